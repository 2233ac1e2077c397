#[cfg(feature = "chrome")]
pub mod chrome;
pub mod session;

#[cfg(feature = "chrome")]
pub use chrome::{ChromeBackend, ChromeCollection, ChromeElement, ChromePage};
pub use session::{BrowserSession, Page};
