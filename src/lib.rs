pub mod actions;
pub mod browser;
pub mod constraints;
pub mod core;
pub mod dom;
pub mod errors;
pub mod finder;
pub mod testing;
pub mod wait;

pub use actions::{CapabilityRegistry, ElementCapabilities};
#[cfg(feature = "chrome")]
pub use browser::ChromeBackend;
pub use browser::{BrowserSession, Page};
pub use constraints::{AttributeLookup, Constraint, ValueMatcher};
pub use self::core::{
    Backend, Config, Document, ElementCollection, EventWait, NativeElement, ReadyState,
};
pub use dom::{AttributeBag, Element};
pub use errors::{AutomationError, Result};
pub use finder::ElementFinder;
pub use wait::{wait_for_complete, SettleDiagnostics};
