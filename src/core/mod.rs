pub mod backend;
pub mod collection;
pub mod config;
pub mod document;
pub mod element;

pub use backend::Backend;
pub use collection::ElementCollection;
pub use config::{ActionConfig, BrowserConfig, Config, Viewport, WaitConfig};
pub use document::{Document, ReadyState};
pub use element::{EventWait, NativeElement};
