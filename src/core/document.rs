use crate::core::collection::ElementCollection;
use crate::core::element::NativeElement;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Loading state of a document, in progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    /// Parse a DOM `readyState` string. Unknown strings read as `Loading`
    /// so an unrecognized state keeps waiters polling rather than declaring
    /// completion.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "complete" => ReadyState::Complete,
            "interactive" => ReadyState::Interactive,
            _ => ReadyState::Loading,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadyState::Loading => "loading",
            ReadyState::Interactive => "interactive",
            ReadyState::Complete => "complete",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One document in a browser container: the top-level page or any nested
/// frame. Frames are documents of the same type, so the settle protocol can
/// recurse over the tree without changing shape.
pub trait Document: Sized {
    type Element: NativeElement;
    type Collection: ElementCollection<Element = Self::Element>;

    fn ready_state(&self) -> Result<ReadyState>;

    /// Direct child frames, in document order.
    fn frames(&self) -> Result<Vec<Self>>;

    /// Collection over every element of this document.
    fn collection(&self) -> Result<Self::Collection>;

    /// Collection over the subtree below `root` (excluding `root` itself).
    fn scoped_collection(&self, root: &Self::Element) -> Result<Self::Collection>;

    fn url(&self) -> Result<String>;

    /// Stable label used in settle diagnostics, e.g. `page` or `frame[0.2]`.
    fn label(&self) -> String;

    fn navigate(&self, url: &str) -> Result<()>;
}
