use crate::core::config::Config;
use crate::core::document::Document;
use crate::errors::Result;

/// Launchable native browser binding owning the top-level handle.
pub trait Backend {
    type Document: Document;

    /// Launch the native browser instance.
    fn launch(&mut self, config: &Config) -> Result<()>;

    /// The top-level document of the running instance.
    fn document(&self) -> Result<Self::Document>;

    fn is_running(&self) -> bool;

    /// Dispose all native resources. Must be idempotent.
    fn close(&mut self) -> Result<()>;
}
