use crate::wait::SettleDiagnostics;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("element is disabled: {0}")]
    ElementDisabled(String),

    #[error("element is read-only: {0}")]
    ElementReadOnly(String),

    #[error("no element found matching {0}")]
    NoElementFound(String),

    #[error("wait for complete timed out: {0}")]
    Timeout(SettleDiagnostics),

    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("browser not launched")]
    NotLaunched,

    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    #[error("script evaluation failed: {0}")]
    ScriptFailed(String),

    #[error("native call failed: {0}")]
    Native(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AutomationError>;

// Convert anyhow::Error (headless_chrome's error type) to AutomationError
impl From<anyhow::Error> for AutomationError {
    fn from(err: anyhow::Error) -> Self {
        AutomationError::Native(err.to_string())
    }
}
