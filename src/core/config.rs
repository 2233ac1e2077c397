use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub browser: BrowserConfig,
    pub wait: WaitConfig,
    pub actions: ActionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
}

/// Settle-wait budget and polling cadence used by the wait protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    pub highlight: bool,
    pub highlight_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            wait: WaitConfig::default(),
            actions: ActionConfig::default(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            args: vec![],
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            poll_interval_ms: 100,
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            highlight: true,
            highlight_color: "yellow".to_string(),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl WaitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
