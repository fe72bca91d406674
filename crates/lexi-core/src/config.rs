use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LexiError, Result};

/// Top-level configuration for the Lexi assistant.
///
/// Loaded from `~/.lexi/config.toml` by default. Every section falls back
/// to its defaults when missing from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub stub: StubConfig,
    #[serde(default)]
    pub links: LinkConfig,
}

impl LexiConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LexiConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chat.resolution_timeout_secs == 0 {
            return Err(LexiError::Config(
                "chat.resolution_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Query dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Seconds to wait for the answer backend before giving up.
    pub resolution_timeout_secs: u64,
    /// Pass prior turns to the answer backend along with the question.
    pub include_history: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            resolution_timeout_secs: 30,
            include_history: true,
        }
    }
}

impl ChatConfig {
    pub fn resolution_timeout(&self) -> Duration {
        Duration::from_secs(self.resolution_timeout_secs)
    }
}

/// Settings for the built-in canned answer backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    /// Simulated backend latency in milliseconds. Zero answers immediately.
    pub delay_ms: u64,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self { delay_ms: 2000 }
    }
}

impl StubConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// How a citation link is turned into the URL handed to the opener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPolicy {
    /// Append a `search=<paragraph>` fragment when the citation has a locator.
    #[default]
    LocatorFragment,
    /// Hand out the stored link unchanged.
    Verbatim,
}

/// Citation link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub policy: LinkPolicy,
    /// Open source documents in the system browser. When false, links are
    /// only logged.
    pub open_in_browser: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            policy: LinkPolicy::LocatorFragment,
            open_in_browser: true,
        }
    }
}
