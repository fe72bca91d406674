//! CLI argument definitions for the Lexi assistant.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use lexi_core::LexiConfig;

/// Lexi: ask legal questions and get answers with citations.
#[derive(Parser, Debug)]
#[command(name = "lexi", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Simulated answer latency of the built-in backend, in milliseconds.
    #[arg(long = "stub-delay-ms")]
    pub stub_delay_ms: Option<u64>,

    /// Seconds to wait for an answer before reporting a failure.
    #[arg(long = "timeout-secs")]
    pub timeout_secs: Option<u64>,

    /// Log citation links instead of opening them in a browser.
    #[arg(long = "no-browser")]
    pub no_browser: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > LEXI_CONFIG env var > platform default (~/.lexi/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("LEXI_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut LexiConfig) {
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ms) = self.stub_delay_ms {
            config.stub.delay_ms = ms;
        }
        if let Some(secs) = self.timeout_secs.filter(|s| *s > 0) {
            config.chat.resolution_timeout_secs = secs;
        }
        if self.no_browser {
            config.links.open_in_browser = false;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".lexi").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".lexi").join("config.toml");
    }
    PathBuf::from("config.toml")
}
