//! Link openers: where a resolved citation URL is finally sent.

use crate::error::LinkError;

/// Opens a URL in a new, independent viewing context.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), LinkError>;
}

/// Opens links in the system's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserOpener;

impl LinkOpener for BrowserOpener {
    fn open(&self, url: &str) -> Result<(), LinkError> {
        webbrowser::open(url).map_err(|e| LinkError::OpenFailed(e.to_string()))?;
        tracing::info!(url = %url, "Opened URL in browser");
        Ok(())
    }
}

/// Headless opener: only logs the URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOpener;

impl LinkOpener for LoggingOpener {
    fn open(&self, url: &str) -> Result<(), LinkError> {
        tracing::info!(url = %url, "Opened URL");
        Ok(())
    }
}
