pub mod config;
pub mod error;

pub use config::{ChatConfig, GeneralConfig, LexiConfig, LinkConfig, LinkPolicy, StubConfig};
pub use error::{LexiError, Result};
