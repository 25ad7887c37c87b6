//! Error types for machoscope.

use thiserror::Error;

/// Result type alias using machoscope's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in machoscope operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The decoder rejected the input.
    #[error("decode failed: {0}")]
    Decode(#[from] machoscope_core::DecodeError),

    /// Failed to load configuration.
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Failed to save configuration.
    #[error("failed to save config: {0}")]
    ConfigSave(String),

    /// Output serialization failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// IO error wrapper.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
