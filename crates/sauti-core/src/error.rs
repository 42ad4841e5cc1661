//! Error types for the Sauti runtime

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Requested model/variant is not known to the catalog
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Constructing the engine on the device failed; the resident slot is
    /// left empty and the next caller may retry a fresh construction.
    #[error("Model load error: {0}")]
    ModelLoadError(String),

    /// The engine failed while generating against an already-acquired
    /// handle; resident state is unaffected.
    #[error("Inference error: {0}")]
    InferenceError(String),

    /// Caller-supplied parameter failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Config error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
