//! Error types for the virtual radio

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("image file error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed radio image: {0}")]
    Format(#[from] serde_json::Error),

    /// Image file belongs to a different model
    #[error("image is for model '{found}', expected '{expected}'")]
    ModelMismatch { expected: String, found: String },
}
