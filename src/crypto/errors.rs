use thiserror::Error;

use crate::{encoding::EncodingError, keys::KeyError, rings::RnsNttError};

#[derive(Error, Debug, Clone)]
pub enum CkksError {
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Invalid input shape: {message}")]
    InvalidInputShape { message: String },

    #[error("Encoding failed: {source}")]
    EncodingError {
        #[from]
        source: EncodingError,
    },

    #[error("Ring operation failed: {source}")]
    RingError {
        #[from]
        source: RnsNttError,
    },

    #[error("Key generation failed: {source}")]
    KeyError {
        #[from]
        source: KeyError,
    },

    #[error("Scale mismatch: expected {expected:.2}, got {actual:.2}")]
    ScaleMismatch { expected: f64, actual: f64 },

    #[error("Level mismatch: {left} vs {right}")]
    LevelMismatch { left: usize, right: usize },

    #[error("Degree mismatch: expected {expected}, got {actual}")]
    DegreeMismatch { expected: usize, actual: usize },

    #[error("Depth exhausted: operation needs level {required}, ciphertext is at level {available}")]
    DepthExhausted { required: usize, available: usize },

    #[error("No rotation key for rotation by {rotation}")]
    MissingRotationKey { rotation: usize },

    #[error("Missing ciphertext at index {index}")]
    NullCiphertext { index: usize },
}

pub type CkksResult<T> = Result<T, CkksError>;
