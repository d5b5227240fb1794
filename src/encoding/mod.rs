pub mod ckks_encoder;

pub use ckks_encoder::CkksEncoder;
use thiserror::Error;

pub type EncodingResult<T> = Result<T, EncodingError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Input too long: got {got}, max {max}")]
    InputTooLong { got: usize, max: usize },

    #[error("Coefficient {value} out of range")]
    CoefficientOutOfRange { value: f64 },
}
