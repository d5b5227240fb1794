use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompressionError {
    #[error("Signal length {len} is not a power of two")]
    InvalidLength { len: usize },

    #[error("Cutoff {cutoff} outside signal of length {len}")]
    InvalidCutoff { cutoff: usize, len: usize },

    #[error("Invalid band [{low}, {high})")]
    InvalidBand { low: usize, high: usize },

    #[error("Cannot unpack {len} reals into complex pairs")]
    OddLength { len: usize },

    #[error("{} batch row(s) failed, first at row {}", .failures.len(), first_index(.failures))]
    BatchFailed {
        failures: Vec<(usize, CompressionError)>,
    },
}

fn first_index(failures: &[(usize, CompressionError)]) -> usize {
    failures.first().map_or(0, |(index, _)| *index)
}

pub type CompressionResult<T> = Result<T, CompressionError>;

impl CompressionError {
    /// Wraps per-row failures, or returns `Ok` when there are none.
    pub(crate) fn check_batch(failures: Vec<(usize, CompressionError)>) -> CompressionResult<()> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CompressionError::BatchFailed { failures })
        }
    }
}
