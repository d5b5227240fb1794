use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RnsNttError {
    #[error("ring degree must be a power of two, got {degree}")]
    InvalidDegree { degree: usize },
    #[error("RNS basis must contain at least one modulus")]
    EmptyBasis,
    #[error("modulus {modulus} is not NTT-friendly for degree {degree}")]
    NonNttFriendlyModulus { modulus: u64, degree: usize },
    #[error("modulus {modulus} appears more than once in the basis")]
    DuplicateModulus { modulus: u64 },
    #[error("basis product of {bits} bits exceeds the {max_bits}-bit CRT limit")]
    ModulusTooLarge { bits: u32, max_bits: u32 },
    #[error("invalid mod-drop count {drop_count} for {channel_count} channels")]
    InvalidModDrop {
        drop_count: usize,
        channel_count: usize,
    },
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },
    #[error("channel length mismatch: expected {expected}, got {actual}")]
    ChannelLengthMismatch { expected: usize, actual: usize },
    #[error("coefficient {coefficient} is not reduced modulo {modulus}")]
    NonReducedCoefficient { coefficient: u64, modulus: u64 },
    #[error("modulus {modulus} is not part of the source basis")]
    ModulusNotInBasis { modulus: u64 },
    #[error("galois element {element} is not odd modulo {order}")]
    InvalidGaloisElement { element: usize, order: usize },
}

pub type RnsNttResult<T> = Result<T, RnsNttError>;
