//! Leveled CKKS over the RNS-NTT ring.
//!
//! [`Parameters`] fix the ring and modulus chain, [`Encryptor`] and
//! [`Decryptor`] move between plaintexts and ciphertexts, and [`Evaluator`]
//! carries out the homomorphic operations.

pub mod encryptor;
pub mod errors;
pub mod evaluator;
pub mod params;
pub mod types;

pub use encryptor::{Decryptor, Encryptor};
pub use errors::{CkksError, CkksResult};
pub use evaluator::{Evaluator, Operand};
pub use params::{Parameters, ParametersLiteral};
pub use types::{Ciphertext, Plaintext};
