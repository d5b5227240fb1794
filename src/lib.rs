//! Privacy-preserving cosine similarity.
//!
//! A leveled CKKS pipeline computes encrypted dot products between
//! encrypted query vectors and plaintext reference vectors; a spectral
//! compressor optionally shrinks the vectors beforehand.

pub mod batch;
pub mod compression;
pub mod crypto;
pub mod encoding;
pub mod keys;
pub mod math;
pub mod rings;
pub mod session;
pub mod similarity;

pub use compression::{CompressionError, CompressionResult, Filter, SpectralCompressor};
pub use crypto::{
    Ciphertext, CkksError, CkksResult, Decryptor, Encryptor, Evaluator, Operand, Parameters,
    ParametersLiteral, Plaintext,
};
pub use encoding::{CkksEncoder, EncodingError};
pub use keys::{KeyError, KeyMaterial};
pub use rings::{PolyRing, PolySampler, RnsBasis, RnsPoly};
pub use session::{
    DecryptionContext, DotProductBatch, EncryptionContext, EvaluationContext, Session,
    SessionBuilder, create_session,
};
pub use similarity::{NULL_SIMILARITY, SimilarityMatrix};
