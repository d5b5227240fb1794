//! Secret Key (sk): a "small" polynomial s(X) with coefficients in {-1, 0, 1}.
use crate::{
    crypto::Parameters,
    rings::{PolySampler, RnsPoly},
};
use rand::Rng;

/// Secret key held over the extended basis `{q_0, …, q_L, p}` in NTT domain,
/// so key generation and decryption at any level only need to project it.
#[derive(Debug, Clone)]
pub struct SecretKey {
    pub poly: RnsPoly,
}

impl SecretKey {
    /// Generate a new sparse ternary secret key.
    ///
    /// `Parameters` clamps the hamming weight to the ring degree, so
    /// sampling cannot fail.
    pub fn generate<R: Rng + ?Sized>(params: &Parameters, rng: &mut R) -> Self {
        let basis = params.qp_basis(params.max_level());
        let mut poly = RnsPoly::sample_tribits(params.hamming_weight(), basis, rng);
        poly.to_ntt_domain();
        Self { poly }
    }
}
