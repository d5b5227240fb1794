use crate::{
    crypto::Parameters,
    keys::SecretKey,
    rings::{PolySampler, RnsNttError, RnsPoly},
};
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PublicKeyError {
    #[error("Secret key does not cover the encryption basis: {0}")]
    InvalidSecretKey(#[from] RnsNttError),
}

/// RLWE public key at the top level of the modulus chain, in NTT domain.
#[derive(Debug, Clone)]
pub struct PublicKey {
    /// "b" component: b = -(a * s) + e
    pub b: RnsPoly,
    /// "a" component: uniformly random
    pub a: RnsPoly,
}

impl PublicKey {
    /// Generate a new RLWE public key.
    pub fn generate<R: Rng + ?Sized>(
        secret_key: &SecretKey,
        params: &Parameters,
        rng: &mut R,
    ) -> Result<Self, PublicKeyError> {
        let basis = params.q_basis(params.max_level());
        let s = secret_key.poly.restrict_to(basis)?;

        let a = RnsPoly::sample_uniform(basis, rng);
        let mut e = RnsPoly::sample_gaussian(params.error_std(), basis, rng);
        e.to_ntt_domain();

        // b = -(a * s) + e
        let mut a_times_s = a.clone();
        a_times_s *= &s;
        let mut b = -a_times_s;
        b += &e;

        Ok(PublicKey { b, a })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ParametersLiteral;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn b_plus_a_s_is_small() {
        let params = Parameters::new(ParametersLiteral::new(4)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let sk = SecretKey::generate(&params, &mut rng);
        let pk = PublicKey::generate(&sk, &params, &mut rng).unwrap();

        let s = sk.poly.restrict_to(pk.a.basis()).unwrap();
        let mut noise = pk.a.clone();
        noise *= &s;
        noise += &pk.b;
        // 6 sigma bound on rounded gaussian noise.
        assert!(noise.to_centered_f64().iter().all(|e| e.abs() <= 20.0));
    }
}
