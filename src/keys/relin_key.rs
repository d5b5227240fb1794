use crate::{crypto::Parameters, rings::RnsNttResult};
use rand::Rng;

use super::{SecretKey, SwitchingKey};

/// Relinearization key used to transform ciphertexts after multiplication.
///
/// Switches the `c_2 · s^2` term of a degree-2 ciphertext back to a
/// degree-1 pair under `s`.
#[derive(Debug, Clone)]
pub struct RelinearizationKey {
    pub key: SwitchingKey,
}

impl RelinearizationKey {
    pub fn generate<R: Rng + ?Sized>(
        secret_key: &SecretKey,
        params: &Parameters,
        rng: &mut R,
    ) -> RnsNttResult<Self> {
        let mut s_squared = secret_key.poly.clone();
        s_squared *= &secret_key.poly;
        let key = SwitchingKey::generate(&s_squared, secret_key, params, rng)?;
        Ok(Self { key })
    }
}
