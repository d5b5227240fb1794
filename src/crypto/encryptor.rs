//! Public-key encryption and secret-key decryption.
//!
//! Encryption of `m` under `pk = (b, a)`:
//!    - `c0 = b * u + e0 + m`
//!    - `c1 = a * u + e1`
//!
//! with `u` ternary and `e0`, `e1` Gaussian. Since `b = -a s + e`,
//! `c0 + c1 * s = m + e u + e0 + e1 s`.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use super::{Ciphertext, CkksError, CkksResult, Parameters, Plaintext};
use crate::{
    keys::{PublicKey, SecretKey},
    rings::{PolySampler, RnsPoly},
};

/// Encrypts plaintexts under the session public key.
///
/// Owns its randomness source, so each concurrent task needs its own
/// instance from [`clone_for_task`](Self::clone_for_task).
pub struct Encryptor {
    params: Arc<Parameters>,
    public_key: Arc<PublicKey>,
    rng: ChaCha20Rng,
}

impl Encryptor {
    pub fn new(params: Arc<Parameters>, public_key: Arc<PublicKey>) -> Self {
        Self::with_rng(params, public_key, ChaCha20Rng::from_os_rng())
    }

    pub fn with_rng(
        params: Arc<Parameters>,
        public_key: Arc<PublicKey>,
        rng: ChaCha20Rng,
    ) -> Self {
        Self {
            params,
            public_key,
            rng,
        }
    }

    /// Same key, independent randomness seeded from the OS. The clone never
    /// inherits the parent's RNG stream, even when that one was seeded.
    pub fn clone_for_task(&self) -> Self {
        Self::new(self.params.clone(), self.public_key.clone())
    }

    pub fn encrypt(&mut self, plaintext: &Plaintext) -> CkksResult<Ciphertext> {
        let basis = plaintext.poly.basis();
        let b = self.public_key.b.restrict_to(basis)?;
        let a = self.public_key.a.restrict_to(basis)?;

        let mut u = RnsPoly::sample_tribits(self.params.hamming_weight(), basis, &mut self.rng);
        u.to_ntt_domain();
        let mut e0 = RnsPoly::sample_gaussian(self.params.error_std(), basis, &mut self.rng);
        e0.to_ntt_domain();
        let mut e1 = RnsPoly::sample_gaussian(self.params.error_std(), basis, &mut self.rng);
        e1.to_ntt_domain();

        let mut m = plaintext.poly.clone();
        m.to_ntt_domain();

        // c0 = b * u + e0 + m
        let mut c0 = b;
        c0 *= &u;
        c0 += &e0;
        c0 += &m;

        // c1 = a * u + e1
        let mut c1 = a;
        c1 *= &u;
        c1 += &e1;

        Ok(Ciphertext {
            components: vec![c0, c1],
            scale: plaintext.scale,
        })
    }
}

/// Decrypts ciphertexts of any degree at any level.
#[derive(Clone)]
pub struct Decryptor {
    secret_key: Arc<SecretKey>,
}

impl Decryptor {
    pub fn new(secret_key: Arc<SecretKey>) -> Self {
        Self { secret_key }
    }

    /// Shares the key; decryption keeps no other state.
    pub fn clone_for_task(&self) -> Self {
        self.clone()
    }

    /// Computes `Σ c_i s^i` by Horner's rule over the ciphertext's basis.
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> CkksResult<Plaintext> {
        let (last, rest) = ciphertext
            .components
            .split_last()
            .ok_or(CkksError::DegreeMismatch {
                expected: 1,
                actual: 0,
            })?;
        let s = self.secret_key.poly.restrict_to(last.basis())?;

        let mut acc = last.clone();
        acc.to_ntt_domain();
        for component in rest.iter().rev() {
            acc *= &s;
            let mut c = component.clone();
            c.to_ntt_domain();
            acc += &c;
        }

        Ok(Plaintext {
            poly: acc,
            scale: ciphertext.scale,
        })
    }
}
