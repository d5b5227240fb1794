//! Hybrid key-switching keys with one special prime `P`.
//!
//! A key from `s'` to `s` holds one RLWE sample per prime `q_j` of the chain,
//! over the basis `{q_0, …, q_L, p}`:
//!
//! ```text
//! b_j = -a_j * s + e_j + g_j * s'      g_j = P (mod q_j), 0 (mod q_i, i != j), 0 (mod p)
//! ```
//!
//! Switching a polynomial `c` decomposes it into its residues `[c]_{q_j}`,
//! takes `Σ [c]_{q_j} (b_j, a_j)`, which decrypts to `P c s'` plus small
//! noise, and divides by `P`.

use crate::{
    crypto::Parameters,
    math::modular::{add_mod, mul_mod},
    rings::{PolySampler, RnsNttResult, RnsPoly},
};
use rand::Rng;

use super::SecretKey;

#[derive(Debug, Clone)]
pub struct SwitchingKey {
    /// `(b_j, a_j)` for every prime `q_j` of the chain, NTT domain.
    pub digits: Vec<(RnsPoly, RnsPoly)>,
}

impl SwitchingKey {
    /// Generates a key turning encryptions under `source` into encryptions
    /// under `secret_key`.
    ///
    /// `source` must live on the extended basis in NTT domain.
    pub fn generate<R: Rng + ?Sized>(
        source: &RnsPoly,
        secret_key: &SecretKey,
        params: &Parameters,
        rng: &mut R,
    ) -> RnsNttResult<Self> {
        let basis = params.qp_basis(params.max_level());
        let source = source.restrict_to(basis)?;
        let s = secret_key.poly.restrict_to(basis)?;
        let p = params.p_modulus();

        let mut digits = Vec::with_capacity(params.max_level() + 1);
        for (j, &q) in params.q_moduli().iter().enumerate() {
            let a = RnsPoly::sample_uniform(basis, rng);
            let mut e = RnsPoly::sample_gaussian(params.error_std(), basis, rng);
            e.to_ntt_domain();

            let mut a_times_s = a.clone();
            a_times_s *= &s;
            let mut b = -a_times_s;
            b += &e;

            let gadget = p % q;
            for (bk, &sk) in b.channel_mut(j).iter_mut().zip(&source.channels()[j]) {
                *bk = add_mod(*bk, mul_mod(gadget, sk, q), q);
            }
            digits.push((b, a));
        }
        Ok(Self { digits })
    }

    pub fn digit_count(&self) -> usize {
        self.digits.len()
    }
}
