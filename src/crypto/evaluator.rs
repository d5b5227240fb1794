//! Homomorphic operations on ciphertexts.
//!
//! The supported circuit is the encrypted inner product:
//! `mul` (by a plaintext) → `relinearize` → `rescale` → `inner_sum`.
//! The remaining operations are its building blocks.

use std::sync::Arc;

use super::{Ciphertext, CkksError, CkksResult, Parameters, Plaintext};
use crate::{
    encoding::CkksEncoder,
    keys::{EvaluationKeySet, RotationKeySet, SwitchingKey},
    rings::RnsPoly,
};

/// Relative tolerance when comparing floating-point scales.
const SCALE_TOLERANCE: f64 = 1e-9;

/// Right-hand side of a multiplication.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Plaintext(&'a Plaintext),
    Ciphertext(&'a Ciphertext),
}

/// Evaluates homomorphic operations with the session's evaluation keys.
///
/// Holds an encoder for plaintext operands, whose buffers make the evaluator
/// unsuitable for sharing; use [`clone_for_task`](Self::clone_for_task).
pub struct Evaluator {
    params: Arc<Parameters>,
    keys: Arc<EvaluationKeySet>,
    encoder: CkksEncoder,
}

impl Evaluator {
    pub fn new(params: Arc<Parameters>, keys: Arc<EvaluationKeySet>) -> Self {
        let encoder = CkksEncoder::new(params.clone());
        Self {
            params,
            keys,
            encoder,
        }
    }

    pub fn clone_for_task(&self) -> Self {
        Self {
            params: self.params.clone(),
            keys: self.keys.clone(),
            encoder: self.encoder.clone_for_task(),
        }
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    pub fn rotation_keys(&self) -> &RotationKeySet {
        &self.keys.rotations
    }

    // ── Arithmetic ───────────────────────────────────────────────────────────

    /// Homomorphic addition. Operands must agree on level and scale; the
    /// result has the larger of the two degrees.
    pub fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> CkksResult<Ciphertext> {
        self.check_shape(lhs)?;
        self.check_shape(rhs)?;
        check_levels(lhs.level(), rhs.level())?;
        check_scales(lhs.scale, rhs.scale)?;

        let (long, short) = if lhs.components.len() >= rhs.components.len() {
            (lhs, rhs)
        } else {
            (rhs, lhs)
        };
        let mut components = long.components.clone();
        for (acc, c) in components.iter_mut().zip(&short.components) {
            *acc += c;
        }
        Ok(Ciphertext {
            components,
            scale: lhs.scale,
        })
    }

    /// Multiplies without relinearizing. A plaintext operand keeps the
    /// degree; a ciphertext operand yields degree 2. Scales multiply.
    pub fn mul(&self, ct: &Ciphertext, operand: Operand<'_>) -> CkksResult<Ciphertext> {
        self.check_shape(ct)?;
        match operand {
            Operand::Plaintext(pt) => {
                check_levels(ct.level(), pt.level())?;
                let mut m = pt.poly.clone();
                m.to_ntt_domain();
                let components = ct
                    .components
                    .iter()
                    .map(|c| {
                        let mut product = c.clone();
                        product *= &m;
                        product
                    })
                    .collect();
                Ok(Ciphertext {
                    components,
                    scale: ct.scale * pt.scale,
                })
            }
            Operand::Ciphertext(other) => {
                self.check_shape(other)?;
                check_levels(ct.level(), other.level())?;
                for degree in [ct.degree(), other.degree()] {
                    if degree != 1 {
                        return Err(CkksError::DegreeMismatch {
                            expected: 1,
                            actual: degree,
                        });
                    }
                }
                let (a0, a1) = (&ct.components[0], &ct.components[1]);
                let (b0, b1) = (&other.components[0], &other.components[1]);

                // (a0 + a1 s)(b0 + b1 s) = d0 + d1 s + d2 s^2
                let mut d0 = a0.clone();
                d0 *= b0;
                let mut d1 = a0.clone();
                d1 *= b1;
                let mut cross = a1.clone();
                cross *= b0;
                d1 += &cross;
                let mut d2 = a1.clone();
                d2 *= b1;

                Ok(Ciphertext {
                    components: vec![d0, d1, d2],
                    scale: ct.scale * other.scale,
                })
            }
        }
    }

    /// Restores a degree-2 ciphertext to degree 1. Degree-1 input is
    /// returned unchanged.
    pub fn relinearize(&self, ct: &Ciphertext) -> CkksResult<Ciphertext> {
        self.check_shape(ct)?;
        match ct.degree() {
            1 => Ok(ct.clone()),
            2 => {
                let (k0, k1) = self.switch_key(
                    &ct.components[2],
                    &self.keys.relinearization.key,
                    ct.level(),
                )?;
                let mut c0 = ct.components[0].clone();
                c0 += &k0;
                let mut c1 = ct.components[1].clone();
                c1 += &k1;
                Ok(Ciphertext {
                    components: vec![c0, c1],
                    scale: ct.scale,
                })
            }
            actual => Err(CkksError::DegreeMismatch {
                expected: 2,
                actual,
            }),
        }
    }

    pub fn mul_relin(&self, ct: &Ciphertext, operand: Operand<'_>) -> CkksResult<Ciphertext> {
        self.relinearize(&self.mul(ct, operand)?)
    }

    /// Divides by the last prime of the ciphertext's basis, consuming one
    /// level.
    pub fn rescale(&self, ct: &Ciphertext) -> CkksResult<Ciphertext> {
        self.check_shape(ct)?;
        let level = ct.level();
        if level == 0 {
            return Err(CkksError::DepthExhausted {
                required: 1,
                available: 0,
            });
        }
        let target = self.params.q_basis(level - 1);
        let components = ct
            .components
            .iter()
            .map(|c| c.divide_round_by_last(target))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Ciphertext {
            components,
            scale: ct.scale / self.params.q_modulus(level) as f64,
        })
    }

    /// Drops `levels` primes without dividing; the message is unchanged.
    pub fn drop_level(&self, ct: &Ciphertext, levels: usize) -> CkksResult<Ciphertext> {
        self.check_shape(ct)?;
        let level = ct.level();
        if levels > level {
            return Err(CkksError::DepthExhausted {
                required: levels,
                available: level,
            });
        }
        let target = self.params.q_basis(level - levels);
        let components = ct
            .components
            .iter()
            .map(|c| c.restrict_to(target))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Ciphertext {
            components,
            scale: ct.scale,
        })
    }

    // ── Rotations ────────────────────────────────────────────────────────────

    /// Rotates the slot vector left by `rotation` positions, cyclically.
    pub fn rotate(&self, ct: &Ciphertext, rotation: usize) -> CkksResult<Ciphertext> {
        self.check_shape(ct)?;
        let rotation = rotation % self.params.slots();
        if rotation == 0 {
            return Ok(ct.clone());
        }
        if ct.degree() != 1 {
            return Err(CkksError::DegreeMismatch {
                expected: 1,
                actual: ct.degree(),
            });
        }
        let galois_key = self
            .keys
            .rotations
            .get(rotation)
            .ok_or(CkksError::MissingRotationKey { rotation })?;

        let element = galois_key.galois_element;
        let mut c0 = ct.components[0].automorphism(element)?;
        let c1 = ct.components[1].automorphism(element)?;
        let (k0, k1) = self.switch_key(&c1, &galois_key.key, ct.level())?;
        c0 += &k0;
        Ok(Ciphertext {
            components: vec![c0, k1],
            scale: ct.scale,
        })
    }

    /// Sums `n` copies of the ciphertext rotated by multiples of `batch`:
    /// afterwards slot `i` holds `Σ_k slot[i + k·batch]` for `k < n`.
    ///
    /// `n` must be a power of two.
    pub fn inner_sum(&self, ct: &Ciphertext, batch: usize, n: usize) -> CkksResult<Ciphertext> {
        self.check_shape(ct)?;
        if !n.is_power_of_two() {
            return Err(CkksError::InvalidInputShape {
                message: format!("inner sum width must be a power of two, got {n}"),
            });
        }
        let mut acc = ct.clone();
        let mut step = 1;
        while step < n {
            let rotated = self.rotate(&acc, batch * step)?;
            acc = self.add(&acc, &rotated)?;
            step <<= 1;
        }
        Ok(acc)
    }

    // ── Dot product ──────────────────────────────────────────────────────────

    /// Encrypted inner product of `ct` with a plaintext vector.
    ///
    /// The plaintext is encoded at the ciphertext's level with scale
    /// `q_level`, so the rescale restores the ciphertext's original scale.
    /// Slot 0 of the result holds the dot product; other slots hold partial
    /// sums.
    pub fn dot_product(&mut self, ct: &Ciphertext, values: &[f64]) -> CkksResult<Ciphertext> {
        self.check_shape(ct)?;
        let level = ct.level();
        if level == 0 {
            return Err(CkksError::DepthExhausted {
                required: 1,
                available: 0,
            });
        }
        let scale = self.params.q_modulus(level) as f64;
        let pt = self.encoder.encode(values, level, scale)?;
        let product = self.mul_relin(ct, Operand::Plaintext(&pt))?;
        let rescaled = self.rescale(&product)?;
        self.inner_sum(&rescaled, 1, self.params.slots())
    }

    /// Rejects ciphertexts the arithmetic cannot index into: no components,
    /// or a basis larger than the modulus chain.
    fn check_shape(&self, ct: &Ciphertext) -> CkksResult<()> {
        if ct.components.is_empty() {
            return Err(CkksError::DegreeMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let level = ct.level();
        if level > self.params.max_level() {
            return Err(CkksError::InvalidInputShape {
                message: format!(
                    "ciphertext level {level} above maximum {}",
                    self.params.max_level()
                ),
            });
        }
        Ok(())
    }

    // ── Key switching ────────────────────────────────────────────────────────

    /// Returns `(k0, k1)` with `k0 + k1 s ≈ c s'`, where `key` switches from
    /// `s'` to `s`. `c` lives on the level-`level` basis.
    fn switch_key(
        &self,
        c: &RnsPoly,
        key: &SwitchingKey,
        level: usize,
    ) -> CkksResult<(RnsPoly, RnsPoly)> {
        if key.digit_count() <= level {
            return Err(CkksError::DepthExhausted {
                required: level,
                available: key.digit_count().saturating_sub(1),
            });
        }
        let extended = self.params.qp_basis(level);
        let mut acc0 = RnsPoly::zero_ntt(extended.clone());
        let mut acc1 = RnsPoly::zero_ntt(extended.clone());

        for (j, (b, a)) in key.digits.iter().take(level + 1).enumerate() {
            let mut digit = c.lift_channel(j, extended);
            digit.to_ntt_domain();

            let mut term = b.restrict_to(extended)?;
            term *= &digit;
            acc0 += &term;

            let mut term = a.restrict_to(extended)?;
            term *= &digit;
            acc1 += &term;
        }

        let base = self.params.q_basis(level);
        Ok((
            acc0.divide_round_by_last(base)?,
            acc1.divide_round_by_last(base)?,
        ))
    }
}

fn check_levels(left: usize, right: usize) -> CkksResult<()> {
    if left != right {
        return Err(CkksError::LevelMismatch { left, right });
    }
    Ok(())
}

fn check_scales(expected: f64, actual: f64) -> CkksResult<()> {
    if (expected - actual).abs() > SCALE_TOLERANCE * expected.abs() {
        return Err(CkksError::ScaleMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::{Decryptor, Encryptor, ParametersLiteral},
        keys::KeyMaterial,
    };
    use approx::assert_abs_diff_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    struct Fixture {
        params: Arc<Parameters>,
        encoder: CkksEncoder,
        encryptor: Encryptor,
        decryptor: Decryptor,
        evaluator: Evaluator,
    }

    fn fixture(log_slots: u32) -> Fixture {
        let params = Arc::new(Parameters::new(ParametersLiteral::new(log_slots)).unwrap());
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let keys = KeyMaterial::generate(&params, &mut rng).unwrap();
        Fixture {
            encoder: CkksEncoder::new(params.clone()),
            encryptor: Encryptor::with_rng(
                params.clone(),
                keys.public.clone(),
                ChaCha20Rng::seed_from_u64(8),
            ),
            decryptor: Decryptor::new(keys.secret.clone()),
            evaluator: Evaluator::new(params.clone(), keys.evaluation.clone()),
            params,
        }
    }

    impl Fixture {
        fn encrypt(&mut self, values: &[f64]) -> Ciphertext {
            let pt = self
                .encoder
                .encode(values, self.params.max_level(), self.params.default_scale())
                .unwrap();
            self.encryptor.encrypt(&pt).unwrap()
        }

        fn decrypt(&mut self, ct: &Ciphertext) -> Vec<f64> {
            let pt = self.decryptor.decrypt(ct).unwrap();
            self.encoder.decode(&pt)
        }
    }

    fn random_values(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        (0..n).map(|_| rng.random_range(-1.0..1.0)).collect()
    }

    #[test]
    fn add_sums_slotwise() {
        let mut f = fixture(4);
        let a = random_values(16, 1);
        let b = random_values(16, 2);
        let (ca, cb) = (f.encrypt(&a), f.encrypt(&b));
        let sum = f.evaluator.add(&ca, &cb).unwrap();
        let decoded = f.decrypt(&sum);
        for i in 0..16 {
            assert_abs_diff_eq!(decoded[i], a[i] + b[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn add_rejects_level_mismatch() {
        let mut f = fixture(3);
        let ct = f.encrypt(&[1.0]);
        let dropped = f.evaluator.drop_level(&ct, 1).unwrap();
        assert!(matches!(
            f.evaluator.add(&ct, &dropped),
            Err(CkksError::LevelMismatch { .. })
        ));
    }

    #[test]
    fn ciphertext_product_relinearizes_and_rescales() {
        let mut f = fixture(3);
        let a = random_values(8, 3);
        let b = random_values(8, 4);
        let (ca, cb) = (f.encrypt(&a), f.encrypt(&b));

        let product = f.evaluator.mul(&ca, Operand::Ciphertext(&cb)).unwrap();
        assert_eq!(product.degree(), 2);

        let relin = f.evaluator.relinearize(&product).unwrap();
        assert_eq!(relin.degree(), 1);
        let rescaled = f.evaluator.rescale(&relin).unwrap();
        assert_eq!(rescaled.level(), ca.level() - 1);

        let decoded = f.decrypt(&rescaled);
        for i in 0..8 {
            assert_abs_diff_eq!(decoded[i], a[i] * b[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn rescale_at_level_zero_is_depth_exhausted() {
        let mut f = fixture(3);
        let ct = f.encrypt(&[0.5]);
        let bottom = f.evaluator.drop_level(&ct, ct.level()).unwrap();
        assert!(matches!(
            f.evaluator.rescale(&bottom),
            Err(CkksError::DepthExhausted {
                required: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn rotate_shifts_slots_left() {
        let mut f = fixture(3);
        let values: Vec<f64> = (0..8).map(|i| i as f64 / 8.0).collect();
        let ct = f.encrypt(&values);
        let rotated = f.evaluator.rotate(&ct, 2).unwrap();
        let decoded = f.decrypt(&rotated);
        for i in 0..8 {
            assert_abs_diff_eq!(decoded[i], values[(i + 2) % 8], epsilon = 1e-5);
        }
    }

    #[test]
    fn rotate_without_key_fails() {
        let mut f = fixture(3);
        let ct = f.encrypt(&[1.0]);
        assert!(matches!(
            f.evaluator.rotate(&ct, 3),
            Err(CkksError::MissingRotationKey { rotation: 3 })
        ));
    }

    #[test]
    fn inner_sum_broadcasts_total() {
        let mut f = fixture(4);
        let values = random_values(16, 5);
        let ct = f.encrypt(&values);
        let summed = f.evaluator.inner_sum(&ct, 1, 16).unwrap();
        let total: f64 = values.iter().sum();
        let decoded = f.decrypt(&summed);
        for slot in decoded {
            assert_abs_diff_eq!(slot, total, epsilon = 1e-4);
        }
    }

    #[test]
    fn inner_sum_requires_power_of_two() {
        let mut f = fixture(3);
        let ct = f.encrypt(&[1.0]);
        assert!(matches!(
            f.evaluator.inner_sum(&ct, 1, 3),
            Err(CkksError::InvalidInputShape { .. })
        ));
    }

    #[test]
    fn dot_product_lands_in_slot_zero() {
        let mut f = fixture(5);
        let a = random_values(32, 6);
        let b = random_values(20, 7);
        let ct = f.encrypt(&a);
        let result = f.evaluator.dot_product(&ct, &b).unwrap();

        assert_eq!(result.level(), ct.level() - 1);
        assert_abs_diff_eq!(result.scale, f.params.default_scale(), epsilon = 1e-3);

        let expected: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        assert_abs_diff_eq!(f.decrypt(&result)[0], expected, epsilon = 1e-4);
    }

    #[test]
    fn ciphertext_without_components_is_rejected() {
        let mut f = fixture(3);
        let empty = Ciphertext {
            components: Vec::new(),
            scale: f.params.default_scale(),
        };
        assert_eq!((empty.level(), empty.degree()), (0, 0));
        for result in [
            f.evaluator.dot_product(&empty, &[1.0]),
            f.evaluator.rescale(&empty),
            f.evaluator.rotate(&empty, 1),
            f.evaluator.relinearize(&empty),
        ] {
            assert!(matches!(
                result,
                Err(CkksError::DegreeMismatch {
                    expected: 1,
                    actual: 0
                })
            ));
        }

        let ct = f.encrypt(&[1.0]);
        assert!(f.evaluator.add(&ct, &empty).is_err());
        assert!(f.evaluator.mul(&ct, Operand::Ciphertext(&empty)).is_err());
    }

    #[test]
    fn ciphertext_above_the_chain_is_rejected() {
        let mut f = fixture(3);
        let mut ct = f.encrypt(&[1.0]);
        let oversized = f.params.qp_basis(f.params.max_level()).clone();
        ct.components = ct
            .components
            .iter()
            .map(|_| RnsPoly::zero_ntt(oversized.clone()))
            .collect();
        assert!(matches!(
            f.evaluator.rescale(&ct),
            Err(CkksError::InvalidInputShape { .. })
        ));
    }
}
