//! Scheme parameters: ring degree, modulus chain, special prime and scale.
//!
//! A [`ParametersLiteral`] is the serialisable description; [`Parameters`]
//! is the validated, derived form shared by every context of a session.
//! The prime chain `q_0, …, q_L` is ordered so that `q_0` is the large base
//! prime and rescaling always removes the last remaining one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::{CkksError, CkksResult};
use crate::{
    math::{generate_ntt_primes, modular::mod_pow},
    rings::{MAX_BASIS_BITS, NttTable, RnsBasis},
};

pub const DEFAULT_LOG_SLOTS: u32 = 10;
pub const DEFAULT_LOG_Q: [u32; 3] = [45, 35, 35];
pub const DEFAULT_LOG_P: [u32; 1] = [40];
pub const DEFAULT_LOG_SCALE: u32 = 35;
pub const DEFAULT_ERROR_STD: f64 = 3.2;
pub const DEFAULT_HAMMING_WEIGHT: usize = 192;

/// Generator of the rotation subgroup of `(Z/2NZ)^*`.
pub const GALOIS_GENERATOR: u64 = 5;

const MAX_LOG_SLOTS: u32 = 16;
const MIN_PRIME_BITS: u32 = 20;
const MAX_PRIME_BITS: u32 = 61;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParametersLiteral {
    pub log_slots: u32,
    pub log_q: Vec<u32>,
    pub log_p: Vec<u32>,
    pub log_default_scale: u32,
    pub error_std: f64,
    pub hamming_weight: usize,
}

impl Default for ParametersLiteral {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_SLOTS)
    }
}

impl ParametersLiteral {
    pub fn new(log_slots: u32) -> Self {
        Self {
            log_slots,
            log_q: DEFAULT_LOG_Q.to_vec(),
            log_p: DEFAULT_LOG_P.to_vec(),
            log_default_scale: DEFAULT_LOG_SCALE,
            error_std: DEFAULT_ERROR_STD,
            hamming_weight: DEFAULT_HAMMING_WEIGHT,
        }
    }

    pub fn with_log_slots(mut self, log_slots: u32) -> Self {
        self.log_slots = log_slots;
        self
    }

    pub fn with_log_q(mut self, log_q: Vec<u32>) -> Self {
        self.log_q = log_q;
        self
    }

    pub fn with_log_p(mut self, log_p: Vec<u32>) -> Self {
        self.log_p = log_p;
        self
    }

    pub fn with_log_default_scale(mut self, bits: u32) -> Self {
        self.log_default_scale = bits;
        self
    }

    pub fn with_error_std(mut self, std_dev: f64) -> Self {
        self.error_std = std_dev;
        self
    }

    pub fn with_hamming_weight(mut self, weight: usize) -> Self {
        self.hamming_weight = weight;
        self
    }

    fn validate(&self) -> CkksResult<()> {
        let invalid = |message: String| Err(CkksError::InvalidParameter { message });

        if !(1..=MAX_LOG_SLOTS).contains(&self.log_slots) {
            return invalid(format!(
                "log_slots must be in [1, {MAX_LOG_SLOTS}], got {}",
                self.log_slots
            ));
        }
        if self.log_q.len() < 2 {
            return invalid(format!(
                "modulus chain too shallow: need at least 2 primes for one \
                multiply and rescale, got {}",
                self.log_q.len()
            ));
        }
        if self.log_p.len() != 1 {
            return invalid(format!(
                "exactly one special prime is supported, got {}",
                self.log_p.len()
            ));
        }
        if let Some(bits) = self
            .log_q
            .iter()
            .chain(&self.log_p)
            .find(|b| !(MIN_PRIME_BITS..=MAX_PRIME_BITS).contains(*b))
        {
            return invalid(format!(
                "prime sizes must be in [{MIN_PRIME_BITS}, {MAX_PRIME_BITS}] bits, got {bits}"
            ));
        }
        let total: u32 = self.log_q.iter().chain(&self.log_p).sum();
        if total > MAX_BASIS_BITS {
            return invalid(format!(
                "modulus chain of {total} bits exceeds the {MAX_BASIS_BITS}-bit limit"
            ));
        }
        if self.log_default_scale == 0 || self.log_default_scale >= self.log_q[0] {
            return invalid(format!(
                "default scale 2^{} must be positive and below q_0 (2^{})",
                self.log_default_scale, self.log_q[0]
            ));
        }
        if !(self.error_std.is_finite() && self.error_std > 0.0) {
            return invalid(format!(
                "error_std must be finite and positive, got {}",
                self.error_std
            ));
        }
        if self.hamming_weight == 0 {
            return invalid("hamming_weight must be positive".to_string());
        }
        Ok(())
    }
}

/// Validated parameters together with the derived modulus chain and the
/// RNS bases for every level.
#[derive(Debug)]
pub struct Parameters {
    literal: ParametersLiteral,
    degree: usize,
    q_moduli: Vec<u64>,
    p_modulus: u64,
    q_bases: Vec<Arc<RnsBasis>>,
    qp_bases: Vec<Arc<RnsBasis>>,
}

impl Parameters {
    pub fn new(literal: ParametersLiteral) -> CkksResult<Self> {
        literal.validate()?;
        let degree = 1usize << (literal.log_slots + 1);

        let bit_sizes: Vec<u32> = literal.log_q.iter().chain(&literal.log_p).copied().collect();
        let mut primes = generate_ntt_primes(&bit_sizes, degree as u64).ok_or_else(|| {
            CkksError::InvalidParameter {
                message: format!(
                    "no NTT-friendly primes of sizes {bit_sizes:?} for degree {degree}"
                ),
            }
        })?;
        let p_modulus = primes.pop().ok_or_else(|| CkksError::InvalidParameter {
            message: "special prime missing".to_string(),
        })?;
        let q_moduli = primes;
        debug!(degree, ?q_moduli, p_modulus, "generated modulus chain");

        let q_tables = q_moduli
            .iter()
            .map(|&q| NttTable::new(q, degree).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        let p_table = Arc::new(NttTable::new(p_modulus, degree)?);

        let mut q_bases = Vec::with_capacity(q_moduli.len());
        let mut qp_bases = Vec::with_capacity(q_moduli.len());
        for level in 0..q_moduli.len() {
            let tables = q_tables[..=level].to_vec();
            q_bases.push(Arc::new(RnsBasis::from_tables(degree, tables.clone())?));
            let mut extended = tables;
            extended.push(p_table.clone());
            qp_bases.push(Arc::new(RnsBasis::from_tables(degree, extended)?));
        }

        let hamming_weight = literal.hamming_weight.min(degree);
        Ok(Self {
            literal: ParametersLiteral {
                hamming_weight,
                ..literal
            },
            degree,
            q_moduli,
            p_modulus,
            q_bases,
            qp_bases,
        })
    }

    pub fn literal(&self) -> &ParametersLiteral {
        &self.literal
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn log_slots(&self) -> u32 {
        self.literal.log_slots
    }

    /// Number of real values a plaintext can hold.
    pub fn slots(&self) -> usize {
        self.degree / 2
    }

    pub fn max_level(&self) -> usize {
        self.q_moduli.len() - 1
    }

    pub fn q_moduli(&self) -> &[u64] {
        &self.q_moduli
    }

    pub fn q_modulus(&self, level: usize) -> u64 {
        self.q_moduli[level]
    }

    pub fn p_modulus(&self) -> u64 {
        self.p_modulus
    }

    pub fn default_scale(&self) -> f64 {
        2f64.powi(self.literal.log_default_scale as i32)
    }

    pub fn error_std(&self) -> f64 {
        self.literal.error_std
    }

    pub fn hamming_weight(&self) -> usize {
        self.literal.hamming_weight
    }

    /// Basis `{q_0, …, q_level}`.
    pub fn q_basis(&self, level: usize) -> &Arc<RnsBasis> {
        &self.q_bases[level]
    }

    /// Basis `{q_0, …, q_level, p}` used during key switching.
    pub fn qp_basis(&self, level: usize) -> &Arc<RnsBasis> {
        &self.qp_bases[level]
    }

    /// Galois element `5^rotation mod 2N` realising a left rotation of the
    /// slot vector by `rotation` positions.
    pub fn galois_element(&self, rotation: usize) -> usize {
        let order = 2 * self.degree as u64;
        let steps = (rotation % self.slots()) as u64;
        mod_pow(GALOIS_GENERATOR, steps, order) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_literal_matches_reference_chain() {
        let literal = ParametersLiteral::default();
        assert_eq!(literal.log_q, vec![45, 35, 35]);
        assert_eq!(literal.log_p, vec![40]);
        assert_eq!(literal.log_default_scale, 35);
    }

    #[test]
    fn derives_degree_and_bases() {
        let params = Parameters::new(ParametersLiteral::new(4)).unwrap();
        assert_eq!(params.degree(), 32);
        assert_eq!(params.slots(), 16);
        assert_eq!(params.max_level(), 2);
        assert_eq!(params.q_basis(1).moduli(), &params.q_moduli()[..2]);
        assert_eq!(params.qp_basis(0).moduli(), &[params.q_modulus(0), params.p_modulus()]);
        assert_eq!(params.hamming_weight(), 32);
    }

    #[test]
    fn galois_elements_follow_generator() {
        let params = Parameters::new(ParametersLiteral::new(3)).unwrap();
        assert_eq!(params.galois_element(0), 1);
        assert_eq!(params.galois_element(1), 5);
        assert_eq!(params.galois_element(2), 25);
        // Rotations wrap around the slot count.
        assert_eq!(params.galois_element(9), 5);
    }

    #[test]
    fn rejects_shallow_chain() {
        let literal = ParametersLiteral::new(4).with_log_q(vec![45]);
        assert!(matches!(
            Parameters::new(literal),
            Err(CkksError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn rejects_inconsistent_literals() {
        let cases = [
            ParametersLiteral::new(0),
            ParametersLiteral::new(4).with_log_p(vec![40, 40]),
            ParametersLiteral::new(4).with_log_default_scale(45),
            ParametersLiteral::new(4).with_log_q(vec![61, 61, 61, 61]),
            ParametersLiteral::new(4).with_log_q(vec![45, 10]),
            ParametersLiteral::new(4).with_error_std(-1.0),
        ];
        for literal in cases {
            assert!(
                matches!(Parameters::new(literal.clone()), Err(CkksError::InvalidParameter { .. })),
                "accepted {literal:?}"
            );
        }
    }

    #[test]
    fn literal_roundtrips_through_json() {
        let literal = ParametersLiteral::new(6).with_log_q(vec![50, 40, 40]);
        let json = serde_json::to_string(&literal).unwrap();
        let back: ParametersLiteral = serde_json::from_str(&json).unwrap();
        assert_eq!(back, literal);

        let partial: ParametersLiteral = serde_json::from_str(r#"{"log_slots": 5}"#).unwrap();
        assert_eq!(partial, ParametersLiteral::new(5));
    }
}
