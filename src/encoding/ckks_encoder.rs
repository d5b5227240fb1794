//! CKKS encoder/decoder for `RnsPoly` plaintexts.
//!
//! Slot `j` holds the evaluation of the message polynomial at
//! `ζ^{5^j}`, with `ζ = exp(iπ/N)`. This ordering makes the Galois map
//! `X -> X^{5^k}` a cyclic left rotation of the slots by `k`.
//!
//! Both directions run as one length-`N` FFT:
//!   decode: twist `m_i ζ^i`, unnormalised inverse DFT, read the slot indices
//!   encode: scatter values and conjugates, forward DFT / N, untwist, round
//!
//! The FFT plans and index tables are immutable and shared between clones;
//! the working buffers are per instance.

use std::{f64::consts::PI, sync::Arc};

use rustfft::{Fft, FftPlanner, num_complex::Complex64};

use super::{EncodingError, EncodingResult};
use crate::{
    crypto::{Parameters, Plaintext},
    rings::RnsPoly,
};

/// Integer coefficients must stay well inside `i64` after rounding.
const MAX_COEFFICIENT: f64 = (1u64 << 62) as f64;

#[derive(Debug)]
struct EmbeddingTables {
    /// Position of slot `j` in the DFT output: `(5^j mod 2N - 1) / 2`.
    slot_index: Vec<usize>,
    /// Position of the conjugate of slot `j`: `(-5^j mod 2N - 1) / 2`.
    conj_index: Vec<usize>,
    /// `ζ^i` for `i` in `0..N`.
    twist: Vec<Complex64>,
    /// `ζ^{-i} / N` for `i` in `0..N`.
    untwist: Vec<Complex64>,
}

impl EmbeddingTables {
    fn new(degree: usize) -> Self {
        let order = 2 * degree;
        let slots = degree / 2;
        let mut slot_index = Vec::with_capacity(slots);
        let mut conj_index = Vec::with_capacity(slots);
        let mut power = 1usize;
        for _ in 0..slots {
            slot_index.push((power - 1) / 2);
            conj_index.push((order - power - 1) / 2);
            power = power * 5 % order;
        }

        let angle = PI / degree as f64;
        let twist = (0..degree)
            .map(|i| Complex64::from_polar(1.0, angle * i as f64))
            .collect();
        let untwist = (0..degree)
            .map(|i| Complex64::from_polar(1.0 / degree as f64, -angle * i as f64))
            .collect();

        Self {
            slot_index,
            conj_index,
            twist,
            untwist,
        }
    }
}

/// CKKS encoder/decoder bound to one parameter set.
///
/// Not safe to share mutably between tasks: call
/// [`clone_for_task`](Self::clone_for_task) to get a worker with its own
/// buffers.
pub struct CkksEncoder {
    params: Arc<Parameters>,
    tables: Arc<EmbeddingTables>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl CkksEncoder {
    pub fn new(params: Arc<Parameters>) -> Self {
        let degree = params.degree();
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(degree);
        let inverse = planner.plan_fft_inverse(degree);
        let tables = Arc::new(EmbeddingTables::new(degree));
        Self::with_shared(params, tables, forward, inverse)
    }

    fn with_shared(
        params: Arc<Parameters>,
        tables: Arc<EmbeddingTables>,
        forward: Arc<dyn Fft<f64>>,
        inverse: Arc<dyn Fft<f64>>,
    ) -> Self {
        let degree = params.degree();
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            params,
            tables,
            forward,
            inverse,
            buffer: vec![Complex64::default(); degree],
            scratch: vec![Complex64::default(); scratch_len],
        }
    }

    /// Shares plans and tables, allocates fresh buffers.
    pub fn clone_for_task(&self) -> Self {
        Self::with_shared(
            self.params.clone(),
            self.tables.clone(),
            self.forward.clone(),
            self.inverse.clone(),
        )
    }

    pub fn max_slots(&self) -> usize {
        self.params.slots()
    }

    // ── Encoding ─────────────────────────────────────────────────────────────

    /// Encodes real values into a `Plaintext` at `level`, scaled by `scale`.
    ///
    /// Shorter inputs are zero-padded up to the slot capacity. Every scaled
    /// coefficient must lie strictly inside `±Q_level / 2`, otherwise it
    /// would wrap when reduced into the level's RNS basis.
    pub fn encode(
        &mut self,
        values: &[f64],
        level: usize,
        scale: f64,
    ) -> EncodingResult<Plaintext> {
        if level > self.params.max_level() {
            return Err(EncodingError::InvalidInput {
                message: format!(
                    "level {level} above maximum {}",
                    self.params.max_level()
                ),
            });
        }
        let basis = self.params.q_basis(level).clone();
        let half_modulus = basis.moduli().iter().map(|&q| q as f64).product::<f64>() / 2.0;
        let coeffs = self.encode_bounded(values, scale, half_modulus.min(MAX_COEFFICIENT))?;
        let mut poly = RnsPoly::from_coeffs(&coeffs, basis);
        poly.to_ntt_domain();
        Ok(Plaintext { poly, scale })
    }

    /// Maps values to rounded integer coefficients of `m(X)`.
    pub fn encode_coeffs(&mut self, values: &[f64], scale: f64) -> EncodingResult<Vec<i64>> {
        self.encode_bounded(values, scale, MAX_COEFFICIENT)
    }

    fn encode_bounded(
        &mut self,
        values: &[f64],
        scale: f64,
        bound: f64,
    ) -> EncodingResult<Vec<i64>> {
        let max = self.max_slots();
        if values.len() > max {
            return Err(EncodingError::InputTooLong {
                got: values.len(),
                max,
            });
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(EncodingError::InvalidInput {
                message: format!("scale must be finite and positive, got {scale}"),
            });
        }
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(EncodingError::InvalidInput {
                message: format!("non-finite value at position {position}"),
            });
        }

        self.buffer.fill(Complex64::default());
        for (j, &value) in values.iter().enumerate() {
            // Real inputs are their own conjugates.
            self.buffer[self.tables.slot_index[j]] = Complex64::new(value, 0.0);
            self.buffer[self.tables.conj_index[j]] = Complex64::new(value, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        self.buffer
            .iter()
            .zip(&self.tables.untwist)
            .map(|(b, u)| {
                let value = (*b * *u).re * scale;
                if value.abs() >= bound {
                    Err(EncodingError::CoefficientOutOfRange { value })
                } else {
                    Ok(value.round() as i64)
                }
            })
            .collect()
    }

    // ── Decoding ─────────────────────────────────────────────────────────────

    /// Decodes a `Plaintext` back to all `max_slots()` real values.
    pub fn decode(&mut self, pt: &Plaintext) -> Vec<f64> {
        let coeffs = pt.poly.to_centered_f64();
        self.decode_coeffs(&coeffs, pt.scale)
    }

    /// Evaluates the polynomial with (unscaled) coefficients at the slot
    /// roots and divides by `scale`.
    pub fn decode_coeffs(&mut self, coeffs: &[f64], scale: f64) -> Vec<f64> {
        debug_assert_eq!(coeffs.len(), self.buffer.len());
        for ((b, &c), t) in self.buffer.iter_mut().zip(coeffs).zip(&self.tables.twist) {
            *b = *t * (c / scale);
        }
        self.inverse
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        self.tables
            .slot_index
            .iter()
            .map(|&index| self.buffer[index].re)
            .collect()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
