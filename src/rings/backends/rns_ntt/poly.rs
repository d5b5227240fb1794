use super::{
    basis::RnsBasis,
    errors::{RnsNttError, RnsNttResult},
};
use crate::{
    math::{
        modular::{add_mod, center, mod_inverse, mul_mod, neg_mod, reduce_i64, sub_mod},
        sampling::{gaussian_coefficients, ternary_coefficients, uniform_coefficients},
    },
    rings::traits::{PolyRing, PolySampler},
};
use rand::Rng;
use std::{
    ops::{AddAssign, MulAssign, Neg, SubAssign},
    sync::Arc,
};

/// A polynomial in `Z_{q_0} x … x Z_{q_{L-1}}[X] / (X^N + 1)`.
///
/// Stores one `Vec<u64>` of length `N` per RNS channel. The `in_ntt_domain`
/// flag tracks whether the vectors hold coefficient-domain or NTT-domain
/// values.
///
/// # Invariants
/// - `channels.len() == basis.channel_count()`
/// - `channels[i].len() == basis.degree()`
/// - Every `channels[i][j] < basis.moduli()[i]`
#[derive(Clone, Debug)]
pub struct RnsPoly {
    channels: Vec<Vec<u64>>,
    basis: Arc<RnsBasis>,
    in_ntt_domain: bool,
}

// ─── Constructors ─────────────────────────────────────────────────────────────

impl RnsPoly {
    /// Creates the zero polynomial in coefficient domain.
    pub fn zero(basis: Arc<RnsBasis>) -> Self {
        let channels = vec![vec![0u64; basis.degree()]; basis.channel_count()];
        Self {
            channels,
            basis,
            in_ntt_domain: false,
        }
    }

    /// Creates the zero polynomial flagged as NTT domain.
    pub fn zero_ntt(basis: Arc<RnsBasis>) -> Self {
        Self {
            in_ntt_domain: true,
            ..Self::zero(basis)
        }
    }

    /// Creates a polynomial from signed integer coefficients.
    ///
    /// Each coefficient is reduced into `[0, q_i)` per channel. Accepts slices
    /// of length ≥ N; only the first N elements are used.
    pub fn from_coeffs(coeffs: &[i64], basis: Arc<RnsBasis>) -> Self {
        let degree = basis.degree();
        assert!(
            coeffs.len() >= degree,
            "from_coeffs: need at least {degree} coefficients, got {}",
            coeffs.len()
        );
        let channels = basis
            .moduli()
            .iter()
            .map(|&q| coeffs[..degree].iter().map(|&c| reduce_i64(c, q)).collect())
            .collect();
        Self {
            channels,
            basis,
            in_ntt_domain: false,
        }
    }

    /// Creates a polynomial from pre-built channel vectors.
    ///
    /// Returns an error if the channel count or length doesn't match the
    /// basis, or if any coefficient is not reduced.
    pub fn from_channels(
        channels: Vec<Vec<u64>>,
        basis: Arc<RnsBasis>,
        in_ntt_domain: bool,
    ) -> RnsNttResult<Self> {
        let expected = basis.channel_count();
        let actual = channels.len();
        if actual != expected {
            return Err(RnsNttError::ChannelCountMismatch { expected, actual });
        }
        for (channel, &q) in channels.iter().zip(basis.moduli()) {
            if channel.len() != basis.degree() {
                return Err(RnsNttError::ChannelLengthMismatch {
                    expected: basis.degree(),
                    actual: channel.len(),
                });
            }
            if let Some(&c) = channel.iter().find(|&&c| c >= q) {
                return Err(RnsNttError::NonReducedCoefficient {
                    coefficient: c,
                    modulus: q,
                });
            }
        }
        Ok(Self {
            channels,
            basis,
            in_ntt_domain,
        })
    }
}

// ─── Accessors & domain conversion ───────────────────────────────────────────

impl RnsPoly {
    pub fn channels(&self) -> &[Vec<u64>] {
        &self.channels
    }

    pub(crate) fn channel_mut(&mut self, channel: usize) -> &mut [u64] {
        &mut self.channels[channel]
    }

    pub fn basis(&self) -> &Arc<RnsBasis> {
        &self.basis
    }

    pub fn degree(&self) -> usize {
        self.basis.degree()
    }

    pub fn is_ntt_domain(&self) -> bool {
        self.in_ntt_domain
    }

    /// Converts to NTT domain in-place (no-op if already there).
    pub fn to_ntt_domain(&mut self) {
        if self.in_ntt_domain {
            return;
        }
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            self.basis.ntt_table(ch).forward(channel);
        }
        self.in_ntt_domain = true;
    }

    /// Converts to coefficient domain in-place (no-op if already there).
    pub fn to_coeff_domain(&mut self) {
        if !self.in_ntt_domain {
            return;
        }
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            self.basis.ntt_table(ch).inverse(channel);
        }
        self.in_ntt_domain = false;
    }

    fn coeff_domain_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.to_coeff_domain();
        copy
    }

    /// Returns a new polynomial with the last `drop_count` RNS channels removed.
    pub fn mod_drop_last(&self, drop_count: usize) -> RnsNttResult<Self> {
        let reduced_basis = Arc::new(self.basis.drop_last(drop_count)?);
        self.restrict_to(&reduced_basis)
    }

    /// Projects onto `target`, whose moduli must all appear in this basis.
    ///
    /// Works in either domain: each channel is copied as-is.
    pub fn restrict_to(&self, target: &Arc<RnsBasis>) -> RnsNttResult<Self> {
        let channels = target
            .moduli()
            .iter()
            .map(|&q| {
                self.basis
                    .position_of(q)
                    .map(|ch| self.channels[ch].clone())
                    .ok_or(RnsNttError::ModulusNotInBasis { modulus: q })
            })
            .collect::<RnsNttResult<Vec<_>>>()?;
        Ok(Self {
            channels,
            basis: target.clone(),
            in_ntt_domain: self.in_ntt_domain,
        })
    }

    /// Lifts channel `channel` (taken as a centred integer modulo its prime)
    /// into every modulus of `target`. The result is in coefficient domain.
    ///
    /// This is the digit extension of hybrid key switching.
    pub fn lift_channel(&self, channel: usize, target: &Arc<RnsBasis>) -> Self {
        let source = if self.in_ntt_domain {
            let mut values = self.channels[channel].clone();
            self.basis.ntt_table(channel).inverse(&mut values);
            values
        } else {
            self.channels[channel].clone()
        };
        let q_src = self.basis.moduli()[channel];
        let channels = target
            .moduli()
            .iter()
            .map(|&q| {
                if q == q_src {
                    source.clone()
                } else {
                    source.iter().map(|&c| reduce_i64(center(c, q_src), q)).collect()
                }
            })
            .collect();
        Self {
            channels,
            basis: target.clone(),
            in_ntt_domain: false,
        }
    }

    /// Divides by the last modulus of the basis with rounding and drops it.
    ///
    /// For every remaining `q_i`: `(x_i - [x_last]) * q_last^{-1} mod q_i`,
    /// with `[x_last]` the centred residue. `target` must equal this basis
    /// minus its last modulus. The result keeps the input's domain.
    ///
    /// Serves both CKKS rescaling and the mod-down step of key switching.
    pub fn divide_round_by_last(&self, target: &Arc<RnsBasis>) -> RnsNttResult<Self> {
        let count = self.basis.channel_count();
        if count < 2 {
            return Err(RnsNttError::InvalidModDrop {
                drop_count: 1,
                channel_count: count,
            });
        }
        let keep = count - 1;
        if target.moduli() != &self.basis.moduli()[..keep] {
            return Err(RnsNttError::ChannelCountMismatch {
                expected: keep,
                actual: target.channel_count(),
            });
        }

        let source = self.coeff_domain_copy();
        let q_last = self.basis.moduli()[keep];
        let last = &source.channels[keep];
        let mut channels = Vec::with_capacity(keep);
        for (ch, &q) in target.moduli().iter().enumerate() {
            let inv = mod_inverse(q_last % q, q)
                .ok_or(RnsNttError::DuplicateModulus { modulus: q })?;
            let out: Vec<u64> = source.channels[ch]
                .iter()
                .zip(last)
                .map(|(&x, &r)| mul_mod(sub_mod(x, reduce_i64(center(r, q_last), q), q), inv, q))
                .collect();
            channels.push(out);
        }

        let mut result = Self {
            channels,
            basis: target.clone(),
            in_ntt_domain: false,
        };
        if self.in_ntt_domain {
            result.to_ntt_domain();
        }
        Ok(result)
    }

    /// Applies the Galois automorphism `X -> X^galois_element`.
    ///
    /// The element must be odd modulo `2N`. The result keeps the input's
    /// domain.
    pub fn automorphism(&self, galois_element: usize) -> RnsNttResult<Self> {
        let n = self.degree();
        let order = 2 * n;
        let g = galois_element % order;
        if g % 2 == 0 {
            return Err(RnsNttError::InvalidGaloisElement {
                element: galois_element,
                order,
            });
        }

        let source = self.coeff_domain_copy();
        let mut channels = vec![vec![0u64; n]; source.channels.len()];
        for (out, (input, &q)) in channels
            .iter_mut()
            .zip(source.channels.iter().zip(self.basis.moduli()))
        {
            for (i, &c) in input.iter().enumerate() {
                // X^i -> X^(i*g), and X^N = -1.
                let target = (i * g) % order;
                if target < n {
                    out[target] = c;
                } else {
                    out[target - n] = neg_mod(c, q);
                }
            }
        }

        let mut result = Self {
            channels,
            basis: self.basis.clone(),
            in_ntt_domain: false,
        };
        if self.in_ntt_domain {
            result.to_ntt_domain();
        }
        Ok(result)
    }

    /// Multiplies every channel by the same small scalar.
    pub fn mul_scalar_assign(&mut self, scalar: u64) {
        for (channel, &q) in self.channels.iter_mut().zip(self.basis.moduli()) {
            let s = scalar % q;
            for c in channel.iter_mut() {
                *c = mul_mod(*c, s, q);
            }
        }
    }

    /// CRT-reconstructs each coefficient, centred in `(-Q/2, Q/2]`.
    ///
    /// If the polynomial is in NTT domain, a temporary copy is converted to
    /// coefficient domain first.
    pub fn to_centered_f64(&self) -> Vec<f64> {
        let source = self.coeff_domain_copy();
        let mut residues = vec![0u64; self.basis.channel_count()];
        (0..self.degree())
            .map(|i| {
                for (r, channel) in residues.iter_mut().zip(&source.channels) {
                    *r = channel[i];
                }
                self.basis.reconstruct_centered(&residues)
            })
            .collect()
    }

    fn assert_compatible(&self, rhs: &RnsPoly, op: &str) {
        debug_assert!(
            self.basis.same_as(&rhs.basis),
            "{op}: basis mismatch"
        );
        debug_assert_eq!(
            self.in_ntt_domain, rhs.in_ntt_domain,
            "{op}: domain mismatch"
        );
    }
}

// ─── Arithmetic ───────────────────────────────────────────────────────────────

impl AddAssign<&RnsPoly> for RnsPoly {
    /// Coefficient-wise addition modulo each `q_i`. Works in both domains.
    fn add_assign(&mut self, rhs: &RnsPoly) {
        self.assert_compatible(rhs, "add_assign");
        for ((channel, other), &q) in self
            .channels
            .iter_mut()
            .zip(&rhs.channels)
            .zip(self.basis.moduli())
        {
            for (a, &b) in channel.iter_mut().zip(other) {
                *a = add_mod(*a, b, q);
            }
        }
    }
}

impl SubAssign<&RnsPoly> for RnsPoly {
    fn sub_assign(&mut self, rhs: &RnsPoly) {
        self.assert_compatible(rhs, "sub_assign");
        for ((channel, other), &q) in self
            .channels
            .iter_mut()
            .zip(&rhs.channels)
            .zip(self.basis.moduli())
        {
            for (a, &b) in channel.iter_mut().zip(other) {
                *a = sub_mod(*a, b, q);
            }
        }
    }
}

impl MulAssign<&RnsPoly> for RnsPoly {
    /// Polynomial multiplication in `Z[X]/(X^N + 1)`.
    ///
    /// Pointwise in NTT domain. Coefficient-domain operands are routed
    /// through the NTT and the result is returned in coefficient domain.
    fn mul_assign(&mut self, rhs: &RnsPoly) {
        debug_assert!(self.basis.same_as(&rhs.basis), "mul_assign: basis mismatch");
        let back_to_coeff = !self.in_ntt_domain;
        self.to_ntt_domain();
        let converted;
        let rhs = if rhs.in_ntt_domain {
            rhs
        } else {
            let mut copy = rhs.clone();
            copy.to_ntt_domain();
            converted = copy;
            &converted
        };

        for ((channel, other), &q) in self
            .channels
            .iter_mut()
            .zip(&rhs.channels)
            .zip(self.basis.moduli())
        {
            for (a, &b) in channel.iter_mut().zip(other) {
                *a = mul_mod(*a, b, q);
            }
        }
        if back_to_coeff {
            self.to_coeff_domain();
        }
    }
}

impl Neg for RnsPoly {
    type Output = Self;

    /// Coefficient-wise negation modulo each `q_i`. Works in both domains.
    fn neg(mut self) -> Self {
        for (channel, &q) in self.channels.iter_mut().zip(self.basis.moduli()) {
            for c in channel.iter_mut() {
                *c = neg_mod(*c, q);
            }
        }
        self
    }
}

// ─── PolyRing trait ───────────────────────────────────────────────────────────

impl PolyRing for RnsPoly {
    type Context = Arc<RnsBasis>;

    fn zero(context: &Self::Context) -> Self {
        Self::zero(context.clone())
    }

    fn from_coeffs(coeffs: &[i64], context: &Self::Context) -> Self {
        Self::from_coeffs(coeffs, context.clone())
    }

    fn to_centered_f64(&self) -> Vec<f64> {
        Self::to_centered_f64(self)
    }

    fn context(&self) -> &Self::Context {
        &self.basis
    }
}

// ─── PolySampler trait ────────────────────────────────────────────────────────

impl PolySampler for RnsPoly {
    /// Samples with coefficients uniform in `[0, q_i)` per channel.
    ///
    /// Independent uniform residues are uniform modulo the basis product, and
    /// uniform in either domain, so the result is flagged as NTT domain.
    fn sample_uniform<R: Rng + ?Sized>(context: &Self::Context, rng: &mut R) -> Self {
        let channels = context
            .moduli()
            .iter()
            .map(|&q| uniform_coefficients(context.degree(), q, rng))
            .collect();
        Self {
            channels,
            basis: context.clone(),
            in_ntt_domain: true,
        }
    }

    /// Samples noise from N(0, std_dev), rounded and reduced per channel.
    fn sample_gaussian<R: Rng + ?Sized>(
        std_dev: f64,
        context: &Self::Context,
        rng: &mut R,
    ) -> Self {
        let noise = gaussian_coefficients(context.degree(), std_dev, rng);
        Self::from_coeffs(&noise, context.clone())
    }

    /// Samples a ternary polynomial with exactly `hamming_weight` non-zero
    /// coefficients.
    fn sample_tribits<R: Rng + ?Sized>(
        hamming_weight: usize,
        context: &Self::Context,
        rng: &mut R,
    ) -> Self {
        let ternary = ternary_coefficients(context.degree(), hamming_weight, rng);
        Self::from_coeffs(&ternary, context.clone())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
