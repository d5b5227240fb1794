use std::sync::Arc;

use crypto_bigint::{U256, Word};

use crate::math::{
    is_ntt_friendly_prime,
    modular::{mod_inverse, mod_pow, mul_mod},
};

use super::errors::{RnsNttError, RnsNttResult};

/// Products above this size could overflow the `U256` accumulator used by
/// CRT reconstruction.
pub const MAX_BASIS_BITS: u32 = 250;

/// Precomputed tables for the negacyclic NTT modulo one prime.
///
/// `psi` is a primitive `2N`-th root of unity and `omega = psi^2`. The forward
/// transform twists by `psi^i`, then runs a cyclic Cooley-Tukey NTT with
/// `omega`; the inverse undoes both and folds in `N^{-1}`.
#[derive(Debug, Clone)]
pub struct NttTable {
    pub modulus: u64,
    pub degree: usize,
    pub psi_powers: Vec<u64>,
    pub psi_inv_powers_scaled: Vec<u64>,
    pub omega_powers: Vec<u64>,
    pub omega_inv_powers: Vec<u64>,
}

impl NttTable {
    pub fn new(modulus: u64, degree: usize) -> RnsNttResult<Self> {
        if !degree.is_power_of_two() || degree < 2 {
            return Err(RnsNttError::InvalidDegree { degree });
        }
        let non_friendly = RnsNttError::NonNttFriendlyModulus { modulus, degree };
        if modulus >= 1 << 62 || !is_ntt_friendly_prime(modulus, degree as u64) {
            return Err(non_friendly);
        }

        let psi = find_primitive_root(modulus, 2 * degree).ok_or(non_friendly.clone())?;
        let psi_inv = mod_inverse(psi, modulus).ok_or(non_friendly.clone())?;
        let n_inv = mod_inverse(degree as u64, modulus).ok_or(non_friendly)?;
        let omega = mul_mod(psi, psi, modulus);
        let omega_inv = mul_mod(psi_inv, psi_inv, modulus);

        Ok(Self {
            modulus,
            degree,
            psi_powers: powers(psi, degree, 1, modulus),
            psi_inv_powers_scaled: powers(psi_inv, degree, n_inv, modulus),
            omega_powers: powers(omega, degree / 2, 1, modulus),
            omega_inv_powers: powers(omega_inv, degree / 2, 1, modulus),
        })
    }

    /// Coefficient domain to evaluation domain, in place.
    pub fn forward(&self, values: &mut [u64]) {
        debug_assert_eq!(values.len(), self.degree);
        let q = self.modulus;
        for (v, &psi) in values.iter_mut().zip(&self.psi_powers) {
            *v = mul_mod(*v, psi, q);
        }
        bit_reverse_permute(values);
        cooley_tukey(values, &self.omega_powers, q);
    }

    /// Evaluation domain to coefficient domain, in place.
    pub fn inverse(&self, values: &mut [u64]) {
        debug_assert_eq!(values.len(), self.degree);
        let q = self.modulus;
        bit_reverse_permute(values);
        cooley_tukey(values, &self.omega_inv_powers, q);
        for (v, &scale) in values.iter_mut().zip(&self.psi_inv_powers_scaled) {
            *v = mul_mod(*v, scale, q);
        }
    }
}

/// `[start, start*root, start*root^2, ...]` of length `len`.
fn powers(root: u64, len: usize, start: u64, modulus: u64) -> Vec<u64> {
    let mut out = Vec::with_capacity(len);
    let mut acc = start;
    for _ in 0..len {
        out.push(acc);
        acc = mul_mod(acc, root, modulus);
    }
    out
}

fn cooley_tukey(values: &mut [u64], roots: &[u64], q: u64) {
    let n = values.len();
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let step = n / len;
        for start in (0..n).step_by(len) {
            for offset in 0..half {
                let left = start + offset;
                let right = left + half;
                let t = mul_mod(values[right], roots[offset * step], q);
                let u = values[left];
                values[left] = if u + t >= q { u + t - q } else { u + t };
                values[right] = if u >= t { u - t } else { u + q - t };
            }
        }
        len *= 2;
    }
}

fn bit_reverse_permute(values: &mut [u64]) {
    let bits = values.len().trailing_zeros() as usize;
    for i in 0..values.len() {
        let j = reverse_bits(i, bits);
        if i < j {
            values.swap(i, j);
        }
    }
}

pub(super) fn reverse_bits(value: usize, bit_count: usize) -> usize {
    if bit_count == 0 {
        return 0;
    }
    value.reverse_bits() >> (usize::BITS as usize - bit_count)
}

/// Finds a primitive `order`-th root of unity modulo a prime, where `order`
/// is a power of two dividing `modulus - 1`.
fn find_primitive_root(modulus: u64, order: usize) -> Option<u64> {
    let exponent = (modulus - 1) / order as u64;
    // An element of order dividing 2^k is primitive iff its 2^(k-1)th power is -1.
    (2..modulus.min(1 << 20))
        .map(|candidate| mod_pow(candidate, exponent, modulus))
        .find(|&root| mod_pow(root, (order / 2) as u64, modulus) == modulus - 1)
}

/// Constants for CRT reconstruction of a coefficient from its residues.
#[derive(Debug, Clone)]
struct CrtContext {
    product: U256,
    half_product: U256,
    punctured: Vec<U256>,
    punctured_inv: Vec<u64>,
}

impl CrtContext {
    fn new(moduli: &[u64]) -> RnsNttResult<Self> {
        let bits: u32 = moduli.iter().map(|&q| u64::BITS - q.leading_zeros()).sum();
        if bits > MAX_BASIS_BITS {
            return Err(RnsNttError::ModulusTooLarge {
                bits,
                max_bits: MAX_BASIS_BITS,
            });
        }

        let product = moduli
            .iter()
            .fold(U256::ONE, |acc, &q| acc.wrapping_mul(&U256::from_u64(q)));

        let mut punctured = Vec::with_capacity(moduli.len());
        let mut punctured_inv = Vec::with_capacity(moduli.len());
        for (i, &qi) in moduli.iter().enumerate() {
            let mut big = U256::ONE;
            let mut small = 1u64;
            for (j, &qj) in moduli.iter().enumerate() {
                if i != j {
                    big = big.wrapping_mul(&U256::from_u64(qj));
                    small = mul_mod(small, qj % qi, qi);
                }
            }
            let inv = mod_inverse(small, qi)
                .ok_or(RnsNttError::DuplicateModulus { modulus: qi })?;
            punctured.push(big);
            punctured_inv.push(inv);
        }

        Ok(Self {
            product,
            half_product: product.wrapping_shr(1),
            punctured,
            punctured_inv,
        })
    }

    fn reconstruct_centered(&self, residues: &[u64], moduli: &[u64]) -> f64 {
        let mut acc = U256::ZERO;
        for (i, (&r, &q)) in residues.iter().zip(moduli).enumerate() {
            let t = mul_mod(r, self.punctured_inv[i], q);
            // t < q_i, so the term stays below Q.
            let term = self.punctured[i].wrapping_mul(&U256::from_u64(t));
            acc = acc.wrapping_add(&term);
            if acc >= self.product {
                acc = acc.wrapping_sub(&self.product);
            }
        }
        if acc > self.half_product {
            -u256_to_f64(&self.product.wrapping_sub(&acc))
        } else {
            u256_to_f64(&acc)
        }
    }
}

fn u256_to_f64(value: &U256) -> f64 {
    value
        .as_words()
        .iter()
        .enumerate()
        .map(|(i, &word)| word as f64 * 2f64.powi((i as u32 * Word::BITS) as i32))
        .sum()
}

/// RNS basis: a set of NTT-friendly prime moduli with precomputed NTT tables.
///
/// Invariant: `moduli.len() == ntt_tables.len()` and
/// `ntt_tables[i].modulus == moduli[i]` for all `i`. Tables are shared
/// between bases through `Arc`, so the level bases of a modulus chain cost a
/// single set of tables.
#[derive(Debug, Clone)]
pub struct RnsBasis {
    degree: usize,
    moduli: Vec<u64>,
    ntt_tables: Vec<Arc<NttTable>>,
    crt: CrtContext,
}

impl RnsBasis {
    pub fn new(degree: usize, moduli: Vec<u64>) -> RnsNttResult<Self> {
        let tables = moduli
            .iter()
            .map(|&q| NttTable::new(q, degree).map(Arc::new))
            .collect::<RnsNttResult<Vec<_>>>()?;
        Self::from_tables(degree, tables)
    }

    /// Builds a basis from already computed tables.
    pub fn from_tables(
        degree: usize,
        ntt_tables: Vec<Arc<NttTable>>,
    ) -> RnsNttResult<Self> {
        if ntt_tables.is_empty() {
            return Err(RnsNttError::EmptyBasis);
        }
        let moduli: Vec<u64> = ntt_tables.iter().map(|t| t.modulus).collect();
        for (i, table) in ntt_tables.iter().enumerate() {
            if table.degree != degree {
                return Err(RnsNttError::InvalidDegree { degree: table.degree });
            }
            if moduli[..i].contains(&table.modulus) {
                return Err(RnsNttError::DuplicateModulus {
                    modulus: table.modulus,
                });
            }
        }
        let crt = CrtContext::new(&moduli)?;
        Ok(Self {
            degree,
            moduli,
            ntt_tables,
            crt,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    pub fn ntt_table(&self, channel: usize) -> &NttTable {
        &self.ntt_tables[channel]
    }

    pub fn ntt_tables(&self) -> &[Arc<NttTable>] {
        &self.ntt_tables
    }

    pub fn channel_count(&self) -> usize {
        self.moduli.len()
    }

    pub fn position_of(&self, modulus: u64) -> Option<usize> {
        self.moduli.iter().position(|&q| q == modulus)
    }

    /// Two bases are interchangeable when they hold the same moduli in the
    /// same order.
    pub fn same_as(&self, other: &RnsBasis) -> bool {
        std::ptr::eq(self, other) || self.moduli == other.moduli
    }

    /// Returns a new basis with the last `drop_count` channels removed.
    pub fn drop_last(&self, drop_count: usize) -> RnsNttResult<Self> {
        let channel_count = self.channel_count();
        if drop_count >= channel_count {
            return Err(RnsNttError::InvalidModDrop {
                drop_count,
                channel_count,
            });
        }
        let keep = channel_count - drop_count;
        Self::from_tables(self.degree, self.ntt_tables[..keep].to_vec())
    }

    /// CRT-reconstructs a single coefficient, centred in `(-Q/2, Q/2]`, and
    /// returns it as a float.
    pub fn reconstruct_centered(&self, residues: &[u64]) -> f64 {
        debug_assert_eq!(residues.len(), self.moduli.len());
        self.crt.reconstruct_centered(residues, &self.moduli)
    }
}
