//! Complex ⇄ interleaved real packing.
//!
//! Both directions take their input by value: the source buffer is consumed
//! and cannot be observed after packing.

use num_complex::Complex64;

use super::{CompressionError, CompressionResult};

/// `[a+bi, c+di, …]` → `[a, b, c, d, …]`.
pub fn to_real(signal: Vec<Complex64>) -> Vec<f64> {
    let mut packed = Vec::with_capacity(signal.len() * 2);
    for c in signal {
        packed.push(c.re);
        packed.push(c.im);
    }
    packed
}

/// Inverse of [`to_real`]. The length must be even.
pub fn from_real(values: Vec<f64>) -> CompressionResult<Vec<Complex64>> {
    if values.len() % 2 != 0 {
        return Err(CompressionError::OddLength { len: values.len() });
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| Complex64::new(pair[0], pair[1]))
        .collect())
}

pub fn to_real_batch(signals: Vec<Vec<Complex64>>) -> Vec<Vec<f64>> {
    signals.into_iter().map(to_real).collect()
}

/// Unpacks every row; odd-length rows are reported together.
pub fn from_real_batch(rows: Vec<Vec<f64>>) -> CompressionResult<Vec<Vec<Complex64>>> {
    let mut unpacked = Vec::with_capacity(rows.len());
    let mut failures = Vec::new();
    for (index, row) in rows.into_iter().enumerate() {
        match from_real(row) {
            Ok(signal) => unpacked.push(signal),
            Err(error) => failures.push((index, error)),
        }
    }
    CompressionError::check_batch(failures)?;
    Ok(unpacked)
}
