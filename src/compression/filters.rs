//! Frequency-domain filters: contiguous index ranges of a spectrum.

use num_complex::Complex64;

use super::{CompressionError, CompressionResult};

/// Bins `[0, cutoff)`.
pub fn low_pass(spectrum: &[Complex64], cutoff: usize) -> CompressionResult<&[Complex64]> {
    check_cutoff(spectrum, cutoff)?;
    Ok(&spectrum[..cutoff])
}

/// Bins `[cutoff, N)`.
pub fn high_pass(spectrum: &[Complex64], cutoff: usize) -> CompressionResult<&[Complex64]> {
    check_cutoff(spectrum, cutoff)?;
    Ok(&spectrum[cutoff..])
}

/// Bins `[low, high)`.
pub fn band_pass(
    spectrum: &[Complex64],
    low: usize,
    high: usize,
) -> CompressionResult<&[Complex64]> {
    check_band(spectrum, low, high)?;
    Ok(&spectrum[low..high])
}

/// Everything outside `[low, high)`, concatenated.
pub fn band_stop(
    spectrum: &[Complex64],
    low: usize,
    high: usize,
) -> CompressionResult<Vec<Complex64>> {
    check_band(spectrum, low, high)?;
    let mut kept = Vec::with_capacity(spectrum.len() - (high - low));
    kept.extend_from_slice(&spectrum[..low]);
    kept.extend_from_slice(&spectrum[high..]);
    Ok(kept)
}

fn check_cutoff(spectrum: &[Complex64], cutoff: usize) -> CompressionResult<()> {
    if cutoff > spectrum.len() {
        return Err(CompressionError::InvalidCutoff {
            cutoff,
            len: spectrum.len(),
        });
    }
    Ok(())
}

fn check_band(spectrum: &[Complex64], low: usize, high: usize) -> CompressionResult<()> {
    if low > high {
        return Err(CompressionError::InvalidBand { low, high });
    }
    check_cutoff(spectrum, high)
}
