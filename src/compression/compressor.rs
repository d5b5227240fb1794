use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{
    CompressionError, CompressionResult, band_pass, band_stop, fft, high_pass, low_pass, to_real,
};
use crate::batch::batch_map;

/// Which frequency bins survive compression. Indices refer to the
/// zero-padded power-of-two spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    Passthrough,
    LowPass { cutoff: usize },
    HighPass { cutoff: usize },
    BandPass { low: usize, high: usize },
    BandStop { low: usize, high: usize },
}

impl Filter {
    pub fn apply(&self, spectrum: &[Complex64]) -> CompressionResult<Vec<Complex64>> {
        match *self {
            Filter::Passthrough => Ok(spectrum.to_vec()),
            Filter::LowPass { cutoff } => low_pass(spectrum, cutoff).map(<[_]>::to_vec),
            Filter::HighPass { cutoff } => high_pass(spectrum, cutoff).map(<[_]>::to_vec),
            Filter::BandPass { low, high } => band_pass(spectrum, low, high).map(<[_]>::to_vec),
            Filter::BandStop { low, high } => band_stop(spectrum, low, high),
        }
    }
}

/// Real vector → zero-pad to a power of two → FFT → filter → interleaved
/// real output of twice the kept bin count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectralCompressor {
    pub filter: Filter,
}

impl SpectralCompressor {
    pub fn new(filter: Filter) -> Self {
        Self { filter }
    }

    pub fn compress(&self, values: &[f64]) -> CompressionResult<Vec<f64>> {
        if values.is_empty() {
            return Err(CompressionError::InvalidLength { len: 0 });
        }
        let padded_len = values.len().next_power_of_two();
        let mut signal: Vec<Complex64> = values
            .iter()
            .map(|&v| Complex64::new(v, 0.0))
            .chain(std::iter::repeat(Complex64::new(0.0, 0.0)))
            .take(padded_len)
            .collect();
        fft(&mut signal)?;
        let kept = self.filter.apply(&signal)?;
        Ok(to_real(kept))
    }

    /// Compresses every vector in parallel; any failure fails the batch,
    /// listing every failed row.
    #[instrument(skip_all, fields(count = vectors.len(), filter = ?self.filter))]
    pub fn compress_batch(&self, vectors: &[Vec<f64>]) -> CompressionResult<Vec<Vec<f64>>> {
        let outcome = batch_map(vectors, || (), |_, _, values| self.compress(values));
        for (index, error) in &outcome.failures {
            warn!(index, %error, "compression failed");
        }
        CompressionError::check_batch(outcome.failures)?;
        debug!("batch compression done");
        Ok(outcome.results.into_iter().flatten().collect())
    }

    /// Output length over input length for a vector of `input_len` values.
    pub fn compression_ratio(&self, input_len: usize) -> CompressionResult<f64> {
        if input_len == 0 {
            return Err(CompressionError::InvalidLength { len: 0 });
        }
        let template = vec![Complex64::new(0.0, 0.0); input_len.next_power_of_two()];
        let kept = self.filter.apply(&template)?.len();
        Ok((2 * kept) as f64 / input_len as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn low_pass_keeps_dc() {
        let compressor = SpectralCompressor::new(Filter::LowPass { cutoff: 1 });
        // padded to 4: [1, 1, 1, 0], DC bin = 3
        let out = compressor.compress(&[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(out.len(), 2);
        assert_abs_diff_eq!(out[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn ratio_and_errors() {
        let compressor = SpectralCompressor::new(Filter::BandStop { low: 2, high: 6 });
        assert_abs_diff_eq!(compressor.compression_ratio(8).unwrap(), 1.0, epsilon = 1e-12);
        assert!(matches!(
            compressor.compress(&[1.0, 2.0]),
            Err(CompressionError::InvalidCutoff { cutoff: 6, len: 2 })
        ));
        assert_eq!(
            compressor.compress(&[]),
            Err(CompressionError::InvalidLength { len: 0 })
        );
    }

    #[test]
    fn batch_lists_failed_rows() {
        let compressor = SpectralCompressor::new(Filter::LowPass { cutoff: 4 });
        let err = compressor
            .compress_batch(&[vec![1.0; 8], vec![1.0; 2], vec![1.0; 4], vec![]])
            .unwrap_err();
        let CompressionError::BatchFailed { failures } = err else {
            panic!("expected batch failure");
        };
        let rows: Vec<usize> = failures.iter().map(|(i, _)| *i).collect();
        assert_eq!(rows, vec![1, 3]);

        let ok = compressor.compress_batch(&[vec![1.0; 8], vec![0.5; 5]]).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(ok.iter().all(|row| row.len() == 8));
    }

    #[test]
    fn filter_config_from_json() {
        let compressor: SpectralCompressor =
            serde_json::from_str(r#"{"filter":{"kind":"band_pass","low":1,"high":3}}"#).unwrap();
        assert_eq!(compressor.filter, Filter::BandPass { low: 1, high: 3 });
        let json = serde_json::to_string(&compressor).unwrap();
        assert_eq!(serde_json::from_str::<SpectralCompressor>(&json).unwrap(), compressor);
    }
}
