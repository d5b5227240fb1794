//! Spectral compression of real feature vectors.
//!
//! [`fft`] and the filters work on complex spectra in place or by slicing.
//! [`SpectralCompressor`] chains them into a real-to-real pipeline whose
//! output can be fed to the encryption context.

mod compressor;
mod errors;
mod fft;
mod filters;
mod packing;

pub use compressor::{Filter, SpectralCompressor};
pub use errors::{CompressionError, CompressionResult};
pub use fft::{batch_fft, bit_reverse_permute, fft};
pub use filters::{band_pass, band_stop, high_pass, low_pass};
pub use packing::{from_real, from_real_batch, to_real, to_real_batch};
