//! In-place radix-2 Cooley-Tukey FFT.
//!
//! Forward transform with the `e^{-2πi kn/N}` kernel and no normalisation.
//! The two first stages run as one radix-4 pass; later stages derive each
//! stage's base twiddle by taking the square root of the previous one,
//! starting from `-i`, instead of reading a trig table.

use num_complex::Complex64;

use super::{CompressionError, CompressionResult};
use crate::batch::batch_apply;

/// Transforms `signal` in place. Its length must be a power of two; it is
/// never padded or truncated.
pub fn fft(signal: &mut [Complex64]) -> CompressionResult<()> {
    let n = signal.len();
    if !n.is_power_of_two() {
        return Err(CompressionError::InvalidLength { len: n });
    }
    match n {
        1 => return Ok(()),
        2 => {
            let (a, b) = (signal[0], signal[1]);
            signal[0] = a + b;
            signal[1] = a - b;
            return Ok(());
        }
        _ => {}
    }

    bit_reverse_permute(signal)?;
    radix4_first_stages(signal);

    let mut base = Complex64::new(0.0, -1.0);
    let mut size = 8;
    while size <= n {
        base = base.sqrt();
        let half = size / 2;
        for block in signal.chunks_exact_mut(size) {
            let (lower, upper) = block.split_at_mut(half);
            let mut w = Complex64::new(1.0, 0.0);
            for (u, v) in lower.iter_mut().zip(upper.iter_mut()) {
                let t = w * *v;
                *v = *u - t;
                *u += t;
                w *= base;
            }
        }
        size <<= 1;
    }
    Ok(())
}

/// Stages of size 2 and 4 merged, on bit-reversed input.
fn radix4_first_stages(signal: &mut [Complex64]) {
    for quad in signal.chunks_exact_mut(4) {
        let s0 = quad[0] + quad[1];
        let d0 = quad[0] - quad[1];
        let s1 = quad[2] + quad[3];
        let d1 = quad[2] - quad[3];
        // d1 · (-i)
        let rot = Complex64::new(d1.im, -d1.re);
        quad[0] = s0 + s1;
        quad[1] = d0 + rot;
        quad[2] = s0 - s1;
        quad[3] = d0 - rot;
    }
}

/// Reorders `signal` so index `i` holds the element at the bit reversal
/// of `i`. Applying it twice is the identity.
pub fn bit_reverse_permute<T>(signal: &mut [T]) -> CompressionResult<()> {
    let n = signal.len();
    if !n.is_power_of_two() {
        return Err(CompressionError::InvalidLength { len: n });
    }
    if n <= 2 {
        return Ok(());
    }
    let shift = usize::BITS - n.trailing_zeros();
    let half = n / 2;
    // For even i, rev(i) < n/2 and rev(i + 1) = rev(i) + n/2.
    for i in (0..n).step_by(2) {
        let j = i.reverse_bits() >> shift;
        if i < half && i < j {
            signal.swap(i, j);
        }
        if i + 1 < j + half {
            signal.swap(i + 1, j + half);
        }
    }
    Ok(())
}

/// Transforms every row in parallel. Rows that succeed stay transformed
/// even if others fail; failures are reported together, sorted by row.
pub fn batch_fft(signals: &mut [Vec<Complex64>]) -> CompressionResult<()> {
    CompressionError::check_batch(batch_apply(signals, |row| fft(row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn complex(values: &[f64]) -> Vec<Complex64> {
        values.iter().map(|&v| Complex64::new(v, 0.0)).collect()
    }

    #[test]
    fn four_point_example() {
        let mut signal = complex(&[1.0, 2.0, 3.0, 4.0]);
        fft(&mut signal).unwrap();
        let expected = [
            Complex64::new(10.0, 0.0),
            Complex64::new(-2.0, 2.0),
            Complex64::new(-2.0, 0.0),
            Complex64::new(-2.0, -2.0),
        ];
        for (got, want) in signal.iter().zip(&expected) {
            assert_abs_diff_eq!(got.re, want.re, epsilon = 1e-12);
            assert_abs_diff_eq!(got.im, want.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn trivial_lengths() {
        let mut one = complex(&[5.0]);
        fft(&mut one).unwrap();
        assert_eq!(one, complex(&[5.0]));

        let mut two = complex(&[1.0, 3.0]);
        fft(&mut two).unwrap();
        assert_eq!(two, complex(&[4.0, -2.0]));
    }

    #[test]
    fn rejects_non_power_of_two() {
        let mut signal = complex(&[1.0, 2.0, 3.0]);
        assert_eq!(fft(&mut signal), Err(CompressionError::InvalidLength { len: 3 }));
        assert_eq!(signal, complex(&[1.0, 2.0, 3.0]));
        assert!(matches!(
            fft(&mut []),
            Err(CompressionError::InvalidLength { len: 0 })
        ));
    }

    #[test]
    fn impulse_has_flat_spectrum() {
        let mut signal = vec![Complex64::new(0.0, 0.0); 32];
        signal[0] = Complex64::new(1.0, 0.0);
        fft(&mut signal).unwrap();
        for bin in signal {
            assert_abs_diff_eq!(bin.re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(bin.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn bit_reversal_of_eight() {
        let mut indices: Vec<usize> = (0..8).collect();
        bit_reverse_permute(&mut indices).unwrap();
        assert_eq!(indices, vec![0, 4, 2, 6, 1, 5, 3, 7]);
    }

    #[test]
    fn batch_keeps_good_rows() {
        let mut rows = vec![
            complex(&[1.0, 2.0, 3.0, 4.0]),
            complex(&[1.0, 2.0, 3.0]),
            complex(&[1.0, 1.0]),
        ];
        let err = batch_fft(&mut rows).unwrap_err();
        assert_eq!(
            err,
            CompressionError::BatchFailed {
                failures: vec![(1, CompressionError::InvalidLength { len: 3 })]
            }
        );
        assert_abs_diff_eq!(rows[0][0].re, 10.0, epsilon = 1e-12);
        assert_eq!(rows[1], complex(&[1.0, 2.0, 3.0]));
        assert_eq!(rows[2], complex(&[2.0, 0.0]));
    }
}
