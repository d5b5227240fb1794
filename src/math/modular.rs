//! Word-sized modular arithmetic shared by the prime search and the RNS ring.
//!
//! All moduli are below 2^62, so sums of two reduced residues never overflow
//! a `u64` and products are taken through `u128`.

#[inline]
pub fn add_mod(a: u64, b: u64, q: u64) -> u64 {
    let s = a + b;
    if s >= q { s - q } else { s }
}

#[inline]
pub fn sub_mod(a: u64, b: u64, q: u64) -> u64 {
    if a >= b { a - b } else { a + q - b }
}

#[inline]
pub fn neg_mod(a: u64, q: u64) -> u64 {
    if a == 0 { 0 } else { q - a }
}

#[inline]
pub fn mul_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

/// Computes `base^exponent mod modulus` via binary exponentiation.
pub fn mod_pow(mut base: u64, mut exponent: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut acc = 1u64;
    base %= modulus;
    while exponent > 0 {
        if exponent & 1 == 1 {
            acc = mul_mod(acc, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exponent >>= 1;
    }
    acc
}

/// Multiplicative inverse of `value` modulo `modulus`, if one exists.
pub fn mod_inverse(value: u64, modulus: u64) -> Option<u64> {
    let (mut old_r, mut r) = ((value % modulus) as i128, modulus as i128);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let quotient = old_r / r;
        (old_r, r) = (r, old_r - quotient * r);
        (old_s, s) = (s, old_s - quotient * s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(modulus as i128) as u64)
}

/// Reduces a signed integer into `[0, q)`.
#[inline]
pub fn reduce_i64(value: i64, q: u64) -> u64 {
    (value as i128).rem_euclid(q as i128) as u64
}

/// Maps a residue in `[0, q)` to its centered representative in `(-q/2, q/2]`.
#[inline]
pub fn center(value: u64, q: u64) -> i64 {
    if value > q / 2 {
        -((q - value) as i64)
    } else {
        value as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_sub_wrap_at_modulus() {
        assert_eq!(add_mod(16, 2, 17), 1);
        assert_eq!(sub_mod(2, 16, 17), 3);
        assert_eq!(neg_mod(0, 17), 0);
        assert_eq!(neg_mod(3, 17), 14);
    }

    #[test]
    fn mul_mod_matches_widened_reference() {
        let a = (1u64 << 61) - 5;
        let b = (1u64 << 60) + 11;
        let modulus = 1_073_750_017u64;
        let expected = ((a as u128 * b as u128) % modulus as u128) as u64;
        assert_eq!(mul_mod(a % modulus, b % modulus, modulus), expected);
    }

    #[test]
    fn mod_pow_handles_edge_cases() {
        assert_eq!(mod_pow(2, 0, 17), 1);
        assert_eq!(mod_pow(5, 0, 1), 0);
        assert_eq!(mod_pow(0, 5, 17), 0);
        assert_eq!(mod_pow(3, 16, 17), 1);
    }

    #[test]
    fn mod_inverse_roundtrips() {
        for value in 1..97u64 {
            let inv = mod_inverse(value, 97).unwrap();
            assert_eq!(mul_mod(value, inv, 97), 1);
        }
        assert_eq!(mod_inverse(6, 9), None);
    }

    #[test]
    fn center_and_reduce_agree() {
        assert_eq!(reduce_i64(-1, 17), 16);
        assert_eq!(center(16, 17), -1);
        assert_eq!(center(8, 17), 8);
        assert_eq!(center(9, 17), -8);
        for v in -8i64..=8 {
            assert_eq!(center(reduce_i64(v, 17), 17), v);
        }
    }
}
