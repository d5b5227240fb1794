//! Prime utilities for constructing NTT-friendly modulus chains.
//!
//! Primality is decided with Miller-Rabin over a fixed base set, which is
//! deterministic for every `u64`. `n - 1` is decomposed into `d * 2^r`, and
//! each base must either hit `1`/`n - 1` directly or reach `n - 1` by
//! repeated squaring.
//!
//! Reference:
//! https://en.wikipedia.org/wiki/Miller%E2%80%93Rabin_primality_test

use super::modular::{mod_pow, mul_mod};

// Deterministic for all n < 3.18e23, which covers u64.
// Source: https://miller-rabin.appspot.com/
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Returns `(odd_part, power_of_two)` such that `n = odd_part * 2^power_of_two`.
fn decompose(n: u64) -> (u64, u32) {
    assert!(n > 0, "decompose: n must be positive");
    (n >> n.trailing_zeros(), n.trailing_zeros())
}

/// Returns `true` if `n` is prime.
pub fn is_prime(n: u64) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let (d, r) = decompose(n - 1);
    'bases: for &a in MILLER_RABIN_BASES.iter() {
        if a >= n {
            continue;
        }
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Returns `true` when `p` is prime and `p = 1 (mod 2n)`.
///
/// Such a prime has a primitive `2n`-th root of unity, which the negacyclic
/// NTT over `X^n + 1` needs.
#[inline]
pub fn is_ntt_friendly_prime(p: u64, n: u64) -> bool {
    match n.checked_mul(2) {
        Some(order) if n > 0 => is_prime(p) && p % order == 1,
        _ => false,
    }
}

/// Returns the largest NTT-friendly prime `p < bound`, or `None` if there is
/// none.
pub fn get_first_prime_down(bound: u64, n: u64) -> Option<u64> {
    let step = n.checked_mul(2)?;
    if n == 0 || bound <= step {
        return None;
    }
    // Largest candidate below `bound` that is congruent to 1 mod 2n.
    let mut candidate = bound - 1;
    candidate -= (candidate % step + step - 1) % step;

    while candidate > step {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate -= step;
    }
    None
}

/// Generates one distinct NTT-friendly prime per requested bit size.
///
/// Every prime has exactly the requested bit length and lies just below
/// `2^bits`. Repeated bit sizes walk further down so the chain stays
/// pairwise distinct, which CRT reconstruction requires.
pub fn generate_ntt_primes(bit_sizes: &[u32], n: u64) -> Option<Vec<u64>> {
    let mut primes: Vec<u64> = Vec::with_capacity(bit_sizes.len());
    for &bits in bit_sizes {
        if !(2..=62).contains(&bits) {
            return None;
        }
        let floor = 1u64 << (bits - 1);
        let mut bound = 1u64 << bits;
        let prime = loop {
            let candidate = get_first_prime_down(bound, n)?;
            if candidate < floor {
                return None;
            }
            if !primes.contains(&candidate) {
                break candidate;
            }
            bound = candidate;
        };
        primes.push(prime);
    }
    Some(primes)
}
