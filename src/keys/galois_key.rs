use std::collections::BTreeMap;

use crate::{crypto::Parameters, rings::RnsNttResult};
use rand::Rng;
use tracing::debug;

use super::{SecretKey, SwitchingKey};

/// Key switching from `s(X^g)` back to `s(X)` for one Galois element `g`.
#[derive(Debug, Clone)]
pub struct GaloisKey {
    pub galois_element: usize,
    pub key: SwitchingKey,
}

impl GaloisKey {
    pub fn generate<R: Rng + ?Sized>(
        galois_element: usize,
        secret_key: &SecretKey,
        params: &Parameters,
        rng: &mut R,
    ) -> RnsNttResult<Self> {
        let rotated = secret_key.poly.automorphism(galois_element)?;
        let key = SwitchingKey::generate(&rotated, secret_key, params, rng)?;
        Ok(Self {
            galois_element,
            key,
        })
    }
}

/// Galois keys indexed by slot rotation amount.
#[derive(Debug, Clone, Default)]
pub struct RotationKeySet {
    keys: BTreeMap<usize, GaloisKey>,
}

impl RotationKeySet {
    /// Rotations needed by `inner_sum(batch, n)`: `batch · 2^i` for
    /// `2^i < n`.
    pub fn inner_sum_rotations(batch: usize, n: usize) -> Vec<usize> {
        let mut rotations = Vec::new();
        let mut step = 1;
        while step < n {
            rotations.push(batch * step);
            step <<= 1;
        }
        rotations
    }

    /// Generates one key per rotation amount (taken modulo the slot count).
    pub fn generate<R: Rng + ?Sized>(
        rotations: &[usize],
        secret_key: &SecretKey,
        params: &Parameters,
        rng: &mut R,
    ) -> RnsNttResult<Self> {
        let mut keys = BTreeMap::new();
        for &rotation in rotations {
            let rotation = rotation % params.slots();
            if rotation == 0 || keys.contains_key(&rotation) {
                continue;
            }
            let element = params.galois_element(rotation);
            debug!(rotation, galois_element = element, "generating rotation key");
            keys.insert(rotation, GaloisKey::generate(element, secret_key, params, rng)?);
        }
        Ok(Self { keys })
    }

    pub fn get(&self, rotation: usize) -> Option<&GaloisKey> {
        self.keys.get(&rotation)
    }

    pub fn rotations(&self) -> impl Iterator<Item = usize> + '_ {
        self.keys.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
