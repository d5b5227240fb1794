//! Key material for one session.
//!
//! The secret key stays with the decrypting side. Evaluators receive only
//! [`EvaluationKeySet`], encryptors only the [`PublicKey`].

pub mod galois_key;
pub mod public_key;
pub mod relin_key;
pub mod secret_key;
pub mod switching_key;

use std::sync::Arc;

pub use galois_key::{GaloisKey, RotationKeySet};
pub use public_key::{PublicKey, PublicKeyError};
pub use relin_key::RelinearizationKey;
pub use secret_key::SecretKey;
pub use switching_key::SwitchingKey;

use rand::Rng;
use thiserror::Error;
use tracing::{info, instrument};

use crate::{crypto::Parameters, rings::RnsNttError};

#[derive(Debug, Error, Clone)]
pub enum KeyError {
    #[error("Public key generation failed: {0}")]
    PublicKey(#[from] PublicKeyError),
    #[error("Switching key generation failed: {0}")]
    SwitchingKey(#[from] RnsNttError),
}

/// Keys an evaluator needs: relinearization plus rotations.
#[derive(Debug, Clone)]
pub struct EvaluationKeySet {
    pub relinearization: RelinearizationKey,
    pub rotations: RotationKeySet,
}

/// Everything generated at session start.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    pub secret: Arc<SecretKey>,
    pub public: Arc<PublicKey>,
    pub evaluation: Arc<EvaluationKeySet>,
}

impl KeyMaterial {
    /// Generates the secret/public pair, the relinearization key and the
    /// rotation keys for a full-width inner sum.
    #[instrument(skip_all, fields(degree = params.degree(), slots = params.slots()))]
    pub fn generate<R: Rng + ?Sized>(params: &Parameters, rng: &mut R) -> Result<Self, KeyError> {
        let secret = SecretKey::generate(params, rng);
        let public = PublicKey::generate(&secret, params, rng)?;
        let relinearization = RelinearizationKey::generate(&secret, params, rng)?;
        let rotations = RotationKeySet::generate(
            &RotationKeySet::inner_sum_rotations(1, params.slots()),
            &secret,
            params,
            rng,
        )?;
        info!(rotation_keys = rotations.len(), "generated key material");

        Ok(Self {
            secret: Arc::new(secret),
            public: Arc::new(public),
            evaluation: Arc::new(EvaluationKeySet {
                relinearization,
                rotations,
            }),
        })
    }
}
