//! Session setup: parameters plus key material, split into the three
//! role-specific contexts.
//!
//! ```no_run
//! use ckks_similarity::create_session;
//!
//! let (encryption, decryption, evaluation) = create_session(10)?;
//! let cts = encryption.batch_encrypt(&[vec![0.6, 0.8]]);
//! let products = evaluation.batch_dot_product(&cts, &[vec![1.0, 0.0]])?;
//! let similarities = decryption.extract_similarities(&products.results);
//! # Ok::<(), ckks_similarity::CkksError>(())
//! ```

mod decryption;
mod encryption;
mod evaluation;

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{info, instrument};

pub use decryption::DecryptionContext;
pub use encryption::EncryptionContext;
pub use evaluation::{DotProductBatch, EvaluationContext};

use crate::{
    crypto::{CkksResult, Parameters, ParametersLiteral},
    keys::KeyMaterial,
};

/// Parameters and keys generated once and shared by every context.
#[derive(Debug, Clone)]
pub struct Session {
    params: Arc<Parameters>,
    keys: KeyMaterial,
    encryption_seed: Option<u64>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    pub fn encryption_context(&self) -> EncryptionContext {
        EncryptionContext::new(
            self.params.clone(),
            self.keys.public.clone(),
            self.encryption_seed,
        )
    }

    /// The evaluation side never sees the secret key.
    pub fn evaluation_context(&self) -> EvaluationContext {
        EvaluationContext::new(self.params.clone(), self.keys.evaluation.clone())
    }

    pub fn decryption_context(&self) -> DecryptionContext {
        DecryptionContext::new(self.params.clone(), self.keys.secret.clone())
    }

    pub fn into_contexts(self) -> (EncryptionContext, DecryptionContext, EvaluationContext) {
        (
            self.encryption_context(),
            self.decryption_context(),
            self.evaluation_context(),
        )
    }
}

/// Builds a [`Session`]. Unset fields fall back to the defaults of
/// [`ParametersLiteral`]; without a seed, keys come from OS randomness.
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    literal: Option<ParametersLiteral>,
    log_slots: Option<u32>,
    seed: Option<u64>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameters(mut self, literal: ParametersLiteral) -> Self {
        self.literal = Some(literal);
        self
    }

    /// Overrides `log_slots` of the parameter literal.
    pub fn log_slots(mut self, log_slots: u32) -> Self {
        self.log_slots = Some(log_slots);
        self
    }

    /// Makes key generation reproducible, along with the randomness of
    /// [`EncryptionContext::encrypt`] on contexts from this session.
    ///
    /// Batch encryption is not covered: each worker draws a fresh OS seed,
    /// so `batch_encrypt` output differs between runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[instrument(skip_all, fields(log_slots = tracing::field::Empty))]
    pub fn build(self) -> CkksResult<Session> {
        let mut literal = self.literal.unwrap_or_default();
        if let Some(log_slots) = self.log_slots {
            literal.log_slots = log_slots;
        }
        tracing::Span::current().record("log_slots", literal.log_slots);

        let params = Arc::new(Parameters::new(literal)?);
        let mut rng = match self.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_os_rng(),
        };
        let keys = KeyMaterial::generate(&params, &mut rng)?;
        let encryption_seed = self.seed.map(|_| rng.random());

        info!(
            degree = params.degree(),
            slots = params.slots(),
            levels = params.max_level() + 1,
            "session ready"
        );
        Ok(Session {
            params,
            keys,
            encryption_seed,
        })
    }
}

/// Creates a session with default parameters sized by `log_slots` and
/// returns its contexts.
pub fn create_session(
    log_slots: u32,
) -> CkksResult<(EncryptionContext, DecryptionContext, EvaluationContext)> {
    Ok(Session::builder().log_slots(log_slots).build()?.into_contexts())
}
