use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, instrument, warn};

use crate::{
    batch::batch_map,
    crypto::{Ciphertext, CkksError, CkksResult, Encryptor, Parameters},
    encoding::CkksEncoder,
    keys::PublicKey,
};

/// Encodes and encrypts vectors under the session public key.
pub struct EncryptionContext {
    params: Arc<Parameters>,
    encoder: CkksEncoder,
    encryptor: Encryptor,
}

impl EncryptionContext {
    pub(crate) fn new(
        params: Arc<Parameters>,
        public_key: Arc<PublicKey>,
        seed: Option<u64>,
    ) -> Self {
        let encryptor = match seed {
            Some(seed) => Encryptor::with_rng(
                params.clone(),
                public_key,
                ChaCha20Rng::seed_from_u64(seed),
            ),
            None => Encryptor::new(params.clone(), public_key),
        };
        Self {
            encoder: CkksEncoder::new(params.clone()),
            encryptor,
            params,
        }
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    pub fn slots(&self) -> usize {
        self.params.slots()
    }

    /// Encrypts one vector at the top level with the default scale.
    pub fn encrypt(&mut self, values: &[f64]) -> CkksResult<Ciphertext> {
        encrypt_with(&self.params, &mut self.encoder, &mut self.encryptor, values)
    }

    /// Encrypts every vector in parallel. A vector that fails to encode or
    /// encrypt leaves `None` at its position.
    ///
    /// Workers use freshly seeded encryptors, so the ciphertexts are not
    /// reproducible even when the session was built with a seed.
    pub fn batch_encrypt(&self, vectors: &[Vec<f64>]) -> Vec<Option<Ciphertext>> {
        self.batch_encrypt_report(vectors).0
    }

    /// Like [`batch_encrypt`](Self::batch_encrypt), also returning the
    /// per-vector errors sorted by index.
    #[instrument(skip_all, fields(count = vectors.len()))]
    pub fn batch_encrypt_report(
        &self,
        vectors: &[Vec<f64>],
    ) -> (Vec<Option<Ciphertext>>, Vec<(usize, CkksError)>) {
        let outcome = batch_map(
            vectors,
            || (self.encoder.clone_for_task(), self.encryptor.clone_for_task()),
            |(encoder, encryptor), _, values| {
                encrypt_with(&self.params, encoder, encryptor, values)
            },
        );
        for (index, error) in &outcome.failures {
            warn!(index, %error, "encryption failed");
        }
        debug!(
            encrypted = outcome.success_count(),
            failed = outcome.failures.len(),
            "batch encryption done"
        );
        (outcome.results, outcome.failures)
    }
}

fn encrypt_with(
    params: &Parameters,
    encoder: &mut CkksEncoder,
    encryptor: &mut Encryptor,
    values: &[f64],
) -> CkksResult<Ciphertext> {
    let pt = encoder.encode(values, params.max_level(), params.default_scale())?;
    encryptor.encrypt(&pt)
}
