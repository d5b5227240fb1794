use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    batch::batch_map,
    crypto::{Ciphertext, CkksError, CkksResult, Decryptor, Parameters},
    encoding::CkksEncoder,
    keys::SecretKey,
    similarity::SimilarityMatrix,
};

/// Decrypts and decodes results. The only context holding the secret key.
pub struct DecryptionContext {
    params: Arc<Parameters>,
    encoder: CkksEncoder,
    decryptor: Decryptor,
}

impl DecryptionContext {
    pub(crate) fn new(params: Arc<Parameters>, secret_key: Arc<SecretKey>) -> Self {
        Self {
            encoder: CkksEncoder::new(params.clone()),
            decryptor: Decryptor::new(secret_key),
            params,
        }
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    /// Decrypts to all `slots` values; callers truncate to their length.
    pub fn decrypt(&mut self, ct: &Ciphertext) -> CkksResult<Vec<f64>> {
        let pt = self.decryptor.decrypt(ct)?;
        Ok(self.encoder.decode(&pt))
    }

    /// Decrypts every ciphertext in parallel. Missing or undecryptable
    /// entries come back as `None` at their position.
    #[instrument(skip_all, fields(count = cts.len()))]
    pub fn batch_decrypt(&self, cts: &[Option<Ciphertext>]) -> Vec<Option<Vec<f64>>> {
        let outcome = batch_map(
            cts,
            || (self.decryptor.clone_for_task(), self.encoder.clone_for_task()),
            |(decryptor, encoder), index, ct| {
                let ct = ct.as_ref().ok_or(CkksError::NullCiphertext { index })?;
                let pt = decryptor.decrypt(ct)?;
                Ok::<_, CkksError>(encoder.decode(&pt))
            },
        );
        for (index, error) in &outcome.failures {
            match error {
                CkksError::NullCiphertext { .. } => debug!(index, "skipping missing ciphertext"),
                _ => warn!(index, %error, "decryption failed"),
            }
        }
        outcome.results
    }

    /// Decrypts a dot-product matrix and keeps slot 0 of every cell.
    /// Missing or undecryptable cells are `None`; they surface as
    /// [`NULL_SIMILARITY`](crate::NULL_SIMILARITY) in the dense rows.
    #[instrument(skip_all, fields(rows = matrix.len()))]
    pub fn extract_similarities(&self, matrix: &[Vec<Option<Ciphertext>>]) -> SimilarityMatrix {
        let rows = matrix
            .iter()
            .map(|row| {
                self.batch_decrypt(row)
                    .into_iter()
                    .map(|values| values.and_then(|v| v.first().copied()))
                    .collect()
            })
            .collect();
        SimilarityMatrix::from_cells(rows)
    }
}
