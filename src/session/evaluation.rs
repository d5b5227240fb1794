use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    batch::batch_map,
    crypto::{Ciphertext, CkksError, CkksResult, Evaluator, Parameters},
    keys::EvaluationKeySet,
};

/// Result of an all-pairs dot product.
///
/// Failed cells and cells of missing rows are `None`. A non-empty failure
/// list means the matrix may be incomplete, not that it is empty.
#[derive(Debug)]
pub struct DotProductBatch {
    pub results: Vec<Vec<Option<Ciphertext>>>,
    /// `((row, column), error)`, in row-major order.
    pub failures: Vec<((usize, usize), CkksError)>,
}

impl DotProductBatch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failure with the smallest `(row, column)`.
    pub fn first_error(&self) -> Option<&CkksError> {
        self.failures.first().map(|(_, error)| error)
    }

    pub fn into_parts(self) -> (Vec<Vec<Option<Ciphertext>>>, Option<CkksError>) {
        let error = self.failures.into_iter().next().map(|(_, error)| error);
        (self.results, error)
    }
}

/// Computes encrypted dot products. Holds only evaluation keys.
pub struct EvaluationContext {
    params: Arc<Parameters>,
    evaluator: Evaluator,
}

impl EvaluationContext {
    pub(crate) fn new(params: Arc<Parameters>, keys: Arc<EvaluationKeySet>) -> Self {
        Self {
            evaluator: Evaluator::new(params.clone(), keys),
            params,
        }
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Encrypted dot product of one ciphertext with one plaintext vector.
    /// Only slot 0 of the decrypted result is meaningful.
    pub fn dot_product(&mut self, ct: &Ciphertext, values: &[f64]) -> CkksResult<Ciphertext> {
        self.check_plaintexts(std::slice::from_ref(&values))?;
        self.evaluator.dot_product(ct, values)
    }

    /// Dot product of every ciphertext row with every plaintext column, one
    /// task per pair.
    ///
    /// Rows whose ciphertext is `None` yield a row of `None` without work.
    /// A plaintext longer than the slot capacity fails the whole call before
    /// any task starts.
    #[instrument(skip_all, fields(rows = cts.len(), columns = pts.len()))]
    pub fn batch_dot_product(
        &self,
        cts: &[Option<Ciphertext>],
        pts: &[Vec<f64>],
    ) -> CkksResult<DotProductBatch> {
        self.check_plaintexts(pts)?;

        let pairs: Vec<(usize, usize)> = cts
            .iter()
            .enumerate()
            .filter(|(_, ct)| ct.is_some())
            .flat_map(|(row, _)| (0..pts.len()).map(move |col| (row, col)))
            .collect();

        let outcome = batch_map(
            &pairs,
            || self.evaluator.clone_for_task(),
            |evaluator, _, &(row, col)| match &cts[row] {
                Some(ct) => evaluator.dot_product(ct, &pts[col]),
                None => Err(CkksError::NullCiphertext { index: row }),
            },
        );

        let mut results: Vec<Vec<Option<Ciphertext>>> = (0..cts.len())
            .map(|_| (0..pts.len()).map(|_| None).collect())
            .collect();
        for (&(row, col), result) in pairs.iter().zip(outcome.results) {
            results[row][col] = result;
        }
        let failures: Vec<_> = outcome
            .failures
            .into_iter()
            .map(|(index, error)| (pairs[index], error))
            .collect();
        for ((row, col), error) in &failures {
            warn!(row, col, %error, "dot product failed");
        }
        debug!(pairs = pairs.len(), failed = failures.len(), "batch dot product done");

        Ok(DotProductBatch { results, failures })
    }

    fn check_plaintexts<V: AsRef<[f64]>>(&self, pts: &[V]) -> CkksResult<()> {
        let slots = self.params.slots();
        match pts.iter().position(|pt| pt.as_ref().len() > slots) {
            Some(col) => Err(CkksError::InvalidInputShape {
                message: format!(
                    "plaintext {col} has {} values, slot capacity is {slots}",
                    pts[col].as_ref().len()
                ),
            }),
            None => Ok(()),
        }
    }
}
