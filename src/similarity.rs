//! Plaintext similarity helpers and the decrypted similarity matrix.
//!
//! These are the reference computations the encrypted pipeline is checked
//! against, plus [`ErrorStats`] to quantify the difference.

use serde::{Deserialize, Serialize};

/// Value of a similarity cell that could not be computed or decrypted.
pub const NULL_SIMILARITY: f64 = -1.0;

pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(v: &[f64]) -> f64 {
    dot_product(v, v).sqrt()
}

/// Scales `v` to unit length. A zero vector is returned unchanged.
pub fn normalize(v: &[f64]) -> Vec<f64> {
    let n = norm(v);
    if n == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / n).collect()
}

/// `a·b / (|a| |b|)`, or 0 when either vector is zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    dot_product(a, b) / denom
}

/// `1 - cosine_similarity`. A zero vector is at distance 1 from everything.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

/// Distance of every vector to every other, row-major.
pub fn cosine_distance_all(vectors: &[Vec<f64>]) -> Vec<Vec<f64>> {
    vectors
        .iter()
        .map(|a| vectors.iter().map(|b| cosine_distance(a, b)).collect())
        .collect()
}

/// Mean distance over all unordered pairs, or 0 for fewer than two vectors.
pub fn average_cosine_distance(vectors: &[Vec<f64>]) -> f64 {
    let n = vectors.len();
    if n < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..n {
        for j in i + 1..n {
            total += cosine_distance(&vectors[i], &vectors[j]);
        }
    }
    total / (n * (n - 1) / 2) as f64
}

/// Queries by references. A cell is `None` when it could not be computed
/// or decrypted; [`into_rows`](Self::into_rows) writes those as
/// [`NULL_SIMILARITY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    cells: Vec<Vec<Option<f64>>>,
}

impl SimilarityMatrix {
    pub fn from_cells(cells: Vec<Vec<Option<f64>>>) -> Self {
        Self { cells }
    }

    /// Plaintext cosine similarity of every query with every reference.
    pub fn compute(queries: &[Vec<f64>], references: &[Vec<f64>]) -> Self {
        Self::from_cells(
            queries
                .iter()
                .map(|q| {
                    references
                        .iter()
                        .map(|r| Some(cosine_similarity(q, r)))
                        .collect()
                })
                .collect(),
        )
    }

    pub fn cells(&self) -> &[Vec<Option<f64>>] {
        &self.cells
    }

    /// Dense rows with missing cells set to [`NULL_SIMILARITY`].
    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.cells
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.unwrap_or(NULL_SIMILARITY))
                    .collect()
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `(rows, columns)`; columns are taken from the first row.
    pub fn shape(&self) -> (usize, usize) {
        (self.cells.len(), self.cells.first().map_or(0, Vec::len))
    }

    /// The cell, or `None` when out of range or missing.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    /// Column and value of the highest present similarity in `row`.
    pub fn best_match(&self, row: usize) -> Option<(usize, f64)> {
        self.cells
            .get(row)?
            .iter()
            .enumerate()
            .filter_map(|(col, cell)| cell.map(|v| (col, v)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_none()).count()
    }
}

/// Deviation of computed values from expected ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub count: usize,
    pub rmse: f64,
    pub mae: f64,
    pub max_abs: f64,
    /// Number of absolute errors above 0.1.
    pub over_0_1: usize,
    /// Number of absolute errors above 0.5.
    pub over_0_5: usize,
}

impl ErrorStats {
    /// Compares cell by cell, skipping cells missing on either side.
    pub fn between(actual: &SimilarityMatrix, expected: &SimilarityMatrix) -> Self {
        let errors: Vec<f64> = actual
            .cells()
            .iter()
            .zip(expected.cells())
            .flat_map(|(a, e)| a.iter().zip(e))
            .filter_map(|(&a, &e)| Some((a? - e?).abs()))
            .collect();
        Self::from_errors(&errors)
    }

    pub fn from_errors(errors: &[f64]) -> Self {
        let count = errors.len();
        if count == 0 {
            return Self {
                count,
                rmse: 0.0,
                mae: 0.0,
                max_abs: 0.0,
                over_0_1: 0,
                over_0_5: 0,
            };
        }
        let n = count as f64;
        Self {
            count,
            rmse: (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt(),
            mae: errors.iter().map(|e| e.abs()).sum::<f64>() / n,
            max_abs: errors.iter().fold(0.0, |m, e| m.max(e.abs())),
            over_0_1: errors.iter().filter(|e| e.abs() > 0.1).count(),
            over_0_5: errors.iter().filter(|e| e.abs() > 0.5).count(),
        }
    }
}
