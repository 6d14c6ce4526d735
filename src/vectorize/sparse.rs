//! Sparse feature vector implementation.
//!
//! Per-pipeline vocabularies can run to thousands of n-gram columns while a
//! single form activates only a handful, so vectors are stored as an
//! index -> value map rather than dense arrays.

use ahash::AHashMap;

/// A fixed-dimension sparse numeric vector.
///
/// Invariant: every stored index is `< dim`, and a vector produced by one
/// pipeline occupies only that pipeline's reserved column range inside the
/// concatenated feature space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    dim: usize,
    entries: AHashMap<usize, f64>,
}

impl SparseVector {
    /// Create an empty vector of the given dimension.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            entries: AHashMap::new(),
        }
    }

    /// Total dimension of the feature space this vector lives in.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of nonzero entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Set a column value. Indices past `dim` are ignored rather than
    /// panicking; vectorizers only ever emit in-range columns.
    pub fn set(&mut self, index: usize, value: f64) {
        if index < self.dim {
            self.entries.insert(index, value);
        }
    }

    /// Get a column value (zero for absent entries).
    pub fn get(&self, index: usize) -> f64 {
        self.entries.get(&index).copied().unwrap_or(0.0)
    }

    /// Iterate over the nonzero `(index, value)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().map(|(&i, &v)| (i, v))
    }

    /// Dot product against a dense weight row.
    ///
    /// Columns beyond the row length contribute nothing; only nonzero
    /// entries are visited.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter_map(|(&i, &v)| weights.get(i).map(|w| v * w))
            .sum()
    }

    /// Concatenate sparse vectors, offsetting indices by the cumulative
    /// prior dimensions. The result dimension is the sum of input
    /// dimensions and all nonzero entries are preserved.
    pub fn concat(vectors: &[SparseVector]) -> SparseVector {
        let total_dim = vectors.iter().map(|v| v.dim).sum();
        let mut out = SparseVector::new(total_dim);
        let mut offset = 0;
        for v in vectors {
            for (i, value) in v.iter() {
                out.set(offset + i, value);
            }
            offset += v.dim;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut v = SparseVector::new(10);
        v.set(3, 1.5);
        assert_eq!(v.get(3), 1.5);
        assert_eq!(v.get(4), 0.0);
        assert_eq!(v.nnz(), 1);
        assert_eq!(v.dim(), 10);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut v = SparseVector::new(2);
        v.set(5, 1.0);
        assert_eq!(v.nnz(), 0);
    }

    #[test]
    fn test_dot_product() {
        let mut v = SparseVector::new(4);
        v.set(0, 2.0);
        v.set(3, 0.5);
        let weights = [1.0, 10.0, 10.0, 4.0];
        assert!((v.dot(&weights) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_dot_short_row() {
        let mut v = SparseVector::new(4);
        v.set(3, 1.0);
        // Weight row shorter than dim: the trailing column contributes zero.
        assert_eq!(v.dot(&[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_concat_dimension_law() {
        let mut a = SparseVector::new(3);
        a.set(1, 1.0);
        let mut b = SparseVector::new(5);
        b.set(0, 2.0);
        b.set(4, 3.0);
        let c = SparseVector::new(2);

        let out = SparseVector::concat(&[a, b, c]);
        assert_eq!(out.dim(), 10);
        assert_eq!(out.nnz(), 3);
        assert_eq!(out.get(1), 1.0);
        assert_eq!(out.get(3), 2.0);
        assert_eq!(out.get(7), 3.0);
    }

    #[test]
    fn test_concat_empty() {
        let out = SparseVector::concat(&[]);
        assert_eq!(out.dim(), 0);
        assert_eq!(out.nnz(), 0);
    }
}
