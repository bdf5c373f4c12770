//! Vector index abstraction for document chunks.
//!
//! Defines a trait for vector storage with nearest-neighbour search, and an
//! exact brute-force implementation over contiguous storage.

use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A search hit: the position of a stored vector and its squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub position: usize,
    pub distance: f32,
}

/// Trait for vector index backends.
///
/// Positions are assigned in insertion order starting at zero. Results are
/// ordered by ascending distance; equal distances keep insertion order.
pub trait VectorIndex: Send + Sync + std::fmt::Debug {
    /// Replace the index contents with `vectors`.
    ///
    /// All vectors must share one non-zero dimensionality. On error the
    /// previous contents are kept.
    fn build(&mut self, vectors: Vec<Vec<f32>>) -> AppResult<()>;

    /// Return the `k` nearest stored vectors to `query`.
    ///
    /// Returns `min(k, len)` hits. An empty index yields no hits.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>>;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    /// Whether the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of the stored vectors, if any were stored.
    fn dimensions(&self) -> Option<usize>;

    /// The stored vector at `position`.
    fn vector(&self, position: usize) -> Option<&[f32]>;

    /// Remove all vectors.
    fn reset(&mut self);
}

/// Exact nearest-neighbour index using squared Euclidean distance.
///
/// Vectors are stored row-major in one contiguous buffer.
#[derive(Debug, Clone, Default)]
pub struct FlatL2Index {
    data: Vec<f32>,
    dims: usize,
    count: usize,
}

impl FlatL2Index {
    pub fn new() -> Self {
        Self::default()
    }

    fn row(&self, position: usize) -> &[f32] {
        let start = position * self.dims;
        &self.data[start..start + self.dims]
    }
}

impl VectorIndex for FlatL2Index {
    fn build(&mut self, vectors: Vec<Vec<f32>>) -> AppResult<()> {
        let Some(dims) = vectors.first().map(Vec::len) else {
            self.reset();
            return Ok(());
        };

        if dims == 0 {
            return Err(AppError::Invariant(
                "cannot index zero-dimensional vectors".to_string(),
            ));
        }
        if let Some((position, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dims) {
            return Err(AppError::Invariant(format!(
                "vector {} has {} dimensions, expected {}",
                position,
                v.len(),
                dims
            )));
        }

        let mut data = Vec::with_capacity(vectors.len() * dims);
        for v in &vectors {
            data.extend_from_slice(v);
        }

        self.count = vectors.len();
        self.dims = dims;
        self.data = data;

        tracing::debug!("Built flat L2 index: {} vectors x {} dims", self.count, dims);
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        if self.count == 0 || k == 0 {
            return Ok(Vec::new());
        }

        debug_assert_eq!(
            query.len(),
            self.dims,
            "query dimensions do not match the index"
        );
        if query.len() != self.dims {
            return Err(AppError::Invariant(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dims
            )));
        }

        let mut hits: Vec<SearchHit> = (0..self.count)
            .map(|position| SearchHit {
                position,
                distance: squared_l2(query, self.row(position)),
            })
            .collect();

        let k = k.min(self.count);
        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, by_distance_then_position);
            hits.truncate(k);
        }
        hits.sort_by(by_distance_then_position);

        Ok(hits)
    }

    fn len(&self) -> usize {
        self.count
    }

    fn dimensions(&self) -> Option<usize> {
        (self.count > 0).then_some(self.dims)
    }

    fn vector(&self, position: usize) -> Option<&[f32]> {
        (position < self.count).then(|| self.row(position))
    }

    fn reset(&mut self) {
        self.data.clear();
        self.dims = 0;
        self.count = 0;
    }
}

fn by_distance_then_position(a: &SearchHit, b: &SearchHit) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.position.cmp(&b.position))
}

/// Squared Euclidean distance. Both slices must have the same length.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    let mut sum = 0.0;
    let mut i = 0;

    // Unrolled by 4
    while i + 3 < n {
        let d0 = a[i] - b[i];
        let d1 = a[i + 1] - b[i + 1];
        let d2 = a[i + 2] - b[i + 2];
        let d3 = a[i + 3] - b[i + 3];
        sum += d0 * d0 + d1 * d1 + d2 * d2 + d3 * d3;
        i += 4;
    }

    while i < n {
        let d = a[i] - b[i];
        sum += d * d;
        i += 1;
    }

    sum
}
