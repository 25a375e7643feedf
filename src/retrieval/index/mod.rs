#[cfg(test)]
mod tests;

use thiserror::Error;
use tracing::debug;

use super::chunking::ChunkId;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(
        "Embedding dimension mismatch: expected {expected}, found {found} at position {position}"
    )]
    DimensionMismatch {
        expected: usize,
        found: usize,
        position: usize,
    },
}

/// A single nearest-neighbor hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: ChunkId,
    /// Euclidean (L2) distance from the query vector.
    pub distance: f32,
}

/// Flat in-memory nearest-neighbor index over the embedding vectors of the
/// current document batch.
///
/// Search is exhaustive L2 distance over every stored vector, which is the
/// right trade-off for a single user's working set of at most a few thousand
/// chunks. Row order matches chunking order exactly: the vector at row `i`
/// belongs to `ChunkId(i)`.
///
/// The index is immutable once built; a new upload builds a fresh index and
/// the caller swaps it in whole, so a query never observes a partial set.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    /// Row-major storage, `rows * dimension` values.
    vectors: Vec<f32>,
    dimension: usize,
    rows: usize,
}

impl SimilarityIndex {
    /// Build an index from vectors in chunk order.
    ///
    /// Dimensionality is fixed by the first vector; any later vector with a
    /// different length aborts the build. Vectors from different embedding
    /// models must never be mixed in one index.
    #[inline]
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self, IndexError> {
        let Some(first) = vectors.first() else {
            return Ok(Self {
                vectors: Vec::new(),
                dimension: 0,
                rows: 0,
            });
        };

        let dimension = first.len();
        let mut flat = Vec::with_capacity(vectors.len() * dimension);

        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    found: vector.len(),
                    position,
                });
            }
            flat.extend_from_slice(vector);
        }

        debug!(
            "Built similarity index: {} vectors x {} dimensions",
            vectors.len(),
            dimension
        );

        Ok(Self {
            vectors: flat,
            dimension,
            rows: vectors.len(),
        })
    }

    /// Return up to `min(k, len)` stored vectors nearest to `query`, ordered
    /// by ascending L2 distance. Ties are broken by lowest chunk id, so
    /// results are fully deterministic.
    ///
    /// An empty index returns an empty result, not an error.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if self.rows == 0 || self.dimension == 0 || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                found: query.len(),
                position: 0,
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, stored)| Neighbor {
                id: ChunkId::new(row as u32),
                distance: l2_distance(query, stored),
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        neighbors.truncate(k.min(self.rows));

        debug!(
            "Search over {} vectors returned {} neighbors",
            self.rows,
            neighbors.len()
        );
        Ok(neighbors)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Dimensionality shared by every stored vector. Zero for an empty index.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum::<f32>()
        .sqrt()
}
