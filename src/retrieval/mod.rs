// Retrieval-augmented context engine:
// document text -> chunks -> embeddings -> similarity index -> context assembly

pub mod chunking;
pub mod engine;
pub mod index;

use serde::{Deserialize, Serialize};

pub use chunking::{Chunk, ChunkId, DEFAULT_CHUNK_SIZE, chunk_text};
pub use engine::{DocumentIndex, RetrievalEngine, RetrievalError};
pub use index::{IndexError, Neighbor, SimilarityIndex};

/// Maps text to fixed-dimensionality embedding vectors.
///
/// Implementations are expected to be expensive to construct and cheap to
/// call repeatedly; the engine treats them as a pure text-to-vector function
/// and never reconstructs them between interactions. Ingest passes every
/// chunk in one batch; a query arrives as a single-element batch.
pub trait Embedder {
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Tunables for the retrieval engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunk length in characters.
    pub chunk_size: usize,
    /// Number of chunks retrieved per query.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            top_k: 3,
        }
    }
}
