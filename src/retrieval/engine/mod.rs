
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::chunking::{Chunk, ChunkId, chunk_text};
use super::index::{IndexError, SimilarityIndex};
use super::{Embedder, RetrievalConfig};

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Embedding request failed: {0}")]
    Embedding(anyhow::Error),

    #[error("Embedder returned {found} vectors for {expected} inputs")]
    EmbeddingCountMismatch { expected: usize, found: usize },
}

/// The chunk set and similarity index built from one document batch.
///
/// Both halves are built together and installed together, so a handle is
/// always internally consistent: every row of the index maps back to the
/// chunk with the same id. Replacing the active handle on re-upload discards
/// the prior batch entirely; there is no incremental merge.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    chunks: Vec<Chunk>,
    index: SimilarityIndex,
}

impl DocumentIndex {
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    #[inline]
    pub fn chunk(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id.as_usize())
    }
}

/// Builds document indexes and assembles retrieval-augmented prompts.
///
/// Holds the embedder for the lifetime of the session so the expensive
/// client setup happens once. All operations are synchronous and touch no
/// shared state; the caller owns the active `DocumentIndex` and swaps it
/// atomically on re-upload.
pub struct RetrievalEngine<E> {
    embedder: E,
    config: RetrievalConfig,
}

impl<E: Embedder> RetrievalEngine<E> {
    #[inline]
    pub fn new(embedder: E, config: RetrievalConfig) -> Self {
        Self { embedder, config }
    }

    /// Chunk, embed, and index a document batch.
    ///
    /// Texts are concatenated in upload order; a document that extracted to
    /// nothing simply contributes nothing. Returns `Ok(None)` when the whole
    /// batch yields zero chunks, which callers treat as "no index" rather
    /// than an error. A dimension mismatch aborts the build before any index
    /// exists, so a corrupt handle can never be installed.
    #[inline]
    pub fn ingest(&self, document_texts: &[String]) -> Result<Option<DocumentIndex>, RetrievalError> {
        let combined = document_texts.concat();
        let chunks = chunk_text(&combined, self.config.chunk_size);

        if chunks.is_empty() {
            info!("Document batch produced no chunks; skipping index build");
            return Ok(None);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .embedder
            .embed(&texts)
            .map_err(RetrievalError::Embedding)?;

        if vectors.len() != chunks.len() {
            return Err(RetrievalError::EmbeddingCountMismatch {
                expected: chunks.len(),
                found: vectors.len(),
            });
        }

        let index = SimilarityIndex::build(&vectors)?;

        info!(
            "Indexed document batch: {} chunks, {} dimensions",
            chunks.len(),
            index.dimension()
        );

        Ok(Some(DocumentIndex { chunks, index }))
    }

    /// Produce the text to send to the completion endpoint for `query`.
    ///
    /// With no index present the query passes through unchanged. Otherwise
    /// the nearest `top_k` chunks are spliced into an instructional template
    /// with the verbatim question below them. A transient retrieval failure
    /// at query time (embedding call down, missing vector) degrades to the
    /// unaugmented query with a warning rather than failing the whole ask;
    /// only a query/index dimension mismatch is surfaced as an error. The
    /// index is never mutated; only the outgoing prompt is augmented, so
    /// stored history and the visible chat log keep the raw query.
    #[inline]
    pub fn respond(
        &self,
        query: &str,
        index: Option<&DocumentIndex>,
    ) -> Result<String, RetrievalError> {
        let Some(handle) = index else {
            debug!("No document index active; passing query through unaugmented");
            return Ok(query.to_string());
        };

        let query_batch = [query.to_string()];
        let query_vector = match self.embedder.embed(&query_batch) {
            Ok(mut vectors) if !vectors.is_empty() => vectors.swap_remove(0),
            Ok(_) => {
                warn!("Embedder returned no vector for query; answering without document context");
                return Ok(query.to_string());
            }
            Err(e) => {
                warn!(
                    "Query embedding failed ({e:#}); answering without document context"
                );
                return Ok(query.to_string());
            }
        };

        let neighbors = handle.index.search(&query_vector, self.config.top_k)?;

        if neighbors.is_empty() {
            debug!("Search returned no chunks; passing query through unaugmented");
            return Ok(query.to_string());
        }

        let mut context_chunks = Vec::with_capacity(neighbors.len());
        for neighbor in &neighbors {
            let Some(chunk) = handle.chunk(neighbor.id) else {
                warn!(
                    "Search returned unknown chunk id {}; answering without document context",
                    neighbor.id
                );
                return Ok(query.to_string());
            };
            context_chunks.push(chunk.text.as_str());
        }

        debug!(
            "Retrieved {} chunks for query (nearest distance {:.4})",
            neighbors.len(),
            neighbors[0].distance
        );

        Ok(assemble_prompt(query, &context_chunks))
    }

    #[inline]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }
}

/// Wrap retrieved chunks and the verbatim question in the fixed prompt
/// template, nearest chunk first.
fn assemble_prompt(query: &str, context_chunks: &[&str]) -> String {
    let context = context_chunks.iter().join("\n");
    format!(
        "Use the following context from the uploaded documents to answer the question. \
         If the context is not relevant, answer from your own knowledge.\n\n\
         Context:\n{context}\n\nQuestion: {query}"
    )
}
