
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Default chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Stable identity of a chunk within the current document batch.
///
/// Ids are dense and 0-based, assigned in chunking order, and match the
/// similarity index's row ordering exactly. They are a distinct key type
/// rather than a bare `usize` so that identity never silently changes
/// meaning if the index ever gains incremental updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId(u32);

impl ChunkId {
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A contiguous span of document text, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
}

/// Split text into consecutive, non-overlapping spans of `chunk_size`
/// characters. The final chunk may be shorter. Boundaries fall at fixed
/// character offsets regardless of word or sentence structure; splits always
/// land on `char` boundaries so multi-byte text is never bisected.
///
/// Empty input yields an empty sequence. Concatenating the returned chunks
/// in order reproduces the input exactly.
#[inline]
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<Chunk> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut current = String::with_capacity(chunk_size);
    let mut char_count = 0usize;
    let mut next_id = 0u32;

    for ch in text.chars() {
        current.push(ch);
        char_count += 1;
        if char_count == chunk_size {
            chunks.push(Chunk {
                id: ChunkId::new(next_id),
                text: std::mem::take(&mut current),
            });
            next_id += 1;
            char_count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            id: ChunkId::new(next_id),
            text: current,
        });
    }

    debug!("Split {} bytes into {} chunks", text.len(), chunks.len());
    chunks
}
