use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use quarry_core::Chunk;

use super::cache::EmbeddingCache;
use super::traits::{Embedder, EmbeddingError};

/// Embeds chunk text in fixed-size batches, skipping any checksum already
/// seen by this batcher.
pub struct EmbeddingBatcher {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    cache: EmbeddingCache,
}

/// Outcome counters of one `embed_chunks` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub requested: usize,
    pub cache_hits: usize,
    pub embedded: usize,
    pub batches: usize,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize, cache_capacity: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            cache: EmbeddingCache::new(cache_capacity),
        }
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// One vector per chunk, in chunk order.
    ///
    /// Chunks sharing a checksum are sent to the backend once. Every vector
    /// returned by the backend must match its configured dimensionality.
    pub async fn embed_chunks(
        &mut self,
        chunks: &[Chunk],
    ) -> Result<(Vec<Vec<f32>>, BatchStats), EmbeddingError> {
        let mut stats = BatchStats {
            requested: chunks.len(),
            ..BatchStats::default()
        };
        let mut resolved: HashMap<&str, Vec<f32>> = HashMap::new();
        let mut queued: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&Chunk> = Vec::new();

        for chunk in chunks {
            let key = chunk.checksum.as_str();
            if resolved.contains_key(key) || !queued.insert(key) {
                continue;
            }
            match self.cache.get(key) {
                Some(vector) => {
                    stats.cache_hits += 1;
                    resolved.insert(key, vector);
                }
                None => pending.push(chunk),
            }
        }

        let expected = self.embedder.dimensions();
        for batch in pending.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(EmbeddingError::CountMismatch {
                    sent: texts.len(),
                    received: vectors.len(),
                });
            }
            for (chunk, vector) in batch.iter().zip(vectors) {
                if vector.len() != expected {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                self.cache.put(&chunk.checksum, vector.clone());
                resolved.insert(chunk.checksum.as_str(), vector);
            }
            stats.batches += 1;
            stats.embedded += batch.len();
        }

        debug!(
            model = self.embedder.model_name(),
            requested = stats.requested,
            cache_hits = stats.cache_hits,
            embedded = stats.embedded,
            batches = stats.batches,
            "chunk embeddings resolved"
        );

        let mut out = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match resolved.get(chunk.checksum.as_str()) {
                Some(vector) => out.push(vector.clone()),
                None => {
                    return Err(EmbeddingError::CountMismatch {
                        sent: chunks.len(),
                        received: out.len(),
                    })
                }
            }
        }
        Ok((out, stats))
    }
}
