use std::num::NonZeroUsize;

use lru::LruCache;

/// LRU cache mapping a chunk checksum to its embedding vector.
///
/// Keyed by content checksum, so identical text across documents or
/// re-ingested versions is embedded once per model.
pub struct EmbeddingCache {
    cache: LruCache<String, Vec<f32>>,
    hits: u64,
    misses: u64,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a cached embedding by chunk checksum.
    pub fn get(&mut self, checksum: &str) -> Option<Vec<f32>> {
        if let Some(vec) = self.cache.get(checksum) {
            self.hits += 1;
            Some(vec.clone())
        } else {
            self.misses += 1;
            None
        }
    }

    pub fn put(&mut self, checksum: &str, embedding: Vec<f32>) {
        self.cache.put(checksum.to_string(), embedding);
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
