use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;

use quarry_core::{Chunk, ChunkEmbedding, ChunkId, DocChunkCount, DocumentId, TenantId};

use crate::error::StoreError;
use crate::traits::{check_replacement, CorpusReader, CorpusWriter, DocumentVersionKey};

#[derive(Default)]
struct Corpus {
    chunks: HashMap<DocumentVersionKey, Vec<Chunk>>,
    embeddings: HashMap<DocumentVersionKey, Vec<ChunkEmbedding>>,
}

impl Corpus {
    /// Embedding rows in scope whose checksum still matches their chunk.
    fn live_embeddings<'a>(
        &'a self,
        tenant_id: TenantId,
        embedding_model: &'a str,
        scope: &'a HashSet<DocumentId>,
    ) -> impl Iterator<Item = &'a ChunkEmbedding> + 'a {
        self.embeddings
            .iter()
            .filter(move |(key, _)| key.tenant_id == tenant_id && scope.contains(&key.document_id))
            .flat_map(move |(key, rows)| {
                let checksums: HashMap<ChunkId, &str> = self
                    .chunks
                    .get(key)
                    .map(|chunks| chunks.iter().map(|c| (c.id, c.checksum.as_str())).collect())
                    .unwrap_or_default();
                rows.iter().filter(move |e| {
                    e.embedding_model == embedding_model
                        && checksums.get(&e.chunk_id) == Some(&e.chunk_checksum.as_str())
                })
            })
    }
}

/// Process-local corpus. Each call holds the lock for its whole read or
/// write, so readers see either the old or the new chunk set of a document.
#[derive(Default)]
pub struct MemoryCorpusStore {
    corpus: RwLock<Corpus>,
}

impl MemoryCorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total embedding rows across all tenants and models.
    pub async fn embedding_count(&self) -> usize {
        self.corpus.read().await.embeddings.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl CorpusReader for MemoryCorpusStore {
    async fn chunk_counts(
        &self,
        tenant_id: TenantId,
        embedding_model: &str,
        document_ids: &[DocumentId],
    ) -> Result<Vec<DocChunkCount>, StoreError> {
        let scope: HashSet<DocumentId> = document_ids.iter().copied().collect();
        let corpus = self.corpus.read().await;

        let mut counts: BTreeMap<DocumentId, usize> = BTreeMap::new();
        for e in corpus.live_embeddings(tenant_id, embedding_model, &scope) {
            *counts.entry(e.document_id).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(document_id, chunk_count)| DocChunkCount::new(document_id, chunk_count))
            .collect())
    }

    async fn fetch_candidates(
        &self,
        tenant_id: TenantId,
        document_ids: &[DocumentId],
        embedding_model: &str,
        per_document: usize,
    ) -> Result<Vec<ChunkEmbedding>, StoreError> {
        let scope: HashSet<DocumentId> = document_ids.iter().copied().collect();
        let corpus = self.corpus.read().await;

        let mut partitions: BTreeMap<DocumentId, Vec<&ChunkEmbedding>> = BTreeMap::new();
        for e in corpus.live_embeddings(tenant_id, embedding_model, &scope) {
            partitions.entry(e.document_id).or_default().push(e);
        }

        let mut rng = rand::thread_rng();
        let mut out = Vec::new();
        for rows in partitions.values() {
            out.extend(
                rows.choose_multiple(&mut rng, per_document)
                    .map(|e| (*e).clone()),
            );
        }
        Ok(out)
    }
}

#[async_trait]
impl CorpusWriter for MemoryCorpusStore {
    async fn replace_document_version(
        &self,
        key: DocumentVersionKey,
        chunks: Vec<Chunk>,
        embeddings: Vec<ChunkEmbedding>,
    ) -> Result<(), StoreError> {
        check_replacement(&key, &chunks, &embeddings)?;

        let mut corpus = self.corpus.write().await;
        if chunks.is_empty() {
            corpus.chunks.remove(&key);
            corpus.embeddings.remove(&key);
        } else {
            corpus.chunks.insert(key, chunks);
            corpus.embeddings.insert(key, embeddings);
        }
        Ok(())
    }

    async fn chunks_for_version(&self, key: DocumentVersionKey) -> Result<Vec<Chunk>, StoreError> {
        let corpus = self.corpus.read().await;
        let mut chunks = corpus.chunks.get(&key).cloned().unwrap_or_default();
        chunks.sort_by_key(|c| c.ordinal);
        Ok(chunks)
    }
}
