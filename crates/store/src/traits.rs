use std::collections::HashMap;

use async_trait::async_trait;

use quarry_core::{
    Chunk, ChunkEmbedding, DocChunkCount, DocumentId, DocumentVersion, TenantId,
};

use crate::error::StoreError;

/// Key of one wholesale-replaceable chunk set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentVersionKey {
    pub tenant_id: TenantId,
    pub document_id: DocumentId,
    pub document_version: DocumentVersion,
}

impl DocumentVersionKey {
    pub fn new(
        tenant_id: TenantId,
        document_id: DocumentId,
        document_version: DocumentVersion,
    ) -> Self {
        Self {
            tenant_id,
            document_id,
            document_version,
        }
    }

    pub fn owns_chunk(&self, chunk: &Chunk) -> bool {
        chunk.tenant_id == self.tenant_id
            && chunk.document_id == self.document_id
            && chunk.document_version == self.document_version
    }

    pub fn owns_embedding(&self, embedding: &ChunkEmbedding) -> bool {
        embedding.tenant_id == self.tenant_id
            && embedding.document_id == self.document_id
            && embedding.document_version == self.document_version
    }
}

/// Read side used by sampling. Every call reads one consistent snapshot and
/// filters strictly by tenant and embedding model.
#[async_trait]
pub trait CorpusReader: Send + Sync {
    /// Embedding row count per document. Documents without rows are absent.
    async fn chunk_counts(
        &self,
        tenant_id: TenantId,
        embedding_model: &str,
        document_ids: &[DocumentId],
    ) -> Result<Vec<DocChunkCount>, StoreError>;

    /// At most `per_document` randomly ranked embedding rows per document.
    async fn fetch_candidates(
        &self,
        tenant_id: TenantId,
        document_ids: &[DocumentId],
        embedding_model: &str,
        per_document: usize,
    ) -> Result<Vec<ChunkEmbedding>, StoreError>;
}

/// Write side used by ingestion.
#[async_trait]
pub trait CorpusWriter: Send + Sync {
    /// Delete every chunk (and its embeddings) stored under `key`, then insert
    /// `chunks` and `embeddings`. Readers never observe a partial replacement.
    async fn replace_document_version(
        &self,
        key: DocumentVersionKey,
        chunks: Vec<Chunk>,
        embeddings: Vec<ChunkEmbedding>,
    ) -> Result<(), StoreError>;

    /// Chunks stored under `key`, ordered by ordinal.
    async fn chunks_for_version(&self, key: DocumentVersionKey) -> Result<Vec<Chunk>, StoreError>;
}

/// Reject writes whose rows do not belong to `key` or reference unknown chunks.
pub(crate) fn check_replacement(
    key: &DocumentVersionKey,
    chunks: &[Chunk],
    embeddings: &[ChunkEmbedding],
) -> Result<(), StoreError> {
    if let Some(c) = chunks.iter().find(|c| !key.owns_chunk(c)) {
        return Err(StoreError::Inconsistent(format!(
            "chunk {} does not belong to document {} version {}",
            c.id, key.document_id, key.document_version
        )));
    }
    let by_id: HashMap<_, _> = chunks.iter().map(|c| (c.id, c)).collect();
    for e in embeddings {
        if !key.owns_embedding(e) {
            return Err(StoreError::Inconsistent(format!(
                "embedding for chunk {} does not belong to document {} version {}",
                e.chunk_id, key.document_id, key.document_version
            )));
        }
        let owner = by_id.get(&e.chunk_id).ok_or_else(|| {
            StoreError::Inconsistent(format!("embedding references unknown chunk {}", e.chunk_id))
        })?;
        if !e.matches_chunk(owner) {
            return Err(StoreError::Inconsistent(format!(
                "checksum of embedding for chunk {} does not match its chunk",
                e.chunk_id
            )));
        }
    }
    Ok(())
}
