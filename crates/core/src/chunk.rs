use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ids::{ChunkId, DocumentId, DocumentVersion, SectionId, TenantId, TopicId};

/// SHA-256 hex digest of final chunk text.
pub fn content_checksum(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{digest:x}")
}

/// One addressable slice of a document version's text.
///
/// Identity is (tenant, document, version, ordinal). `char_start`/`char_end`
/// count `char`s and are relative to `start_page`, except `char_end` of an
/// overlap-extended chunk (`end_page > start_page`), which is relative to the
/// next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub tenant_id: TenantId,
    pub topic_id: Option<TopicId>,
    pub document_id: DocumentId,
    pub document_version: DocumentVersion,
    /// 1-based, contiguous within one (document, version).
    pub ordinal: u32,
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
    pub char_start: usize,
    pub char_end: usize,
    pub text: String,
    pub checksum: String,
}

/// Embedding of one chunk under one embedding model.
///
/// Document, version, topic and section ids are copied from the owning chunk
/// so sampling can filter by scope without touching the chunk rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEmbedding {
    pub tenant_id: TenantId,
    pub chunk_id: ChunkId,
    pub document_id: DocumentId,
    pub document_version: DocumentVersion,
    pub topic_id: Option<TopicId>,
    pub section_id: Option<SectionId>,
    pub chunk_checksum: String,
    pub embedding_model: String,
    pub vector: Vec<f32>,
}

impl ChunkEmbedding {
    pub fn for_chunk(
        chunk: &Chunk,
        section_id: Option<SectionId>,
        embedding_model: &str,
        vector: Vec<f32>,
    ) -> Self {
        Self {
            tenant_id: chunk.tenant_id,
            chunk_id: chunk.id,
            document_id: chunk.document_id,
            document_version: chunk.document_version,
            topic_id: chunk.topic_id,
            section_id,
            chunk_checksum: chunk.checksum.clone(),
            embedding_model: embedding_model.to_string(),
            vector,
        }
    }

    /// False when the chunk was regenerated after this embedding was computed.
    pub fn matches_chunk(&self, chunk: &Chunk) -> bool {
        self.chunk_id == chunk.id && self.chunk_checksum == chunk.checksum
    }
}

/// Number of embedding rows one document has in a (tenant, model) scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocChunkCount {
    pub document_id: DocumentId,
    pub chunk_count: usize,
}

impl DocChunkCount {
    pub fn new(document_id: DocumentId, chunk_count: usize) -> Self {
        Self {
            document_id,
            chunk_count,
        }
    }
}
