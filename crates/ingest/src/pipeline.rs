//! Segment → embed → atomic replace, for one document version.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use quarry_core::{ChunkEmbedding, ChunkingPolicy, DocumentId, DocumentVersion, TenantId};
use quarry_store::{CorpusWriter, DocumentVersionKey};

use crate::embedding::EmbeddingBatcher;
use crate::error::IngestError;
use crate::segmenter::{ChunkSegmenter, DocumentTarget};

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub tenant_id: TenantId,
    pub document_id: DocumentId,
    pub document_version: DocumentVersion,
    pub embedding_model: String,
    pub pages: usize,
    pub chunks: usize,
    pub embedded: usize,
    pub cache_hits: usize,
    pub ingested_at: DateTime<Utc>,
}

pub struct IngestPipeline {
    store: Arc<dyn CorpusWriter>,
    batcher: EmbeddingBatcher,
    segmenter: ChunkSegmenter,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn CorpusWriter>, batcher: EmbeddingBatcher) -> Self {
        Self {
            store,
            batcher,
            segmenter: ChunkSegmenter::new(),
        }
    }

    pub fn with_segmenter(mut self, segmenter: ChunkSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn embedding_model(&self) -> &str {
        self.batcher.model_name()
    }

    /// Replace the stored chunk set of `target` with a fresh segmentation of
    /// `pages`. Nothing is written unless every chunk was embedded.
    pub async fn ingest_version<S: AsRef<str>>(
        &mut self,
        target: &DocumentTarget,
        pages: &[Option<S>],
        policy: &ChunkingPolicy,
    ) -> Result<IngestReport, IngestError> {
        policy.validate()?;
        let chunks = self.segmenter.segment_document(target, pages, policy)?;
        let (vectors, stats) = self.batcher.embed_chunks(&chunks).await?;

        let model = self.batcher.model_name().to_string();
        let embeddings: Vec<ChunkEmbedding> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                ChunkEmbedding::for_chunk(chunk, target.section_id, &model, vector)
            })
            .collect();

        let key = DocumentVersionKey::new(
            target.tenant_id,
            target.document_id,
            target.document_version,
        );
        let chunk_count = chunks.len();
        self.store
            .replace_document_version(key, chunks, embeddings)
            .await?;

        let report = IngestReport {
            tenant_id: target.tenant_id,
            document_id: target.document_id,
            document_version: target.document_version,
            embedding_model: model,
            pages: pages.len(),
            chunks: chunk_count,
            embedded: stats.embedded,
            cache_hits: stats.cache_hits,
            ingested_at: Utc::now(),
        };
        info!(
            document_id = %report.document_id,
            version = report.document_version,
            model = %report.embedding_model,
            chunks = report.chunks,
            embedded = report.embedded,
            cache_hits = report.cache_hits,
            "document version ingested"
        );
        Ok(report)
    }
}
