use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use quarry_core::{DocChunkCount, DocumentId, TenantId};
use quarry_store::{CorpusReader, StoreError};

/// Per-document embedding row counts for one (tenant, model) scope.
pub struct CorpusShapeAnalyzer {
    reader: Arc<dyn CorpusReader>,
}

impl CorpusShapeAnalyzer {
    pub fn new(reader: Arc<dyn CorpusReader>) -> Self {
        Self { reader }
    }

    /// Documents without rows are absent from the result, never zero-valued.
    /// Entries outside `document_ids` are dropped.
    pub async fn shape(
        &self,
        tenant_id: TenantId,
        embedding_model: &str,
        document_ids: &[DocumentId],
    ) -> Result<Vec<DocChunkCount>, StoreError> {
        let scope: HashSet<DocumentId> = document_ids.iter().copied().collect();
        let mut seen = HashSet::new();
        let shape: Vec<DocChunkCount> = self
            .reader
            .chunk_counts(tenant_id, embedding_model, document_ids)
            .await?
            .into_iter()
            .filter(|c| c.chunk_count > 0 && scope.contains(&c.document_id))
            .filter(|c| seen.insert(c.document_id))
            .collect();

        debug!(
            documents = shape.len(),
            requested = scope.len(),
            chunks = shape.iter().map(|c| c.chunk_count).sum::<usize>(),
            "corpus shape"
        );
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quarry_core::ChunkEmbedding;
    use uuid::Uuid;

    /// Returns a fixed count list regardless of the query.
    struct CannedCounts(Vec<DocChunkCount>);

    #[async_trait]
    impl CorpusReader for CannedCounts {
        async fn chunk_counts(
            &self,
            _tenant_id: TenantId,
            _embedding_model: &str,
            _document_ids: &[DocumentId],
        ) -> Result<Vec<DocChunkCount>, StoreError> {
            Ok(self.0.clone())
        }

        async fn fetch_candidates(
            &self,
            _tenant_id: TenantId,
            _document_ids: &[DocumentId],
            _embedding_model: &str,
            _per_document: usize,
        ) -> Result<Vec<ChunkEmbedding>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn drops_zero_and_out_of_scope_entries() {
        let (a, b, stranger) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let analyzer = CorpusShapeAnalyzer::new(Arc::new(CannedCounts(vec![
            DocChunkCount::new(a, 3),
            DocChunkCount::new(b, 0),
            DocChunkCount::new(stranger, 9),
        ])));

        let shape = analyzer.shape(Uuid::new_v4(), "m", &[a, b]).await.unwrap();
        assert_eq!(shape, vec![DocChunkCount::new(a, 3)]);
    }

    #[tokio::test]
    async fn keeps_first_entry_per_document() {
        let a = Uuid::new_v4();
        let analyzer = CorpusShapeAnalyzer::new(Arc::new(CannedCounts(vec![
            DocChunkCount::new(a, 3),
            DocChunkCount::new(a, 5),
        ])));

        let shape = analyzer.shape(Uuid::new_v4(), "m", &[a]).await.unwrap();
        assert_eq!(shape.len(), 1);
        assert_eq!(shape[0].chunk_count, 3);
    }
}
