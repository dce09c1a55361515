use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use quarry_core::{ChunkEmbedding, DocumentId, TenantId};
use quarry_store::{CorpusReader, StoreError};

use crate::allocation::QuotaMap;

/// Bounded, randomly ranked candidate rows for the documents in a quota map.
pub struct CandidateFetcher {
    reader: Arc<dyn CorpusReader>,
}

impl CandidateFetcher {
    pub fn new(reader: Arc<dyn CorpusReader>) -> Self {
        Self { reader }
    }

    /// At most `max_quota` rows per document. Rows for documents outside
    /// `quotas`, or under another model, are discarded.
    pub async fn fetch(
        &self,
        tenant_id: TenantId,
        quotas: &QuotaMap,
        embedding_model: &str,
        max_quota: usize,
    ) -> Result<Vec<ChunkEmbedding>, StoreError> {
        if quotas.is_empty() || max_quota == 0 {
            return Ok(Vec::new());
        }
        let document_ids: Vec<DocumentId> = quotas.keys().copied().collect();
        let rows = self
            .reader
            .fetch_candidates(tenant_id, &document_ids, embedding_model, max_quota)
            .await?;
        let fetched = rows.len();

        let mut per_document: HashMap<DocumentId, usize> = HashMap::new();
        let candidates: Vec<ChunkEmbedding> = rows
            .into_iter()
            .filter(|e| {
                e.tenant_id == tenant_id
                    && e.embedding_model == embedding_model
                    && quotas.contains_key(&e.document_id)
            })
            .filter(|e| {
                let taken = per_document.entry(e.document_id).or_default();
                *taken += 1;
                *taken <= max_quota
            })
            .collect();

        debug!(
            fetched,
            kept = candidates.len(),
            max_quota,
            documents = document_ids.len(),
            "candidates fetched"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quarry_core::DocChunkCount;
    use uuid::Uuid;

    /// Ignores `per_document` and the scope, returning every row it holds.
    struct Overfetching(Vec<ChunkEmbedding>);

    #[async_trait]
    impl CorpusReader for Overfetching {
        async fn chunk_counts(
            &self,
            _tenant_id: TenantId,
            _embedding_model: &str,
            _document_ids: &[DocumentId],
        ) -> Result<Vec<DocChunkCount>, StoreError> {
            Ok(Vec::new())
        }

        async fn fetch_candidates(
            &self,
            _tenant_id: TenantId,
            _document_ids: &[DocumentId],
            _embedding_model: &str,
            _per_document: usize,
        ) -> Result<Vec<ChunkEmbedding>, StoreError> {
            Ok(self.0.clone())
        }
    }

    fn row(tenant_id: TenantId, document_id: DocumentId, model: &str, n: usize) -> ChunkEmbedding {
        ChunkEmbedding {
            tenant_id,
            chunk_id: Uuid::new_v4(),
            document_id,
            document_version: 1,
            topic_id: None,
            section_id: None,
            chunk_checksum: format!("{document_id}-{n}"),
            embedding_model: model.to_string(),
            vector: vec![0.0; 2],
        }
    }

    #[tokio::test]
    async fn enforces_per_document_bound_and_scope() {
        let tenant = Uuid::new_v4();
        let (a, b, outside) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut rows: Vec<ChunkEmbedding> = (0..10).map(|n| row(tenant, a, "m", n)).collect();
        rows.push(row(tenant, b, "m", 0));
        rows.push(row(tenant, b, "other-model", 1));
        rows.push(row(Uuid::new_v4(), b, "m", 2));
        rows.push(row(tenant, outside, "m", 0));

        let fetcher = CandidateFetcher::new(Arc::new(Overfetching(rows)));
        let quotas: QuotaMap = [(a, 3), (b, 1)].into_iter().collect();

        let got = fetcher.fetch(tenant, &quotas, "m", 3).await.unwrap();
        assert_eq!(got.iter().filter(|e| e.document_id == a).count(), 3);
        assert_eq!(got.iter().filter(|e| e.document_id == b).count(), 1);
        assert!(got.iter().all(|e| e.document_id != outside));
    }

    #[tokio::test]
    async fn empty_quotas_skip_storage() {
        let fetcher = CandidateFetcher::new(Arc::new(Overfetching(vec![row(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "m",
            0,
        )])));
        let got = fetcher
            .fetch(Uuid::new_v4(), &QuotaMap::new(), "m", 5)
            .await
            .unwrap();
        assert!(got.is_empty());
    }
}
