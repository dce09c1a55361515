use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{info, warn};

use quarry_core::config::PostgresConfig;
use quarry_core::{Chunk, ChunkEmbedding, DocChunkCount, DocumentId, TenantId};

use crate::error::StoreError;
use crate::traits::{check_replacement, CorpusReader, CorpusWriter, DocumentVersionKey};

/// Create a PostgreSQL connection pool and run migrations.
pub async fn init_pg_pool(config: &PostgresConfig) -> Result<PgPool, StoreError> {
    if !config.is_configured() {
        warn!("PG_USERNAME not set, connecting as the default postgres user");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await
        .map_err(|e| StoreError::Unavailable(format!("{}: {e}", config.host)))?;
    info!("PostgreSQL connected: {}", config.host);

    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

/// Chunk and embedding rows in PostgreSQL with pgvector.
///
/// Embedding rows whose checksum no longer matches their chunk are invisible
/// to both read paths.
#[derive(Clone)]
pub struct PgCorpusStore {
    pool: PgPool,
}

impl PgCorpusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Narrow a positional field to the `INTEGER` column it is stored in.
fn to_db<T>(value: T, field: &str) -> Result<i32, StoreError>
where
    T: TryInto<i32> + Copy + std::fmt::Display,
{
    value
        .try_into()
        .map_err(|_| StoreError::Inconsistent(format!("{field} {value} exceeds INTEGER range")))
}

/// Widen an `INTEGER` column back to its in-memory type; negatives are rejected.
fn from_db<T: TryFrom<i32>>(value: i32, field: &str) -> Result<T, StoreError> {
    T::try_from(value)
        .map_err(|_| StoreError::Inconsistent(format!("{field} {value} out of range in stored row")))
}

fn chunk_from_row(row: &PgRow) -> Result<Chunk, StoreError> {
    let ordinal: i32 = row.try_get("ordinal")?;
    let char_start: i32 = row.try_get("char_start")?;
    let char_end: i32 = row.try_get("char_end")?;
    let start_page: Option<i32> = row.try_get("start_page")?;
    let end_page: Option<i32> = row.try_get("end_page")?;
    Ok(Chunk {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        topic_id: row.try_get("topic_id")?,
        document_id: row.try_get("document_id")?,
        document_version: row.try_get("document_version")?,
        ordinal: from_db(ordinal, "ordinal")?,
        start_page: start_page.map(|p| from_db(p, "start_page")).transpose()?,
        end_page: end_page.map(|p| from_db(p, "end_page")).transpose()?,
        char_start: from_db(char_start, "char_start")?,
        char_end: from_db(char_end, "char_end")?,
        text: row.try_get("text")?,
        checksum: row.try_get("checksum")?,
    })
}

fn embedding_from_row(row: &PgRow) -> Result<ChunkEmbedding, sqlx::Error> {
    let vector: Vector = row.try_get("embedding")?;
    Ok(ChunkEmbedding {
        tenant_id: row.try_get("tenant_id")?,
        chunk_id: row.try_get("chunk_id")?,
        document_id: row.try_get("document_id")?,
        document_version: row.try_get("document_version")?,
        topic_id: row.try_get("topic_id")?,
        section_id: row.try_get("section_id")?,
        chunk_checksum: row.try_get("chunk_checksum")?,
        embedding_model: row.try_get("embedding_model")?,
        vector: vector.to_vec(),
    })
}

#[async_trait]
impl CorpusReader for PgCorpusStore {
    async fn chunk_counts(
        &self,
        tenant_id: TenantId,
        embedding_model: &str,
        document_ids: &[DocumentId],
    ) -> Result<Vec<DocChunkCount>, StoreError> {
        let rows = sqlx::query(
            "SELECT e.document_id, COUNT(*) AS chunk_count \
             FROM chunk_embeddings e \
             JOIN document_chunks c ON c.id = e.chunk_id AND c.checksum = e.chunk_checksum \
             WHERE e.tenant_id = $1 AND e.embedding_model = $2 AND e.document_id = ANY($3) \
             GROUP BY e.document_id \
             ORDER BY e.document_id",
        )
        .bind(tenant_id)
        .bind(embedding_model)
        .bind(document_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<DocChunkCount, sqlx::Error> {
                let count: i64 = row.try_get("chunk_count")?;
                Ok(DocChunkCount::new(row.try_get("document_id")?, count as usize))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    async fn fetch_candidates(
        &self,
        tenant_id: TenantId,
        document_ids: &[DocumentId],
        embedding_model: &str,
        per_document: usize,
    ) -> Result<Vec<ChunkEmbedding>, StoreError> {
        let rows = sqlx::query(
            "SELECT tenant_id, chunk_id, document_id, document_version, topic_id, section_id, \
                    chunk_checksum, embedding_model, embedding \
             FROM ( \
                 SELECT e.*, ROW_NUMBER() OVER (PARTITION BY e.document_id ORDER BY random()) AS rn \
                 FROM chunk_embeddings e \
                 JOIN document_chunks c ON c.id = e.chunk_id AND c.checksum = e.chunk_checksum \
                 WHERE e.tenant_id = $1 AND e.embedding_model = $2 AND e.document_id = ANY($3) \
             ) ranked \
             WHERE rn <= $4",
        )
        .bind(tenant_id)
        .bind(embedding_model)
        .bind(document_ids)
        .bind(per_document as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(embedding_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl CorpusWriter for PgCorpusStore {
    async fn replace_document_version(
        &self,
        key: DocumentVersionKey,
        chunks: Vec<Chunk>,
        embeddings: Vec<ChunkEmbedding>,
    ) -> Result<(), StoreError> {
        check_replacement(&key, &chunks, &embeddings)?;

        let mut tx = self.pool.begin().await?;

        // Embeddings go with their chunks (ON DELETE CASCADE).
        let deleted = sqlx::query(
            "DELETE FROM document_chunks \
             WHERE tenant_id = $1 AND document_id = $2 AND document_version = $3",
        )
        .bind(key.tenant_id)
        .bind(key.document_id)
        .bind(key.document_version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        for chunk in &chunks {
            sqlx::query(
                "INSERT INTO document_chunks \
                 (id, tenant_id, topic_id, document_id, document_version, ordinal, \
                  start_page, end_page, char_start, char_end, text, checksum) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(chunk.id)
            .bind(chunk.tenant_id)
            .bind(chunk.topic_id)
            .bind(chunk.document_id)
            .bind(chunk.document_version)
            .bind(to_db(chunk.ordinal, "ordinal")?)
            .bind(chunk.start_page.map(|p| to_db(p, "start_page")).transpose()?)
            .bind(chunk.end_page.map(|p| to_db(p, "end_page")).transpose()?)
            .bind(to_db(chunk.char_start, "char_start")?)
            .bind(to_db(chunk.char_end, "char_end")?)
            .bind(&chunk.text)
            .bind(&chunk.checksum)
            .execute(&mut *tx)
            .await?;
        }

        for emb in &embeddings {
            sqlx::query(
                "INSERT INTO chunk_embeddings \
                 (tenant_id, chunk_id, document_id, document_version, topic_id, section_id, \
                  chunk_checksum, embedding_model, embedding) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(emb.tenant_id)
            .bind(emb.chunk_id)
            .bind(emb.document_id)
            .bind(emb.document_version)
            .bind(emb.topic_id)
            .bind(emb.section_id)
            .bind(&emb.chunk_checksum)
            .bind(&emb.embedding_model)
            .bind(Vector::from(emb.vector.clone()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            document_id = %key.document_id,
            version = key.document_version,
            replaced = deleted,
            chunks = chunks.len(),
            embeddings = embeddings.len(),
            "replaced document chunk set"
        );
        Ok(())
    }

    async fn chunks_for_version(&self, key: DocumentVersionKey) -> Result<Vec<Chunk>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, topic_id, document_id, document_version, ordinal, \
                    start_page, end_page, char_start, char_end, text, checksum \
             FROM document_chunks \
             WHERE tenant_id = $1 AND document_id = $2 AND document_version = $3 \
             ORDER BY ordinal",
        )
        .bind(key.tenant_id)
        .bind(key.document_id)
        .bind(key.document_version)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(chunk_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_beyond_integer_column_are_rejected() {
        assert_eq!(to_db(42usize, "char_end").ok(), Some(42));
        let too_big = i32::MAX as usize + 1;
        assert!(matches!(to_db(too_big, "char_end"), Err(StoreError::Inconsistent(_))));
        assert!(matches!(to_db(u32::MAX, "ordinal"), Err(StoreError::Inconsistent(_))));
    }

    #[test]
    fn negative_stored_positions_are_rejected() {
        assert_eq!(from_db::<u32>(7, "ordinal").ok(), Some(7));
        assert!(matches!(from_db::<usize>(-1, "char_start"), Err(StoreError::Inconsistent(_))));
        assert!(matches!(from_db::<u32>(-5, "start_page"), Err(StoreError::Inconsistent(_))));
    }
}
