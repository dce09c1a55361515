use thiserror::Error;

use quarry_core::CoreError;
use quarry_store::StoreError;

use crate::document::ExtractionError;
use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("tenant id is required")]
    MissingTenant,

    #[error(transparent)]
    Policy(#[from] CoreError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store write failed: {0}")]
    Store(#[from] StoreError),
}
