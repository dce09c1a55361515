use std::time::Duration;

use thiserror::Error;

use quarry_core::CoverageMode;
use quarry_store::StoreError;

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("tenant id is required")]
    MissingTenant,

    #[error("coverage mode {0} is unsupported: requires query embedding")]
    UnsupportedMode(CoverageMode),

    #[error("sampling did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SamplerError {
    /// Whether the same request may succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            SamplerError::DeadlineExceeded(_) => true,
            SamplerError::Store(e) => e.is_transient(),
            SamplerError::MissingTenant | SamplerError::UnsupportedMode(_) => false,
        }
    }
}
