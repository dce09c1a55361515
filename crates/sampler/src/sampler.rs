use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use quarry_core::config::SamplingConfig;
use quarry_core::{is_present, ChunkEmbedding, CoverageMode, DocumentId, TenantId};
use quarry_store::CorpusReader;

use crate::allocation::{allocate, max_quota};
use crate::error::SamplerError;
use crate::fetch::CandidateFetcher;
use crate::selection::select;
use crate::shape::CorpusShapeAnalyzer;

/// One call to [`Sampler::retrieve_top`].
#[derive(Debug, Clone)]
pub struct SamplingRequest {
    pub tenant_id: TenantId,
    pub document_ids: Vec<DocumentId>,
    pub limit: usize,
    pub coverage_mode: CoverageMode,
    /// Accepted for callers that track prior attempts. Not applied: there is
    /// no exclusion set to filter against yet.
    pub avoid_repeats: bool,
    /// Overrides the sampler's default deadline.
    pub deadline: Option<Duration>,
}

impl SamplingRequest {
    pub fn new(
        tenant_id: TenantId,
        document_ids: Vec<DocumentId>,
        limit: usize,
        coverage_mode: CoverageMode,
    ) -> Self {
        Self {
            tenant_id,
            document_ids,
            limit,
            coverage_mode,
            avoid_repeats: false,
            deadline: None,
        }
    }
}

/// Balanced sampler over one embedding model's vector space.
pub struct Sampler {
    shape: CorpusShapeAnalyzer,
    fetcher: CandidateFetcher,
    embedding_model: String,
    deadline: Duration,
    rng: Mutex<StdRng>,
}

impl Sampler {
    pub fn new(reader: Arc<dyn CorpusReader>, embedding_model: impl Into<String>) -> Self {
        Self {
            shape: CorpusShapeAnalyzer::new(reader.clone()),
            fetcher: CandidateFetcher::new(reader),
            embedding_model: embedding_model.into(),
            deadline: Duration::from_secs(5),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn from_config(
        reader: Arc<dyn CorpusReader>,
        embedding_model: impl Into<String>,
        config: &SamplingConfig,
    ) -> Self {
        Self::new(reader, embedding_model).with_deadline(config.deadline())
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Fix the shuffle seed so repeated runs over the same candidates agree.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Bounded, deduplicated sample of embedding rows for `request`.
    ///
    /// `Focused` and a missing tenant fail immediately. A zero limit or an
    /// empty scope returns `Ok(vec![])` without reading storage. Store errors
    /// are passed through unchanged; running past the deadline fails with
    /// [`SamplerError::DeadlineExceeded`] instead of returning a partial result.
    pub async fn retrieve_top(
        &self,
        request: &SamplingRequest,
    ) -> Result<Vec<ChunkEmbedding>, SamplerError> {
        if request.coverage_mode == CoverageMode::Focused {
            return Err(SamplerError::UnsupportedMode(request.coverage_mode));
        }
        if !is_present(&request.tenant_id) {
            return Err(SamplerError::MissingTenant);
        }
        if request.limit == 0 || request.document_ids.is_empty() {
            debug!(limit = request.limit, "empty sampling scope");
            return Ok(Vec::new());
        }
        if request.avoid_repeats {
            debug!("avoid_repeats requested, no exclusion set is applied");
        }

        let deadline = request.deadline.unwrap_or(self.deadline);
        let selected = tokio::time::timeout(deadline, self.sample(request))
            .await
            .map_err(|_| SamplerError::DeadlineExceeded(deadline))??;

        info!(
            tenant_id = %request.tenant_id,
            mode = %request.coverage_mode,
            limit = request.limit,
            documents = request.document_ids.len(),
            selected = selected.len(),
            "sampling complete"
        );
        Ok(selected)
    }

    async fn sample(&self, request: &SamplingRequest) -> Result<Vec<ChunkEmbedding>, SamplerError> {
        let mut unique = HashSet::new();
        let scope: Vec<DocumentId> = request
            .document_ids
            .iter()
            .copied()
            .filter(|d| unique.insert(*d))
            .collect();

        let shape = self
            .shape
            .shape(request.tenant_id, &self.embedding_model, &scope)
            .await?;
        if shape.is_empty() {
            return Ok(Vec::new());
        }

        let quotas = allocate(&shape, request.limit, request.coverage_mode)?;
        let bound = max_quota(&quotas);
        let candidates = self
            .fetcher
            .fetch(request.tenant_id, &quotas, &self.embedding_model, bound)
            .await?;

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Ok(select(candidates, &quotas, request.limit, &mut *rng))
    }
}
