use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use quarry_core::config::EmbeddingConfig;

use super::traits::{Embedder, EmbeddingError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI-compatible embedding backend (`POST /v1/embeddings`).
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            model,
            base_url: base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            dimensions,
        }
    }

    /// Requires `OPENAI_API_KEY`.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| EmbeddingError::NotConfigured("OPENAI_API_KEY is not set".into()))?;
        Ok(Self::new(
            api_key,
            config.model.clone(),
            config.openai_base_url.clone(),
            config.dimensions as usize,
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Vectors in input order. Every input index must appear exactly once.
fn into_ordered(mut resp: EmbedResponse, sent: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    resp.data.sort_by_key(|item| item.index);
    let in_order = resp.data.iter().enumerate().all(|(i, item)| item.index == i);
    if resp.data.len() != sent || !in_order {
        return Err(EmbeddingError::CountMismatch {
            sent,
            received: resp.data.len(),
        });
    }
    Ok(resp.data.into_iter().map(|item| item.embedding).collect())
}

/// Prefer the provider's `error.message` over the raw body.
fn api_error(status: reqwest::StatusCode, body: &str) -> EmbeddingError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => EmbeddingError::Api(format!("{status}: {}", parsed.error.message)),
        Err(_) => EmbeddingError::Api(format!("{status}: {body}")),
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        into_ordered(response.json().await?, texts.len())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
