use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quarry_core::config::EmbeddingConfig;

use super::traits::{Embedder, EmbeddingError};

/// Embedder backed by a local Ollama instance (`POST /api/embed`).
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(url: String, model: String, dimensions: usize) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            url: url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::new(
            config.ollama_url.clone(),
            config.model.clone(),
            config.dimensions as usize,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.url)
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    /// Ollama otherwise truncates silently at the model's context length.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct OllamaErrorBody {
    error: String,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .post(self.endpoint())
            .json(&OllamaEmbedRequest {
                model: &self.model,
                input: texts,
                truncate: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OllamaErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(EmbeddingError::Api(format!("{status}: {message}")));
        }

        let parsed: OllamaEmbedResponse = response.json().await?;
        debug!(model = %self.model, count = parsed.embeddings.len(), "ollama embeddings received");
        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_disables_silent_truncation() {
        let body = serde_json::to_value(OllamaEmbedRequest {
            model: "nomic-embed-text",
            input: &["chunk"],
            truncate: false,
        })
        .unwrap();
        assert_eq!(body["truncate"], serde_json::json!(false));
        assert_eq!(body["input"], serde_json::json!(["chunk"]));
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let embedder = OllamaEmbedder::new("http://localhost:11434/".into(), "m".into(), 4);
        assert_eq!(embedder.endpoint(), "http://localhost:11434/api/embed");
    }

    #[test]
    fn response_parses_embeddings() {
        let parsed: OllamaEmbedResponse =
            serde_json::from_str(r#"{"model":"m","embeddings":[[0.1,0.2],[0.3,0.4]]}"#).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
    }
}
