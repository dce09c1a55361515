use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policy::ChunkingPolicy;
use crate::sampling::CoverageMode;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub postgres: PostgresConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingPolicy,
    pub sampling: SamplingConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `QUARRY_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("QUARRY_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            postgres: PostgresConfig::from_env_profiled(p),
            embedding: EmbeddingConfig::from_env_profiled(p),
            chunking: chunking_from_env_profiled(p),
            sampling: SamplingConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  postgres:    host={}, db={}", self.postgres.host, self.postgres.database);
        tracing::info!(
            "  embedding:   provider={}, model={}, dims={}",
            self.embedding.provider,
            self.embedding.model,
            self.embedding.dimensions
        );
        tracing::info!(
            "  chunking:    max_chars={}, overlap_chars={}, trim={}, pages={}",
            self.chunking.max_chunk_size_chars,
            self.chunking.overlap_size_chars,
            self.chunking.trim_whitespace,
            self.chunking.include_page_metadata
        );
        tracing::info!(
            "  sampling:    deadline={:?}, mode={}",
            self.sampling.deadline(),
            self.sampling.coverage_mode
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "postgres": {
                "host": self.postgres.host,
                "port": self.postgres.port,
                "database": self.postgres.database,
                "configured": self.postgres.is_configured(),
            },
            "embedding": {
                "provider": self.embedding.provider,
                "model": self.embedding.model,
                "dimensions": self.embedding.dimensions,
                "configured": self.embedding.is_configured(),
            },
            "chunking": self.chunking,
            "sampling": {
                "deadline_ms": self.sampling.deadline_ms,
                "coverage_mode": self.sampling.coverage_mode,
            },
        })
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl PostgresConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "PG_HOST", "localhost"),
            port: profiled_env_parse(p, "PG_PORT", 5432),
            database: profiled_env_or(p, "PG_DATABASE", "quarry"),
            username: profiled_env_opt(p, "PG_USERNAME"),
            password: profiled_env_opt(p, "PG_PASSWORD"),
            ssl_mode: profiled_env_or(p, "PG_SSL_MODE", "prefer"),
            max_connections: profiled_env_parse(p, "PG_MAX_CONNECTIONS", 10),
        }
    }

    pub fn connection_string(&self) -> String {
        let user = self.username.as_deref().unwrap_or("postgres");
        let pass = self.password.as_deref().unwrap_or("");
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            user, pass, self.host, self.port, self.database, self.ssl_mode
        )
    }

    pub fn is_configured(&self) -> bool {
        self.username.is_some()
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Model identifier; also scopes which embedding rows a sampler pools.
    pub model: String,
    pub dimensions: u32,
    pub batch_size: u32,
    /// Capacity of the checksum-keyed embedding cache used during ingestion.
    pub cache_size: u32,
    pub ollama_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
}

impl EmbeddingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "EMBEDDING_PROVIDER", "ollama"),
            model: profiled_env_or(p, "EMBEDDING_MODEL", "nomic-embed-text"),
            dimensions: profiled_env_parse(p, "EMBEDDING_DIMENSIONS", 768),
            batch_size: profiled_env_parse(p, "EMBEDDING_BATCH_SIZE", 64),
            cache_size: profiled_env_parse(p, "EMBEDDING_CACHE_SIZE", 4096),
            ollama_url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Chunking ──────────────────────────────────────────────────

fn chunking_from_env_profiled(p: &str) -> ChunkingPolicy {
    let defaults = ChunkingPolicy::default();
    ChunkingPolicy {
        max_chunk_size_chars: profiled_env_parse(p, "CHUNK_MAX_CHARS", defaults.max_chunk_size_chars),
        overlap_size_chars: profiled_env_parse(p, "CHUNK_OVERLAP_CHARS", defaults.overlap_size_chars),
        trim_whitespace: profiled_env_bool(p, "CHUNK_TRIM_WHITESPACE", defaults.trim_whitespace),
        include_page_metadata: profiled_env_bool(
            p,
            "CHUNK_INCLUDE_PAGE_METADATA",
            defaults.include_page_metadata,
        ),
    }
}

// ── Sampling ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Overall budget for one sampling call.
    pub deadline_ms: u64,
    pub coverage_mode: CoverageMode,
}

impl SamplingConfig {
    fn from_env_profiled(p: &str) -> Self {
        let coverage_mode = profiled_env_opt(p, "SAMPLING_COVERAGE_MODE")
            .and_then(|v| match v.parse() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    tracing::warn!("{e}, falling back to EQUAL_PER_DOCUMENT");
                    None
                }
            })
            .unwrap_or(CoverageMode::EqualPerDocument);
        Self {
            deadline_ms: profiled_env_parse(p, "SAMPLING_DEADLINE_MS", 5000),
            coverage_mode,
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}
