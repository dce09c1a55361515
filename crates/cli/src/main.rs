mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use quarry_core::{ChunkingPolicy, Config};
use quarry_ingest::{
    embedder_from_config, extract_file, ChunkSegmenter, DocumentTarget, EmbeddingBatcher,
    IngestPipeline,
};
use quarry_sampler::{Sampler, SamplingRequest};
use quarry_store::{init_pg_pool, PgCorpusStore};

use crate::cli::{ChunkingArgs, CliArgs, Command};

fn load_config() -> Config {
    quarry_core::config::load_dotenv();
    Config::from_env()
}

fn chunking_policy(config: &Config, args: &ChunkingArgs) -> Result<ChunkingPolicy> {
    let mut policy = config.chunking.clone();
    if let Some(max) = args.max_chars {
        policy.max_chunk_size_chars = max;
    }
    if let Some(overlap) = args.overlap_chars {
        policy.overlap_size_chars = overlap;
    }
    if args.no_page_metadata {
        policy.include_page_metadata = false;
    }
    policy.validate().context("invalid chunking policy")?;
    Ok(policy)
}

async fn connect_store(config: &Config) -> Result<Arc<PgCorpusStore>> {
    let pool = init_pg_pool(&config.postgres)
        .await
        .context("failed to connect to PostgreSQL")?;
    Ok(Arc::new(PgCorpusStore::new(pool)))
}

fn segment(config: &Config, file: &Path, args: &ChunkingArgs) -> Result<()> {
    let policy = chunking_policy(config, args)?;
    let document = extract_file(file).with_context(|| format!("failed to read {}", file.display()))?;
    info!(
        file = %document.filename,
        pages = document.pages.len(),
        chars = document.total_chars(),
        "document extracted"
    );

    let chunks = ChunkSegmenter::new().segment(&document.page_slices(), &policy);
    for chunk in &chunks {
        println!("{}", serde_json::to_string(chunk)?);
    }
    info!(chunks = chunks.len(), "segmentation complete");
    Ok(())
}

async fn ingest(
    config: &Config,
    file: &Path,
    target: DocumentTarget,
    args: &ChunkingArgs,
) -> Result<()> {
    let policy = chunking_policy(config, args)?;
    let document = extract_file(file).with_context(|| format!("failed to read {}", file.display()))?;

    let embedder = embedder_from_config(&config.embedding)?;
    let batcher = EmbeddingBatcher::new(
        embedder,
        config.embedding.batch_size as usize,
        config.embedding.cache_size as usize,
    );
    let store = connect_store(config).await?;
    let mut pipeline = IngestPipeline::new(store, batcher);
    info!(
        file = %document.filename,
        pages = document.pages.len(),
        model = pipeline.embedding_model(),
        "ingesting document"
    );

    let report = pipeline
        .ingest_version(&target, &document.page_slices(), &policy)
        .await
        .with_context(|| format!("failed to ingest {}", file.display()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn sample(config: &Config, request: SamplingRequest, seed: Option<u64>) -> Result<()> {
    let store = connect_store(config).await?;
    let mut sampler = Sampler::from_config(store, config.embedding.model.clone(), &config.sampling);
    if let Some(seed) = seed {
        sampler = sampler.with_seed(seed);
    }

    let rows = sampler.retrieve_top(&request).await?;
    info!(model = sampler.embedding_model(), rows = rows.len(), "sampling complete");
    for row in &rows {
        let line = serde_json::json!({
            "chunk_id": row.chunk_id,
            "document_id": row.document_id,
            "document_version": row.document_version,
            "topic_id": row.topic_id,
            "section_id": row.section_id,
            "chunk_checksum": row.chunk_checksum,
            "embedding_model": row.embedding_model,
        });
        println!("{line}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config();

    match args.command {
        Command::Segment { file, chunking } => segment(&config, &file, &chunking),
        Command::Ingest {
            file,
            tenant,
            document,
            version,
            topic,
            section,
            chunking,
        } => {
            config.log_summary();
            let target = DocumentTarget {
                tenant_id: tenant,
                topic_id: topic,
                section_id: section,
                document_id: document,
                document_version: version,
            };
            ingest(&config, &file, target, &chunking).await
        }
        Command::Sample {
            tenant,
            documents,
            limit,
            mode,
            deadline_ms,
            avoid_repeats,
            seed,
        } => {
            config.log_summary();
            let request = SamplingRequest {
                tenant_id: tenant,
                document_ids: documents,
                limit,
                coverage_mode: mode.unwrap_or(config.sampling.coverage_mode),
                avoid_repeats,
                deadline: deadline_ms.map(Duration::from_millis),
            };
            sample(&config, request, seed).await
        }
    }
}
