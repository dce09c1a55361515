use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use quarry_core::CoverageMode;

/// Chunk, embed and sample a document corpus.
///
/// Connection and embedding settings come from the environment (or `.env`),
/// see `QUARRY_PROFILE`, `PG_*` and `EMBEDDING_*`.
#[derive(Parser, Debug)]
#[command(name = "quarry", version, about = "Chunk, embed and sample a document corpus")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Segment a pdf/txt/md file and print its chunks as JSON lines.
    Segment {
        file: PathBuf,

        #[command(flatten)]
        chunking: ChunkingArgs,
    },

    /// Segment, embed and store one document version, replacing any
    /// chunks already stored for it.
    Ingest {
        file: PathBuf,

        #[arg(long)]
        tenant: Uuid,

        #[arg(long)]
        document: Uuid,

        #[arg(long, default_value_t = 1)]
        version: i32,

        #[arg(long)]
        topic: Option<Uuid>,

        #[arg(long)]
        section: Option<Uuid>,

        #[command(flatten)]
        chunking: ChunkingArgs,
    },

    /// Draw a balanced sample of stored chunks and print it as JSON lines.
    Sample {
        #[arg(long)]
        tenant: Uuid,

        /// Documents in scope (repeatable).
        #[arg(long = "document", required = true)]
        documents: Vec<Uuid>,

        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// EQUAL_PER_DOCUMENT or PROPORTIONAL_TO_SIZE (defaults to SAMPLING_COVERAGE_MODE).
        #[arg(long)]
        mode: Option<CoverageMode>,

        /// Overall deadline in milliseconds (defaults to SAMPLING_DEADLINE_MS).
        #[arg(long)]
        deadline_ms: Option<u64>,

        #[arg(long)]
        avoid_repeats: bool,

        /// Fixed shuffle seed for reproducible samples.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Overrides for the environment's chunking policy.
#[derive(Args, Debug, Default)]
pub struct ChunkingArgs {
    #[arg(long)]
    pub max_chars: Option<usize>,

    #[arg(long)]
    pub overlap_chars: Option<usize>,

    /// Keep page metadata off the chunks.
    #[arg(long)]
    pub no_page_metadata: bool,
}
