pub mod document;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod segmenter;

pub use document::{extract_file, extract_text, ExtractedDocument, ExtractionError};
pub use embedding::{embedder_from_config, Embedder, EmbeddingBatcher, EmbeddingError};
pub use error::IngestError;
pub use pipeline::{IngestPipeline, IngestReport};
pub use segmenter::{BoundarySplitter, ChunkSegmenter, DocumentTarget, SegmentedChunk, TextSplitter};
