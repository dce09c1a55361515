//! Page-aware chunk segmentation.
//!
//! Turns one document version's ordered page texts into ordinal-numbered,
//! checksummed chunks with page and character provenance. A page's last chunk
//! may be extended with the head of the following page.

mod engine;
mod splitter;
mod types;

pub use engine::ChunkSegmenter;
pub use splitter::{BoundarySplitter, TextSplitter};
pub use types::{DocumentTarget, SegmentedChunk};

#[cfg(test)]
mod tests;
