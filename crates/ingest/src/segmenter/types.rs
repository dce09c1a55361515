//! Segmentation output and target types.

use serde::Serialize;
use uuid::Uuid;

use quarry_core::{
    Chunk, DocumentId, DocumentVersion, SectionId, TenantId, TopicId,
};

// ── Target ──────────────────────────────────────────────────────────────────

/// The document version a chunk set is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentTarget {
    pub tenant_id: TenantId,
    pub topic_id: Option<TopicId>,
    pub section_id: Option<SectionId>,
    pub document_id: DocumentId,
    pub document_version: DocumentVersion,
}

// ── Segment output ──────────────────────────────────────────────────────────

/// A chunk before it is bound to a document: everything the segmentation
/// algorithm decides on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentedChunk {
    /// 1-based, contiguous across the whole document.
    pub ordinal: u32,
    /// Absent when page metadata is disabled.
    pub start_page: Option<u32>,
    /// `start_page + 1` when the chunk carries the head of the next page.
    pub end_page: Option<u32>,
    pub char_start: usize,
    pub char_end: usize,
    pub text: String,
    pub checksum: String,
}

impl SegmentedChunk {
    pub fn into_chunk(self, target: &DocumentTarget) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            tenant_id: target.tenant_id,
            topic_id: target.topic_id,
            document_id: target.document_id,
            document_version: target.document_version,
            ordinal: self.ordinal,
            start_page: self.start_page,
            end_page: self.end_page,
            char_start: self.char_start,
            char_end: self.char_end,
            text: self.text,
            checksum: self.checksum,
        }
    }
}
