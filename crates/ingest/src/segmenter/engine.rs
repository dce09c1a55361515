//! The segmentation algorithm: split pages, locate offsets, carry cross-page
//! overlap, number and checksum the result.

use tracing::warn;

use quarry_core::{content_checksum, is_present, Chunk, ChunkingPolicy};

use super::splitter::{char_len, BoundarySplitter, TextSplitter};
use super::types::{DocumentTarget, SegmentedChunk};
use crate::error::IngestError;

/// Deterministic page-aware segmenter. Pure: no I/O, no shared state.
pub struct ChunkSegmenter {
    splitter: Box<dyn TextSplitter>,
}

impl Default for ChunkSegmenter {
    fn default() -> Self {
        Self::with_splitter(BoundarySplitter)
    }
}

impl ChunkSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_splitter(splitter: impl TextSplitter + 'static) -> Self {
        Self {
            splitter: Box::new(splitter),
        }
    }

    /// Segment ordered pages (page 1 first). `None` pages count as empty.
    pub fn segment<S: AsRef<str>>(
        &self,
        pages: &[Option<S>],
        policy: &ChunkingPolicy,
    ) -> Vec<SegmentedChunk> {
        let prepared: Vec<&str> = pages
            .iter()
            .map(|p| {
                let text = p.as_ref().map(|s| s.as_ref()).unwrap_or("");
                if policy.trim_whitespace { text.trim() } else { text }
            })
            .collect();

        let mut out = Vec::new();
        let mut ordinal = 0u32;

        for (idx, page) in prepared.iter().enumerate() {
            if page.is_empty() {
                continue;
            }
            let page_number = idx as u32 + 1;
            let segments: Vec<String> = self
                .splitter
                .split(page, policy.max_chunk_size_chars, policy.overlap_size_chars)
                .into_iter()
                .map(|raw| if policy.trim_whitespace { raw.trim().to_string() } else { raw })
                .filter(|segment| !segment.is_empty())
                .collect();
            let last_index = segments.len().saturating_sub(1);
            let mut cursor = PageCursor::default();

            for (i, segment) in segments.iter().enumerate() {
                let char_start =
                    cursor.locate(page, segment, policy.overlap_size_chars, page_number);
                let mut char_end = (char_start + char_len(segment)).min(cursor.page_chars(page));
                let mut text = segment.clone();
                let mut end_page = page_number;

                if i == last_index && policy.overlap_size_chars > 0 {
                    if let Some(next) = prepared.get(idx + 1) {
                        let carried: String = next.chars().take(policy.overlap_size_chars).collect();
                        if !carried.is_empty() {
                            char_end = char_len(&carried);
                            text.push_str(&carried);
                            end_page = page_number + 1;
                        }
                    }
                }

                ordinal += 1;
                let (start_page, end_page) = if policy.include_page_metadata {
                    (Some(page_number), Some(end_page))
                } else {
                    (None, None)
                };
                out.push(SegmentedChunk {
                    ordinal,
                    start_page,
                    end_page,
                    char_start,
                    char_end,
                    checksum: content_checksum(&text),
                    text,
                });
            }
        }
        out
    }

    /// Segment pages for `target`, assigning fresh chunk ids.
    pub fn segment_document<S: AsRef<str>>(
        &self,
        target: &DocumentTarget,
        pages: &[Option<S>],
        policy: &ChunkingPolicy,
    ) -> Result<Vec<Chunk>, IngestError> {
        if !is_present(&target.tenant_id) {
            return Err(IngestError::MissingTenant);
        }
        Ok(self
            .segment(pages, policy)
            .into_iter()
            .map(|s| s.into_chunk(target))
            .collect())
    }
}

/// Forward-only search position within one page, tracked in bytes and chars.
#[derive(Default)]
struct PageCursor {
    byte: usize,
    chars: usize,
    total_chars: Option<usize>,
}

impl PageCursor {
    fn page_chars(&mut self, page: &str) -> usize {
        *self.total_chars.get_or_insert_with(|| char_len(page))
    }

    /// Char offset of `segment`, searching from the cursor. A miss falls back
    /// to the cursor position. The cursor then moves past the segment, less the
    /// `overlap_chars` the next segment may share with it, and always at least
    /// one char.
    fn locate(&mut self, page: &str, segment: &str, overlap_chars: usize, page_number: u32) -> usize {
        let start_byte = match page[self.byte..].find(segment) {
            Some(rel) => self.byte + rel,
            None => {
                warn!(
                    page = page_number,
                    offset = self.chars,
                    "segment not found verbatim in page text, using cursor position"
                );
                self.byte
            }
        };

        let start_chars = self.chars + char_len(&page[self.byte..start_byte]);
        let advance = char_len(segment).saturating_sub(overlap_chars).max(1);
        let (mut byte, mut chars) = (start_byte, start_chars);
        for c in page[start_byte..].chars().take(advance) {
            byte += c.len_utf8();
            chars += 1;
        }
        self.byte = byte;
        self.chars = chars;
        start_chars
    }
}
