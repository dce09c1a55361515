//! Tests for the segmentation engine.

use quarry_core::{content_checksum, ChunkingPolicy};
use uuid::Uuid;

use super::engine::ChunkSegmenter;
use super::splitter::TextSplitter;
use super::types::{DocumentTarget, SegmentedChunk};
use crate::error::IngestError;

fn policy(max: usize, overlap: usize) -> ChunkingPolicy {
    ChunkingPolicy {
        max_chunk_size_chars: max,
        overlap_size_chars: overlap,
        trim_whitespace: true,
        include_page_metadata: true,
    }
}

fn segment(pages: &[&str], policy: &ChunkingPolicy) -> Vec<SegmentedChunk> {
    let pages: Vec<Option<&str>> = pages.iter().map(|p| Some(*p)).collect();
    ChunkSegmenter::new().segment(&pages, policy)
}

fn substring(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end - start).collect()
}

// ── Cross-page overlap ──────────────────────────────────────────────

#[test]
fn last_chunk_of_page_carries_head_of_next_page() {
    let chunks = segment(&["AAAA", "BBBB"], &policy(100, 2));
    assert_eq!(chunks.len(), 2);

    let first = &chunks[0];
    assert_eq!(first.text, "AAAABB");
    assert_eq!(first.start_page, Some(1));
    assert_eq!(first.end_page, Some(2));
    assert_eq!(first.char_start, 0);
    assert_eq!(first.char_end, 2, "end offset is measured within the next page");
    assert_eq!(first.checksum, content_checksum("AAAABB"));
    assert_ne!(first.checksum, content_checksum("AAAA"));

    let second = &chunks[1];
    assert_eq!(second.text, "BBBB");
    assert_eq!((second.start_page, second.end_page), (Some(2), Some(2)));
    assert_eq!((second.char_start, second.char_end), (0, 4));
}

#[test]
fn overlap_never_flows_backward_into_next_page() {
    let chunks = segment(&["first page", "second page"], &policy(100, 4));
    assert_eq!(chunks[1].text, "second page");
    assert_eq!(chunks[1].char_start, 0);
}

#[test]
fn carried_text_is_bounded_by_next_page_length() {
    let chunks = segment(&["AAAA", "BB"], &policy(100, 10));
    assert_eq!(chunks[0].text, "AAAABB");
    assert_eq!(chunks[0].char_end, 2);
}

#[test]
fn only_last_segment_of_page_is_extended() {
    let page_one = "aa bb cc dd ee ff";
    let chunks = segment(&[page_one, "ZZZZ"], &policy(8, 2));
    let page_one_chunks: Vec<_> = chunks.iter().filter(|c| c.start_page == Some(1)).collect();
    assert!(page_one_chunks.len() > 1);
    for c in &page_one_chunks[..page_one_chunks.len() - 1] {
        assert_eq!(c.end_page, Some(1));
        assert!(!c.text.contains('Z'));
    }
    let last = page_one_chunks.last().unwrap();
    assert_eq!(last.end_page, Some(2));
    assert!(last.text.ends_with("ZZ"));
}

#[test]
fn zero_overlap_never_spans_pages() {
    let chunks = segment(&["AAAA", "BBBB"], &policy(100, 0));
    assert_eq!(chunks[0].text, "AAAA");
    assert_eq!(chunks[0].end_page, Some(1));
}

#[test]
fn empty_next_page_does_not_extend() {
    let chunks = segment(&["AAAA", "   ", "CCCC"], &policy(100, 2));
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, "AAAA");
    assert_eq!(chunks[0].end_page, Some(1));
    assert_eq!(chunks[1].start_page, Some(3));
}

// ── Offsets and ordinals ────────────────────────────────────────────

#[test]
fn offsets_round_trip_for_single_page_chunks() {
    let pages = [
        "Introduction. This document explains the thing.\n\nIt has paragraphs! \
         Some are long enough to be split into more than one segment, which \
         exercises the overlap logic.",
        "  Ünïcödé page with àccents and more words to split across windows.  ",
        "Short.",
    ];
    let p = policy(40, 10);
    let chunks = segment(&pages, &p);
    assert!(chunks.len() > 4);

    for c in chunks.iter().filter(|c| c.start_page == c.end_page) {
        let page = pages[c.start_page.unwrap() as usize - 1].trim();
        assert_eq!(substring(page, c.char_start, c.char_end), c.text, "chunk {}", c.ordinal);
    }
}

#[test]
fn repeated_text_maps_to_the_copy_it_was_carved_from() {
    let chunks = segment(&["ab ab ab"], &policy(5, 0));
    let ranges: Vec<(usize, usize)> = chunks.iter().map(|c| (c.char_start, c.char_end)).collect();
    assert_eq!(ranges, vec![(0, 5), (6, 8)]);

    let chunks = segment(&["x x x x"], &policy(3, 0));
    let ranges: Vec<(usize, usize)> = chunks.iter().map(|c| (c.char_start, c.char_end)).collect();
    assert_eq!(ranges, vec![(0, 3), (4, 7)]);
}

#[test]
fn repeated_rows_keep_ranges_ordered_with_overlap() {
    let page = "row row row row row row row row";
    let chunks = segment(&[page], &policy(11, 4));
    assert!(chunks.len() > 2);
    for pair in chunks.windows(2) {
        assert!(pair[1].char_start > pair[0].char_start);
        assert!(pair[1].char_start + 4 >= pair[0].char_end, "overlap exceeds budget");
    }
    for c in &chunks {
        assert_eq!(substring(page, c.char_start, c.char_end), c.text);
    }
}

#[test]
fn ordinals_are_contiguous_from_one() {
    let long = (0..300).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    let chunks = segment(&[long.as_str(), "", long.as_str(), "tail"], &policy(60, 15));
    let ordinals: Vec<u32> = chunks.iter().map(|c| c.ordinal).collect();
    let expected: Vec<u32> = (1..=chunks.len() as u32).collect();
    assert_eq!(ordinals, expected);
}

#[test]
fn checksum_matches_final_text() {
    let chunks = segment(&["alpha beta gamma", "delta"], &policy(10, 3));
    for c in &chunks {
        assert_eq!(c.checksum, content_checksum(&c.text));
    }
}

// ── Page handling ───────────────────────────────────────────────────

#[test]
fn empty_and_missing_pages_yield_no_chunks() {
    let pages: Vec<Option<&str>> = vec![None, Some(""), Some("content"), None];
    let chunks = ChunkSegmenter::new().segment(&pages, &policy(100, 0));
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].start_page, Some(3));
}

#[test]
fn page_metadata_can_be_disabled() {
    let p = ChunkingPolicy {
        include_page_metadata: false,
        ..policy(100, 2)
    };
    let chunks = segment(&["AAAA", "BBBB"], &p);
    assert!(chunks.iter().all(|c| c.start_page.is_none() && c.end_page.is_none()));
    // Offsets are still computed.
    assert_eq!(chunks[0].char_end, 2);
    assert_eq!(chunks[1].char_end, 4);
}

#[test]
fn untrimmed_policy_keeps_leading_whitespace_offsets() {
    let p = ChunkingPolicy {
        trim_whitespace: false,
        ..policy(100, 0)
    };
    let chunks = segment(&["   padded"], &p);
    assert_eq!(chunks[0].text, "padded");
    assert_eq!(chunks[0].char_start, 3);
    assert_eq!(chunks[0].char_end, 9);
}

#[test]
fn same_input_same_output() {
    let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(30);
    let p = policy(120, 30);
    let pages = [text.as_str(), text.as_str()];
    assert_eq!(segment(&pages, &p), segment(&pages, &p));
}

// ── Offset lookup fallback ──────────────────────────────────────────

/// Emits segments that never occur verbatim in the page.
struct ShoutingSplitter;

impl TextSplitter for ShoutingSplitter {
    fn split(&self, text: &str, _max_chars: usize, _overlap_chars: usize) -> Vec<String> {
        text.split_whitespace().map(|w| w.to_uppercase()).collect()
    }
}

#[test]
fn lookup_miss_falls_back_to_cursor() {
    let segmenter = ChunkSegmenter::with_splitter(ShoutingSplitter);
    let chunks = segmenter.segment(&[Some("abc def ghi")], &policy(100, 0));
    assert_eq!(chunks.len(), 3);
    let starts: Vec<usize> = chunks.iter().map(|c| c.char_start).collect();
    assert_eq!(starts, vec![0, 3, 6], "cursor moves past each unmatched segment");
    assert_eq!(chunks[1].text, "DEF");
}

/// Emits the page's words, then a whitespace-only tail segment.
struct TrailingBlankSplitter;

impl TextSplitter for TrailingBlankSplitter {
    fn split(&self, text: &str, _max_chars: usize, _overlap_chars: usize) -> Vec<String> {
        let mut out: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        out.push("   ".to_string());
        out
    }
}

#[test]
fn blank_tail_segment_does_not_block_carry() {
    let segmenter = ChunkSegmenter::with_splitter(TrailingBlankSplitter);
    let chunks = segmenter.segment(&[Some("aa bb"), Some("CCCC")], &policy(100, 2));
    assert_eq!(chunks[1].text, "bbCC");
    assert_eq!(chunks[1].end_page, Some(2));
    assert_eq!(chunks[0].end_page, Some(1));
}

// ── Document binding ────────────────────────────────────────────────

#[test]
fn segment_document_binds_identity() {
    let target = DocumentTarget {
        tenant_id: Uuid::new_v4(),
        topic_id: Some(Uuid::new_v4()),
        section_id: None,
        document_id: Uuid::new_v4(),
        document_version: 7,
    };
    let chunks = ChunkSegmenter::new()
        .segment_document(&target, &[Some("one"), Some("two")], &policy(100, 0))
        .unwrap();
    assert_eq!(chunks.len(), 2);
    for c in &chunks {
        assert_eq!(c.tenant_id, target.tenant_id);
        assert_eq!(c.document_id, target.document_id);
        assert_eq!(c.document_version, 7);
        assert_eq!(c.topic_id, target.topic_id);
    }
    assert_ne!(chunks[0].id, chunks[1].id);
}

#[test]
fn segment_document_requires_tenant() {
    let target = DocumentTarget {
        tenant_id: Uuid::nil(),
        topic_id: None,
        section_id: None,
        document_id: Uuid::new_v4(),
        document_version: 1,
    };
    let err = ChunkSegmenter::new()
        .segment_document(&target, &[Some("text")], &policy(100, 0))
        .unwrap_err();
    assert!(matches!(err, IngestError::MissingTenant));
}
