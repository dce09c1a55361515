//! Within-page text splitting.

use std::ops::Range;

/// Splits one page of text into ordered segments.
///
/// Implementations must be deterministic for a fixed input and parameters,
/// keep segment order equal to text order, and bound each segment by
/// `max_chars` characters wherever the text allows it.
pub trait TextSplitter: Send + Sync {
    fn split(&self, text: &str, max_chars: usize, overlap_chars: usize) -> Vec<String>;
}

/// Boundary-aware splitter: paragraphs first, then sentences, then words,
/// hard-splitting only words longer than `max_chars`. Spans are packed
/// greedily into windows and consecutive windows share trailing spans
/// totalling at most `overlap_chars`.
///
/// Every segment is a verbatim, whitespace-trimmed substring of the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundarySplitter;

impl TextSplitter for BoundarySplitter {
    fn split(&self, text: &str, max_chars: usize, overlap_chars: usize) -> Vec<String> {
        let max_chars = max_chars.max(1);
        let overlap_chars = overlap_chars.min(max_chars - 1);
        let spans = atomic_spans(text, max_chars);
        pack_windows(text, &spans, max_chars, overlap_chars)
            .into_iter()
            .map(|r| text[r].to_string())
            .collect()
    }
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Shrink `range` so it neither starts nor ends with whitespace.
fn trim_range(text: &str, range: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[range.clone()];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    if lead == slice.len() {
        return None;
    }
    Some(range.start + lead..range.end - trail)
}

/// Paragraphs are separated by a blank line.
fn paragraph_ranges(text: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (idx, sep) in text.match_indices("\n\n") {
        if let Some(r) = trim_range(text, start..idx) {
            out.push(r);
        }
        start = idx + sep.len();
    }
    if let Some(r) = trim_range(text, start..text.len()) {
        out.push(r);
    }
    out
}

/// Sentence ends at `.`, `!` or `?` followed by whitespace.
pub(crate) fn sentence_ranges(text: &str, within: Range<usize>) -> Vec<Range<usize>> {
    let slice = &text[within.clone()];
    let mut out = Vec::new();
    let mut start = 0;
    let mut iter = slice.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(_, next)) = iter.peek() {
                if next.is_whitespace() {
                    let end = i + c.len_utf8();
                    if let Some(r) = trim_range(text, within.start + start..within.start + end) {
                        out.push(r);
                    }
                    start = end;
                }
            }
        }
    }
    if let Some(r) = trim_range(text, within.start + start..within.end) {
        out.push(r);
    }
    out
}

fn word_ranges(text: &str, within: Range<usize>) -> Vec<Range<usize>> {
    let slice = &text[within.clone()];
    let mut out = Vec::new();
    let mut word_start: Option<usize> = None;
    for (i, c) in slice.char_indices() {
        match (c.is_whitespace(), word_start) {
            (true, Some(s)) => {
                out.push(within.start + s..within.start + i);
                word_start = None;
            }
            (false, None) => word_start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = word_start {
        out.push(within.start + s..within.end);
    }
    out
}

/// Cut `within` into pieces of exactly `max_chars` characters (the last may be shorter).
fn hard_split(text: &str, within: Range<usize>, max_chars: usize) -> Vec<Range<usize>> {
    let slice = &text[within.clone()];
    let mut out = Vec::new();
    let mut piece_start = 0;
    for (n, (i, _)) in slice.char_indices().enumerate() {
        if n > 0 && n % max_chars == 0 {
            out.push(within.start + piece_start..within.start + i);
            piece_start = i;
        }
    }
    out.push(within.start + piece_start..within.end);
    out
}

/// Ordered, non-overlapping spans of at most `max_chars` characters each.
pub(crate) fn atomic_spans(text: &str, max_chars: usize) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    for para in paragraph_ranges(text) {
        if char_len(&text[para.clone()]) <= max_chars {
            spans.push(para);
            continue;
        }
        for sentence in sentence_ranges(text, para) {
            if char_len(&text[sentence.clone()]) <= max_chars {
                spans.push(sentence);
                continue;
            }
            for word in word_ranges(text, sentence) {
                if char_len(&text[word.clone()]) <= max_chars {
                    spans.push(word);
                } else {
                    spans.extend(hard_split(text, word, max_chars));
                }
            }
        }
    }
    spans
}

/// Greedily group consecutive spans into windows of at most `max_chars`
/// characters (measured from the first span's start to the last span's end).
pub(crate) fn pack_windows(
    text: &str,
    spans: &[Range<usize>],
    max_chars: usize,
    overlap_chars: usize,
) -> Vec<Range<usize>> {
    let mut windows = Vec::new();
    let mut first = 0;
    while first < spans.len() {
        let start = spans[first].start;
        let mut last = first;
        while last + 1 < spans.len() && char_len(&text[start..spans[last + 1].end]) <= max_chars {
            last += 1;
        }
        let end = spans[last].end;
        windows.push(start..end);

        if last + 1 >= spans.len() {
            break;
        }

        // Restart at the earliest span whose tail fits in the overlap budget.
        let mut next = last + 1;
        if overlap_chars > 0 {
            for candidate in (first + 1)..=last {
                if char_len(&text[spans[candidate].start..end]) <= overlap_chars {
                    next = candidate;
                    break;
                }
            }
        }
        first = next;
    }
    windows
}
