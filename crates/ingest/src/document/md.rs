use super::decode_utf8;

/// Markdown is one page; headings stay inline so the segmenter sees them.
pub fn extract_md(bytes: &[u8]) -> Vec<String> {
    vec![decode_utf8(bytes)]
}
