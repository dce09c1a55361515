use super::decode_utf8;

/// Plain text has no page structure: form feeds, when present, separate pages.
pub fn extract_txt(bytes: &[u8]) -> Vec<String> {
    decode_utf8(bytes).split('\x0C').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page_without_form_feed() {
        let pages = extract_txt(b"Hello, world!\nThis is a test file.");
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("Hello, world!"));
    }

    #[test]
    fn form_feed_separates_pages() {
        let pages = extract_txt(b"page one\x0Cpage two\x0C");
        assert_eq!(pages, vec!["page one", "page two", ""]);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let pages = extract_txt(&[b'o', b'k', 0xFF]);
        assert!(pages[0].starts_with("ok"));
    }
}
