//! Raw file → ordered page texts.

mod md;
mod pdf;
mod txt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of extracting text from a document: page texts in page order.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Original filename.
    pub filename: String,
    /// File type: "pdf", "txt", "md"
    pub file_type: String,
    /// Page texts; index 0 is page 1. Blank pages are kept so page numbers
    /// stay aligned with the source.
    pub pages: Vec<String>,
}

impl ExtractedDocument {
    /// Pages in the shape the segmenter consumes.
    pub fn page_slices(&self) -> Vec<Option<&str>> {
        self.pages.iter().map(|p| Some(p.as_str())).collect()
    }

    /// Total character count across all pages.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.chars().count()).sum()
    }
}

/// Extract text from file bytes based on file type.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, ExtractionError> {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    let file_type = ext.as_str();

    let pages = match file_type {
        "pdf" => pdf::extract_pdf(bytes)?,
        "txt" | "text" => txt::extract_txt(bytes),
        "md" | "markdown" => md::extract_md(bytes),
        other => return Err(ExtractionError::UnsupportedType(other.to_string())),
    };

    Ok(ExtractedDocument {
        filename: filename.to_string(),
        file_type: file_type.to_string(),
        pages,
    })
}

/// Read a file from disk and extract it.
pub fn extract_file(path: &std::path::Path) -> Result<ExtractedDocument, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    extract_text(&bytes, &filename)
}

pub(crate) fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_extension() {
        let doc = extract_text(b"hello", "notes.TXT").unwrap();
        assert_eq!(doc.file_type, "txt");
        assert_eq!(doc.pages, vec!["hello"]);
        assert_eq!(doc.total_chars(), 5);
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = extract_text(b"", "slides.pptx").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(t) if t == "pptx"));
    }
}
