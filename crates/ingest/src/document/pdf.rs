use super::ExtractionError;

/// pdf-extract returns all text as one string with form feeds between pages.
/// Blank pages are kept so page numbers match the PDF.
pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    if text.trim().is_empty() {
        tracing::warn!("PDF has no text layer (scanned or image-only)");
        return Ok(Vec::new());
    }

    let mut pages: Vec<String> = text.split('\x0C').map(str::to_string).collect();
    // A trailing form feed produces an empty tail that is not a real page.
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    Ok(pages)
}
