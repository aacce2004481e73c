use std::panic;

use super::PageContent;

/// Extract per-page text from PDF bytes, one entry per page in page order.
///
/// Pages without a text layer come back empty; no OCR is attempted, so a
/// scanned PDF yields blank text rather than an error.
pub(super) fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageContent>, String> {
    // The parser panics on some malformed inputs instead of returning Err.
    let pages = match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => return Err(e.to_string()),
        Err(_) => return Err("PDF parser aborted on malformed input".to_string()),
    };

    if pages.iter().all(|p| p.trim().is_empty()) {
        tracing::warn!("PDF contains no extractable text (no text layer?)");
    }

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageContent {
            page_number: i + 1,
            text,
        })
        .collect())
}
