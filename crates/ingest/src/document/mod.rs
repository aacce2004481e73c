pub mod chunker;
mod pdf;

use std::path::Path;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF extraction failed for '{document}': {reason}")]
    Pdf { document: String, reason: String },
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// An uploaded PDF. Lives only for the duration of one ingestion call.
#[derive(Debug, Clone)]
pub struct Document {
    /// Display name (usually the file name).
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a document from disk, naming it after the file.
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

/// A page of extracted text.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number.
    pub page_number: usize,
    pub text: String,
}

/// Result of extracting text from one document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub filename: String,
    pub pages: Vec<PageContent>,
}

impl ExtractedDocument {
    /// All page text concatenated in page order, with no separator.
    pub fn full_text(&self) -> String {
        self.pages.iter().map(|p| p.text.as_str()).collect()
    }

    /// Total character count across all pages.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Extract every page of one PDF.
pub fn extract_document(doc: &Document) -> Result<ExtractedDocument, ExtractionError> {
    let pages = pdf::extract_pdf(&doc.bytes).map_err(|reason| ExtractionError::Pdf {
        document: doc.name.clone(),
        reason,
    })?;
    Ok(ExtractedDocument {
        filename: doc.name.clone(),
        pages,
    })
}

/// Extract and concatenate the text of every page of every document, in
/// order and without separators. The first unreadable document fails the
/// whole batch.
pub fn extract_text(docs: &[Document]) -> Result<String, ExtractionError> {
    let mut raw = String::new();
    for doc in docs {
        let extracted = extract_document(doc)?;
        info!(
            "Extracted '{}': {} pages, {} chars",
            extracted.filename,
            extracted.pages.len(),
            extracted.total_chars(),
        );
        raw.push_str(&extracted.full_text());
    }
    Ok(raw)
}

/// Tiny PDF generator for tests in this and downstream crates.
#[cfg(any(test, feature = "test-util"))]
pub mod test_pdf {
    /// Build a minimal single-font PDF with one page per entry of `pages`.
    /// Offsets in the xref table are computed exactly so strict parsers
    /// accept the file.
    pub fn build(pages: &[&str]) -> Vec<u8> {
        let n = pages.len();
        // Object numbering: 1 catalog, 2 pages, 3 font, then (page, content) pairs.
        let mut objects: Vec<String> = Vec::new();
        let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", 4 + 2 * i)).collect();
        objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
        objects.push(format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            n
        ));
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());
        for (i, text) in pages.iter().enumerate() {
            let content_id = 5 + 2 * i;
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
            ));
            let stream = if text.is_empty() {
                "BT ET".to_string()
            } else {
                format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET")
            };
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ));
        }

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
        }
        let xref_at = out.len();
        out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
        out.push_str("0000000000 65535 f \n");
        for off in offsets {
            out.push_str(&format!("{off:010} 00000 n \n"));
        }
        out.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        ));
        out.into_bytes()
    }
}
