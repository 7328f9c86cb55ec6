// Document loading: strict UTF-8 text files and PDF text extraction.
use std::fs;
use std::path::Path;

use crate::error::{SummaryError, SummaryResult};

/// Where the document text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    PlainText,
    PdfExtracted,
}

/// Raw book text. Guaranteed to contain at least one non-whitespace character.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    kind: SourceKind,
}

impl Document {
    pub fn new(text: impl Into<String>, kind: SourceKind) -> SummaryResult<Self> {
        let mut text = text.into();
        if text.starts_with('\u{feff}') {
            text.drain(..'\u{feff}'.len_utf8());
        }
        if text.trim().is_empty() {
            return Err(SummaryError::Input(
                "document is empty or contains no extractable text".to_string(),
            ));
        }
        Ok(Self { text, kind })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }
}

pub fn load_document(path: &Path) -> SummaryResult<Document> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    let (text, kind) = match ext.as_str() {
        "txt" | "md" => (read_text_file(path)?, SourceKind::PlainText),
        "pdf" => (read_pdf_text(path)?, SourceKind::PdfExtracted),
        _ => {
            return Err(SummaryError::Input(format!(
                "unsupported file format {:?} for {}",
                ext,
                path.display()
            )))
        }
    };

    let doc = Document::new(text, kind).map_err(|_| {
        SummaryError::Input(format!(
            "{} is empty or contains no extractable text",
            path.display()
        ))
    })?;
    tracing::info!(path = %path.display(), kind = ?doc.kind(), chars = doc.text().chars().count(), "loaded document");
    Ok(doc)
}

fn read_text_file(path: &Path) -> SummaryResult<String> {
    let bytes = fs::read(path).map_err(|e| SummaryError::io(path, e))?;
    String::from_utf8(bytes).map_err(|e| SummaryError::Encoding {
        path: path.to_path_buf(),
        offset: e.utf8_error().valid_up_to(),
    })
}

fn read_pdf_text(path: &Path) -> SummaryResult<String> {
    let raw = pdf_extract::extract_text(path)
        .map_err(|e| SummaryError::Input(format!("PDF extraction failed for {}: {}", path.display(), e)))?;
    Ok(join_pages(&raw))
}

// pdf-extract separates pages with form feeds; keep page order, drop blank pages.
fn join_pages(raw: &str) -> String {
    raw.split('\x0C')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
