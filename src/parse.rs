//! Text extraction for uploaded documents.
//!
//! Turns raw bytes into ordered [`Page`]s of plain text. The rest of the
//! pipeline treats this as a black box returning `(text, page_number)`
//! pairs; format handling is dispatched on content type here.
//!
//! Supported formats:
//! - `application/pdf` via `pdf-extract`; the extractor emits a form feed
//!   (`\x0c`) between pages, which is used to recover page numbers.
//! - `text/plain` (and `text/markdown`) as a single page.

use crate::models::Page;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

/// Parse failure, reported to the caller as a fatal pipeline error.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("document contains no extractable text")]
    Empty,
}

/// Extract ordered, page-scoped text from raw document bytes.
///
/// Pages are 1-based. Blank pages are kept out of the result (they produce
/// no chunks), but page numbering still reflects the source position.
pub fn parse_pages(bytes: &[u8], content_type: &str) -> Result<Vec<Page>, ParseError> {
    let pages = match content_type {
        MIME_PDF => parse_pdf(bytes)?,
        MIME_TEXT | MIME_MARKDOWN => parse_text(bytes),
        other => return Err(ParseError::UnsupportedContentType(other.to_string())),
    };

    if pages.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(pages)
}

fn parse_pdf(bytes: &[u8]) -> Result<Vec<Page>, ParseError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ParseError::Pdf(e.to_string()))?;
    Ok(split_form_feeds(&text))
}

fn parse_text(bytes: &[u8]) -> Vec<Page> {
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        return Vec::new();
    }
    vec![Page {
        text: text.into_owned(),
        page_number: 1,
    }]
}

/// Split extracted text on form-feed page breaks, keeping 1-based page
/// numbers aligned with the source even when a page is blank.
fn split_form_feeds(text: &str) -> Vec<Page> {
    text.split('\x0c')
        .enumerate()
        .filter(|(_, t)| !t.trim().is_empty())
        .map(|(i, t)| Page {
            text: t.to_string(),
            page_number: (i + 1) as u32,
        })
        .collect()
}
