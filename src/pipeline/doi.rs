//! DOI discovery: read the leading pages of a PDF and find the first
//! DOI-shaped token.
//!
//! Text extraction is best-effort by nature. A PDF that lopdf cannot open
//! yields [`DocumentText::Unreadable`], and a page whose content stream
//! cannot be decoded contributes empty text. Both end up as "no DOI",
//! never as a request failure: the caller has already checked type, size
//! and magic bytes, and a not-found answer is the honest result for a
//! document we cannot read.
//!
//! lopdf asserts on some malformed inputs (e.g. a `/Font` resource that is
//! not a font dictionary). Every parser call runs under
//! [`std::panic::catch_unwind`] so such a panic is handled like an error.

use crate::metadata::NormalizedDoi;
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

static RE_DOI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)10\.\d{4,9}/\S+").unwrap());

/// Result of reading text from the leading pages of a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentText {
    /// One entry per scanned page, in page order. Pages whose text could not
    /// be extracted are empty strings.
    Pages(Vec<String>),
    /// The document itself could not be parsed.
    Unreadable(String),
}

impl DocumentText {
    /// Concatenate page texts with line breaks; empty for unreadable documents.
    pub fn joined(&self) -> String {
        match self {
            DocumentText::Pages(pages) => pages.join("\n"),
            DocumentText::Unreadable(_) => String::new(),
        }
    }
}

/// Run a parser call, mapping a panic inside lopdf to `None`.
fn guarded<R>(f: impl FnOnce() -> R) -> Option<R> {
    panic::catch_unwind(AssertUnwindSafe(f)).ok()
}

/// Extract text from at most `max_pages` leading pages.
///
/// CPU-bound; call from `spawn_blocking` in async contexts.
pub fn read_leading_pages(pdf: &[u8], max_pages: usize) -> DocumentText {
    let document = match guarded(|| Document::load_mem(pdf)) {
        Some(Ok(doc)) => doc,
        Some(Err(e)) => return DocumentText::Unreadable(e.to_string()),
        None => return DocumentText::Unreadable("PDF parser panicked".to_string()),
    };

    let Some(page_numbers) = guarded(|| document.get_pages().into_keys().collect::<Vec<_>>())
    else {
        return DocumentText::Unreadable("PDF page tree is corrupt".to_string());
    };

    let pages = page_numbers
        .into_iter()
        .take(max_pages)
        .map(|page_num| match guarded(|| document.extract_text(&[page_num])) {
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                debug!("Text extraction failed on page {}: {}", page_num, e);
                String::new()
            }
            None => {
                warn!("PDF parser panicked on page {}; treating it as empty", page_num);
                String::new()
            }
        })
        .collect();

    DocumentText::Pages(pages)
}

/// Find and normalise the first DOI in `text`.
pub fn find_doi(text: &str) -> Option<NormalizedDoi> {
    RE_DOI
        .find_iter(text)
        .find_map(|m| NormalizedDoi::parse(m.as_str()))
}

/// Locate a DOI in the first `max_pages` pages of a PDF.
pub fn extract_doi(pdf: &[u8], max_pages: usize) -> Option<NormalizedDoi> {
    let text = match read_leading_pages(pdf, max_pages) {
        DocumentText::Unreadable(reason) => {
            debug!("PDF could not be parsed: {}", reason);
            return None;
        }
        pages => pages.joined(),
    };

    match find_doi(&text) {
        Some(doi) => {
            info!("Found DOI {}", doi);
            Some(doi)
        }
        None => {
            debug!(
                "No DOI in first {} pages ({} chars of text)",
                max_pages,
                text.len()
            );
            None
        }
    }
}
