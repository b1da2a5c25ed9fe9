//! Error types for the pdf-doi-rename library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`DoiRenameError`] — **Fatal**: the request cannot produce a renamed
//!   file (wrong method, not a PDF, no DOI inside). Every variant carries a
//!   short human-readable message and maps to exactly one HTTP status via
//!   [`DoiRenameError::status_code`].
//!
//! * [`MultipartError`] — returned by the multipart decoder. The request
//!   pipeline folds it into [`DoiRenameError`].
//!
//! * [`TransportError`] — **Non-fatal**: a registry call failed at the
//!   network level. It only drives the retry loop and the fallback between
//!   registries; it never reaches a caller, because a found DOI always
//!   yields a renamed file even when enrichment fails entirely.

use thiserror::Error;

/// All fatal errors returned by the pdf-doi-rename library.
#[derive(Debug, Error)]
pub enum DoiRenameError {
    // ── Request shape ─────────────────────────────────────────────────────
    /// Anything other than `POST` (or the `OPTIONS` preflight).
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Content-Type is not `multipart/form-data`.
    #[error("Expected multipart/form-data request")]
    NotMultipart,

    /// The request carried no body at all.
    #[error("Request body is empty")]
    EmptyBody,

    /// Raw body or extracted file exceeds the configured ceiling.
    #[error("Payload too large. PDF limit is {limit_mb}MB")]
    PayloadTooLarge { limit_mb: usize },

    /// Content-Type names multipart but has no `boundary=` parameter.
    #[error("Missing multipart boundary")]
    MissingBoundary,

    /// The multipart body could not be decoded.
    #[error("Malformed multipart form data")]
    MalformedMultipart,

    // ── File part ─────────────────────────────────────────────────────────
    /// No file part named `file` was uploaded.
    #[error("No file field found. Use field name 'file'")]
    FileFieldMissing,

    /// The declared part type is not `application/pdf`.
    #[error("Unsupported file type. Please upload a PDF")]
    UnsupportedMediaType,

    /// Declared as a PDF but the bytes lack the `%PDF-` header.
    #[error("Malformed or invalid PDF file")]
    NotAPdf,

    /// The leading pages contain no DOI-shaped token.
    #[error("DOI not found in {}", page_span(.pages))]
    DoiNotFound { pages: usize },

    // ── Setup ─────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP host adapter could not bind or serve.
    #[error("Server error: {0}")]
    Server(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DoiRenameError {
    /// HTTP status reported to the client for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed => 405,
            Self::NotMultipart
            | Self::EmptyBody
            | Self::MissingBoundary
            | Self::MalformedMultipart
            | Self::FileFieldMissing
            | Self::NotAPdf => 400,
            Self::PayloadTooLarge { .. } => 413,
            Self::UnsupportedMediaType => 415,
            Self::DoiNotFound { .. } => 404,
            Self::InvalidConfig(_) | Self::Server(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<MultipartError> for DoiRenameError {
    fn from(e: MultipartError) -> Self {
        match e {
            MultipartError::MissingBoundary => Self::MissingBoundary,
            MultipartError::Malformed(_) => Self::MalformedMultipart,
        }
    }
}

fn page_span(pages: &usize) -> String {
    let word = match *pages {
        1 => return "first page".to_string(),
        2 => "two".to_string(),
        3 => "three".to_string(),
        n => n.to_string(),
    };
    format!("first {word} pages")
}

/// Failure decoding a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultipartError {
    /// Content-Type header carries no boundary token.
    #[error("Missing multipart boundary")]
    MissingBoundary,

    /// The body cannot be split into parts at all.
    #[error("Malformed multipart body: {0}")]
    Malformed(String),
}

/// A registry request that never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The per-call timeout elapsed.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// TCP/TLS connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other client-side failure (body read, redirect loop, …).
    #[error("request failed: {0}")]
    Other(String),
}
