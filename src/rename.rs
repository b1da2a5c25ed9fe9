//! File-level rename: PDF bytes in, derived filename out.
//!
//! This is the transport-independent core shared by the HTTP service and
//! the `rename` CLI command. It runs the checks that concern the file itself
//! (size ceiling, `%PDF-` magic), then DOI discovery, metadata resolution
//! and filename assembly. Request-shape checks (method, content type,
//! multipart framing) live in [`crate::service`].

use crate::config::RenameConfig;
use crate::error::DoiRenameError;
use crate::metadata::{MetadataRecord, NormalizedDoi};
use crate::pipeline::doi;
use crate::pipeline::fetch::{RegistryTransport, ReqwestTransport};
use crate::pipeline::filename::build_filename;
use crate::pipeline::resolve::MetadataResolver;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Leading bytes every PDF file starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// A successfully renamed PDF.
#[derive(Debug, Clone, Serialize)]
pub struct RenamedPdf {
    /// `journal_year_author_title_doi.pdf`
    pub filename: String,
    pub doi: NormalizedDoi,
    pub metadata: MetadataRecord,
    /// The uploaded bytes, unmodified.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Renames PDFs by the DOI printed on their leading pages.
///
/// Holds the resolver (and therefore the metadata cache), so one instance
/// should be shared for the life of the process.
#[derive(Debug)]
pub struct DoiRenamer<T = ReqwestTransport> {
    config: RenameConfig,
    resolver: MetadataResolver<T>,
}

impl DoiRenamer<ReqwestTransport> {
    /// A renamer querying the configured registries over HTTPS.
    pub fn new(config: RenameConfig) -> Result<Self, DoiRenameError> {
        let resolver = MetadataResolver::new(&config)
            .map_err(|e| DoiRenameError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { config, resolver })
    }
}

impl<T: RegistryTransport> DoiRenamer<T> {
    /// A renamer using a caller-supplied registry transport.
    pub fn with_transport(config: RenameConfig, transport: T) -> Self {
        let resolver = MetadataResolver::with_transport(&config, transport);
        Self { config, resolver }
    }

    pub fn config(&self) -> &RenameConfig {
        &self.config
    }

    pub fn resolver(&self) -> &MetadataResolver<T> {
        &self.resolver
    }

    /// Derive the filename for `pdf`.
    ///
    /// # Errors
    /// * [`DoiRenameError::PayloadTooLarge`] — more than `max_file_size` bytes
    /// * [`DoiRenameError::NotAPdf`] — missing `%PDF-` header
    /// * [`DoiRenameError::DoiNotFound`] — no DOI in the first `max_pages` pages
    ///
    /// Registry failures never surface here; they degrade to placeholder
    /// fields in the filename.
    pub async fn rename(&self, pdf: Vec<u8>) -> Result<RenamedPdf, DoiRenameError> {
        // ── Step 1: Size ceiling ─────────────────────────────────────────
        if pdf.len() > self.config.max_file_size {
            return Err(DoiRenameError::PayloadTooLarge {
                limit_mb: self.config.max_file_size_mb(),
            });
        }

        // ── Step 2: Magic bytes ──────────────────────────────────────────
        if !pdf.starts_with(PDF_MAGIC) {
            return Err(DoiRenameError::NotAPdf);
        }

        // ── Step 3: DOI discovery (CPU-bound) ────────────────────────────
        let max_pages = self.config.max_pages;
        // Parser panics are caught inside `extract_doi`; a failed task is
        // still reported as "not found" rather than leaking its message.
        let (pdf, found) = tokio::task::spawn_blocking(move || {
            let found = doi::extract_doi(&pdf, max_pages);
            (pdf, found)
        })
        .await
        .map_err(|e| {
            warn!("DOI extraction task failed: {}", e);
            DoiRenameError::DoiNotFound { pages: max_pages }
        })?;

        let doi = found.ok_or(DoiRenameError::DoiNotFound { pages: max_pages })?;
        debug!("DOI {} found in {} bytes", doi, pdf.len());

        // ── Step 4: Metadata + filename ──────────────────────────────────
        let metadata = self.resolver.resolve(&doi).await;
        let filename = build_filename(&metadata);
        info!("Renamed {} → {}", doi, filename);

        Ok(RenamedPdf {
            filename,
            doi,
            metadata,
            bytes: pdf,
        })
    }
}
