//! # pdf-doi-rename
//!
//! Rename scholarly PDFs after the DOI printed on their first pages.
//!
//! Downloaded papers arrive as `1-s2.0-S0092867410000012-main.pdf` or
//! `fulltext(3).pdf`. Almost every publisher prints the DOI in the header or
//! footer of page one, and the DOI registries know the journal, year,
//! authors and title. This crate connects the two and produces a stable,
//! sortable name such as
//! `cell_2010_smith_a-study-of-things_10-1016-j-cell-2010-01-001.pdf`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST multipart/form-data
//!  │
//!  ├─ 1. Validate  method, content type, body size
//!  ├─ 2. Decode    multipart body → `file` part (application/pdf)
//!  ├─ 3. Check     file size ceiling, %PDF- magic
//!  ├─ 4. Extract   text of the first pages via lopdf (spawn_blocking) → DOI
//!  ├─ 5. Resolve   LRU cache → Crossref → OpenAlex → placeholders
//!  ├─ 6. Name      slugify five fields, join, cap at 220 chars
//!  └─ 7. Respond   original bytes + Content-Disposition
//! ```
//!
//! Registry outages never fail a request: a PDF whose DOI was found is
//! always returned, with `unknown-<field>` placeholders where metadata was
//! unavailable.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_doi_rename::{DoiRenamer, RenameConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenameConfig::builder()
//!         .contact_email("librarian@example.org")
//!         .build()?;
//!     let renamer = DoiRenamer::new(config)?;
//!     let renamed = renamer.rename(std::fs::read("paper.pdf")?).await?;
//!     println!("{} → {}", renamed.doi, renamed.filename);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum host adapter ([`server`]) |
//! | `cli`    | on      | The `doi-rename` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable both when embedding the pipeline in another HTTP stack; the
//! framework-free [`RenameService`] is always available:
//! ```toml
//! pdf-doi-rename = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod rename;
#[cfg(feature = "server")]
pub mod server;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RenameConfig, RenameConfigBuilder};
pub use error::{DoiRenameError, MultipartError, TransportError};
pub use metadata::{MetadataField, MetadataRecord, NormalizedDoi};
pub use pipeline::fetch::{RegistryResponse, RegistryTransport, ReqwestTransport};
pub use pipeline::resolve::MetadataResolver;
pub use rename::{DoiRenamer, RenamedPdf};
pub use service::{HttpRequest, HttpResponse, RenameService};
