//! Configuration for the rename pipeline.
//!
//! Every limit, registry endpoint and retry knob lives in [`RenameConfig`],
//! built via its [`RenameConfigBuilder`]. One struct shared by the HTTP
//! service and the CLI keeps both front-ends applying identical limits.

use crate::error::DoiRenameError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One mebibyte.
pub const MIB: usize = 1024 * 1024;

/// Configuration for renaming PDFs by DOI.
///
/// Built via [`RenameConfig::builder()`] or using [`RenameConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_doi_rename::RenameConfig;
///
/// let config = RenameConfig::builder()
///     .max_pages(3)
///     .contact_email("librarian@example.org")
///     .build()
///     .unwrap();
/// assert!(config.user_agent().contains("mailto:librarian@example.org"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameConfig {
    /// Hard ceiling on the uploaded file content in bytes. Default: 20 MiB.
    pub max_file_size: usize,

    /// Extra bytes tolerated on the raw request body before parsing, to
    /// cover multipart framing. Default: 128 KiB.
    pub body_margin: usize,

    /// Number of leading pages scanned for a DOI. Default: 2.
    ///
    /// DOIs are printed in the header or footer of the first page of nearly
    /// every article; the second page catches cover sheets.
    pub max_pages: usize,

    /// Resolved records kept in the LRU metadata cache. Default: 256.
    pub cache_capacity: usize,

    /// Per registry call timeout in seconds. Default: 15.
    pub request_timeout_secs: u64,

    /// Extra attempts per registry call on transport failure or 5xx. Default: 2.
    pub max_retries: u32,

    /// First retry delay in milliseconds; doubles after each retry. Default: 600.
    ///
    /// 600 ms → 1.2 s, so a failing registry stalls a request by under two
    /// seconds of back-off before the next source is tried.
    pub retry_backoff_ms: u64,

    /// Contact address appended to the User-Agent (Crossref "polite pool").
    pub contact_email: Option<String>,

    /// Base URL of the primary registry (Crossref works API).
    pub crossref_base_url: String,

    /// Base URL of the fallback registry (OpenAlex works API).
    pub openalex_base_url: String,

    /// `Cache-Control` value attached to successful responses.
    pub cache_control: String,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            max_file_size: 20 * MIB,
            body_margin: 128 * 1024,
            max_pages: 2,
            cache_capacity: 256,
            request_timeout_secs: 15,
            max_retries: 2,
            retry_backoff_ms: 600,
            contact_email: None,
            crossref_base_url: "https://api.crossref.org".to_string(),
            openalex_base_url: "https://api.openalex.org".to_string(),
            cache_control: "public, max-age=3600".to_string(),
        }
    }
}

impl RenameConfig {
    /// Create a new builder for `RenameConfig`.
    pub fn builder() -> RenameConfigBuilder {
        RenameConfigBuilder {
            config: Self::default(),
        }
    }

    /// Largest raw request body accepted before multipart parsing.
    pub fn max_body_size(&self) -> usize {
        self.max_file_size.saturating_add(self.body_margin)
    }

    /// File ceiling in whole mebibytes, for error messages.
    pub fn max_file_size_mb(&self) -> usize {
        self.max_file_size.div_ceil(MIB)
    }

    /// Identifying User-Agent sent to both registries.
    pub fn user_agent(&self) -> String {
        let base = concat!("pdf-doi-rename/", env!("CARGO_PKG_VERSION"));
        match &self.contact_email {
            Some(mail) => format!("{base} (mailto:{mail})"),
            None => base.to_string(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Builder for [`RenameConfig`].
#[derive(Debug)]
pub struct RenameConfigBuilder {
    config: RenameConfig,
}

impl RenameConfigBuilder {
    pub fn max_file_size(mut self, bytes: usize) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn body_margin(mut self, bytes: usize) -> Self {
        self.config.body_margin = bytes;
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn cache_capacity(mut self, n: usize) -> Self {
        self.config.cache_capacity = n.max(1);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn contact_email(mut self, mail: impl Into<String>) -> Self {
        self.config.contact_email = Some(mail.into());
        self
    }

    pub fn crossref_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.crossref_base_url = url.into();
        self
    }

    pub fn openalex_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.openalex_base_url = url.into();
        self
    }

    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.config.cache_control = value.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenameConfig, DoiRenameError> {
        let c = &self.config;
        if c.max_file_size == 0 {
            return Err(DoiRenameError::InvalidConfig(
                "max_file_size must be > 0".into(),
            ));
        }
        if c.max_pages == 0 {
            return Err(DoiRenameError::InvalidConfig(
                "max_pages must be ≥ 1".into(),
            ));
        }
        for (name, url) in [
            ("crossref_base_url", &c.crossref_base_url),
            ("openalex_base_url", &c.openalex_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(DoiRenameError::InvalidConfig(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if c.cache_control.contains(['\r', '\n']) {
            return Err(DoiRenameError::InvalidConfig(
                "cache_control must be a single header line".into(),
            ));
        }
        let mut config = self.config;
        for url in [&mut config.crossref_base_url, &mut config.openalex_base_url] {
            while url.ends_with('/') {
                url.pop();
            }
        }
        Ok(config)
    }
}
