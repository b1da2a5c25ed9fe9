//! HTTP request pipeline, independent of any web framework.
//!
//! A host adapter (see `server` with the `server` feature) converts its
//! native request into an [`HttpRequest`], calls [`RenameService::handle`]
//! and writes the returned [`HttpResponse`] back. The pipeline never
//! panics and never returns an error: every failure becomes a JSON
//! `{"error": "..."}` body with the status from
//! [`DoiRenameError::status_code`].
//!
//! ## Request state machine
//!
//! ```text
//! OPTIONS ─────────────────────────────────────────────▶ 204
//! method ≠ POST ───────────────────────────────────────▶ 405
//! Content-Type ≠ multipart/form-data ──────────────────▶ 400
//! empty body ──────────────────────────────────────────▶ 400
//! body > max_file_size + margin ───────────────────────▶ 413
//! no boundary / undecodable ───────────────────────────▶ 400
//! no `file` part ──────────────────────────────────────▶ 400
//! part type ≠ application/pdf ─────────────────────────▶ 415
//! file > max_file_size ────────────────────────────────▶ 413
//! no %PDF- magic ──────────────────────────────────────▶ 400
//! no DOI on leading pages ─────────────────────────────▶ 404
//! otherwise ──────────────────────────▶ 200 + original bytes
//! ```

use crate::config::RenameConfig;
use crate::error::DoiRenameError;
use crate::pipeline::fetch::{RegistryTransport, ReqwestTransport};
use crate::pipeline::multipart;
use crate::rename::{DoiRenamer, RenamedPdf};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Form field the PDF must be uploaded under.
pub const FILE_FIELD: &str = "file";

const PDF_MIME: &str = "application/pdf";

/// Headers attached to every response, errors included.
pub const CORS_HEADERS: [(&str, &str); 4] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "POST,OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Expose-Headers", "Content-Disposition"),
];

/// The parts of an inbound request the pipeline looks at.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What the host adapter writes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    fn new(status: u16) -> Self {
        let headers = CORS_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            status,
            headers,
            body: Vec::new(),
        }
    }

    fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn no_content() -> Self {
        Self::new(204)
    }

    /// JSON error response for `e`.
    pub fn from_error(e: &DoiRenameError) -> Self {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            error: &'a str,
        }
        let message = e.to_string();
        // Serialising a single string field cannot fail.
        let body = serde_json::to_vec(&ErrorBody { error: &message }).unwrap_or_default();
        Self {
            body,
            ..Self::new(e.status_code()).with_header("Content-Type", "application/json")
        }
    }

    fn pdf(renamed: RenamedPdf, cache_control: &str) -> Self {
        Self {
            body: renamed.bytes,
            ..Self::new(200)
                .with_header("Content-Type", PDF_MIME)
                .with_header(
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", renamed.filename),
                )
                .with_header("Cache-Control", cache_control)
        }
    }
}

/// The request pipeline: validation, decoding, renaming, response assembly.
#[derive(Debug)]
pub struct RenameService<T = ReqwestTransport> {
    renamer: DoiRenamer<T>,
}

impl RenameService<ReqwestTransport> {
    pub fn new(config: RenameConfig) -> Result<Self, DoiRenameError> {
        Ok(Self {
            renamer: DoiRenamer::new(config)?,
        })
    }
}

impl<T: RegistryTransport> RenameService<T> {
    pub fn with_transport(config: RenameConfig, transport: T) -> Self {
        Self {
            renamer: DoiRenamer::with_transport(config, transport),
        }
    }

    pub fn from_renamer(renamer: DoiRenamer<T>) -> Self {
        Self { renamer }
    }

    pub fn renamer(&self) -> &DoiRenamer<T> {
        &self.renamer
    }

    pub fn config(&self) -> &RenameConfig {
        self.renamer.config()
    }

    /// Run one request through the pipeline.
    pub async fn handle(&self, request: HttpRequest) -> HttpResponse {
        if request.method.eq_ignore_ascii_case("OPTIONS") {
            return HttpResponse::no_content();
        }
        match self.process(request).await {
            Ok(renamed) => {
                info!("200 {} ({} bytes)", renamed.filename, renamed.bytes.len());
                HttpResponse::pdf(renamed, &self.config().cache_control)
            }
            Err(e) => {
                if e.status_code() >= 500 {
                    warn!("{} {}", e.status_code(), e);
                } else {
                    debug!("{} {}", e.status_code(), e);
                }
                HttpResponse::from_error(&e)
            }
        }
    }

    async fn process(&self, request: HttpRequest) -> Result<RenamedPdf, DoiRenameError> {
        let config = self.config();

        if !request.method.eq_ignore_ascii_case("POST") {
            return Err(DoiRenameError::MethodNotAllowed);
        }

        let content_type = request.header_value("content-type").unwrap_or_default();
        if !content_type
            .to_ascii_lowercase()
            .contains("multipart/form-data")
        {
            return Err(DoiRenameError::NotMultipart);
        }

        if request.body.is_empty() {
            return Err(DoiRenameError::EmptyBody);
        }
        if request.body.len() > config.max_body_size() {
            return Err(DoiRenameError::PayloadTooLarge {
                limit_mb: config.max_file_size_mb(),
            });
        }

        let mut form = multipart::decode(content_type, &request.body)?;
        debug!("Decoded {} multipart parts", form.len());

        let file = form
            .take_file(FILE_FIELD)
            .ok_or(DoiRenameError::FileFieldMissing)?;

        let declared = file
            .content_type
            .as_deref()
            .map(|t| t.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if declared != PDF_MIME {
            return Err(DoiRenameError::UnsupportedMediaType);
        }

        self.renamer.rename(file.content).await
    }
}
