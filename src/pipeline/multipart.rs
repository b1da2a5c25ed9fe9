//! `multipart/form-data` decoding: raw request body → named parts.
//!
//! The decoder is lenient. Only a missing boundary fails the whole body;
//! an individual part without a header/content separator or without a
//! `name` is dropped and the rest of the form is still returned. Browsers,
//! curl and hand-written upload scripts disagree on many framing details,
//! and one odd part must not cost the caller the file part next to it.
//!
//! Content bytes are preserved exactly, apart from the single CRLF that
//! precedes the next delimiter.

use crate::error::MultipartError;
use once_cell::sync::Lazy;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use tracing::debug;

static RE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)boundary=([^;]+)").unwrap());

// `name=` must not match the tail of `filename=`.
static RE_DISPOSITION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(?:^|[;\s])name="([^"]+)""#).unwrap());

static RE_DISPOSITION_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(?:^|[;\s])filename="([^"]*)""#).unwrap());

const CRLF: &[u8] = b"\r\n";
const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";

/// One decoded form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPart {
    /// `name` from `Content-Disposition`.
    pub name: String,
    /// `filename` from `Content-Disposition`; present only for file parts.
    pub filename: Option<String>,
    /// The part's own `Content-Type` header, if any.
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

impl RawPart {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// All parts of a decoded form, in body order.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<RawPart>,
}

impl MultipartForm {
    /// The file part called `name`. With duplicates the last one wins.
    pub fn file(&self, name: &str) -> Option<&RawPart> {
        self.parts
            .iter()
            .rev()
            .find(|p| p.is_file() && p.name == name)
    }

    /// Take ownership of the file part called `name`.
    pub fn take_file(&mut self, name: &str) -> Option<RawPart> {
        let idx = self
            .parts
            .iter()
            .rposition(|p| p.is_file() && p.name == name)?;
        Some(self.parts.remove(idx))
    }

    /// The plain (non-file) field called `name`, decoded as lossy UTF-8.
    pub fn field(&self, name: &str) -> Option<String> {
        self.parts
            .iter()
            .rev()
            .find(|p| !p.is_file() && p.name == name)
            .map(|p| String::from_utf8_lossy(&p.content).into_owned())
    }

    /// Iterate plain fields as `(name, value)`.
    pub fn fields(&self) -> impl Iterator<Item = (&str, String)> {
        self.parts
            .iter()
            .filter(|p| !p.is_file())
            .map(|p| (p.name.as_str(), String::from_utf8_lossy(&p.content).into_owned()))
    }

    /// Iterate file parts.
    pub fn files(&self) -> impl Iterator<Item = &RawPart> {
        self.parts.iter().filter(|p| p.is_file())
    }

    pub fn parts(&self) -> &[RawPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Extract the boundary token from a `Content-Type` header value.
pub fn boundary(content_type: &str) -> Result<String, MultipartError> {
    let caps = RE_BOUNDARY
        .captures(content_type)
        .ok_or(MultipartError::MissingBoundary)?;
    let token = caps[1].trim().trim_matches('"');
    if token.is_empty() {
        return Err(MultipartError::Malformed("empty boundary".into()));
    }
    Ok(token.to_string())
}

/// Decode a `multipart/form-data` body.
///
/// # Errors
/// - [`MultipartError::MissingBoundary`] when `content_type` has no boundary
/// - [`MultipartError::Malformed`] when the boundary token is empty
pub fn decode(content_type: &str, body: &[u8]) -> Result<MultipartForm, MultipartError> {
    let boundary = boundary(content_type)?;
    let delimiter = format!("--{boundary}");
    let splitter = BytesRegex::new(&regex::escape(&delimiter))
        .map_err(|e| MultipartError::Malformed(e.to_string()))?;

    let mut form = MultipartForm::default();
    let mut skipped = 0usize;

    for segment in splitter.split(body) {
        let segment = segment.strip_prefix(CRLF).unwrap_or(segment);
        if segment.starts_with(b"--") || segment.trim_ascii().is_empty() {
            continue;
        }
        match parse_part(segment) {
            Some(part) => form.parts.push(part),
            None => skipped += 1,
        }
    }

    debug!(
        "Decoded multipart body: {} parts, {} skipped",
        form.parts.len(),
        skipped
    );
    Ok(form)
}

/// Parse one segment into a part; `None` for segments that should be dropped.
fn parse_part(segment: &[u8]) -> Option<RawPart> {
    let split_at = find(segment, HEADER_SEPARATOR)?;
    let header_block = &segment[..split_at];
    let mut content = &segment[split_at + HEADER_SEPARATOR.len()..];
    if let Some(stripped) = content.strip_suffix(CRLF) {
        content = stripped;
    }

    let mut disposition = None;
    let mut content_type = None;
    for line in header_block.split(|&b| b == b'\n') {
        let line = String::from_utf8_lossy(line);
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "content-disposition" => disposition = Some(value),
            "content-type" => content_type = Some(value),
            _ => {}
        }
    }

    let disposition = disposition?;
    let name = RE_DISPOSITION_NAME.captures(&disposition)?[1].to_string();
    let filename = RE_DISPOSITION_FILENAME
        .captures(&disposition)
        .map(|c| c[1].to_string());

    Some(RawPart {
        name,
        filename,
        content_type,
        content: content.to_vec(),
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
