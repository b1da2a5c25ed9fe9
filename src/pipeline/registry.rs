//! Registry response shapes and their mapping onto [`MetadataRecord`].
//!
//! Two registries are queried, in priority order:
//!
//! | Registry | URL | Shape |
//! |----------|-----|-------|
//! | Crossref | `{base}/works/{doi}` | `{"message": {"container-title": [..], "issued": {"date-parts": [[y, m, d]]}, "author": [{"family"|"name"}], "title": [..]}}` |
//! | OpenAlex | `{base}/works/https://doi.org/{doi}` | `{"primary_location": {"source": {"display_name"}}, "publication_year", "authorships": [{"author": {"display_name"}}], "title"}` |
//!
//! Every field is optional on the wire. Lists contribute their first
//! element; a missing or blank value falls back to the field's sentinel.
//! A body that is not JSON of the expected shape is a [`serde_json::Error`],
//! which the resolver treats as a failed source.

use crate::metadata::{MetadataField, MetadataRecord, NormalizedDoi};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static RE_LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// The metadata registries, in the order they are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registry {
    Crossref,
    OpenAlex,
}

impl Registry {
    pub const PRIORITY: [Registry; 2] = [Registry::Crossref, Registry::OpenAlex];

    pub fn name(self) -> &'static str {
        match self {
            Registry::Crossref => "crossref",
            Registry::OpenAlex => "openalex",
        }
    }

    /// Works endpoint for `doi` under `base_url` (no trailing slash).
    pub fn work_url(self, base_url: &str, doi: &NormalizedDoi) -> String {
        match self {
            Registry::Crossref => format!("{base_url}/works/{doi}"),
            Registry::OpenAlex => format!("{base_url}/works/https://doi.org/{doi}"),
        }
    }

    /// Map a 2xx response body onto a complete record.
    pub fn parse(self, body: &[u8], doi: &NormalizedDoi) -> Result<MetadataRecord, serde_json::Error> {
        match self {
            Registry::Crossref => {
                let envelope: CrossrefEnvelope = serde_json::from_slice(body)?;
                Ok(envelope.message.unwrap_or_default().into_record(doi))
            }
            Registry::OpenAlex => {
                let work: OpenAlexWork = serde_json::from_slice(body)?;
                Ok(work.into_record(doi))
            }
        }
    }
}

// ── Crossref ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CrossrefEnvelope {
    #[serde(default)]
    message: Option<CrossrefWork>,
}

#[derive(Debug, Default, Deserialize)]
struct CrossrefWork {
    #[serde(rename = "container-title", default)]
    container_title: Option<Vec<String>>,
    #[serde(default)]
    issued: Option<CrossrefDate>,
    #[serde(default)]
    author: Option<Vec<CrossrefAuthor>>,
    #[serde(default)]
    title: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CrossrefDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Deserialize)]
struct CrossrefAuthor {
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl CrossrefWork {
    fn into_record(self, doi: &NormalizedDoi) -> MetadataRecord {
        let journal = first(self.container_title);
        let year = self
            .issued
            .and_then(|d| d.date_parts)
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| row.into_iter().next())
            .and_then(|v| scalar_text(&v));
        let author = self
            .author
            .and_then(|a| a.into_iter().next())
            .and_then(|a| non_empty(a.family).or_else(|| non_empty(a.name)));
        let title = first(self.title);

        build_record(doi, journal, year, author, title)
    }
}

// ── OpenAlex ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OpenAlexWork {
    #[serde(default)]
    primary_location: Option<OpenAlexLocation>,
    #[serde(default)]
    publication_year: Option<Value>,
    #[serde(default)]
    authorships: Option<Vec<OpenAlexAuthorship>>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAlexLocation {
    #[serde(default)]
    source: Option<OpenAlexNamed>,
}

#[derive(Debug, Deserialize)]
struct OpenAlexAuthorship {
    #[serde(default)]
    author: Option<OpenAlexNamed>,
}

#[derive(Debug, Deserialize)]
struct OpenAlexNamed {
    #[serde(default)]
    display_name: Option<String>,
}

impl OpenAlexWork {
    fn into_record(self, doi: &NormalizedDoi) -> MetadataRecord {
        let journal = self
            .primary_location
            .and_then(|l| l.source)
            .and_then(|s| s.display_name);
        let year = self.publication_year.as_ref().and_then(scalar_text);
        let author = self
            .authorships
            .and_then(|a| a.into_iter().next())
            .and_then(|a| a.author)
            .and_then(|a| a.display_name);

        build_record(doi, journal, year, author, self.title)
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────

fn build_record(
    doi: &NormalizedDoi,
    journal: Option<String>,
    year: Option<String>,
    author: Option<String>,
    title: Option<String>,
) -> MetadataRecord {
    MetadataRecord {
        journal: clean_text(journal.as_deref(), MetadataField::Journal.sentinel()),
        year: clean_text(year.as_deref(), MetadataField::Year.sentinel()),
        author: clean_text(author.as_deref(), MetadataField::Author.sentinel()),
        title: clean_text(title.as_deref(), MetadataField::Title.sentinel()),
        doi: doi.to_string(),
    }
}

/// Collapse line breaks and whitespace runs to single spaces and trim;
/// blank or missing input becomes `fallback`.
pub fn clean_text(value: Option<&str>, fallback: &str) -> String {
    let value = value.unwrap_or_default();
    let single_line = RE_LINE_BREAKS.replace_all(value, " ");
    let collapsed = RE_WHITESPACE.replace_all(single_line.trim(), " ");
    if collapsed.is_empty() {
        fallback.to_string()
    } else {
        collapsed.into_owned()
    }
}

fn first(list: Option<Vec<String>>) -> Option<String> {
    list.and_then(|l| l.into_iter().next())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// Numbers and strings as text; anything else (null, arrays, objects) is absent.
fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}
