//! Core value types: the normalised DOI and the resolved metadata record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closing punctuation that commonly trails a DOI printed in prose.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', ')', ']', '}', '"', '\''];

static RE_DOI_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^10\.\d{4,9}/\S+$").unwrap());

/// A lowercase DOI (`10.<registrant>/<suffix>`) with trailing punctuation
/// removed.
///
/// Only constructible through [`NormalizedDoi::parse`], so a value is never
/// empty and never contains whitespace (CR/LF included).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedDoi(String);

impl NormalizedDoi {
    /// Normalise a raw DOI token: trim, lowercase, strip trailing
    /// `.,;:)]}"'` characters.
    ///
    /// Returns `None` when what remains is not DOI-shaped.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw
            .trim()
            .to_lowercase()
            .trim_end_matches(TRAILING_PUNCTUATION)
            .to_string();
        RE_DOI_SHAPE.is_match(&cleaned).then_some(Self(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedDoi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedDoi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The five bibliographic fields a filename is built from, in filename order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    Journal,
    Year,
    Author,
    Title,
    Doi,
}

impl MetadataField {
    /// Filename order.
    pub const ALL: [MetadataField; 5] = [
        MetadataField::Journal,
        MetadataField::Year,
        MetadataField::Author,
        MetadataField::Title,
        MetadataField::Doi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetadataField::Journal => "journal",
            MetadataField::Year => "year",
            MetadataField::Author => "author",
            MetadataField::Title => "title",
            MetadataField::Doi => "doi",
        }
    }

    /// Placeholder used when the field cannot be resolved.
    pub fn sentinel(self) -> &'static str {
        match self {
            MetadataField::Journal => "unknown-journal",
            MetadataField::Year => "unknown-year",
            MetadataField::Author => "unknown-author",
            MetadataField::Title => "unknown-title",
            MetadataField::Doi => "unknown-doi",
        }
    }
}

/// Bibliographic metadata for one DOI.
///
/// All five fields are always populated: either a real value or the
/// field's sentinel (`unknown-journal`, …). `doi` is always the input DOI,
/// since it is known locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub journal: String,
    pub year: String,
    pub author: String,
    pub title: String,
    pub doi: String,
}

impl MetadataRecord {
    /// The all-sentinel record returned when no registry can resolve `doi`.
    pub fn unresolved(doi: &NormalizedDoi) -> Self {
        Self {
            journal: MetadataField::Journal.sentinel().to_string(),
            year: MetadataField::Year.sentinel().to_string(),
            author: MetadataField::Author.sentinel().to_string(),
            title: MetadataField::Title.sentinel().to_string(),
            doi: doi.to_string(),
        }
    }

    pub fn get(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::Journal => &self.journal,
            MetadataField::Year => &self.year,
            MetadataField::Author => &self.author,
            MetadataField::Title => &self.title,
            MetadataField::Doi => &self.doi,
        }
    }

    /// True when every bibliographic field is still its sentinel.
    pub fn is_unresolved(&self) -> bool {
        MetadataField::ALL
            .iter()
            .filter(|f| **f != MetadataField::Doi)
            .all(|f| self.get(*f) == f.sentinel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lowercases_and_strips_punctuation() {
        let doi = NormalizedDoi::parse("  10.1000/XYZ123.  ").unwrap();
        assert_eq!(doi.as_str(), "10.1000/xyz123");

        let doi = NormalizedDoi::parse("10.1038/nature12373).").unwrap();
        assert_eq!(doi.as_str(), "10.1038/nature12373");

        let doi = NormalizedDoi::parse("10.5555/abc\"';").unwrap();
        assert_eq!(doi.as_str(), "10.5555/abc");
    }

    #[test]
    fn parse_rejects_non_doi() {
        assert!(NormalizedDoi::parse("").is_none());
        assert!(NormalizedDoi::parse("10.12/short-registrant").is_none());
        assert!(NormalizedDoi::parse("10.1000/").is_none());
        assert!(NormalizedDoi::parse("10.1000/a\nb").is_none());
        // Punctuation-only suffix disappears entirely.
        assert!(NormalizedDoi::parse("10.1000/.)").is_none());
    }

    #[test]
    fn unresolved_record_keeps_doi() {
        let doi = NormalizedDoi::parse("10.1000/abc").unwrap();
        let rec = MetadataRecord::unresolved(&doi);
        assert_eq!(rec.journal, "unknown-journal");
        assert_eq!(rec.year, "unknown-year");
        assert_eq!(rec.author, "unknown-author");
        assert_eq!(rec.title, "unknown-title");
        assert_eq!(rec.doi, "10.1000/abc");
        assert!(rec.is_unresolved());
    }

    #[test]
    fn partially_resolved_record_is_not_unresolved() {
        let doi = NormalizedDoi::parse("10.1000/abc").unwrap();
        let mut rec = MetadataRecord::unresolved(&doi);
        rec.year = "2021".into();
        assert!(!rec.is_unresolved());
    }
}
