//! Metadata → filename.
//!
//! `journal_year_author_title_doi.pdf`, each field slugified. The base is
//! capped at [`MAX_BASE_LEN`] characters, so a filename is never longer than
//! 220 characters and never ends in a separator before `.pdf`.

use crate::metadata::{MetadataField, MetadataRecord};
use crate::pipeline::registry::clean_text;
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest base name before the `.pdf` extension.
pub const MAX_BASE_LEN: usize = 216;

const SEPARATOR: &str = "_";

static RE_NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["\r\n]"#).unwrap());

/// Build the download filename for `record`. Deterministic.
pub fn build_filename(record: &MetadataRecord) -> String {
    let slugs: Vec<String> = MetadataField::ALL
        .iter()
        .map(|&field| slugify(&clean_text(Some(record.get(field)), field.sentinel())))
        .collect();

    let joined = slugs.join(SEPARATOR);
    let mut base = RE_UNSAFE.replace_all(&joined, "").into_owned();

    if base.len() > MAX_BASE_LEN {
        // Slugs are pure ASCII, so any byte index is a char boundary.
        base.truncate(MAX_BASE_LEN);
        let trimmed = base.trim_end_matches(['-', '_']).len();
        base.truncate(trimmed);
    }

    format!("{base}.pdf")
}

/// Lowercase, `/` → `-`, runs of anything outside `[a-z0-9]` → one `-`,
/// outer hyphens trimmed. Yields `"unknown"` when nothing survives.
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase().replace('/', "-");
    let slug = RE_NON_ALNUM.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(journal: &str, year: &str, author: &str, title: &str, doi: &str) -> MetadataRecord {
        MetadataRecord {
            journal: journal.into(),
            year: year.into(),
            author: author.into(),
            title: title.into(),
            doi: doi.into(),
        }
    }

    #[test]
    fn reference_filename() {
        let rec = record("Nature!!", "2021", "O'Neil", "A Study: Part One", "10.1/abc");
        assert_eq!(
            build_filename(&rec),
            "nature_2021_o-neil_a-study-part-one_10-1-abc.pdf"
        );
    }

    #[test]
    fn slugify_rules() {
        assert_eq!(slugify("Hello,   World"), "hello-world");
        assert_eq!(slugify("10.1038/Nature12373"), "10-1038-nature12373");
        assert_eq!(slugify("--edge--"), "edge");
        assert_eq!(slugify("Größe"), "gr-e");
        assert_eq!(slugify("!!!"), "unknown");
        assert_eq!(slugify(""), "unknown");
    }

    #[test]
    fn blank_fields_use_sentinels() {
        let rec = record("", "  ", "\n", "", "10.1000/x");
        assert_eq!(
            build_filename(&rec),
            "unknown-journal_unknown-year_unknown-author_unknown-title_10-1000-x.pdf"
        );
    }

    #[test]
    fn quotes_and_newlines_never_survive() {
        let rec = record("J\"ournal", "2020", "A\r\nB", "T\"", "10.1000/x");
        let name = build_filename(&rec);
        assert!(!name.contains(['"', '\r', '\n']), "{name}");
    }

    #[test]
    fn long_titles_are_truncated_without_dangling_separator() {
        let title = "abcd ".repeat(80);
        let rec = record("Journal", "2020", "Author", &title, "10.1000/x");
        let name = build_filename(&rec);

        assert!(name.len() <= MAX_BASE_LEN + ".pdf".len(), "{}", name.len());
        let base = name.strip_suffix(".pdf").unwrap();
        assert!(!base.ends_with(['-', '_']), "{base}");
        assert!(base.starts_with("journal_2020_author_abcd-abcd"));
    }

    #[test]
    fn truncation_bound_holds_for_every_cut_position() {
        for pad in 0..8 {
            let title = format!("{}{}", "x".repeat(pad), " yy".repeat(100));
            let rec = record("J", "1999", "A", &title, "10.1000/x");
            let name = build_filename(&rec);
            assert!(name.len() <= 220);
            assert!(!name.trim_end_matches(".pdf").ends_with(['-', '_']));
        }
    }

    #[test]
    fn deterministic() {
        let rec = record("Cell", "2010", "Smith", "Title", "10.1016/j.cell.2010.01.001");
        assert_eq!(build_filename(&rec), build_filename(&rec.clone()));
    }
}
