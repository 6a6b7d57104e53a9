//! Catalog data model: entries keyed by msgid plus header metadata.

mod header;

use std::collections::HashMap;
use std::path::Path;

use crate::syntax::parser::{self, ParseError};
use crate::types::{SourcePosition, SourceRange};

pub use header::{Header, REQUIRED_FIELDS};

/// A single translation entry: a source string and its localized rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Disambiguation context (`msgctxt`), rarely used in documentation catalogs.
    pub msgctxt: Option<String>,

    /// Source-language text, the lookup key.
    pub msgid: String,

    /// Plural source text (`msgid_plural`), present only for plural entries.
    pub msgid_plural: Option<String>,

    /// Localized text. One element for singular entries, one per plural
    /// form (`msgstr[N]`, in index order) for plural entries.
    pub msgstr: Vec<String>,

    /// Translator comments (`# `).
    pub translator_comments: Vec<String>,

    /// Extracted comments from the source (`#.`).
    pub extracted_comments: Vec<String>,

    /// Source references (`#:`).
    pub references: Vec<String>,

    /// Flags (`#,`), comma-separated in the file. `fuzzy` marks a
    /// translation invalidated by a source-text change.
    pub flags: Vec<String>,

    /// Previous msgid lines (`#|`), left behind by merge tools.
    pub previous: Vec<String>,

    /// Lines the entry occupies in the source file.
    pub range: SourceRange,
}

impl Entry {
    /// The singular translation, or the empty string when untranslated.
    #[must_use]
    pub fn value(&self) -> &str {
        self.msgstr.first().map_or("", String::as_str)
    }

    /// True if every translation slot is filled.
    ///
    /// An empty msgstr conventionally means "not yet translated".
    #[must_use]
    pub fn is_translated(&self) -> bool {
        !self.msgstr.is_empty() && self.msgstr.iter().all(|s| !s.is_empty())
    }

    /// True if the entry carries the `fuzzy` flag.
    #[must_use]
    pub fn is_fuzzy(&self) -> bool {
        self.flags.iter().any(|flag| flag == "fuzzy")
    }

    /// True if the entry declares plural forms.
    #[must_use]
    pub fn is_plural(&self) -> bool {
        self.msgid_plural.is_some()
    }
}

/// Comment block attached to the header entry.
///
/// `msgmerge` and translation services annotate the header like any other
/// entry (a `fuzzy` flag after a template update is routine), so the whole
/// block is kept for re-serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderComments {
    /// Translator comments (`# `).
    pub translator: Vec<String>,

    /// Extracted comments (`#.`).
    pub extracted: Vec<String>,

    /// Source references (`#:`).
    pub references: Vec<String>,

    /// Flags (`#,`).
    pub flags: Vec<String>,

    /// Previous msgid lines (`#|`).
    pub previous: Vec<String>,
}

impl HeaderComments {
    /// True if the header entry carries the `fuzzy` flag.
    #[must_use]
    pub fn is_fuzzy(&self) -> bool {
        self.flags.iter().any(|flag| flag == "fuzzy")
    }
}

/// Defines errors that may occur while loading a catalog from disk.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// Error when the file cannot be read or is not valid UTF-8
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    /// Error when the file content is not a well-formed PO catalog
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A parsed PO catalog: header metadata plus ordered translation entries.
///
/// Entry order is irrelevant to lookup but preserved for readability and
/// diff stability, so serialization keeps the file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Comment block of the header entry.
    pub header_comments: HeaderComments,

    /// Catalog-wide metadata from the empty-msgid entry.
    pub header: Header,

    /// Non-header entries in file order.
    entries: Vec<Entry>,

    /// (msgctxt, msgid) → index into `entries`. Keys are unique by parse-time
    /// invariant.
    index: HashMap<(Option<String>, String), usize>,
}

impl Catalog {
    /// Builds a catalog from already-parsed parts.
    ///
    /// # Errors
    /// Returns the offending entry's msgid if two entries share a
    /// (msgctxt, msgid) key.
    pub(crate) fn from_parts(
        header_comments: HeaderComments,
        header: Header,
        entries: Vec<Entry>,
    ) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let key = (entry.msgctxt.clone(), entry.msgid.clone());
            if index.insert(key, i).is_some() {
                return Err(entry.msgid.clone());
            }
        }
        Ok(Self { header_comments, header, entries, index })
    }

    /// Parses PO text into a catalog.
    ///
    /// # Errors
    /// Returns a [`ParseError`] with the offending line on malformed input,
    /// duplicate keys, or an inconsistent plural entry.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parser::parse(text)
    }

    /// Reads and parses a catalog file.
    ///
    /// The file must be UTF-8; the declared-charset/actual-encoding match
    /// required by the header is verified separately by the checks.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or fails to parse.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        tracing::debug!(path = %path.display(), "Loading catalog");
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text)?)
    }

    /// Serializes the catalog back to canonical PO text.
    #[must_use]
    pub fn to_po_string(&self) -> String {
        crate::writer::write(self)
    }

    /// Looks up the singular translation for a msgid without context.
    #[must_use]
    pub fn get(&self, msgid: &str) -> Option<&str> {
        self.get_with_context(None, msgid)
    }

    /// Looks up the singular translation for a (msgctxt, msgid) pair.
    #[must_use]
    pub fn get_with_context(&self, msgctxt: Option<&str>, msgid: &str) -> Option<&str> {
        let key = (msgctxt.map(ToString::to_string), msgid.to_string());
        self.index.get(&key).and_then(|&i| self.entries.get(i)).map(Entry::value)
    }

    /// Returns the entry whose source lines contain the given line.
    #[must_use]
    pub fn entry_at_line(&self, line: u32) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.range.contains_line(line))
    }

    /// Returns the entry whose source lines contain the given position.
    #[must_use]
    pub fn entry_at_position(&self, position: SourcePosition) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.range.contains(position))
    }

    /// Iterates over non-header entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Number of non-header entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the catalog has no non-header entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose translation slots are all filled.
    #[must_use]
    pub fn translated_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_translated()).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    fn entry(msgid: &str, msgstr: &str) -> Entry {
        Entry {
            msgid: msgid.to_string(),
            msgstr: vec![msgstr.to_string()],
            ..Entry::default()
        }
    }

    #[googletest::test]
    fn test_lookup_by_msgid() {
        let catalog = Catalog::from_parts(
            HeaderComments::default(),
            Header::default(),
            vec![entry("Hello", "Ciao"), entry("World", "Mondo")],
        )
        .unwrap();

        expect_that!(catalog.get("Hello"), some(eq("Ciao")));
        expect_that!(catalog.get("World"), some(eq("Mondo")));
        expect_that!(catalog.get("Missing"), none());
    }

    #[googletest::test]
    fn test_context_distinguishes_entries() {
        let mut open_file = entry("Open", "Apri");
        open_file.msgctxt = Some("menu".to_string());

        let catalog = Catalog::from_parts(
            HeaderComments::default(),
            Header::default(),
            vec![entry("Open", "Aperto"), open_file],
        )
        .unwrap();

        expect_that!(catalog.get("Open"), some(eq("Aperto")));
        expect_that!(catalog.get_with_context(Some("menu"), "Open"), some(eq("Apri")));
    }

    #[googletest::test]
    fn test_duplicate_key_rejected() {
        let result = Catalog::from_parts(
            HeaderComments::default(),
            Header::default(),
            vec![entry("Hello", "Ciao"), entry("Hello", "Salve")],
        );

        expect_that!(result, err(eq("Hello")));
    }

    #[googletest::test]
    fn test_entry_at_line() {
        let mut first = entry("Hello", "Ciao");
        first.range = SourceRange::lines(2, 3);
        let mut second = entry("World", "Mondo");
        second.range = SourceRange::lines(5, 6);

        let catalog =
            Catalog::from_parts(HeaderComments::default(), Header::default(), vec![first, second])
                .unwrap();

        expect_that!(catalog.entry_at_line(2).map(|e| e.msgid.as_str()), some(eq("Hello")));
        expect_that!(catalog.entry_at_line(6).map(|e| e.msgid.as_str()), some(eq("World")));
        expect_that!(catalog.entry_at_line(4), none());
    }

    #[googletest::test]
    fn test_entry_at_position() {
        let mut first = entry("Hello", "Ciao");
        first.range = SourceRange {
            start: SourcePosition { line: 2, character: 0 },
            end: SourcePosition { line: 3, character: 12 },
        };

        let catalog =
            Catalog::from_parts(HeaderComments::default(), Header::default(), vec![first])
                .unwrap();

        let inside = SourcePosition { line: 3, character: 12 };
        let past_end = SourcePosition { line: 3, character: 13 };
        expect_that!(
            catalog.entry_at_position(inside).map(|e| e.msgid.as_str()),
            some(eq("Hello"))
        );
        expect_that!(catalog.entry_at_position(past_end), none());
    }

    #[googletest::test]
    fn test_translated_count() {
        let catalog = Catalog::from_parts(
            HeaderComments::default(),
            Header::default(),
            vec![entry("Hello", "Ciao"), entry("World", "")],
        )
        .unwrap();

        expect_that!(catalog.translated_count(), eq(1));
        expect_that!(catalog.len(), eq(2));
    }

    #[googletest::test]
    fn test_fuzzy_and_plural_flags() {
        let mut e = entry("One item", "Un elemento");
        e.flags = vec!["fuzzy".to_string()];
        expect_that!(e.is_fuzzy(), eq(true));
        expect_that!(e.is_plural(), eq(false));

        e.msgid_plural = Some("{0} items".to_string());
        expect_that!(e.is_plural(), eq(true));
    }
}
