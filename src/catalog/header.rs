//! Catalog header metadata.
//!
//! The header is the entry with an empty msgid; its msgstr is a block of
//! `Key: value` pairs terminated by `\n`, applying to the whole catalog.

/// Header field names a complete documentation catalog is expected to carry.
pub const REQUIRED_FIELDS: &[&str] = &[
    "Project-Id-Version",
    "POT-Creation-Date",
    "PO-Revision-Date",
    "Language-Team",
    "MIME-Version",
    "Content-Type",
    "Content-Transfer-Encoding",
    "Plural-Forms",
];

/// Parsed catalog header.
///
/// Field order is preserved so the catalog can be re-serialized without
/// shuffling metadata lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// `(name, value)` pairs in file order.
    fields: Vec<(String, String)>,
}

impl Header {
    /// Parses the decoded msgstr block of the header entry.
    ///
    /// Each `\n`-terminated segment is split on the first `: `. Segments
    /// without a separator are logged and dropped, matching how gettext
    /// tools tolerate stray header lines.
    #[must_use]
    pub fn parse(msgstr: &str) -> Self {
        let mut fields = Vec::new();

        for segment in msgstr.split('\n') {
            if segment.is_empty() {
                continue;
            }
            if let Some((name, value)) = segment.split_once(':') {
                fields.push((name.trim().to_string(), value.trim_start().to_string()));
            } else {
                tracing::debug!(segment, "Ignoring header segment without ':'");
            }
        }

        Self { fields }
    }

    /// Returns the value of a field by name (ASCII case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over `(name, value)` pairs in file order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns true if the header carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The catalog language (`Language:` field), e.g. `it_IT`.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.get("Language")
    }

    /// The `Plural-Forms:` rule, e.g. `nplurals=2; plural=(n != 1);`.
    #[must_use]
    pub fn plural_forms(&self) -> Option<&str> {
        self.get("Plural-Forms")
    }

    /// The charset declared in `Content-Type:`, e.g. `UTF-8`.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        let content_type = self.get("Content-Type")?;
        content_type.split(';').find_map(|part| {
            let part = part.trim();
            part.strip_prefix("charset=")
        })
    }

    /// Re-serializes the header into the decoded msgstr block form.
    ///
    /// One `Key: value\n` segment per field, in original order.
    #[must_use]
    pub fn to_msgstr(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.fields {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Names of required fields missing from this header.
    #[must_use]
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS.iter().filter(|name| self.get(name).is_none()).copied().collect()
    }
}
