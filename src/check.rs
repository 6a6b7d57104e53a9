//! Content-integrity checks for parsed catalogs.
//!
//! The parser already enforces well-formedness and key uniqueness; these
//! checks cover the catalog-level properties a documentation build relies
//! on: filled translations, a sane header, and a usable plural rule.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::plural::PluralForms;

/// How bad a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Worth a look, does not break the documentation build.
    Warning,
    /// The catalog should not ship like this.
    Error,
}

/// One finding produced by [`check_catalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// 1-based line of the offending entry, when attributable.
    pub line: Option<u32>,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates an error finding.
    fn error(line: Option<u32>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, line, message: message.into() }
    }

    /// Creates a warning finding.
    fn warning(line: Option<u32>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, line, message: message.into() }
    }
}

/// Defines errors that may occur while loading check settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Error when failing to read the settings file
    #[error("Failed to load settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Error when failing to parse the settings file
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// Error when the settings values are inconsistent
    #[error("Settings validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),
}

/// A single invalid settings field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Settings error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "requiredCharset").
    pub field_path: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for one field.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Formats validation errors as a numbered list.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tunables for [`check_catalog`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckSettings {
    /// Report untranslated entries (empty msgstr) as errors.
    pub require_translated: bool,

    /// Accept entries flagged `fuzzy` without a warning.
    pub allow_fuzzy: bool,

    /// Charset the header must declare. `None` skips the check.
    pub required_charset: Option<String>,

    /// Report header fields missing from [`crate::catalog::REQUIRED_FIELDS`].
    pub require_header_fields: bool,

    /// Largest count fed to the plural rule when probing for out-of-range
    /// indices. 200 covers every rule shipped with gettext, which branch on
    /// `n % 100` at most.
    pub max_plural_probe: u64,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            require_translated: true,
            allow_fuzzy: false,
            required_charset: Some("UTF-8".to_string()),
            require_header_fields: true,
            max_plural_probe: 200,
        }
    }
}

impl CheckSettings {
    /// Loads settings from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        tracing::debug!(path = %path.display(), "Loading check settings");
        let text = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&text)?;
        settings.validate().map_err(SettingsError::ValidationErrors)?;
        Ok(settings)
    }

    /// # Errors
    /// - `requiredCharset` is present but empty
    /// - `maxPluralProbe` is zero
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(charset) = &self.required_charset
            && charset.is_empty()
        {
            errors.push(ValidationError::new(
                "requiredCharset",
                "The charset cannot be empty. Use e.g. \"UTF-8\", or remove this field",
            ));
        }

        if self.max_plural_probe == 0 {
            errors.push(ValidationError::new(
                "maxPluralProbe",
                "At least one count must be probed. The default of 200 covers common rules",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Runs every content-integrity check over a catalog.
///
/// Returned diagnostics are ordered: header findings first, then entry
/// findings in file order.
#[must_use]
pub fn check_catalog(catalog: &Catalog, settings: &CheckSettings) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    check_header(catalog, settings, &mut diagnostics);
    check_plural_rule(catalog, settings, &mut diagnostics);
    check_entries(catalog, settings, &mut diagnostics);

    diagnostics
}

/// Header presence, required fields and charset declaration.
fn check_header(catalog: &Catalog, settings: &CheckSettings, out: &mut Vec<Diagnostic>) {
    if catalog.header.is_empty() {
        out.push(Diagnostic::error(None, "Catalog has no header entry"));
        return;
    }

    if settings.require_header_fields {
        for field in catalog.header.missing_required_fields() {
            out.push(Diagnostic::error(None, format!("Missing header field '{field}'")));
        }
    }

    if !settings.allow_fuzzy && catalog.header_comments.is_fuzzy() {
        out.push(Diagnostic::warning(
            None,
            "Header entry is fuzzy, the catalog needs review after a template update",
        ));
    }

    if let Some(required) = &settings.required_charset {
        match catalog.header.charset() {
            None => {
                out.push(Diagnostic::error(None, "Content-Type declares no charset"));
            }
            Some(charset) if !charset.eq_ignore_ascii_case(required) => {
                out.push(Diagnostic::error(
                    None,
                    format!("Declared charset is '{charset}', expected '{required}'"),
                ));
            }
            Some(_) => {}
        }
    }
}

/// Plural-Forms formula syntax and index range.
fn check_plural_rule(catalog: &Catalog, settings: &CheckSettings, out: &mut Vec<Diagnostic>) {
    // Absence is already reported by the required-fields check.
    let Some(rule) = catalog.header.plural_forms() else {
        return;
    };

    let forms = match PluralForms::parse(rule) {
        Ok(forms) => forms,
        Err(err) => {
            out.push(Diagnostic::error(None, format!("Invalid Plural-Forms rule: {err}")));
            return;
        }
    };

    for n in 0..=settings.max_plural_probe {
        match forms.index(n) {
            Ok(index) if index >= forms.nplurals => {
                out.push(Diagnostic::error(
                    None,
                    format!(
                        "Plural rule yields index {index} for n = {n}, but nplurals = {}",
                        forms.nplurals
                    ),
                ));
                return;
            }
            Ok(_) => {}
            Err(err) => {
                out.push(Diagnostic::error(None, format!("Plural rule evaluation failed: {err}")));
                return;
            }
        }
    }
}

/// Per-entry key, translation, fuzziness and plural-arity checks.
fn check_entries(catalog: &Catalog, settings: &CheckSettings, out: &mut Vec<Diagnostic>) {
    let nplurals = catalog
        .header
        .plural_forms()
        .and_then(|rule| PluralForms::parse(rule).ok())
        .map(|forms| forms.nplurals);

    for entry in catalog.entries() {
        let line = Some(entry.range.start.line + 1);

        if entry.msgid.is_empty() {
            out.push(Diagnostic::error(line, "Entry has an empty msgid"));
        }

        if settings.require_translated && !entry.is_translated() {
            out.push(Diagnostic::error(
                line,
                format!("Entry \"{}\" is untranslated", entry.msgid),
            ));
        }

        if !settings.allow_fuzzy && entry.is_fuzzy() {
            out.push(Diagnostic::warning(
                line,
                format!("Entry \"{}\" is fuzzy, its source text changed", entry.msgid),
            ));
        }

        if entry.is_plural()
            && let Some(nplurals) = nplurals
            && entry.msgstr.len() != nplurals
        {
            out.push(Diagnostic::error(
                line,
                format!(
                    "Entry \"{}\" has {} plural forms, header declares {nplurals}",
                    entry.msgid,
                    entry.msgstr.len()
                ),
            ));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    const CLEAN: &str = r#"msgid ""
msgstr ""
"Project-Id-Version: discordpy\n"
"POT-Creation-Date: 2022-03-08 06:31+0000\n"
"PO-Revision-Date: 2022-03-08 07:04\n"
"Language-Team: Italian\n"
"MIME-Version: 1.0\n"
"Content-Type: text/plain; charset=UTF-8\n"
"Content-Transfer-Encoding: 8bit\n"
"Plural-Forms: nplurals=2; plural=(n != 1);\n"
"Language: it_IT\n"

msgid "Version Guarantees"
msgstr "Garanzie quanto al versionamento"
"#;

    fn check_text(text: &str, settings: &CheckSettings) -> Vec<Diagnostic> {
        let catalog = Catalog::parse(text).unwrap();
        check_catalog(&catalog, settings)
    }

    #[googletest::test]
    fn test_clean_catalog_has_no_findings() {
        let diagnostics = check_text(CLEAN, &CheckSettings::default());

        expect_that!(diagnostics, is_empty());
    }

    #[googletest::test]
    fn test_untranslated_entry_reported() {
        let text = format!("{CLEAN}\nmsgid \"Examples\"\nmsgstr \"\"\n");
        let diagnostics = check_text(&text, &CheckSettings::default());

        expect_that!(
            diagnostics,
            elements_are![all![
                field!(Diagnostic.severity, eq(&Severity::Error)),
                field!(Diagnostic.message, contains_substring("untranslated")),
                field!(Diagnostic.line, some(eq(&16)))
            ]]
        );
    }

    #[googletest::test]
    fn test_untranslated_entry_ignored_when_not_required() {
        let text = format!("{CLEAN}\nmsgid \"Examples\"\nmsgstr \"\"\n");
        let settings = CheckSettings { require_translated: false, ..CheckSettings::default() };

        expect_that!(check_text(&text, &settings), is_empty());
    }

    #[googletest::test]
    fn test_fuzzy_entry_is_warning() {
        let text = format!("{CLEAN}\n#, fuzzy\nmsgid \"Examples\"\nmsgstr \"Esempi\"\n");
        let diagnostics = check_text(&text, &CheckSettings::default());

        expect_that!(
            diagnostics,
            elements_are![all![
                field!(Diagnostic.severity, eq(&Severity::Warning)),
                field!(Diagnostic.message, contains_substring("fuzzy"))
            ]]
        );
    }

    #[googletest::test]
    fn test_fuzzy_header_is_warning() {
        let text = format!("#, fuzzy\n{CLEAN}");
        let diagnostics = check_text(&text, &CheckSettings::default());

        expect_that!(
            diagnostics,
            elements_are![all![
                field!(Diagnostic.severity, eq(&Severity::Warning)),
                field!(Diagnostic.message, contains_substring("Header entry is fuzzy"))
            ]]
        );

        let settings = CheckSettings { allow_fuzzy: true, ..CheckSettings::default() };
        expect_that!(check_text(&text, &settings), is_empty());
    }

    #[googletest::test]
    fn test_missing_header_fields_reported() {
        let text = "msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n";
        let diagnostics = check_text(text, &CheckSettings::default());

        expect_that!(
            diagnostics,
            contains(field!(Diagnostic.message, contains_substring("Plural-Forms")))
        );
    }

    #[googletest::test]
    fn test_wrong_charset_reported() {
        let text = "msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=ISO-8859-1\\n\"\n";
        let settings = CheckSettings { require_header_fields: false, ..CheckSettings::default() };
        let diagnostics = check_text(text, &settings);

        expect_that!(
            diagnostics,
            elements_are![field!(Diagnostic.message, contains_substring("ISO-8859-1"))]
        );
    }

    #[googletest::test]
    fn test_invalid_plural_rule_reported() {
        let text = "msgid \"\"\nmsgstr \"\"\n\"Plural-Forms: nplurals=2; plural=(n !!= 1);\\n\"\n";
        let settings = CheckSettings {
            require_header_fields: false,
            required_charset: None,
            ..CheckSettings::default()
        };
        let diagnostics = check_text(text, &settings);

        expect_that!(
            diagnostics,
            elements_are![field!(Diagnostic.message, contains_substring("Invalid Plural-Forms"))]
        );
    }

    #[googletest::test]
    fn test_plural_index_out_of_range_reported() {
        // plural=n grows past nplurals=2 immediately.
        let text = "msgid \"\"\nmsgstr \"\"\n\"Plural-Forms: nplurals=2; plural=n;\\n\"\n";
        let settings = CheckSettings {
            require_header_fields: false,
            required_charset: None,
            ..CheckSettings::default()
        };
        let diagnostics = check_text(text, &settings);

        expect_that!(
            diagnostics,
            elements_are![field!(Diagnostic.message, contains_substring("nplurals = 2"))]
        );
    }

    #[googletest::test]
    fn test_plural_arity_mismatch_reported() {
        let text = format!(
            "{CLEAN}\nmsgid \"One change\"\nmsgid_plural \"%d changes\"\nmsgstr[0] \"Una modifica\"\n"
        );
        let diagnostics = check_text(&text, &CheckSettings::default());

        expect_that!(
            diagnostics,
            elements_are![field!(Diagnostic.message, contains_substring("plural forms"))]
        );
    }

    #[rstest]
    fn validate_valid_settings() {
        let settings = CheckSettings::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"allowFuzzy": true}"#;

        let settings: CheckSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.allow_fuzzy, eq(true));
        assert_that!(settings.require_translated, eq(true));
        assert_that!(settings.required_charset, some(eq("UTF-8")));
    }

    #[rstest]
    fn validate_invalid_empty_charset() {
        let settings =
            CheckSettings { required_charset: Some(String::new()), ..CheckSettings::default() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("requiredCharset")),
                field!(ValidationError.message, contains_substring("cannot be empty"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_zero_probe() {
        let settings = CheckSettings { max_plural_probe: 0, ..CheckSettings::default() };
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![field!(ValidationError.field_path, eq("maxPluralProbe"))])
        );
    }

    #[rstest]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("po-lint.json");
        std::fs::write(&path, r#"{"allowFuzzy": true, "requiredCharset": "ISO-8859-1"}"#)
            .unwrap();

        let settings = CheckSettings::load(&path).unwrap();

        assert_that!(settings.allow_fuzzy, eq(true));
        assert_that!(settings.required_charset, some(eq("ISO-8859-1")));
        assert_that!(settings.require_translated, eq(true));
    }

    #[rstest]
    fn test_load_invalid_json() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("po-lint.json");
        std::fs::write(&path, "not json").unwrap();

        let result = CheckSettings::load(&path);

        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[rstest]
    fn test_load_rejects_invalid_values() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("po-lint.json");
        std::fs::write(&path, r#"{"maxPluralProbe": 0}"#).unwrap();

        let result = CheckSettings::load(&path);

        assert!(matches!(result, Err(SettingsError::ValidationErrors(_))));
    }
}
