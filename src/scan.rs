//! Catalog discovery in a documentation tree.
//!
//! Documentation locales usually live in a `locale/<lang>/LC_MESSAGES/`
//! layout, but Crowdin exports and hand-rolled trees vary, so the locale is
//! detected from any path segment rather than a fixed depth.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use thiserror::Error;

/// Language codes (RFC 5646 subset) seen in documentation locale trees.
static LANGUAGE_CODES: LazyLock<HashSet<String>> = LazyLock::new(|| {
    [
        "ar", "bg", "ca", "cs", "da", "de", "de-DE", "el", "en", "en-GB", "en-US", "es",
        "es-ES", "es-MX", "et", "eu", "fa", "fi", "fr", "fr-FR", "gl", "he", "hi", "hr", "hu",
        "id", "it", "it-IT", "ja", "ja-JP", "ko", "ko-KR", "lt", "lv", "nb", "nl", "nl-NL",
        "pl", "pl-PL", "pt", "pt-BR", "pt-PT", "ro", "ru", "ru-RU", "sk", "sl", "sq", "sr",
        "sv", "sv-SE", "th", "tr", "tr-TR", "uk", "uk-UA", "vi", "zh", "zh-CN", "zh-Hans",
        "zh-Hant", "zh-TW",
    ]
    .iter()
    .flat_map(|code| {
        let code = (*code).to_string();
        let normalized = normalize_language_code(&code);
        vec![code, normalized]
    })
    .collect()
});

/// Normalize language code (lowercase and replace - with _).
fn normalize_language_code(code: &str) -> String {
    code.to_lowercase().replace('-', "_")
}

/// Detect the catalog locale from its file path heuristically.
///
/// Splits the path by '/' and '.', then searches backwards for a part that
/// matches a known language code. The file stem wins over directory names,
/// so `locale/de/it.po` detects `it`.
///
/// # Examples
/// - `locale/it/LC_MESSAGES/version_guarantees.po` → `it`
/// - `translations/it_IT.po` → `it_IT`
/// - `docs/version_guarantees.po` → `None`
#[must_use]
pub fn detect_language_from_path(file_path: &Path) -> Option<String> {
    let path_str = file_path.to_string_lossy();
    let parts: Vec<&str> = path_str.split(&['/', '.']).collect();

    for part in parts.iter().rev() {
        let normalized = normalize_language_code(part);
        if LANGUAGE_CODES.contains(&normalized) || LANGUAGE_CODES.contains(*part) {
            return Some((*part).to_string());
        }
    }

    None
}

/// Detect the documentation domain (page name) from the file path.
///
/// The file stem is the domain unless it is itself a language code, in
/// which case the catalog covers a whole page named by its directory.
///
/// # Examples
/// - `locale/it/LC_MESSAGES/version_guarantees.po` → `Some("version_guarantees")`
/// - `version_guarantees/it.po` → `Some("version_guarantees")`
/// - `locale/it.po` → `None`
#[must_use]
pub fn detect_domain_from_path(file_path: &Path) -> Option<String> {
    let file_stem = file_path.file_stem()?.to_string_lossy().to_string();
    let stem_normalized = normalize_language_code(&file_stem);

    if !LANGUAGE_CODES.contains(&stem_normalized) && !LANGUAGE_CODES.contains(&file_stem) {
        return Some(file_stem);
    }

    let parent = file_path.parent()?;
    let parent_name = parent.file_name()?.to_string_lossy().to_string();
    let parent_normalized = normalize_language_code(&parent_name);

    // Layout directories are not domains.
    let layout_parents = ["locale", "locales", "translations", "i18n", "lang", "LC_MESSAGES"];
    if !LANGUAGE_CODES.contains(&parent_normalized)
        && !LANGUAGE_CODES.contains(&parent_name)
        && !layout_parents.contains(&parent_name.as_str())
    {
        return Some(parent_name);
    }

    None
}

/// A discovered catalog file with path-derived metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFile {
    /// Absolute or root-relative path to the `.po` file.
    pub path: PathBuf,
    /// Locale detected from the path, e.g. `it`.
    pub language: Option<String>,
    /// Documentation page the catalog translates, e.g. `version_guarantees`.
    pub domain: Option<String>,
}

/// Defines errors that may occur while scanning for catalogs.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Error when an exclude pattern is not a valid glob
    #[error("Invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The glob error text.
        message: String,
    },
    /// Error when the pattern set cannot be built
    #[error("Failed to build exclude patterns: {0}")]
    PatternSet(String),
}

/// Builds the exclude pattern set.
fn build_exclude_set(exclude_patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in exclude_patterns {
        let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ScanError::PatternSet(e.to_string()))
}

/// Finds `.po` files under the root, honouring gitignore rules.
///
/// Results are sorted by path for stable output.
///
/// # Errors
/// Returns an error if an exclude pattern is not a valid glob.
pub fn find_catalog_files(
    root: &Path,
    exclude_patterns: &[String],
) -> Result<Vec<CatalogFile>, ScanError> {
    tracing::debug!(root = %root.display(), "Scanning for catalogs");
    let exclude_set = build_exclude_set(exclude_patterns)?;

    let mut found = Vec::new();
    for result in WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "po") {
            continue;
        }

        let Ok(relative_path) = path.strip_prefix(root) else {
            continue;
        };
        if exclude_set.is_match(relative_path) {
            continue;
        }

        found.push(CatalogFile {
            path: path.to_path_buf(),
            language: detect_language_from_path(path),
            domain: detect_domain_from_path(path),
        });
    }

    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    // Basic locale detection from the LC_MESSAGES layout
    #[case("locale/it/LC_MESSAGES/version_guarantees.po", Some("it"))]
    #[case("locale/ja/LC_MESSAGES/index.po", Some("ja"))]
    // Locale in the file stem
    #[case("translations/it_IT.po", Some("it_IT"))]
    #[case("translations/pt-BR.po", Some("pt-BR"))]
    // Stem wins over directory names
    #[case("locale/de/it.po", Some("it"))]
    // No locale anywhere
    #[case("docs/version_guarantees.po", None)]
    #[case("locale/hoge/version_guarantees.po", None)]
    fn test_detect_language_from_path(#[case] path: &str, #[case] expected: Option<&str>) {
        let result = detect_language_from_path(Path::new(path));
        assert_eq!(result.as_deref(), expected);
    }

    #[rstest]
    // File stem is the domain
    #[case("locale/it/LC_MESSAGES/version_guarantees.po", Some("version_guarantees"))]
    #[case("locale/it/LC_MESSAGES/index.po", Some("index"))]
    // Directory name is the domain when the stem is a locale
    #[case("version_guarantees/it.po", Some("version_guarantees"))]
    // Layout directories are not domains
    #[case("locale/it.po", None)]
    #[case("translations/it_IT.po", None)]
    fn test_detect_domain_from_path(#[case] path: &str, #[case] expected: Option<&str>) {
        let result = detect_domain_from_path(Path::new(path));
        assert_eq!(result.as_deref(), expected);
    }

    #[rstest]
    fn test_invalid_exclude_pattern_is_error() {
        let result = find_catalog_files(Path::new("."), &["invalid[pattern".to_string()]);

        assert!(matches!(result, Err(ScanError::InvalidPattern { .. })));
    }
}
