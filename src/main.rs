//! Entry point for the po-lint catalog checker.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use po_catalog::catalog::Catalog;
use po_catalog::check::{CheckSettings, Severity, SettingsError, check_catalog};
use po_catalog::scan::{self, ScanError};

/// Settings file looked up in the scan root.
const SETTINGS_FILE: &str = "po-lint.json";

/// Defines errors that abort the lint run before any catalog is checked.
#[derive(thiserror::Error, Debug)]
enum LintError {
    /// Error when the settings file cannot be loaded
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// Error when catalog discovery fails
    #[error(transparent)]
    Scan(#[from] ScanError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let root = std::env::args().nth(1).map_or_else(|| PathBuf::from("."), PathBuf::from);
    match run(&root) {
        Ok(error_count) if error_count == 0 => ExitCode::SUCCESS,
        Ok(error_count) => {
            tracing::error!(error_count, "Catalog check failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Checks every catalog under the root, returning the error count.
fn run(root: &Path) -> Result<usize, LintError> {
    let settings_path = root.join(SETTINGS_FILE);
    let settings = if settings_path.is_file() {
        CheckSettings::load(&settings_path)?
    } else {
        CheckSettings::default()
    };

    let files = scan::find_catalog_files(root, &[])?;
    tracing::info!(count = files.len(), root = %root.display(), "Checking catalogs");

    let mut error_count = 0;
    for file in &files {
        let catalog = match Catalog::load(&file.path) {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::error!(path = %file.path.display(), "{err}");
                error_count += 1;
                continue;
            }
        };

        for diagnostic in check_catalog(&catalog, &settings) {
            let line = diagnostic.line.unwrap_or(0);
            match diagnostic.severity {
                Severity::Error => {
                    tracing::error!(
                        path = %file.path.display(),
                        line,
                        "{}",
                        diagnostic.message
                    );
                    error_count += 1;
                }
                Severity::Warning => {
                    tracing::warn!(
                        path = %file.path.display(),
                        line,
                        "{}",
                        diagnostic.message
                    );
                }
            }
        }

        tracing::debug!(
            path = %file.path.display(),
            language = file.language.as_deref().unwrap_or("unknown"),
            domain = file.domain.as_deref().unwrap_or("unknown"),
            entries = catalog.len(),
            translated = catalog.translated_count(),
            "Catalog checked"
        );
    }

    Ok(error_count)
}
