//! `validate` command
//!
//! Loads each deck file through the full pipeline and reports the result
//! without presenting anything.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::loader::{ConfigLoader, LoadWarning};
use crate::error::{ConfigError, DeckError, Severity, ValidationIssue};

/// Per-file validation outcome.
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// File that was checked
    pub path: PathBuf,
    /// Whether the file passed
    pub valid: bool,
    /// Slide count, when the deck loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<usize>,
    /// Errors, or the loader's error message
    pub errors: Vec<String>,
    /// Warnings
    pub warnings: Vec<String>,
}

/// Validate deck files.
///
/// Every file is checked and reported before the first failure is returned.
///
/// # Errors
///
/// Returns the first file's error if any file fails. With `--strict`,
/// warnings count as failures.
pub fn run(args: &ValidateArgs) -> Result<(), DeckError> {
    let loader = ConfigLoader::with_defaults();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_error: Option<DeckError> = None;

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating deck");
        let (report, error) = check(&loader, path, args.strict);
        if first_error.is_none() {
            first_error = error;
        }
        reports.push(report);
    }

    match args.format {
        OutputFormat::Human => {
            for report in &reports {
                print_human(report);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    first_error.map_or(Ok(()), Err)
}

fn check(loader: &ConfigLoader, path: &Path, strict: bool) -> (FileReport, Option<DeckError>) {
    match loader.load(path) {
        Ok(result) => {
            let warnings: Vec<String> = result.warnings.iter().map(ToString::to_string).collect();
            let failed = strict && !result.warnings.is_empty();
            let error = failed.then(|| strict_error(path, &result.warnings));
            (
                FileReport {
                    path: path.to_path_buf(),
                    valid: !failed,
                    slides: Some(result.config.slides.len()),
                    errors: Vec::new(),
                    warnings,
                },
                error,
            )
        }
        Err(e) => {
            let errors = match &e {
                ConfigError::ValidationError { errors, .. } => {
                    errors.iter().map(ToString::to_string).collect()
                }
                other => vec![other.to_string()],
            };
            (
                FileReport {
                    path: path.to_path_buf(),
                    valid: false,
                    slides: None,
                    errors,
                    warnings: Vec::new(),
                },
                Some(e.into()),
            )
        }
    }
}

fn strict_error(path: &Path, warnings: &[LoadWarning]) -> DeckError {
    ConfigError::ValidationError {
        path: path.display().to_string(),
        errors: warnings
            .iter()
            .map(|w| ValidationIssue {
                path: w.location.clone().unwrap_or_default(),
                message: w.message.clone(),
                severity: Severity::Warning,
            })
            .collect(),
    }
    .into()
}

fn print_human(report: &FileReport) {
    let mark = if report.valid { "ok" } else { "FAILED" };
    match report.slides {
        Some(n) => println!("{}: {mark} ({n} slides)", report.path.display()),
        None => println!("{}: {mark}", report.path.display()),
    }
    for error in &report.errors {
        println!("  {error}");
    }
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }
}
