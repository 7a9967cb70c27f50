//! Deck loader
//!
//! Loading pipeline:
//! 1. Size check
//! 2. UTF-8 BOM strip
//! 3. YAML parsing
//! 4. Deserialization to typed config
//! 5. Validation
//! 6. Freeze with `Arc`

use std::path::Path;
use std::sync::Arc;

use crate::config::schema::DeckConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

/// Deck shown when no file is given.
pub const DEFAULT_DECK: &str = include_str!("../../decks/default.yaml");

/// Display name used for the embedded deck in errors.
pub const DEFAULT_DECK_NAME: &str = "<built-in deck>";

// ============================================================================
// Public API
// ============================================================================

/// Options for the deck loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Size and count limits.
    pub config_limits: ConfigLimits,
}

/// Limits that keep a hostile or broken deck from exhausting resources.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum number of slides.
    pub max_slides: usize,

    /// Maximum deck file size in bytes.
    pub max_config_size: usize,

    /// Maximum scenario log capacity.
    pub max_log_capacity: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_slides: env_or("DECKHAND_MAX_SLIDES", 500),
            max_config_size: env_or("DECKHAND_MAX_CONFIG_SIZE", 1024 * 1024),
            max_log_capacity: env_or("DECKHAND_MAX_LOG_CAPACITY", 1000),
        }
    }
}

/// Result of loading a deck.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated deck.
    pub config: Arc<DeckConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during deck loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({location})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Deck loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads a deck file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or too large, if YAML parsing
    /// fails, or if validation finds errors.
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let max = self.options.config_limits.max_config_size;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > max {
            return Err(too_large(file_size, max));
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_source(&raw, path)
    }

    /// Loads a deck from YAML text.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the file checks.
    pub fn load_from_str(&self, yaml: &str) -> Result<LoadResult, ConfigError> {
        let max = self.options.config_limits.max_config_size;
        if yaml.len() > max {
            return Err(too_large(yaml.len(), max));
        }
        self.load_source(yaml, Path::new("<string>"))
    }

    /// Loads the embedded default deck.
    ///
    /// # Errors
    ///
    /// Only if the embedded deck is broken.
    pub fn load_default(&self) -> Result<LoadResult, ConfigError> {
        self.load_source(DEFAULT_DECK, Path::new(DEFAULT_DECK_NAME))
    }

    /// Loads `path`, or the embedded deck when `None`.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_or_default(&self, path: Option<&Path>) -> Result<LoadResult, ConfigError> {
        path.map_or_else(|| self.load_default(), |p| self.load(p))
    }

    fn load_source(&self, raw: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let root: serde_yaml::Value =
            serde_yaml::from_str(raw).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "Deck file is empty".to_string(),
            });
        }

        let config: DeckConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: format!("Failed to deserialize deck: {e}"),
            })?;

        let result = Validator::new().validate(&config, &self.options.config_limits);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: result.errors,
            });
        }

        let warnings = result
            .warnings
            .into_iter()
            .map(|issue| LoadWarning {
                message: issue.message,
                location: Some(issue.path),
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            path = %path.display(),
            slides = config.slides.len(),
            warnings = warnings.len(),
            "deck loaded"
        );

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }
}

fn too_large(size: usize, max: usize) -> ConfigError {
    ConfigError::InvalidValue {
        field: "file_size".to_string(),
        value: format!("{size} bytes"),
        expected: format!("at most {max} bytes"),
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
