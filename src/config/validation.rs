//! Deck validation
//!
//! Schema and semantic checks run on a fully deserialized [`DeckConfig`].
//! Every issue is collected before returning so a presenter fixing a deck
//! sees all problems at once.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::loader::ConfigLimits;
use crate::config::schema::{DeckConfig, ScenarioConfig, SlideConfig, SlideKind};
use crate::error::{Severity, ValidationIssue};

/// Longest accepted scenario duration.
pub const MAX_SCENARIO_DURATION: Duration = Duration::from_secs(60 * 60);

// ============================================================================
// Public API
// ============================================================================

/// Result of deck validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Issues that prevent loading.
    pub errors: Vec<ValidationIssue>,

    /// Informational issues.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Deck validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a deck and returns every issue found.
    pub fn validate(&mut self, config: &DeckConfig, limits: &ConfigLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_metadata(config);
        self.validate_slide_list(config, limits);
        for (index, slide) in config.slides.iter().enumerate() {
            self.validate_slide(index, slide, limits);
        }

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Deck
    // ========================================================================

    fn validate_metadata(&mut self, config: &DeckConfig) {
        if config.deck.title.trim().is_empty() {
            self.add_warning("deck.title", "Deck has no title");
        }
        if let Some(color) = &config.deck.accent_color {
            if !is_hex_color(color) {
                self.add_warning(
                    "deck.accent_color",
                    &format!("'{color}' is not a #RRGGBB colour; the default is used"),
                );
            }
        }
    }

    fn validate_slide_list(&mut self, config: &DeckConfig, limits: &ConfigLimits) {
        if config.slides.is_empty() {
            self.add_error("slides", "Deck must contain at least one slide");
            return;
        }

        if config.slides.len() > limits.max_slides {
            self.add_error(
                "slides",
                &format!(
                    "Deck has {} slides, more than the limit of {}",
                    config.slides.len(),
                    limits.max_slides
                ),
            );
        }

        let mut seen = HashSet::new();
        for (index, slide) in config.slides.iter().enumerate() {
            if slide.id.trim().is_empty() {
                self.add_error(&format!("slides[{index}].id"), "Slide id cannot be empty");
            } else if !seen.insert(slide.id.as_str()) {
                self.add_error(
                    &format!("slides[{index}].id"),
                    &format!("Duplicate slide id '{}'", slide.id),
                );
            }
        }
    }

    // ========================================================================
    // Slides
    // ========================================================================

    fn validate_slide(&mut self, index: usize, slide: &SlideConfig, limits: &ConfigLimits) {
        let path = format!("slides[{index}]");

        if let Some(color) = &slide.accent_color {
            if !is_hex_color(color) {
                self.add_warning(
                    &format!("{path}.accent_color"),
                    &format!("'{color}' is not a #RRGGBB colour; the default is used"),
                );
            }
        }

        match slide.kind {
            SlideKind::Iframe => {
                if slide.content_url.as_deref().is_none_or(|u| u.trim().is_empty()) {
                    self.add_error(
                        &format!("{path}.content_url"),
                        "iframe slides require a content_url",
                    );
                }
            }
            SlideKind::Image => {
                if slide.images.is_empty() {
                    self.add_warning(&format!("{path}.images"), "Image slide has no images");
                }
                for (i, image) in slide.images.iter().enumerate() {
                    if let Some(arrow) = image.arrow {
                        if arrow.x > 100 || arrow.y > 100 {
                            self.add_warning(
                                &format!("{path}.images[{i}].arrow"),
                                "Arrow position is a percentage and should be 0-100",
                            );
                        }
                    }
                }
            }
            SlideKind::List => {
                if slide.bullet_points.is_empty() {
                    self.add_warning(
                        &format!("{path}.bullet_points"),
                        "List slide has no bullet points",
                    );
                }
            }
            SlideKind::Title | SlideKind::Warning | SlideKind::Info | SlideKind::Scenario => {}
        }

        match (slide.kind, &slide.scenario) {
            (SlideKind::Scenario, Some(scenario)) => {
                self.validate_scenario(&format!("{path}.scenario"), scenario, limits);
            }
            (SlideKind::Scenario, None) => {
                self.add_warning(
                    &format!("{path}.scenario"),
                    "Scenario slide has no scenario block; defaults are used",
                );
            }
            (_, Some(_)) => {
                self.add_warning(
                    &format!("{path}.scenario"),
                    &format!("scenario block is ignored on '{}' slides", slide.kind),
                );
            }
            (_, None) => {}
        }
    }

    fn validate_scenario(&mut self, path: &str, scenario: &ScenarioConfig, limits: &ConfigLimits) {
        let tick = self.check_duration(path, "tick_interval", &scenario.tick_interval);
        let attempt = self.check_duration(path, "attempt_duration", &scenario.attempt_duration);
        self.check_duration(path, "settle_delay", &scenario.settle_delay);

        if let (Some(tick), Some(attempt)) = (tick, attempt) {
            if tick >= attempt {
                self.add_warning(
                    &format!("{path}.tick_interval"),
                    "tick_interval is not shorter than attempt_duration; no failed attempts will be shown",
                );
            }
        }

        // The success marker and the found line must both fit.
        if scenario.log_capacity < 2 || scenario.log_capacity > limits.max_log_capacity {
            self.add_error(
                &format!("{path}.log_capacity"),
                &format!(
                    "log_capacity must be between 2 and {}, got {}",
                    limits.max_log_capacity, scenario.log_capacity
                ),
            );
        }

        if scenario.candidates.iter().all(|c| c.trim().is_empty()) {
            self.add_error(
                &format!("{path}.candidates"),
                "At least one non-empty candidate is required",
            );
        }

        if scenario.resolved_value.trim().is_empty() {
            self.add_error(
                &format!("{path}.resolved_value"),
                "resolved_value cannot be empty",
            );
        }

        if scenario.target.trim().is_empty() {
            self.add_warning(&format!("{path}.target"), "Scenario target is empty");
        }
    }

    /// Parses a duration field, recording an error if it is invalid, zero,
    /// or longer than [`MAX_SCENARIO_DURATION`].
    fn check_duration(&mut self, path: &str, field: &str, raw: &str) -> Option<Duration> {
        match humantime::parse_duration(raw.trim()) {
            Ok(d) if d.is_zero() => {
                self.add_error(&format!("{path}.{field}"), "Duration must be greater than zero");
                None
            }
            Ok(d) if d > MAX_SCENARIO_DURATION => {
                self.add_error(
                    &format!("{path}.{field}"),
                    &format!(
                        "Duration '{raw}' exceeds the maximum of {}",
                        humantime::format_duration(MAX_SCENARIO_DURATION)
                    ),
                );
                None
            }
            Ok(d) => Some(d),
            Err(e) => {
                self.add_error(
                    &format!("{path}.{field}"),
                    &format!("Invalid duration '{raw}': {e}"),
                );
                None
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

/// Whether `value` is a `#RRGGBB` colour.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
