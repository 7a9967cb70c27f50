//! Deck configuration schema
//!
//! Types deserialized from YAML deck files. Runtime code works with the
//! resolved forms (e.g. [`ScenarioSettings`]) produced during loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Accent colour used when a slide does not set one.
pub const DEFAULT_ACCENT: &str = "#00F3FF";

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root of a deck file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeckConfig {
    /// Deck metadata
    #[serde(default)]
    pub deck: DeckMetadata,

    /// Slides in presentation order
    #[serde(default)]
    pub slides: Vec<SlideConfig>,
}

/// Deck-level metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeckMetadata {
    /// Presentation title
    #[serde(default)]
    pub title: String,

    /// Accent colour applied to slides without their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

// ============================================================================
// Slides
// ============================================================================

/// Slide variant. Decides layout and whether the slide owns a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    /// Large headline with optional subtitle and description
    Title,
    /// Card styled as a warning
    Warning,
    /// Card styled as information
    Info,
    /// Headline with bullet points
    List,
    /// Embedded live page, shown as a placeholder with its URL
    Iframe,
    /// Headline with captioned images
    Image,
    /// Interactive timed scenario
    Scenario,
}

impl SlideKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::List => "list",
            Self::Iframe => "iframe",
            Self::Image => "image",
            Self::Scenario => "scenario",
        }
    }
}

impl std::fmt::Display for SlideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SlideConfig {
    /// Unique identifier
    pub id: String,

    /// Slide variant
    pub kind: SlideKind,

    /// Small label or first half of a title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Second half of a title, drawn in the accent colour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Headline text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_text: Option<String>,

    /// Body text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Bullet points for `list` slides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bullet_points: Vec<String>,

    /// `#RRGGBB` accent colour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,

    /// Target URL for `iframe` slides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,

    /// Images for `image` slides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<SlideImage>,

    /// Scenario parameters for `scenario` slides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioConfig>,
}

impl SlideConfig {
    /// Creates a bare slide of the given kind.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: SlideKind) -> Self {
        Self {
            id: id.into(),
            kind,
            title: None,
            subtitle: None,
            main_text: None,
            description: None,
            bullet_points: Vec::new(),
            accent_color: None,
            content_url: None,
            images: Vec::new(),
            scenario: None,
        }
    }

    /// The most descriptive single line of text on the slide.
    #[must_use]
    pub fn headline(&self) -> &str {
        self.main_text
            .as_deref()
            .or(self.title.as_deref())
            .or(self.subtitle.as_deref())
            .unwrap_or("")
    }

    /// Accent colour, falling back to the default.
    #[must_use]
    pub fn accent(&self) -> &str {
        self.accent_color.as_deref().unwrap_or(DEFAULT_ACCENT)
    }
}

/// An image reference shown on an `image` slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SlideImage {
    /// Image location
    pub url: String,

    /// Caption drawn under the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Pointer annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrow: Option<ImageArrow>,
}

/// Arrow annotation at a percentage position over an image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ImageArrow {
    /// Horizontal position, percent
    pub x: u8,
    /// Vertical position, percent
    pub y: u8,
    /// Direction the arrow points
    #[serde(default)]
    pub direction: ArrowDirection,
}

/// Arrow direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowDirection {
    /// Points up
    #[default]
    Up,
    /// Points down
    Down,
    /// Points left
    Left,
    /// Points right
    Right,
}

impl ArrowDirection {
    /// Glyph used when drawing the arrow.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Up => '↑',
            Self::Down => '↓',
            Self::Left => '←',
            Self::Right => '→',
        }
    }
}

// ============================================================================
// Scenario
// ============================================================================

/// When the scenario gives forward navigation back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockRelease {
    /// Release as soon as the run starts; re-triggers are stopped by the
    /// phase guard alone.
    #[default]
    OnStart,
    /// Hold until the run is done; forward gestures during the run arrive as
    /// steps and are ignored.
    OnDone,
}

/// Scenario parameters as written in the deck file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScenarioConfig {
    /// Account or host under attack, shown in the panel header
    #[serde(default = "default_target")]
    pub target: String,

    /// Interval between generated log lines
    #[serde(default = "default_tick_interval")]
    pub tick_interval: String,

    /// Total length of the attempt
    #[serde(default = "default_attempt_duration")]
    pub attempt_duration: String,

    /// Pause between the success line and the done state
    #[serde(default = "default_settle_delay")]
    pub settle_delay: String,

    /// Maximum number of log lines kept
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Lock release policy
    #[serde(default)]
    pub lock_release: LockRelease,

    /// Guesses drawn at random for failed-attempt lines
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,

    /// Value revealed when the attempt completes
    #[serde(default = "default_resolved_value")]
    pub resolved_value: String,

    /// Fixed RNG seed for reproducible runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            tick_interval: default_tick_interval(),
            attempt_duration: default_attempt_duration(),
            settle_delay: default_settle_delay(),
            log_capacity: default_log_capacity(),
            lock_release: LockRelease::default(),
            candidates: default_candidates(),
            resolved_value: default_resolved_value(),
            seed: None,
        }
    }
}

fn default_target() -> String {
    "admin@example.com".to_string()
}

fn default_tick_interval() -> String {
    "50ms".to_string()
}

fn default_attempt_duration() -> String {
    "4s".to_string()
}

fn default_settle_delay() -> String {
    "800ms".to_string()
}

const fn default_log_capacity() -> usize {
    14
}

fn default_candidates() -> Vec<String> {
    [
        "123456", "password", "qwerty", "12345678", "zaq12wsx", "haslo123", "iloveyou",
        "admin1", "letmein", "Burek2011", "summer2024", "monkey",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_resolved_value() -> String {
    "Burek2012!".to_string()
}

/// Scenario parameters with durations resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSettings {
    /// Account or host under attack
    pub target: String,
    /// Interval between generated log lines
    pub tick_interval: Duration,
    /// Total length of the attempt
    pub attempt_duration: Duration,
    /// Pause between the success line and the done state
    pub settle_delay: Duration,
    /// Maximum number of log lines kept
    pub log_capacity: usize,
    /// Lock release policy
    pub lock_release: LockRelease,
    /// Guesses drawn at random for failed-attempt lines
    pub candidates: Vec<String>,
    /// Value revealed when the attempt completes
    pub resolved_value: String,
    /// Fixed RNG seed
    pub seed: Option<u64>,
}

impl ScenarioSettings {
    /// Resolves a written configuration.
    ///
    /// # Errors
    ///
    /// Returns the name and text of the first duration field that does not
    /// parse as a `humantime` duration.
    pub fn resolve(config: &ScenarioConfig) -> Result<Self, (&'static str, String)> {
        let parse = |field: &'static str, raw: &str| {
            humantime::parse_duration(raw.trim()).map_err(|_| (field, raw.to_string()))
        };
        Ok(Self {
            target: config.target.clone(),
            tick_interval: parse("tick_interval", &config.tick_interval)?,
            attempt_duration: parse("attempt_duration", &config.attempt_duration)?,
            settle_delay: parse("settle_delay", &config.settle_delay)?,
            log_capacity: config.log_capacity,
            lock_release: config.lock_release,
            candidates: config.candidates.clone(),
            resolved_value: config.resolved_value.clone(),
            seed: config.seed,
        })
    }
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            target: default_target(),
            tick_interval: Duration::from_millis(50),
            attempt_duration: Duration::from_secs(4),
            settle_delay: Duration::from_millis(800),
            log_capacity: default_log_capacity(),
            lock_release: LockRelease::OnStart,
            candidates: default_candidates(),
            resolved_value: default_resolved_value(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_slide_parses() {
        let slide: SlideConfig = serde_yaml::from_str("id: intro\nkind: title\n").unwrap();
        assert_eq!(slide.id, "intro");
        assert_eq!(slide.kind, SlideKind::Title);
        assert!(slide.images.is_empty());
        assert_eq!(slide.accent(), DEFAULT_ACCENT);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result: Result<SlideConfig, _> = serde_yaml::from_str("id: x\nkind: video\n");
        assert!(result.is_err());
    }

    #[test]
    fn headline_prefers_main_text() {
        let mut slide = SlideConfig::new("s", SlideKind::Info);
        assert_eq!(slide.headline(), "");
        slide.title = Some("TITLE".into());
        assert_eq!(slide.headline(), "TITLE");
        slide.main_text = Some("Main".into());
        assert_eq!(slide.headline(), "Main");
    }

    #[test]
    fn scenario_defaults_fill_missing_fields() {
        let config: ScenarioConfig = serde_yaml::from_str("target: root@host\n").unwrap();
        assert_eq!(config.target, "root@host");
        assert_eq!(config.log_capacity, 14);
        assert_eq!(config.lock_release, LockRelease::OnStart);
        assert!(!config.candidates.is_empty());
    }

    #[test]
    fn lock_release_parses_snake_case() {
        let config: ScenarioConfig = serde_yaml::from_str("lock_release: on_done\n").unwrap();
        assert_eq!(config.lock_release, LockRelease::OnDone);
    }

    #[test]
    fn resolve_parses_durations() {
        let config = ScenarioConfig {
            tick_interval: "25ms".into(),
            attempt_duration: "2s".into(),
            settle_delay: "1s 500ms".into(),
            ..ScenarioConfig::default()
        };
        let settings = ScenarioSettings::resolve(&config).unwrap();
        assert_eq!(settings.tick_interval, Duration::from_millis(25));
        assert_eq!(settings.attempt_duration, Duration::from_secs(2));
        assert_eq!(settings.settle_delay, Duration::from_millis(1500));
    }

    #[test]
    fn resolve_reports_bad_field() {
        let config = ScenarioConfig {
            attempt_duration: "soon".into(),
            ..ScenarioConfig::default()
        };
        let (field, raw) = ScenarioSettings::resolve(&config).unwrap_err();
        assert_eq!(field, "attempt_duration");
        assert_eq!(raw, "soon");
    }

    #[test]
    fn default_config_resolves_to_default_settings() {
        let settings = ScenarioSettings::resolve(&ScenarioConfig::default()).unwrap();
        assert_eq!(settings, ScenarioSettings::default());
    }

    #[test]
    fn image_arrow_defaults_up() {
        let image: SlideImage =
            serde_yaml::from_str("url: a.png\narrow: { x: 50, y: 60 }\n").unwrap();
        let arrow = image.arrow.unwrap();
        assert_eq!(arrow.direction, ArrowDirection::Up);
        assert_eq!(arrow.direction.glyph(), '↑');
    }
}
