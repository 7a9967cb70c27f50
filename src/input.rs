//! Input adapter
//!
//! Translates raw keyboard and pointer-button events into the two abstract
//! navigation commands. The mapping is pure; front-ends own event capture.

use std::fmt;
use std::str::FromStr;

/// Abstract navigation command derived from a raw input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationCommand {
    /// Move forward (or step the active scenario while the lock is held).
    Advance,
    /// Move backward. Never intercepted by the lock.
    Retreat,
}

impl NavigationCommand {
    /// Stable lowercase name, used for metrics labels and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Advance => "advance",
            Self::Retreat => "retreat",
        }
    }
}

impl fmt::Display for NavigationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key identity as seen by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// `ArrowRight`
    ArrowRight,
    /// `ArrowLeft`
    ArrowLeft,
    /// `Space`
    Space,
    /// Anything else, kept by name for logging.
    Other(String),
}

/// Pointer button index, numbered the way DOM `MouseEvent.button` numbers them:
/// 0 primary, 1 auxiliary, 2 secondary, 3 back, 4 forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerButton(pub u8);

impl PointerButton {
    /// Primary (left) button.
    pub const PRIMARY: Self = Self(0);
    /// Auxiliary (middle) button.
    pub const AUXILIARY: Self = Self(1);
    /// Secondary (right) button.
    pub const SECONDARY: Self = Self(2);
    /// Backward side button.
    pub const BACK: Self = Self(3);
    /// Forward side button.
    pub const FORWARD: Self = Self(4);
}

/// A raw input event delivered by a front-end.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawInput {
    /// A key press.
    Key(Key),
    /// A pointer button press.
    Pointer(PointerButton),
}

/// Maps a raw input event onto a navigation command.
///
/// Returns `None` for every input outside the fixed mapping.
#[must_use]
pub fn translate(input: &RawInput) -> Option<NavigationCommand> {
    match input {
        RawInput::Key(Key::ArrowRight | Key::Space) => Some(NavigationCommand::Advance),
        RawInput::Key(Key::ArrowLeft) => Some(NavigationCommand::Retreat),
        RawInput::Pointer(PointerButton::PRIMARY | PointerButton::FORWARD) => {
            Some(NavigationCommand::Advance)
        }
        RawInput::Pointer(PointerButton::BACK) => Some(NavigationCommand::Retreat),
        RawInput::Key(Key::Other(_)) | RawInput::Pointer(_) => None,
    }
}

/// Whether the platform's own handling of this input must be suppressed.
///
/// The side buttons would otherwise trigger history navigation in hosts
/// that implement it, racing the command produced by [`translate`].
#[must_use]
pub const fn suppresses_default(input: &RawInput) -> bool {
    matches!(
        input,
        RawInput::Pointer(PointerButton::BACK | PointerButton::FORWARD)
    )
}

/// Error returned when a scripted input line cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInputError(pub String);

impl fmt::Display for ParseInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized input: '{}'", self.0)
    }
}

impl std::error::Error for ParseInputError {}

/// Parses the textual form used by scripted (headless) sessions:
/// `ArrowRight`, `ArrowLeft`, `Space`, or `button <n>`.
///
/// Unknown key names parse as [`Key::Other`] so they reach the adapter and
/// are ignored there, exactly as unmapped keys are in interactive mode.
impl FromStr for RawInput {
    type Err = ParseInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseInputError(s.to_string()));
        }
        if let Some(rest) = s.strip_prefix("button") {
            let index: u8 = rest
                .trim()
                .parse()
                .map_err(|_| ParseInputError(s.to_string()))?;
            return Ok(Self::Pointer(PointerButton(index)));
        }
        let key = match s {
            "ArrowRight" => Key::ArrowRight,
            "ArrowLeft" => Key::ArrowLeft,
            "Space" => Key::Space,
            other => Key::Other(other.to_string()),
        };
        Ok(Self::Key(key))
    }
}
