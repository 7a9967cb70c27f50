//! Front-ends
//!
//! A front-end does two things: it produces [`FrontendEvent`]s for the
//! presenter loop and it draws a [`View`] after every turn.
//!
//! - [`terminal`] - interactive `crossterm` front-end
//! - [`headless`] - stdin script reader for dry-runs and tests
//! - [`layout`] - text layout shared by renderers

pub mod headless;
pub mod layout;
pub mod terminal;

use crate::config::schema::{DeckConfig, SlideConfig};
use crate::error::DeckError;
use crate::input::RawInput;
use crate::scenario::ScenarioSnapshot;

/// Something a front-end reports to the presenter loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendEvent {
    /// A raw input for the adapter.
    Input(RawInput),
    /// Direct trigger for the current slide's scenario.
    Trigger,
    /// The screen needs repainting (e.g. after a resize).
    Redraw,
    /// The user asked to quit.
    Quit,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    /// Deck configuration
    pub deck: &'a DeckConfig,
    /// Current slide
    pub slide: &'a SlideConfig,
    /// Current position
    pub position: usize,
    /// Number of slides
    pub len: usize,
    /// Whether the navigation lock is held
    pub locked: bool,
    /// Scenario state, when the current slide owns one
    pub scenario: Option<ScenarioSnapshot<'a>>,
}

/// Draws frames.
pub trait Renderer {
    /// Draws the current state.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::Terminal` if the output device fails.
    fn render(&mut self, view: &View<'_>) -> Result<(), DeckError>;
}
