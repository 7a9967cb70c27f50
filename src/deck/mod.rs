//! Slide collection and activation lifecycle
//!
//! A slide is active exactly when the controller's position equals its
//! index. [`Deck::sync`] re-derives that flag for every slide and runs the
//! only two lifecycle hooks a slide gets: becoming active and becoming
//! inactive. Scenario slides build a fresh engine on activation and tear it
//! down on deactivation, so nothing from a previous visit survives.

mod slide;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::schema::{DeckConfig, ScenarioSettings, SlideConfig, SlideKind};
use crate::error::ConfigError;
use crate::nav::bus::StepBus;
use crate::nav::lock::NavigationLock;
use crate::scenario::{PhaseChange, ScenarioSnapshot, TimerEvent};

pub use slide::Slide;

/// A change of one slide's activation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationChange {
    /// The slide became the current slide.
    Activated {
        /// Slide index
        index: usize,
        /// Activation epoch assigned to this visit
        epoch: u64,
    },
    /// The slide stopped being the current slide.
    Deactivated {
        /// Slide index
        index: usize,
        /// Whether deactivation had to force the lock open
        released_lock: bool,
    },
}

/// Outcome of routing a timer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerDelivery {
    /// Delivered to the live activation that scheduled it.
    Delivered(Option<PhaseChange>),
    /// The scheduling activation is gone; the event had no effect.
    Stale,
}

/// All slides of a loaded deck and their runtime state.
#[derive(Debug)]
pub struct Deck {
    config: Arc<DeckConfig>,
    slides: Vec<Slide>,
    lock: NavigationLock,
    bus: StepBus,
    timer_tx: mpsc::UnboundedSender<TimerEvent>,
    next_epoch: u64,
}

impl Deck {
    /// Builds the runtime deck.
    ///
    /// `seed` overrides every scenario's configured RNG seed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a scenario duration does not
    /// parse. Loaded decks have already been validated, so this only fires
    /// for hand-built configurations.
    pub fn new(
        config: Arc<DeckConfig>,
        lock: NavigationLock,
        bus: StepBus,
        timer_tx: mpsc::UnboundedSender<TimerEvent>,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let slides = config
            .slides
            .iter()
            .enumerate()
            .map(|(index, slide)| build_slide(index, slide, seed))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            slides,
            lock,
            bus,
            timer_tx,
            next_epoch: 1,
        })
    }

    /// Number of slides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Whether the deck has no slides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Deck configuration.
    #[must_use]
    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// Content of the slide at `index`.
    #[must_use]
    pub fn slide_config(&self, index: usize) -> Option<&SlideConfig> {
        self.config.slides.get(index)
    }

    /// Whether the slide at `index` is active.
    #[must_use]
    pub fn is_active(&self, index: usize) -> bool {
        self.slides.get(index).is_some_and(Slide::is_active)
    }

    /// Scenario state of the slide at `index`, if it is an active scenario.
    #[must_use]
    pub fn scenario(&self, index: usize) -> Option<ScenarioSnapshot<'_>> {
        self.slides.get(index).and_then(Slide::scenario)
    }

    /// Re-derives every slide's activation flag from `position`.
    ///
    /// Deactivations run before activations so a departing slide's forced
    /// lock release can never clobber the arriving slide's lock.
    pub fn sync(&mut self, position: usize) -> Vec<ActivationChange> {
        let mut changes = Vec::new();

        for slide in &mut self.slides {
            if slide.is_active() && slide.index() != position {
                let released_lock = slide.deactivate();
                let forced = self.lock.force_release();
                let released_lock = released_lock || forced;
                if forced {
                    warn!(index = slide.index(), "lock left set by departing slide; released");
                }
                changes.push(ActivationChange::Deactivated {
                    index: slide.index(),
                    released_lock,
                });
            }
        }

        if let Some(slide) = self.slides.get_mut(position) {
            if !slide.is_active() {
                let epoch = self.next_epoch;
                self.next_epoch += 1;
                slide.activate(epoch, &self.lock, &self.bus, &self.timer_tx);
                changes.push(ActivationChange::Activated {
                    index: position,
                    epoch,
                });
            }
        }

        debug!(position, changes = changes.len(), "activation synced");
        changes
    }

    /// Hands pending `STEP` signals to the active slide.
    ///
    /// Returns the phase changes they caused, tagged with the slide index.
    pub fn deliver_steps(&mut self) -> Vec<(usize, PhaseChange)> {
        self.slides
            .iter_mut()
            .filter(|slide| slide.is_active())
            .flat_map(|slide| {
                let index = slide.index();
                slide
                    .take_steps()
                    .into_iter()
                    .map(move |change| (index, change))
            })
            .collect()
    }

    /// Triggers the active slide's scenario directly, bypassing the bus.
    pub fn trigger_active(&mut self) -> Option<(usize, PhaseChange)> {
        self.slides
            .iter_mut()
            .find(|slide| slide.is_active())
            .and_then(|slide| slide.trigger().map(|change| (slide.index(), change)))
    }

    /// Routes a timer event to the activation that scheduled it.
    pub fn on_timer(&mut self, event: TimerEvent) -> TimerDelivery {
        match self.slides.get_mut(event.slide) {
            Some(slide) => slide.on_timer(event),
            None => TimerDelivery::Stale,
        }
    }

    /// Deactivates every slide and releases the lock.
    pub fn deactivate_all(&mut self) -> Vec<ActivationChange> {
        let mut changes = Vec::new();
        for slide in &mut self.slides {
            if slide.is_active() {
                let released_lock = slide.deactivate();
                changes.push(ActivationChange::Deactivated {
                    index: slide.index(),
                    released_lock,
                });
            }
        }
        self.lock.force_release();
        changes
    }
}

fn build_slide(index: usize, config: &SlideConfig, seed: Option<u64>) -> Result<Slide, ConfigError> {
    if config.kind != SlideKind::Scenario {
        return Ok(Slide::passive(index));
    }

    let mut settings = match &config.scenario {
        Some(scenario) => {
            ScenarioSettings::resolve(scenario).map_err(|(field, value)| {
                ConfigError::InvalidValue {
                    field: format!("slides[{index}].scenario.{field}"),
                    value,
                    expected: "a duration such as '50ms' or '4s'".to_string(),
                }
            })?
        }
        None => ScenarioSettings::default(),
    };
    if seed.is_some() {
        settings.seed = seed;
    }
    Ok(Slide::with_scenario(index, settings))
}
