//! Per-slide runtime state

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::config::schema::ScenarioSettings;
use crate::nav::bus::{StepBus, StepSubscription};
use crate::nav::lock::NavigationLock;
use crate::scenario::{
    PhaseChange, ScenarioEngine, ScenarioSnapshot, ScenarioTimers, TimerEvent,
};

use super::TimerDelivery;

/// Runtime state of one slide.
#[derive(Debug)]
pub struct Slide {
    index: usize,
    active: bool,
    runtime: SlideRuntime,
}

#[derive(Debug)]
enum SlideRuntime {
    Passive,
    Scenario {
        settings: ScenarioSettings,
        activation: Option<ScenarioActivation>,
    },
}

/// Everything a scenario slide owns while it is the current slide.
#[derive(Debug)]
struct ScenarioActivation {
    engine: ScenarioEngine,
    steps: StepSubscription,
}

impl Slide {
    pub(super) const fn passive(index: usize) -> Self {
        Self {
            index,
            active: false,
            runtime: SlideRuntime::Passive,
        }
    }

    pub(super) const fn with_scenario(index: usize, settings: ScenarioSettings) -> Self {
        Self {
            index,
            active: false,
            runtime: SlideRuntime::Scenario {
                settings,
                activation: None,
            },
        }
    }

    /// Position of the slide in the deck.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Whether the slide is the current slide.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the slide owns a scenario.
    #[must_use]
    pub const fn is_scenario(&self) -> bool {
        matches!(self.runtime, SlideRuntime::Scenario { .. })
    }

    /// Scenario state, while active.
    #[must_use]
    pub fn scenario(&self) -> Option<ScenarioSnapshot<'_>> {
        match &self.runtime {
            SlideRuntime::Scenario {
                activation: Some(activation),
                ..
            } => Some(activation.engine.snapshot()),
            _ => None,
        }
    }

    pub(super) fn activate(
        &mut self,
        epoch: u64,
        lock: &NavigationLock,
        bus: &StepBus,
        timer_tx: &mpsc::UnboundedSender<TimerEvent>,
    ) {
        self.active = true;
        if let SlideRuntime::Scenario {
            settings,
            activation,
        } = &mut self.runtime
        {
            let timers = ScenarioTimers::new(self.index, epoch, timer_tx.clone());
            let engine = ScenarioEngine::new(
                settings.clone(),
                timers,
                Box::new(lock.handle(self.index)),
            );
            *activation = Some(ScenarioActivation {
                engine,
                steps: bus.subscribe(),
            });
        }
        debug!(index = self.index, epoch, "slide activated");
    }

    /// Returns whether tearing down the scenario released the lock.
    pub(super) fn deactivate(&mut self) -> bool {
        self.active = false;
        let mut released = false;
        if let SlideRuntime::Scenario { activation, .. } = &mut self.runtime {
            if let Some(mut current) = activation.take() {
                released = current.engine.shutdown();
            }
        }
        debug!(index = self.index, released, "slide deactivated");
        released
    }

    pub(super) fn take_steps(&mut self) -> Vec<PhaseChange> {
        let SlideRuntime::Scenario {
            activation: Some(activation),
            ..
        } = &mut self.runtime
        else {
            return Vec::new();
        };

        let mut changes = Vec::new();
        while activation.steps.try_next().is_some() {
            changes.extend(activation.engine.trigger());
        }
        changes
    }

    pub(super) fn trigger(&mut self) -> Option<PhaseChange> {
        match &mut self.runtime {
            SlideRuntime::Scenario {
                activation: Some(activation),
                ..
            } => activation.engine.trigger(),
            _ => None,
        }
    }

    pub(super) fn on_timer(&mut self, event: TimerEvent) -> TimerDelivery {
        match &mut self.runtime {
            SlideRuntime::Scenario {
                activation: Some(activation),
                ..
            } if activation.engine.epoch() == event.epoch => {
                TimerDelivery::Delivered(activation.engine.on_timer(event))
            }
            _ => {
                trace!(index = self.index, epoch = event.epoch, kind = ?event.kind, "stale timer");
                TimerDelivery::Stale
            }
        }
    }
}
