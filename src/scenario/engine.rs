//! Scenario engine
//!
//! Drives one activation of a scenario slide through `Idle → Running → Done`.
//! The engine is a plain state machine: it is poked by [`ScenarioEngine::trigger`]
//! (a `STEP` or a direct trigger) and by [`ScenarioEngine::on_timer`], and
//! reports each phase change to the caller. Timers and the lock capability
//! are owned by the engine and die with it.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tracing::{debug, info, trace};

use crate::config::schema::{LockRelease, ScenarioSettings};
use crate::nav::lock::LockControl;

use super::log::LogBuffer;
use super::timer::{ScenarioTimers, TimerEvent, TimerKind};

/// Marker appended when the attempt succeeds.
pub const SUCCESS_MARKER: &str = "[+] ACCESS GRANTED";

/// Prefix of the line that carries the resolved value.
pub const FOUND_PREFIX: &str = "[+] PASSWORD FOUND: ";

/// Formats a failed-attempt log line.
#[must_use]
pub fn failed_line(candidate: &str) -> String {
    format!("[-] trying {candidate:<16} FAILED")
}

/// Formats the line that carries the resolved value.
#[must_use]
pub fn found_line(value: &str) -> String {
    format!("{FOUND_PREFIX}{value}")
}

/// Phase of one scenario activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScenarioPhase {
    /// Waiting for the first step
    Idle,
    /// Attempt in progress
    Running,
    /// Attempt finished; value revealed
    Done,
}

impl ScenarioPhase {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for ScenarioPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a phase change, returned to the caller for events and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseChange {
    /// Phase before the change
    pub from: ScenarioPhase,
    /// Phase after the change
    pub to: ScenarioPhase,
    /// Whether the change released the navigation lock
    pub released_lock: bool,
}

/// Read-only view of the engine, for rendering.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioSnapshot<'a> {
    /// Current phase
    pub phase: ScenarioPhase,
    /// Log buffer
    pub log: &'a LogBuffer,
    /// Revealed value, once the attempt has succeeded
    pub revealed: Option<&'a str>,
    /// Attack target
    pub target: &'a str,
}

/// One activation of the scenario state machine.
///
/// `Idle` holds the navigation lock. That arming step is what turns the next
/// `ADVANCE` on the slide into a `STEP` for the engine instead of a move.
pub struct ScenarioEngine {
    settings: ScenarioSettings,
    phase: ScenarioPhase,
    log: LogBuffer,
    revealed: Option<String>,
    timers: ScenarioTimers,
    lock: Box<dyn LockControl>,
    rng: StdRng,
}

impl ScenarioEngine {
    /// Creates an engine in `Idle` and asserts the lock so the next forward
    /// gesture reaches the engine as a step.
    #[must_use]
    pub fn new(
        settings: ScenarioSettings,
        timers: ScenarioTimers,
        mut lock: Box<dyn LockControl>,
    ) -> Self {
        let rng = settings
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        lock.request_lock(true);
        debug!(epoch = timers.epoch(), scenario_target = %settings.target, "scenario armed");
        Self {
            log: LogBuffer::new(settings.log_capacity),
            settings,
            phase: ScenarioPhase::Idle,
            revealed: None,
            timers,
            lock,
            rng,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> ScenarioPhase {
        self.phase
    }

    /// Activation epoch of this engine.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.timers.epoch()
    }

    /// Log buffer.
    #[must_use]
    pub const fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Revealed value, set exactly once on success.
    #[must_use]
    pub fn revealed(&self) -> Option<&str> {
        self.revealed.as_deref()
    }

    /// Whether this engine currently holds the navigation lock.
    #[must_use]
    pub fn holds_lock(&self) -> bool {
        self.lock.is_locked()
    }

    /// Read-only view for rendering.
    #[must_use]
    pub fn snapshot(&self) -> ScenarioSnapshot<'_> {
        ScenarioSnapshot {
            phase: self.phase,
            log: &self.log,
            revealed: self.revealed(),
            target: &self.settings.target,
        }
    }

    /// Handles a `STEP` or direct trigger.
    ///
    /// Starts the attempt from `Idle`; ignored in every other phase.
    pub fn trigger(&mut self) -> Option<PhaseChange> {
        if self.phase != ScenarioPhase::Idle {
            trace!(phase = %self.phase, "trigger ignored");
            return None;
        }

        self.timers.start_ticker(self.settings.tick_interval);
        self.timers
            .schedule(TimerKind::AttemptElapsed, self.settings.attempt_duration);

        let released_lock = match self.settings.lock_release {
            LockRelease::OnStart => self.release_lock(),
            LockRelease::OnDone => false,
        };
        info!(scenario_target = %self.settings.target, "scenario attempt started");
        Some(self.enter(ScenarioPhase::Running, released_lock))
    }

    /// Handles a timer firing.
    ///
    /// Events from another epoch are dropped without effect.
    pub fn on_timer(&mut self, event: TimerEvent) -> Option<PhaseChange> {
        if event.epoch != self.epoch() {
            debug!(
                event_epoch = event.epoch,
                epoch = self.epoch(),
                kind = ?event.kind,
                "stale timer dropped"
            );
            return None;
        }

        match (event.kind, self.phase) {
            (TimerKind::Tick, ScenarioPhase::Running) if self.revealed.is_none() => {
                self.append_failed_attempt();
                None
            }
            (TimerKind::AttemptElapsed, ScenarioPhase::Running) if self.revealed.is_none() => {
                self.resolve();
                None
            }
            (TimerKind::Settled, ScenarioPhase::Running) if self.revealed.is_some() => {
                let released_lock = self.release_lock();
                info!("scenario done");
                Some(self.enter(ScenarioPhase::Done, released_lock))
            }
            (kind, phase) => {
                trace!(?kind, %phase, "timer ignored in current phase");
                None
            }
        }
    }

    /// Cancels all timers and releases the lock.
    ///
    /// Called when the owning slide deactivates; dropping the engine does the
    /// same, this just makes the order explicit.
    pub fn shutdown(&mut self) -> bool {
        self.timers.cancel_all();
        self.release_lock()
    }

    fn append_failed_attempt(&mut self) {
        let Some(candidate) = self.settings.candidates.choose(&mut self.rng) else {
            return;
        };
        let line = failed_line(candidate);
        trace!(%line, "scenario log line");
        self.log.push(line);
    }

    fn resolve(&mut self) {
        self.timers.stop_ticker();
        self.log.push(SUCCESS_MARKER);
        self.log.push(found_line(&self.settings.resolved_value));
        self.revealed = Some(self.settings.resolved_value.clone());
        self.timers
            .schedule(TimerKind::Settled, self.settings.settle_delay);
        debug!("scenario value resolved");
    }

    fn release_lock(&mut self) -> bool {
        if self.lock.is_locked() {
            self.lock.request_lock(false);
            true
        } else {
            false
        }
    }

    fn enter(&mut self, to: ScenarioPhase, released_lock: bool) -> PhaseChange {
        let from = self.phase;
        self.phase = to;
        debug!(%from, %to, released_lock, "scenario phase entered");
        PhaseChange {
            from,
            to,
            released_lock,
        }
    }
}

impl std::fmt::Debug for ScenarioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioEngine")
            .field("phase", &self.phase)
            .field("epoch", &self.epoch())
            .field("log_len", &self.log.len())
            .field("revealed", &self.revealed)
            .finish_non_exhaustive()
    }
}
