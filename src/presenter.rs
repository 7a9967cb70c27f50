//! Presenter event loop
//!
//! One cooperative loop owns every piece of presentation state. Front-end
//! events and scenario timer events are handled one at a time, each as a
//! single non-preemptible turn followed by a redraw, so no two handlers ever
//! interleave.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::schema::DeckConfig;
use crate::deck::{ActivationChange, Deck, TimerDelivery};
use crate::error::{ConfigError, DeckError};
use crate::frontend::{FrontendEvent, Renderer, View};
use crate::input::{self, NavigationCommand, RawInput};
use crate::nav::{NavOutcome, NavigationController, NavigationLock, StepBus};
use crate::observability::events::{Event, EventEmitter, StopReason};
use crate::observability::metrics;
use crate::scenario::{PhaseChange, TimerEvent, TimerKind};

/// Options for a presentation run.
#[derive(Debug, Clone, Default)]
pub struct PresenterOptions {
    /// Slide to start on; clamped into range.
    pub start: usize,
    /// RNG seed applied to every scenario.
    pub seed: Option<u64>,
}

/// The presentation state machine and its event loop.
#[derive(Debug)]
pub struct Presenter {
    deck: Deck,
    controller: NavigationController,
    lock: NavigationLock,
    timers: mpsc::UnboundedReceiver<TimerEvent>,
    events: Arc<EventEmitter>,
    last_locked: bool,
    start: usize,
}

impl Presenter {
    /// Builds a presenter over a loaded deck.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::Config` if the deck has no slides or a scenario
    /// duration does not parse.
    pub fn new(
        config: Arc<DeckConfig>,
        options: &PresenterOptions,
        events: Arc<EventEmitter>,
    ) -> Result<Self, DeckError> {
        if config.slides.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "slides".to_string(),
                value: "[]".to_string(),
                expected: "at least one slide".to_string(),
            }
            .into());
        }

        let lock = NavigationLock::new();
        let bus = StepBus::new();
        let (timer_tx, timers) = mpsc::unbounded_channel();
        let controller = NavigationController::new(config.slides.len(), lock.clone(), bus.clone());
        let deck = Deck::new(config, lock.clone(), bus, timer_tx, options.seed)?;

        Ok(Self {
            deck,
            controller,
            lock,
            timers,
            events,
            last_locked: false,
            start: options.start,
        })
    }

    /// Current slide index.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.controller.position()
    }

    /// Slide collection.
    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Whether the navigation lock is held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Frame for the current state.
    #[must_use]
    pub fn view(&self) -> Option<View<'_>> {
        let position = self.position();
        self.deck.slide_config(position).map(|slide| View {
            deck: self.deck.config(),
            slide,
            position,
            len: self.controller.len(),
            locked: self.lock.is_locked(),
            scenario: self.deck.scenario(position),
        })
    }

    /// Activates the starting slide and announces the deck.
    pub fn start(&mut self) {
        self.controller.jump_to(self.start);
        let position = self.position();
        self.events.emit(Event::DeckStarted {
            timestamp: Utc::now(),
            title: self.deck.config().deck.title.clone(),
            slide_count: self.deck.len(),
            position,
        });
        info!(slides = self.deck.len(), position, "presentation started");
        self.sync();
    }

    /// Handles one raw input: adapter, controller, activation.
    pub fn handle_input(&mut self, raw: &RawInput) {
        let Some(command) = input::translate(raw) else {
            trace!(?raw, "input ignored");
            return;
        };
        if input::suppresses_default(raw) {
            trace!(?raw, "host default action suppressed");
        }
        metrics::record_command(command);

        let outcome = match command {
            NavigationCommand::Advance => self.controller.advance(),
            NavigationCommand::Retreat => self.controller.retreat(),
        };

        match outcome {
            NavOutcome::Moved { .. } => self.sync(),
            NavOutcome::Clamped => {
                trace!(%command, position = self.position(), "navigation clamped");
                self.events.emit(Event::NavigationClamped {
                    timestamp: Utc::now(),
                    command: command.as_str().to_string(),
                    position: self.position(),
                });
            }
            NavOutcome::Stepped { delivered } => {
                metrics::record_step();
                self.events.emit(Event::StepPublished {
                    timestamp: Utc::now(),
                    position: self.position(),
                    delivered,
                });
                for (index, change) in self.deck.deliver_steps() {
                    self.phase_entered(index, &change);
                }
            }
        }
        self.check_lock();
    }

    /// Triggers the current slide's scenario without going through the bus.
    pub fn trigger_scenario(&mut self) {
        if let Some((index, change)) = self.deck.trigger_active() {
            self.phase_entered(index, &change);
        }
        self.check_lock();
    }

    /// Routes a timer event to its activation.
    pub fn handle_timer(&mut self, event: TimerEvent) {
        match self.deck.on_timer(event) {
            TimerDelivery::Stale => {
                metrics::record_stale_timer();
                debug!(slide = event.slide, epoch = event.epoch, kind = ?event.kind, "stale timer dropped");
            }
            TimerDelivery::Delivered(change) => {
                if event.kind == TimerKind::AttemptElapsed {
                    self.announce_resolution(event.slide);
                }
                if let Some(change) = change {
                    self.phase_entered(event.slide, &change);
                }
            }
        }
        self.check_lock();
    }

    /// Deactivates everything and announces the stop.
    pub fn shutdown(&mut self, reason: StopReason) {
        let changes = self.deck.deactivate_all();
        self.announce(&changes);
        self.check_lock();
        self.events.emit(Event::DeckStopped {
            timestamp: Utc::now(),
            reason,
            position: self.position(),
        });
        info!(?reason, position = self.position(), "presentation stopped");
    }

    /// Runs the loop until quit, end of input, or cancellation.
    ///
    /// # Errors
    ///
    /// Returns the renderer's error if drawing fails.
    pub async fn run(
        mut self,
        mut inputs: mpsc::UnboundedReceiver<FrontendEvent>,
        renderer: &mut dyn Renderer,
        cancel: CancellationToken,
    ) -> Result<StopReason, DeckError> {
        self.start();
        self.render(renderer)?;

        let reason = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break StopReason::Cancelled,
                event = inputs.recv() => match event {
                    None => break StopReason::InputClosed,
                    Some(FrontendEvent::Quit) => break StopReason::Quit,
                    Some(FrontendEvent::Redraw) => {}
                    Some(FrontendEvent::Trigger) => self.trigger_scenario(),
                    Some(FrontendEvent::Input(raw)) => self.handle_input(&raw),
                },
                Some(event) = self.timers.recv() => self.handle_timer(event),
            }
            self.render(renderer)?;
        };

        self.shutdown(reason);
        Ok(reason)
    }

    fn render(&self, renderer: &mut dyn Renderer) -> Result<(), DeckError> {
        match self.view() {
            Some(view) => renderer.render(&view),
            None => Ok(()),
        }
    }

    fn sync(&mut self) {
        let position = self.position();
        metrics::set_current_slide(position);
        let changes = self.deck.sync(position);
        self.announce(&changes);
        self.check_lock();
    }

    /// Emits activation events. A departing slide that released the lock
    /// reports the release here, since the arriving slide may set it again
    /// within the same turn.
    fn announce(&mut self, changes: &[ActivationChange]) {
        for change in changes {
            match *change {
                ActivationChange::Activated { index, epoch } => {
                    self.events.emit(Event::SlideActivated {
                        timestamp: Utc::now(),
                        index,
                        slide_id: self.slide_id(index),
                        epoch,
                    });
                }
                ActivationChange::Deactivated {
                    index,
                    released_lock,
                } => {
                    self.events.emit(Event::SlideDeactivated {
                        timestamp: Utc::now(),
                        index,
                        slide_id: self.slide_id(index),
                    });
                    if released_lock {
                        self.lock_state(false);
                    }
                }
            }
        }
    }

    fn phase_entered(&self, index: usize, change: &PhaseChange) {
        metrics::record_scenario_phase(change.to);
        self.events.emit(Event::ScenarioPhaseEntered {
            timestamp: Utc::now(),
            index,
            from: change.from.to_string(),
            to: change.to.to_string(),
        });
    }

    fn announce_resolution(&self, index: usize) {
        let Some(snapshot) = self.deck.scenario(index) else {
            return;
        };
        if let Some(value) = snapshot.revealed {
            self.events.emit(Event::ScenarioResolved {
                timestamp: Utc::now(),
                index,
                value: value.to_string(),
                log_lines: snapshot.log.total_appended(),
            });
        }
    }

    fn check_lock(&mut self) {
        let locked = self.lock.is_locked();
        self.lock_state(locked);
    }

    fn lock_state(&mut self, locked: bool) {
        if locked != self.last_locked {
            self.last_locked = locked;
            debug!(locked, "navigation lock changed");
            self.events.emit(Event::LockChanged {
                timestamp: Utc::now(),
                locked,
            });
        }
    }

    fn slide_id(&self, index: usize) -> String {
        self.deck
            .slide_config(index)
            .map(|s| s.id.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::schema::{
        DeckMetadata, LockRelease, ScenarioConfig, SlideConfig, SlideKind,
    };
    use crate::frontend::headless::HeadlessRenderer;
    use crate::input::{Key, PointerButton};
    use crate::observability::events::tests::TestWriter;
    use crate::scenario::ScenarioPhase;

    const RIGHT: RawInput = RawInput::Key(Key::ArrowRight);
    const LEFT: RawInput = RawInput::Key(Key::ArrowLeft);

    fn config(lock_release: LockRelease) -> Arc<DeckConfig> {
        let mut scenario = SlideConfig::new("crack", SlideKind::Scenario);
        scenario.scenario = Some(ScenarioConfig {
            tick_interval: "10ms".into(),
            attempt_duration: "100ms".into(),
            settle_delay: "20ms".into(),
            resolved_value: "hunter2".into(),
            lock_release,
            ..ScenarioConfig::default()
        });
        Arc::new(DeckConfig {
            deck: DeckMetadata {
                title: "Test".into(),
                accent_color: None,
            },
            slides: vec![
                SlideConfig::new("intro", SlideKind::Title),
                scenario,
                SlideConfig::new("after", SlideKind::Title),
            ],
        })
    }

    fn presenter(lock_release: LockRelease) -> (Presenter, TestWriter) {
        let writer = TestWriter::default();
        let events = Arc::new(EventEmitter::new(Box::new(writer.clone())));
        let options = PresenterOptions {
            start: 0,
            seed: Some(7),
        };
        let mut presenter = Presenter::new(config(lock_release), &options, events).unwrap();
        presenter.start();
        (presenter, writer)
    }

    async fn pump(presenter: &mut Presenter, until: Duration) {
        let deadline = tokio::time::Instant::now() + until;
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => break,
                Some(event) = presenter.timers.recv() => presenter.handle_timer(event),
            }
        }
    }

    fn types(writer: &TestWriter) -> Vec<String> {
        writer
            .events()
            .iter()
            .map(|e| e["type"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn empty_deck_is_rejected() {
        let config = Arc::new(DeckConfig {
            deck: DeckMetadata::default(),
            slides: vec![],
        });
        let err = Presenter::new(config, &PresenterOptions::default(), Arc::new(EventEmitter::noop()))
            .unwrap_err();
        assert!(matches!(err, DeckError::Config(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn start_position_is_clamped() {
        let options = PresenterOptions {
            start: 99,
            seed: None,
        };
        let mut presenter = Presenter::new(
            config(LockRelease::OnStart),
            &options,
            Arc::new(EventEmitter::noop()),
        )
        .unwrap();
        presenter.start();
        assert_eq!(presenter.position(), 2);
        assert!(presenter.deck().is_active(2));
    }

    #[tokio::test(start_paused = true)]
    async fn ignored_inputs_change_nothing() {
        let (mut presenter, writer) = presenter(LockRelease::OnStart);
        let before = writer.events().len();
        presenter.handle_input(&RawInput::Key(Key::Other("Tab".into())));
        presenter.handle_input(&RawInput::Pointer(PointerButton::SECONDARY));
        assert_eq!(presenter.position(), 0);
        assert_eq!(writer.events().len(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn retreat_at_start_is_clamped() {
        let (mut presenter, writer) = presenter(LockRelease::OnStart);
        presenter.handle_input(&LEFT);
        assert_eq!(presenter.position(), 0);
        assert_eq!(types(&writer).last().unwrap(), "NavigationClamped");
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_walkthrough_on_start_policy() {
        let (mut presenter, writer) = presenter(LockRelease::OnStart);

        presenter.handle_input(&RIGHT);
        assert_eq!(presenter.position(), 1);
        assert!(presenter.is_locked());

        // First advance on the scenario slide starts the run instead of moving.
        presenter.handle_input(&RawInput::Key(Key::Space));
        assert_eq!(presenter.position(), 1);
        assert!(!presenter.is_locked());
        let phase = presenter.deck().scenario(1).unwrap().phase;
        assert_eq!(phase, ScenarioPhase::Running);

        pump(&mut presenter, Duration::from_millis(200)).await;
        let snapshot = presenter.deck().scenario(1).unwrap();
        assert_eq!(snapshot.phase, ScenarioPhase::Done);
        assert_eq!(snapshot.revealed, Some("hunter2"));

        presenter.handle_input(&RIGHT);
        assert_eq!(presenter.position(), 2);
        assert!(presenter.deck().scenario(1).is_none());

        let types = types(&writer);
        assert!(types.contains(&"StepPublished".to_string()));
        assert!(types.contains(&"ScenarioResolved".to_string()));
        assert_eq!(
            types.iter().filter(|t| *t == "ScenarioPhaseEntered").count(),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn advance_during_run_moves_on_under_on_start_policy() {
        let (mut presenter, _) = presenter(LockRelease::OnStart);
        presenter.handle_input(&RIGHT);
        presenter.handle_input(&RIGHT);
        assert_eq!(presenter.deck().scenario(1).unwrap().phase, ScenarioPhase::Running);

        // Lock already released: this one navigates away and tears the run down.
        presenter.handle_input(&RIGHT);
        assert_eq!(presenter.position(), 2);
        assert!(!presenter.is_locked());

        pump(&mut presenter, Duration::from_millis(300)).await;
        assert_eq!(presenter.position(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn on_done_policy_reroutes_until_done() {
        let (mut presenter, _) = presenter(LockRelease::OnDone);
        presenter.handle_input(&RIGHT);
        presenter.handle_input(&RIGHT);
        presenter.handle_input(&RIGHT);
        assert_eq!(presenter.position(), 1);
        assert!(presenter.is_locked());

        pump(&mut presenter, Duration::from_millis(200)).await;
        assert!(!presenter.is_locked());
        presenter.handle_input(&RIGHT);
        assert_eq!(presenter.position(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retreat_mid_run_cancels_and_revisit_resets() {
        let (mut presenter, writer) = presenter(LockRelease::OnDone);
        presenter.handle_input(&RIGHT);
        presenter.handle_input(&RIGHT);
        pump(&mut presenter, Duration::from_millis(50)).await;
        assert!(!presenter.deck().scenario(1).unwrap().log.is_empty());

        presenter.handle_input(&LEFT);
        assert_eq!(presenter.position(), 0);
        assert!(!presenter.is_locked());

        pump(&mut presenter, Duration::from_millis(300)).await;
        assert!(
            !types(&writer).contains(&"ScenarioResolved".to_string()),
            "cancelled run must not resolve"
        );

        presenter.handle_input(&RIGHT);
        let snapshot = presenter.deck().scenario(1).unwrap();
        assert_eq!(snapshot.phase, ScenarioPhase::Idle);
        assert!(snapshot.log.is_empty());
        assert_eq!(snapshot.revealed, None);
        assert!(presenter.is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn moving_between_adjacent_scenarios_reports_lock_handover() {
        let mut deck = (*config(LockRelease::OnStart)).clone();
        let mut second = deck.slides[1].clone();
        second.id = "crack-again".into();
        deck.slides.insert(2, second);

        let writer = TestWriter::default();
        let events = Arc::new(EventEmitter::new(Box::new(writer.clone())));
        let options = PresenterOptions {
            start: 2,
            seed: Some(7),
        };
        let mut presenter = Presenter::new(Arc::new(deck), &options, events).unwrap();
        presenter.start();
        assert!(presenter.is_locked());

        presenter.handle_input(&LEFT);
        assert_eq!(presenter.position(), 1);
        assert!(presenter.is_locked());

        let locks: Vec<bool> = writer
            .events()
            .iter()
            .filter(|e| e["type"] == "LockChanged")
            .map(|e| e["locked"].as_bool().unwrap())
            .collect();
        assert_eq!(locks, vec![true, false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn direct_trigger_starts_scenario() {
        let (mut presenter, _) = presenter(LockRelease::OnStart);
        presenter.trigger_scenario();
        presenter.handle_input(&RIGHT);
        presenter.trigger_scenario();
        assert_eq!(presenter.deck().scenario(1).unwrap().phase, ScenarioPhase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_stops_when_input_closes() {
        let writer = TestWriter::default();
        let events = Arc::new(EventEmitter::new(Box::new(writer.clone())));
        let presenter =
            Presenter::new(config(LockRelease::OnStart), &PresenterOptions::default(), events)
                .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(FrontendEvent::Input(RIGHT)).unwrap();
        tx.send(FrontendEvent::Redraw).unwrap();
        drop(tx);

        let mut renderer = HeadlessRenderer::new();
        let reason = presenter
            .run(rx, &mut renderer, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reason, StopReason::InputClosed);
        assert_eq!(renderer.frames(), 3);

        let events = writer.events();
        let last = events.last().unwrap();
        assert_eq!(last["type"], "DeckStopped");
        assert_eq!(last["position"], 1);
        assert_eq!(last["reason"], "input_closed");
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_honours_quit_and_cancel() {
        let make = || {
            Presenter::new(
                config(LockRelease::OnStart),
                &PresenterOptions::default(),
                Arc::new(EventEmitter::noop()),
            )
            .unwrap()
        };

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(FrontendEvent::Quit).unwrap();
        let reason = make()
            .run(rx, &mut HeadlessRenderer::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reason, StopReason::Quit);

        let (_tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let reason = make()
            .run(rx, &mut HeadlessRenderer::new(), cancel)
            .await
            .unwrap();
        assert_eq!(reason, StopReason::Cancelled);
    }
}
