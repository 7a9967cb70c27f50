mod common;

use std::time::Duration;

use deckhand::config::schema::{LockRelease, ScenarioSettings};
use deckhand::nav::NavigationLock;
use deckhand::scenario::engine::found_line;
use deckhand::scenario::{ScenarioEngine, ScenarioPhase, ScenarioTimers, TimerEvent, TimerKind};
use tokio::sync::mpsc;

fn settings(lock_release: LockRelease) -> ScenarioSettings {
    ScenarioSettings {
        tick_interval: Duration::from_millis(10),
        attempt_duration: Duration::from_millis(100),
        settle_delay: Duration::from_millis(20),
        log_capacity: 4,
        lock_release,
        resolved_value: "hunter2".into(),
        seed: Some(1),
        ..ScenarioSettings::default()
    }
}

fn engine(
    lock_release: LockRelease,
    lock: &NavigationLock,
) -> (ScenarioEngine, mpsc::UnboundedReceiver<TimerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let timers = ScenarioTimers::new(0, 1, tx);
    let engine = ScenarioEngine::new(settings(lock_release), timers, Box::new(lock.handle(0)));
    (engine, rx)
}

/// Advances paused time in small steps, feeding every timer event to the engine.
async fn pump(
    engine: &mut ScenarioEngine,
    rx: &mut mpsc::UnboundedReceiver<TimerEvent>,
    total: Duration,
) -> Vec<ScenarioPhase> {
    let step = Duration::from_millis(5);
    let mut elapsed = Duration::ZERO;
    let mut entered = Vec::new();
    while elapsed < total {
        tokio::time::sleep(step).await;
        elapsed += step;
        while let Ok(event) = rx.try_recv() {
            if let Some(change) = engine.on_timer(event) {
                entered.push(change.to);
            }
        }
    }
    entered
}

#[tokio::test(start_paused = true)]
async fn full_run_reveals_value_and_caps_log() {
    let lock = NavigationLock::new();
    let (mut engine, mut rx) = engine(LockRelease::OnStart, &lock);
    assert_eq!(engine.phase(), ScenarioPhase::Idle);
    assert!(lock.is_locked());

    let change = engine.trigger().unwrap();
    assert_eq!(change.from, ScenarioPhase::Idle);
    assert_eq!(change.to, ScenarioPhase::Running);
    assert!(change.released_lock);
    assert!(!lock.is_locked());

    let entered = pump(&mut engine, &mut rx, Duration::from_millis(90)).await;
    assert!(entered.is_empty());
    assert!(engine.revealed().is_none());
    assert_eq!(engine.log().len(), 4);

    let entered = pump(&mut engine, &mut rx, Duration::from_millis(60)).await;
    assert_eq!(entered, vec![ScenarioPhase::Done]);
    assert_eq!(engine.revealed(), Some("hunter2"));
    assert_eq!(engine.log().last(), Some(found_line("hunter2").as_str()));
    assert_eq!(engine.log().len(), 4);
    assert!(engine.log().total_appended() > 4);
}

#[tokio::test(start_paused = true)]
async fn trigger_outside_idle_is_ignored() {
    let lock = NavigationLock::new();
    let (mut engine, mut rx) = engine(LockRelease::OnStart, &lock);
    assert!(engine.trigger().is_some());
    assert!(engine.trigger().is_none());

    pump(&mut engine, &mut rx, Duration::from_millis(200)).await;
    assert_eq!(engine.phase(), ScenarioPhase::Done);
    assert!(engine.trigger().is_none());
    assert_eq!(engine.phase(), ScenarioPhase::Done);
}

#[tokio::test(start_paused = true)]
async fn on_done_policy_holds_lock_through_run() {
    let lock = NavigationLock::new();
    let (mut engine, mut rx) = engine(LockRelease::OnDone, &lock);

    let change = engine.trigger().unwrap();
    assert!(!change.released_lock);
    assert!(lock.is_locked());

    pump(&mut engine, &mut rx, Duration::from_millis(110)).await;
    assert_eq!(engine.phase(), ScenarioPhase::Running);
    assert!(lock.is_locked());

    let entered = pump(&mut engine, &mut rx, Duration::from_millis(40)).await;
    assert_eq!(entered, vec![ScenarioPhase::Done]);
    assert!(!lock.is_locked());
}

#[tokio::test(start_paused = true)]
async fn events_from_another_epoch_are_dropped() {
    let lock = NavigationLock::new();
    let (mut engine, _rx) = engine(LockRelease::OnStart, &lock);
    engine.trigger();

    let stale = TimerEvent {
        slide: 0,
        epoch: 99,
        kind: TimerKind::AttemptElapsed,
    };
    assert!(engine.on_timer(stale).is_none());
    assert!(engine.revealed().is_none());
    assert_eq!(engine.phase(), ScenarioPhase::Running);
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_run_silences_timers_and_releases_lock() {
    let lock = NavigationLock::new();
    let (mut engine, mut rx) = engine(LockRelease::OnDone, &lock);
    engine.trigger();
    assert!(lock.is_locked());

    tokio::time::sleep(Duration::from_millis(25)).await;
    assert!(engine.shutdown());
    assert!(!lock.is_locked());
    while rx.try_recv().is_ok() {}

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.try_recv().is_err());
    assert!(engine.revealed().is_none());
}

// ============================================================================
// End to end through the headless front-end
// ============================================================================

fn phases(run: &common::Run) -> Vec<(String, String)> {
    run.of_type("ScenarioPhaseEntered")
        .iter()
        .map(|e| {
            (
                e["from"].as_str().unwrap_or_default().to_string(),
                e["to"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn lock_states(run: &common::Run) -> Vec<bool> {
    run.of_type("LockChanged")
        .iter()
        .filter_map(|e| e["locked"].as_bool())
        .collect()
}

#[tokio::test]
async fn step_starts_scenario_and_deck_continues_after_done() {
    let script = "ArrowRight\nArrowRight\nArrowRight\nwait 400ms\nArrowRight\nquit\n";
    let run = common::present(Some("fast_scenario.yaml"), script, &[]).await;

    assert_eq!(run.code, Some(0));
    assert_eq!(run.activations(), vec![0, 1, 2, 3]);
    assert_eq!(
        phases(&run),
        vec![
            ("idle".to_string(), "running".to_string()),
            ("running".to_string(), "done".to_string()),
        ]
    );

    let resolved = run.of_type("ScenarioResolved");
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0]["index"], 2);
    assert_eq!(resolved[0]["value"], "hunter2");

    let steps = run.of_type("StepPublished");
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0]["delivered"], 1);

    assert_eq!(lock_states(&run), vec![true, false]);
    assert_eq!(run.stopped()["position"], 3);
}

#[tokio::test]
async fn leaving_mid_run_cancels_and_revisit_starts_fresh() {
    let script = "ArrowRight\nArrowRight\nArrowRight\nArrowLeft\nwait 300ms\nArrowRight\nquit\n";
    let run = common::present(Some("fast_scenario.yaml"), script, &[]).await;

    assert_eq!(run.activations(), vec![0, 1, 2, 1, 2]);
    assert!(run.of_type("ScenarioResolved").is_empty());
    assert_eq!(phases(&run), vec![("idle".to_string(), "running".to_string())]);

    let epochs: Vec<u64> = run
        .of_type("SlideActivated")
        .iter()
        .filter(|e| e["index"] == 2)
        .filter_map(|e| e["epoch"].as_u64())
        .collect();
    assert_eq!(epochs.len(), 2);
    assert!(epochs[1] > epochs[0]);

    // locked on arrival, released at start, locked again on revisit, released at shutdown
    assert_eq!(lock_states(&run), vec![true, false, true, false]);
    assert_eq!(run.stopped()["position"], 2);
}

#[tokio::test]
async fn held_lock_turns_extra_presses_into_ignored_steps() {
    let script = "ArrowRight\nArrowRight\nArrowRight\nwait 400ms\nArrowRight\nquit\n";
    let run = common::present(Some("held_scenario.yaml"), script, &[]).await;

    assert_eq!(run.activations(), vec![0, 1, 2]);
    assert_eq!(run.of_type("StepPublished").len(), 2);
    assert_eq!(
        phases(&run),
        vec![
            ("idle".to_string(), "running".to_string()),
            ("running".to_string(), "done".to_string()),
        ]
    );
    assert_eq!(lock_states(&run), vec![true, false]);
}

#[tokio::test]
async fn direct_trigger_starts_without_a_step() {
    let script = "ArrowRight\nArrowRight\ntrigger\nwait 400ms\nquit\n";
    let run = common::present(Some("fast_scenario.yaml"), script, &["--seed", "3"]).await;

    assert!(run.of_type("StepPublished").is_empty());
    assert_eq!(run.of_type("ScenarioResolved").len(), 1);
    assert_eq!(run.stopped()["position"], 2);
}

#[tokio::test]
async fn trigger_on_passive_slide_does_nothing() {
    let run = common::present(Some("fast_scenario.yaml"), "trigger\nquit\n", &[]).await;
    assert!(phases(&run).is_empty());
    assert_eq!(run.activations(), vec![0]);
}
