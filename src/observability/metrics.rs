//! Metrics collection.
//!
//! Prometheus-compatible counters and gauges for navigation and scenario
//! activity, with typed helpers so call sites never build label sets by hand.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::DeckError;
use crate::input::NavigationCommand;
use crate::scenario::ScenarioPhase;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// # Errors
///
/// Returns `DeckError::Io` if the recorder or listener cannot be installed
/// (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), DeckError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| DeckError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "deckhand_commands_total",
        "Navigation commands received, by command"
    );
    describe_counter!(
        "deckhand_steps_total",
        "Advance commands rerouted as steps while locked"
    );
    describe_gauge!("deckhand_current_slide", "Index of the current slide");
    describe_counter!(
        "deckhand_scenario_phase_total",
        "Scenario phase entries, by phase"
    );
    describe_counter!(
        "deckhand_stale_timers_total",
        "Timer events dropped because their activation was gone"
    );
}

/// Records a navigation command.
pub fn record_command(command: NavigationCommand) {
    counter!("deckhand_commands_total", "command" => command.as_str()).increment(1);
}

/// Records a published step.
pub fn record_step() {
    counter!("deckhand_steps_total").increment(1);
}

/// Sets the current slide gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_current_slide(index: usize) {
    gauge!("deckhand_current_slide").set(index as f64);
}

/// Records a scenario phase entry.
pub fn record_scenario_phase(phase: ScenarioPhase) {
    counter!("deckhand_scenario_phase_total", "phase" => phase.as_str()).increment(1);
}

/// Records a dropped stale timer event.
pub fn record_stale_timer() {
    counter!("deckhand_stale_timers_total").increment(1);
}
