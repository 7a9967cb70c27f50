//! Scenario timers
//!
//! Timers are spawned tasks that only sleep and post a [`TimerEvent`] back
//! to the presenter loop; they never touch scenario state. Every task is a
//! child of one activation-wide cancellation token, and every event carries
//! the activation epoch so the receiver can drop anything that outlived the
//! activation that scheduled it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// Which timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Repeating log-generation tick
    Tick,
    /// The attempt duration has elapsed
    AttemptElapsed,
    /// The post-success delay has elapsed
    Settled,
}

/// A timer firing, addressed to one slide activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    /// Index of the slide that scheduled the timer
    pub slide: usize,
    /// Activation epoch at scheduling time
    pub epoch: u64,
    /// Which timer fired
    pub kind: TimerKind,
}

/// The timer set owned by one scenario activation.
///
/// Dropping it cancels every outstanding task.
#[derive(Debug)]
pub struct ScenarioTimers {
    slide: usize,
    epoch: u64,
    tx: mpsc::UnboundedSender<TimerEvent>,
    cancel: CancellationToken,
    ticker: Option<CancellationToken>,
}

impl ScenarioTimers {
    /// Creates an empty timer set for one activation.
    #[must_use]
    pub fn new(slide: usize, epoch: u64, tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            slide,
            epoch,
            tx,
            cancel: CancellationToken::new(),
            ticker: None,
        }
    }

    /// Activation epoch these timers belong to.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Starts the repeating tick. The first tick arrives one `period` from now.
    ///
    /// Replaces any running ticker. A `period` too large to schedule leaves
    /// the ticker stopped.
    pub fn start_ticker(&mut self, period: Duration) {
        self.stop_ticker();
        let Some(first) = Instant::now().checked_add(period) else {
            warn!(slide = self.slide, ?period, "tick interval out of range; ticker not started");
            return;
        };
        let token = self.cancel.child_token();
        let event = self.event(TimerKind::Tick);
        let tx = self.tx.clone();
        let task_token = token.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    () = task_token.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                }
            }
            trace!(slide = event.slide, epoch = event.epoch, "ticker stopped");
        });
        self.ticker = Some(token);
    }

    /// Stops the repeating tick, if running.
    pub fn stop_ticker(&mut self) {
        if let Some(token) = self.ticker.take() {
            token.cancel();
        }
    }

    /// Whether the repeating tick is running.
    #[must_use]
    pub const fn ticker_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Schedules a one-shot timer.
    pub fn schedule(&self, kind: TimerKind, delay: Duration) {
        let token = self.cancel.child_token();
        let event = self.event(kind);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    trace!(slide = event.slide, epoch = event.epoch, kind = ?event.kind, "one-shot cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    let _ = tx.send(event);
                }
            }
        });
    }

    /// Cancels every timer in the set.
    pub fn cancel_all(&mut self) {
        self.ticker = None;
        self.cancel.cancel();
    }

    /// Whether [`cancel_all`](Self::cancel_all) has run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    const fn event(&self, kind: TimerKind) -> TimerEvent {
        TimerEvent {
            slide: self.slide,
            epoch: self.epoch,
            kind,
        }
    }
}

impl Drop for ScenarioTimers {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
