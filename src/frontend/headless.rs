//! Headless front-end
//!
//! Reads a script of inputs, one per line, from stdin (or any async reader):
//!
//! ```text
//! # comments and blank lines are skipped
//! ArrowRight
//! button 0
//! trigger
//! wait 500ms
//! quit
//! ```
//!
//! `wait` pauses the reader, not the presenter, so timers keep running
//! while the script sleeps. End of input closes the event channel.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::DeckError;
use crate::input::{ParseInputError, RawInput};

use super::{FrontendEvent, Renderer, View, layout};

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLine {
    /// Forward an event to the presenter.
    Event(FrontendEvent),
    /// Pause the reader.
    Wait(Duration),
}

/// Parses one script line. Blank lines and `#` comments yield `None`.
///
/// # Errors
///
/// Returns `ParseInputError` for an empty `button` index or a malformed
/// `wait` duration.
pub fn parse_line(line: &str) -> Option<Result<ScriptLine, ParseInputError>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let parsed = match line {
        "quit" => Ok(ScriptLine::Event(FrontendEvent::Quit)),
        "trigger" => Ok(ScriptLine::Event(FrontendEvent::Trigger)),
        _ => line.strip_prefix("wait ").map_or_else(
            || {
                line.parse::<RawInput>()
                    .map(|input| ScriptLine::Event(FrontendEvent::Input(input)))
            },
            |raw| {
                humantime::parse_duration(raw.trim())
                    .map(ScriptLine::Wait)
                    .map_err(|_| ParseInputError(line.to_string()))
            },
        ),
    };
    Some(parsed)
}

/// Spawns a task that feeds script lines from stdin into `tx`.
pub fn spawn_stdin_reader(tx: mpsc::UnboundedSender<FrontendEvent>) -> JoinHandle<()> {
    spawn_reader(tokio::io::stdin(), tx)
}

/// Spawns a task that feeds script lines from `reader` into `tx`.
///
/// Unparseable lines are logged and skipped. The task ends at end of input,
/// after `quit`, or when the receiver is dropped.
pub fn spawn_reader<R>(reader: R, tx: mpsc::UnboundedSender<FrontendEvent>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "script read failed");
                    break;
                }
            };

            match parse_line(&line) {
                None => {}
                Some(Ok(ScriptLine::Wait(duration))) => {
                    trace!(?duration, "script waiting");
                    tokio::time::sleep(duration).await;
                }
                Some(Ok(ScriptLine::Event(event))) => {
                    let quit = event == FrontendEvent::Quit;
                    if tx.send(event).is_err() || quit {
                        break;
                    }
                }
                Some(Err(e)) => warn!(error = %e, "script line skipped"),
            }
        }
        debug!("script reader finished");
    })
}

/// Renderer for headless runs: frames go to the trace log only.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames: u64,
}

impl HeadlessRenderer {
    /// Creates a renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: 0 }
    }

    /// Frames rendered so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, view: &View<'_>) -> Result<(), DeckError> {
        self.frames += 1;
        trace!(
            frame = self.frames,
            slide = %view.slide.id,
            footer = %layout::footer(view),
            "frame"
        );
        Ok(())
    }
}
