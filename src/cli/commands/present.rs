//! `present` command
//!
//! Loads a deck, wires the chosen front-end to the presenter loop, and runs
//! it until the user quits, input ends, or a signal arrives.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::args::PresentArgs;
use crate::config::loader::ConfigLoader;
use crate::error::DeckError;
use crate::frontend::headless::{self, HeadlessRenderer};
use crate::frontend::terminal::{self, TerminalGuard, TerminalRenderer};
use crate::observability::events::EventEmitter;
use crate::presenter::{Presenter, PresenterOptions};

/// Present a deck.
///
/// # Errors
///
/// Returns a config error if the deck does not load, an I/O error if the
/// events file or metrics listener cannot be opened, or a terminal error if
/// the screen cannot be driven.
pub async fn run(args: &PresentArgs, cancel: CancellationToken) -> Result<(), DeckError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let loaded = ConfigLoader::with_defaults().load_or_default(args.deck.as_deref())?;
    for warning in &loaded.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }

    let events = match (&args.events_file, args.headless) {
        (Some(path), _) => EventEmitter::from_file(path)?,
        (None, true) => EventEmitter::stdout(),
        (None, false) => EventEmitter::noop(),
    };

    let options = PresenterOptions {
        start: usize::try_from(args.start.saturating_sub(1)).unwrap_or(usize::MAX),
        seed: args.seed,
    };
    let presenter = Presenter::new(loaded.config, &options, Arc::new(events))?;
    let (tx, rx) = mpsc::unbounded_channel();

    let reason = if args.headless {
        let reader = headless::spawn_stdin_reader(tx);
        let mut renderer = HeadlessRenderer::new();
        let reason = presenter.run(rx, &mut renderer, cancel).await;
        reader.abort();
        reason?
    } else {
        let guard = TerminalGuard::enter()?;
        let reader_cancel = cancel.child_token();
        let reader = terminal::spawn_event_reader(tx, reader_cancel.clone());
        let mut renderer = TerminalRenderer::new();
        let reason = presenter.run(rx, &mut renderer, cancel).await;
        reader_cancel.cancel();
        let _ = reader.await;
        drop(guard);
        reason?
    };

    tracing::debug!(?reason, "present finished");
    Ok(())
}
