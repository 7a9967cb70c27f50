//! Structured event stream.
//!
//! Discrete, typed events emitted while a deck is presented. Events are
//! serialized as newline-delimited JSON (JSONL) and carry a monotonically
//! increasing sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a presentation.
///
/// Tagged with `"type"` when serialized so consumers can dispatch on kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The presenter loop has started.
    DeckStarted {
        /// When the loop started.
        timestamp: DateTime<Utc>,
        /// Deck title.
        title: String,
        /// Number of slides.
        slide_count: usize,
        /// Initial position.
        position: usize,
    },

    /// The presenter loop has stopped.
    DeckStopped {
        /// When the loop stopped.
        timestamp: DateTime<Utc>,
        /// Why it stopped.
        reason: StopReason,
        /// Position at shutdown.
        position: usize,
    },

    /// A slide became the current slide.
    SlideActivated {
        /// When it happened.
        timestamp: DateTime<Utc>,
        /// Slide index.
        index: usize,
        /// Slide id from the deck file.
        slide_id: String,
        /// Activation epoch.
        epoch: u64,
    },

    /// A slide stopped being the current slide.
    SlideDeactivated {
        /// When it happened.
        timestamp: DateTime<Utc>,
        /// Slide index.
        index: usize,
        /// Slide id from the deck file.
        slide_id: String,
    },

    /// A navigation command hit a deck boundary and did nothing.
    NavigationClamped {
        /// When it happened.
        timestamp: DateTime<Utc>,
        /// `"advance"` or `"retreat"`.
        command: String,
        /// Position that was kept.
        position: usize,
    },

    /// A locked `ADVANCE` was rerouted as a step.
    StepPublished {
        /// When it happened.
        timestamp: DateTime<Utc>,
        /// Current position.
        position: usize,
        /// Subscribers the step reached.
        delivered: usize,
    },

    /// The navigation lock changed state.
    LockChanged {
        /// When it happened.
        timestamp: DateTime<Utc>,
        /// New state.
        locked: bool,
    },

    /// A scenario entered a new phase.
    ScenarioPhaseEntered {
        /// When it happened.
        timestamp: DateTime<Utc>,
        /// Slide index.
        index: usize,
        /// Phase left.
        from: String,
        /// Phase entered.
        to: String,
    },

    /// A scenario revealed its value.
    ScenarioResolved {
        /// When it happened.
        timestamp: DateTime<Utc>,
        /// Slide index.
        index: usize,
        /// Revealed value.
        value: String,
        /// Log lines appended over the run.
        log_lines: u64,
    },
}

/// Why the presenter stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The user asked to quit.
    Quit,
    /// The input stream ended.
    InputClosed,
    /// A signal cancelled the loop.
    Cancelled,
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization or I/O failures are dropped; a broken event sink must not
/// take the presentation down with it.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    /// In-memory writer for capturing emitter output in tests.
    #[derive(Clone, Default)]
    pub(crate) struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        pub(crate) fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }

        pub(crate) fn events(&self) -> Vec<serde_json::Value> {
            self.contents()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn sample_event() -> Event {
        Event::DeckStarted {
            timestamp: DateTime::parse_from_rfc3339("2026-03-14T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            title: "Password Security".to_owned(),
            slide_count: 12,
            position: 0,
        }
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let json = serde_json::to_string(&sample_event()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "DeckStarted");
        assert_eq!(parsed["slide_count"], 12);
    }

    #[test]
    fn emitter_writes_sequenced_jsonl() {
        let tw = TestWriter::default();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(sample_event());
        emitter.emit(Event::DeckStopped {
            timestamp: Utc::now(),
            reason: StopReason::InputClosed,
            position: 3,
        });

        assert_eq!(emitter.event_count(), 2);
        let lines = tw.events();
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[0]["title"], "Password Security");
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["reason"], "input_closed");
        assert!(lines[1].get("event").is_none(), "event should be flattened");
    }

    #[test]
    fn all_event_variants_serialize_to_valid_json() {
        let now = Utc::now();
        let variants = vec![
            sample_event(),
            Event::SlideActivated {
                timestamp: now,
                index: 1,
                slide_id: "crack".into(),
                epoch: 4,
            },
            Event::SlideDeactivated {
                timestamp: now,
                index: 1,
                slide_id: "crack".into(),
            },
            Event::NavigationClamped {
                timestamp: now,
                command: "retreat".into(),
                position: 0,
            },
            Event::StepPublished {
                timestamp: now,
                position: 1,
                delivered: 1,
            },
            Event::LockChanged {
                timestamp: now,
                locked: true,
            },
            Event::ScenarioPhaseEntered {
                timestamp: now,
                index: 1,
                from: "idle".into(),
                to: "running".into(),
            },
            Event::ScenarioResolved {
                timestamp: now,
                index: 1,
                value: "hunter2".into(),
                log_lines: 40,
            },
        ];

        for variant in &variants {
            let json = serde_json::to_string(variant).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert!(parsed.get("type").is_some(), "missing type tag: {json}");
        }
    }
}
