//! Observability
//!
//! Logging, metrics, and the structured event stream emitted while a deck
//! is being presented.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{Event, EventEmitter, StopReason};
pub use logging::{LogFormat, LogTarget, init_logging};
pub use metrics::init_metrics;
