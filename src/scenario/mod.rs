//! Interactive scenario
//!
//! The timed, three-phase simulation owned by `scenario` slides.
//!
//! - [`ScenarioEngine`] - per-activation state machine
//! - [`LogBuffer`] - capped FIFO log
//! - [`ScenarioTimers`] - epoch-scoped timer tasks

pub mod engine;
pub mod log;
pub mod timer;

pub use engine::{PhaseChange, ScenarioEngine, ScenarioPhase, ScenarioSnapshot};
pub use log::LogBuffer;
pub use timer::{ScenarioTimers, TimerEvent, TimerKind};
