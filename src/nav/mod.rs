//! Navigation core
//!
//! - [`NavigationController`] - slide position, advance/retreat with clamping
//! - [`NavigationLock`] - gate through which the active slide defers forward moves
//! - [`StepBus`] - fan-out channel carrying rerouted forward gestures

pub mod bus;
pub mod controller;
pub mod lock;

pub use bus::{Step, StepBus, StepSubscription};
pub use controller::{NavOutcome, NavigationController};
pub use lock::{LockControl, LockHandle, NavigationLock, NoLock};
