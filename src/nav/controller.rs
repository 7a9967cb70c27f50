//! Navigation controller
//!
//! Owns the current slide position. Forward moves are interceptable by the
//! navigation lock; backward moves never are.

use tracing::debug;

use super::bus::{Step, StepBus};
use super::lock::NavigationLock;

/// Result of applying one navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Position changed.
    Moved {
        /// Position before the move
        from: usize,
        /// Position after the move
        to: usize,
    },
    /// Already at the boundary; nothing changed.
    Clamped,
    /// Lock was held; a `STEP` was published instead of moving.
    Stepped {
        /// Number of subscribers that received the signal
        delivered: usize,
    },
}

impl NavOutcome {
    /// The new position if the command moved it.
    #[must_use]
    pub const fn moved_to(self) -> Option<usize> {
        match self {
            Self::Moved { to, .. } => Some(to),
            Self::Clamped | Self::Stepped { .. } => None,
        }
    }
}

/// Tracks the active slide index within `[0, len - 1]`.
#[derive(Debug)]
pub struct NavigationController {
    position: usize,
    len: usize,
    lock: NavigationLock,
    bus: StepBus,
}

impl NavigationController {
    /// Creates a controller at position 0 over `len` slides.
    ///
    /// `len` is fixed for the lifetime of the controller. A zero length is
    /// treated as a single slide so the position invariant always holds;
    /// deck validation rejects empty decks before this point.
    #[must_use]
    pub fn new(len: usize, lock: NavigationLock, bus: StepBus) -> Self {
        Self {
            position: 0,
            len: len.max(1),
            lock,
            bus,
        }
    }

    /// Current slide index.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Total number of slides.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; a controller spans at least one slide.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Index of the last slide.
    #[must_use]
    pub const fn last(&self) -> usize {
        self.len - 1
    }

    /// Moves forward one slide, or publishes `STEP` if the lock is held.
    pub fn advance(&mut self) -> NavOutcome {
        if self.lock.is_locked() {
            let delivered = self.bus.publish(Step);
            debug!(position = self.position, delivered, "advance rerouted as step");
            return NavOutcome::Stepped { delivered };
        }
        if self.position < self.last() {
            self.move_to(self.position + 1)
        } else {
            NavOutcome::Clamped
        }
    }

    /// Moves back one slide. Not gated by the lock.
    pub fn retreat(&mut self) -> NavOutcome {
        if self.position > 0 {
            self.move_to(self.position - 1)
        } else {
            NavOutcome::Clamped
        }
    }

    /// Jumps straight to `index`, clamped into range.
    ///
    /// Used for the starting slide; bypasses the lock like any
    /// non-forward-step change of position.
    pub fn jump_to(&mut self, index: usize) -> NavOutcome {
        let target = index.min(self.last());
        if target == self.position {
            NavOutcome::Clamped
        } else {
            self.move_to(target)
        }
    }

    fn move_to(&mut self, to: usize) -> NavOutcome {
        let from = self.position;
        self.position = to;
        debug!(from, to, "slide position changed");
        NavOutcome::Moved { from, to }
    }
}
