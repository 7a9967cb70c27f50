//! Navigation lock
//!
//! A single boolean gate. The controller only reads it; the active slide
//! writes it through a [`LockHandle`] that it receives on activation and
//! loses on deactivation. Dropping the handle forces the gate open, so a
//! slide that is abandoned mid-run can never leave navigation wedged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

/// The shared lock cell.
///
/// Cloning yields another view of the same cell. Only [`NavigationLock::handle`]
/// hands out write access.
#[derive(Debug, Clone, Default)]
pub struct NavigationLock {
    locked: Arc<AtomicBool>,
}

impl NavigationLock {
    /// Creates a released lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether forward navigation is currently deferred.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    /// Issues the write capability for the slide that is becoming active.
    #[must_use]
    pub fn handle(&self, owner: usize) -> LockHandle {
        LockHandle {
            locked: Arc::clone(&self.locked),
            owner,
        }
    }

    /// Releases the lock regardless of who set it.
    ///
    /// Returns `true` if the lock was held.
    pub fn force_release(&self) -> bool {
        self.locked.swap(false, Ordering::SeqCst)
    }
}

/// Write access to the lock, as seen by a slide.
///
/// Slides that never defer navigation get [`NoLock`], so call sites never
/// branch on whether the capability exists.
pub trait LockControl: Send {
    /// Sets or clears the lock.
    fn request_lock(&mut self, locked: bool);

    /// Returns whether the lock is currently set.
    fn is_locked(&self) -> bool;
}

/// The capability given to the active slide.
///
/// Releases the lock when dropped.
#[derive(Debug)]
pub struct LockHandle {
    locked: Arc<AtomicBool>,
    owner: usize,
}

impl LockHandle {
    /// Index of the slide holding this handle.
    #[must_use]
    pub const fn owner(&self) -> usize {
        self.owner
    }
}

impl LockControl for LockHandle {
    fn request_lock(&mut self, locked: bool) {
        let previous = self.locked.swap(locked, Ordering::SeqCst);
        if previous != locked {
            debug!(owner = self.owner, locked, "navigation lock changed");
        }
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if self.locked.swap(false, Ordering::SeqCst) {
            debug!(owner = self.owner, "navigation lock force-released");
        }
    }
}

/// No-op lock capability for slides that do not defer navigation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLock;

impl LockControl for NoLock {
    fn request_lock(&mut self, _locked: bool) {}

    fn is_locked(&self) -> bool {
        false
    }
}
