//! Step signal bus
//!
//! Generic fan-out channel for the payload-free `STEP` signal. Each
//! subscriber gets its own mailbox; the subscription is a guard that
//! unsubscribes on drop, which ties it to the lifetime of whatever holds it.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc;
use tracing::trace;

/// The rerouted forward-navigation gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step;

#[derive(Debug, Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<(u64, mpsc::UnboundedSender<Step>)>,
}

/// Publish/subscribe channel for [`Step`] signals.
///
/// Cloning yields another handle to the same bus.
#[derive(Debug, Clone, Default)]
pub struct StepBus {
    inner: Arc<Mutex<BusInner>>,
}

impl StepBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a `STEP` to every live subscriber.
    ///
    /// Returns the number of mailboxes the signal reached.
    pub fn publish(&self, step: Step) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .subscribers
            .retain(|(_, tx)| tx.send(step).is_ok());
        let delivered = inner.subscribers.len();
        trace!(delivered, "step published");
        delivered
    }

    /// Registers a new mailbox.
    #[must_use]
    pub fn subscribe(&self) -> StepSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, tx));
        trace!(id, "step subscriber added");
        StepSubscription {
            id,
            bus: Arc::downgrade(&self.inner),
            rx,
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .len()
    }
}

/// A live subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct StepSubscription {
    id: u64,
    bus: Weak<Mutex<BusInner>>,
    rx: mpsc::UnboundedReceiver<Step>,
}

impl StepSubscription {
    /// Takes the next pending signal without waiting.
    pub fn try_next(&mut self) -> Option<Step> {
        self.rx.try_recv().ok()
    }

    /// Takes every pending signal, returning how many there were.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while self.try_next().is_some() {
            count += 1;
        }
        count
    }
}

impl Drop for StepSubscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            let mut inner = bus.lock().unwrap_or_else(PoisonError::into_inner);
            inner.subscribers.retain(|(id, _)| *id != self.id);
            trace!(id = self.id, "step subscriber removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers() {
        let bus = StepBus::new();
        assert_eq!(bus.publish(Step), 0);
    }

    #[test]
    fn subscriber_receives_steps() {
        let bus = StepBus::new();
        let mut sub = bus.subscribe();
        assert_eq!(bus.publish(Step), 1);
        assert_eq!(sub.try_next(), Some(Step));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn fan_out_to_all_subscribers() {
        let bus = StepBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.publish(Step), 2);
        assert_eq!(a.drain(), 1);
        assert_eq!(b.drain(), 1);
    }

    #[test]
    fn drop_unsubscribes() {
        let bus = StepBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(Step), 0);
    }

    #[test]
    fn drain_counts_pending() {
        let bus = StepBus::new();
        let mut sub = bus.subscribe();
        bus.publish(Step);
        bus.publish(Step);
        bus.publish(Step);
        assert_eq!(sub.drain(), 3);
        assert_eq!(sub.drain(), 0);
    }

    #[test]
    fn subscription_outliving_bus_is_harmless() {
        let bus = StepBus::new();
        let sub = bus.subscribe();
        drop(bus);
        drop(sub);
    }
}
