//! Pending-response table.

use crate::message::Delivery;
use crate::subscription::PublishSink;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::oneshot;

/// What happens to the response for a handle.
pub(crate) enum PendingSlot {
    /// A caller is waiting on the other end.
    Waiter(oneshot::Sender<Delivery>),
    /// A publish response, handed to the notification dispatcher.
    Publish(PublishSink),
}

/// Maps request handles to completion slots.
///
/// Every operation locks one shard for a single map operation; nothing
/// holds a lock across I/O.
pub(crate) struct Correlator {
    pending: DashMap<u32, PendingSlot>,
    next_handle: AtomicU32,
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            next_handle: AtomicU32::new(1),
        }
    }

    /// Allocate a fresh request handle. Zero is skipped on wrap.
    pub fn next_handle(&self) -> u32 {
        loop {
            let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
            if handle != 0 {
                return handle;
            }
        }
    }

    /// Register `slot` under `handle`. Returns `false` and drops the slot
    /// if the handle is already pending.
    pub fn register(&self, handle: u32, slot: PendingSlot) -> bool {
        match self.pending.entry(handle) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(slot);
                true
            }
        }
    }

    /// Remove and return the slot for `handle`.
    pub fn take(&self, handle: u32) -> Option<PendingSlot> {
        self.pending.remove(&handle).map(|(_, slot)| slot)
    }

    /// Number of requests in flight.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Drop the slots of outstanding publish requests. Their responses are
    /// then discarded as unknown. Returns how many were dropped.
    pub fn discard_publishes(&self) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|_, slot| !matches!(slot, PendingSlot::Publish(_)));
        before.saturating_sub(self.pending.len())
    }

    /// Drop every slot. Waiters see their sender dropped.
    pub fn clear(&self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::NotificationDispatcher;
    use crate::subscription::SubscriptionRegistry;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use tracing::Span;

    #[test]
    fn test_handles_are_unique_across_threads() {
        let correlator = Arc::new(Correlator::new());

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let correlator = Arc::clone(&correlator);
                std::thread::spawn(move || {
                    (0..1000)
                        .map(|_| correlator.next_handle())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for thread in threads {
            let handles = thread.join().unwrap();
            assert!(handles.windows(2).all(|pair| pair[0] < pair[1]));
            for handle in handles {
                assert!(seen.insert(handle));
            }
        }
        assert_eq!(seen.len(), 4000);
    }

    #[test]
    fn test_handle_zero_is_skipped() {
        let correlator = Correlator::new();
        correlator.next_handle.store(u32::MAX, Ordering::Relaxed);

        assert_eq!(correlator.next_handle(), u32::MAX);
        assert_eq!(correlator.next_handle(), 1);
    }

    #[test]
    fn test_register_and_take() {
        let correlator = Correlator::new();
        let (first, _first_rx) = oneshot::channel();
        let (second, _second_rx) = oneshot::channel();

        assert!(correlator.register(3, PendingSlot::Waiter(first)));
        assert!(!correlator.register(3, PendingSlot::Waiter(second)));
        assert_eq!(correlator.len(), 1);

        assert!(correlator.take(3).is_some());
        assert!(correlator.take(3).is_none());
        assert_eq!(correlator.len(), 0);
    }

    #[test]
    fn test_discard_publishes_keeps_waiters() {
        let correlator = Correlator::new();
        let dispatcher = NotificationDispatcher::start(&Span::none()).unwrap();
        let registry = Arc::new(SubscriptionRegistry::default());
        let session_closed = Arc::new(AtomicBool::new(false));
        let (waiter, _waiter_rx) = oneshot::channel();

        assert!(correlator.register(1, PendingSlot::Waiter(waiter)));
        for handle in 2..=3 {
            let sink = PublishSink::new(
                dispatcher.handle(),
                &registry,
                Arc::clone(&session_closed),
            );
            assert!(correlator.register(handle, PendingSlot::Publish(sink)));
        }

        assert_eq!(correlator.discard_publishes(), 2);
        assert_eq!(correlator.len(), 1);
        assert!(matches!(correlator.take(1), Some(PendingSlot::Waiter(_))));

        dispatcher.stop().unwrap().join().unwrap();
    }
}
