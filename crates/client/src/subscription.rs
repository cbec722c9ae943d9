//! Subscription registry and publish response handling.

use crate::dispatcher::{DispatcherHandle, Flow};
use crate::message::Delivery;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, warn};
use ua_types::StatusCode;
use ua_types::service::subscription::{PublishResponse, PublishResult};

/// Callback invoked with every publish result of one subscription.
///
/// Runs on the notification worker thread. A callback that needs the
/// client should capture a [`WeakClient`](crate::WeakClient).
pub type NotificationCallback = Arc<dyn Fn(PublishResult) + Send + Sync>;

/// Subscription id to callback.
#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    callbacks: DashMap<u32, NotificationCallback>,
}

impl SubscriptionRegistry {
    /// Register `callback` for `subscription_id`, replacing any earlier one.
    pub fn register(&self, subscription_id: u32, callback: NotificationCallback) {
        if self.callbacks.insert(subscription_id, callback).is_some() {
            debug!("Replaced callback for subscription {}", subscription_id);
        }
    }

    pub fn remove(&self, subscription_id: u32) -> bool {
        self.callbacks.remove(&subscription_id).is_some()
    }

    /// The callback for `subscription_id`. Cloned out so it is never called
    /// with the map locked.
    pub fn get(&self, subscription_id: u32) -> Option<NotificationCallback> {
        self.callbacks
            .get(&subscription_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn clear(&self) {
        self.callbacks.clear();
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }
}

/// Completion of a publish request.
///
/// Holds the registry weakly; once the client is gone a late publish
/// response finds nothing to call.
pub(crate) struct PublishSink {
    dispatcher: DispatcherHandle,
    registry: Weak<SubscriptionRegistry>,
    session_closed: Arc<AtomicBool>,
}

impl PublishSink {
    pub fn new(
        dispatcher: DispatcherHandle,
        registry: &Arc<SubscriptionRegistry>,
        session_closed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            dispatcher,
            registry: Arc::downgrade(registry),
            session_closed,
        }
    }

    /// Hand the response to the notification worker. Called by the receive
    /// task, so it never runs user code itself.
    pub fn deliver(self, delivery: Delivery) {
        let Self {
            dispatcher,
            registry,
            session_closed,
        } = self;

        let action = Box::new(move || handle_publish(delivery, &registry, &session_closed));
        if let Err(e) = dispatcher.post(action) {
            debug!("Dropping publish response: {}", e);
        }
    }
}

fn handle_publish(
    delivery: Delivery,
    registry: &Weak<SubscriptionRegistry>,
    session_closed: &AtomicBool,
) -> Flow {
    let status = delivery.header.service_result;

    if status == StatusCode::BAD_SESSION_CLOSED {
        error!("Server closed the session, stopping notification delivery");
        session_closed.store(true, Ordering::Release);
        return Flow::Stop;
    }

    if !status.is_good() {
        warn!("Dropping publish response with status {}", status);
        return Flow::Continue;
    }

    let response: PublishResponse = match delivery.into_response() {
        Ok(response) => response,
        Err(e) => {
            warn!("Dropping undecodable publish response: {}", e);
            return Flow::Continue;
        }
    };

    let Some(registry) = registry.upgrade() else {
        debug!("Client gone, dropping publish response");
        return Flow::Continue;
    };

    let subscription_id = response.subscription_id;
    let Some(callback) = registry.get(subscription_id) else {
        warn!("No callback registered for subscription {}", subscription_id);
        return Flow::Continue;
    };
    drop(registry);

    callback(PublishResult::from(response));
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_most_recent_registration_wins() {
        let registry = SubscriptionRegistry::default();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first);
        registry.register(
            42,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );
        let counter = Arc::clone(&second);
        registry.register(
            42,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );
        assert_eq!(registry.len(), 1);

        let callback = registry.get(42).unwrap();
        callback(PublishResult::from(PublishResponse::default()));

        assert_eq!(first.load(Ordering::Relaxed), 0);
        assert_eq!(second.load(Ordering::Relaxed), 1);

        assert!(registry.remove(42));
        assert!(!registry.remove(42));
        assert!(registry.get(42).is_none());
    }
}
