use crate::client::Client;
use crate::correlator::PendingSlot;
use crate::error::{Error, Result};
use crate::subscription::PublishSink;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, info};
use ua_types::StatusCode;
use ua_types::service::subscription::{
    CreateMonitoredItemsRequest, CreateSubscriptionRequest, CreateSubscriptionResponse,
    DeleteMonitoredItemsRequest, DeleteSubscriptionsRequest, MonitoredItemCreateResult,
    NotificationMessage, PublishRequest, PublishResult, RepublishRequest,
};

impl Client {
    /// Create a subscription and register `callback` for its notifications.
    ///
    /// The callback runs on the notification worker for every publish
    /// response of this subscription. It replaces any callback registered
    /// earlier under the same id. To reach the client from the callback,
    /// capture a [`WeakClient`](crate::WeakClient).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn create_subscription<F>(
        &self,
        request: CreateSubscriptionRequest,
        callback: F,
    ) -> Result<CreateSubscriptionResponse>
    where
        F: Fn(PublishResult) + Send + Sync + 'static,
    {
        let response = self.send_checked(request).await?;
        self.inner
            .subscriptions
            .register(response.subscription_id, Arc::new(callback));
        info!(
            parent: &self.inner.span,
            "Created subscription {} (interval {} ms)",
            response.subscription_id, response.revised_publishing_interval
        );
        Ok(response)
    }

    /// Delete subscriptions. Callbacks of the subscriptions the server
    /// reports deleted are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole.
    pub async fn delete_subscriptions(&self, subscription_ids: Vec<u32>) -> Result<Vec<StatusCode>> {
        let request = DeleteSubscriptionsRequest {
            subscription_ids: subscription_ids.clone(),
            ..Default::default()
        };
        let results = self.send_checked(request).await?.results;

        for (id, status) in subscription_ids.iter().zip(&results) {
            if status.is_good() && self.inner.subscriptions.remove(*id) {
                debug!(parent: &self.inner.span, "Removed callback for subscription {}", id);
            }
        }

        Ok(results)
    }

    /// Create monitored items in a subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole.
    pub async fn create_monitored_items(
        &self,
        request: CreateMonitoredItemsRequest,
    ) -> Result<Vec<MonitoredItemCreateResult>> {
        Ok(self.send_checked(request).await?.results)
    }

    /// Delete monitored items from a subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it as a
    /// whole.
    pub async fn delete_monitored_items(
        &self,
        subscription_id: u32,
        monitored_item_ids: Vec<u32>,
    ) -> Result<Vec<StatusCode>> {
        let request = DeleteMonitoredItemsRequest {
            subscription_id,
            monitored_item_ids,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.results)
    }

    /// Queue a publish request.
    ///
    /// Returns once the request is written. The server holds it until it
    /// has notifications; the response goes to the callback of its
    /// subscription on the notification worker. The request is sent
    /// without a timeout and nothing waits for it.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] once the server reported the session
    ///   closed.
    /// - [`Error::Send`] if the request could not be written.
    pub async fn publish(&self, mut request: PublishRequest) -> Result<()> {
        if self.inner.session_closed.load(Ordering::Acquire) {
            return Err(Error::SessionClosed);
        }

        let handle = self.stamp(&mut request)?;
        request.request_header.timeout_hint = 0;

        let sink = PublishSink::new(
            self.inner.dispatcher.handle(),
            &self.inner.subscriptions,
            Arc::clone(&self.inner.session_closed),
        );
        self.write_with_slot(&request, handle, PendingSlot::Publish(sink))
            .await
    }

    /// Ask the server to resend a notification message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn republish(
        &self,
        subscription_id: u32,
        retransmit_sequence_number: u32,
    ) -> Result<NotificationMessage> {
        let request = RepublishRequest {
            subscription_id,
            retransmit_sequence_number,
            ..Default::default()
        };
        Ok(self.send_checked(request).await?.notification_message)
    }
}
