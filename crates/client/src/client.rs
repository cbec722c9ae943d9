//! The client handle and the generic send path.

use crate::browse::ContinuationPoints;
use crate::channel::SecureChannel;
use crate::config::ClientConfig;
use crate::correlator::{Correlator, PendingSlot};
use crate::dispatcher::NotificationDispatcher;
use crate::error::{Error, Result};
use crate::framing::FrameReader;
use crate::handshake::handshake;
use crate::logging::client_span;
use crate::receive::{ConnectionHealth, ReceiveLoop};
use crate::subscription::SubscriptionRegistry;
use parking_lot::{Mutex, RwLock};
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, debug_span, info, warn};
use ua_transport::Transport;
use ua_transport_tcp::TcpTransport;
use ua_types::frame::Acknowledge;
use ua_types::service::secure_channel::ChannelSecurityToken;
use ua_types::{ByteString, DateTime, NodeId, ServiceRequest, ServiceResponse};

/// A connection to one server.
///
/// Cheap to clone; all clones share the connection. Requests may be sent
/// concurrently from any number of tasks. Responses are matched to their
/// callers by request handle, in whatever order they arrive.
///
/// Call [`Client::shutdown`] to tear the connection down and wait for its
/// background work to finish. Dropping the last handle stops everything
/// without waiting.
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

/// A handle that does not keep the connection alive.
///
/// Subscription callbacks that need the client should capture one of
/// these instead of a [`Client`].
#[derive(Clone)]
pub struct WeakClient {
    inner: Weak<ClientInner>,
}

impl WeakClient {
    /// The client, if it still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<Client> {
        self.inner.upgrade().map(|inner| Client { inner })
    }
}

impl Debug for WeakClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakClient")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    pub(crate) span: Span,
    pub(crate) channel: SecureChannel,
    pub(crate) correlator: Arc<Correlator>,
    pub(crate) health: Arc<ConnectionHealth>,
    pub(crate) dispatcher: NotificationDispatcher,
    pub(crate) subscriptions: Arc<SubscriptionRegistry>,
    pub(crate) continuation: ContinuationPoints,
    pub(crate) authentication_token: RwLock<NodeId>,
    pub(crate) session_closed: Arc<AtomicBool>,
    accepting: AtomicBool,
    receive_task: Mutex<Option<JoinHandle<()>>>,
    acknowledge: Acknowledge,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if self.accepting.swap(false, Ordering::AcqRel) {
            debug!(parent: &self.span, "Client dropped without shutdown");
        }
        // Detached; the worker exits on its own.
        drop(self.dispatcher.stop());
        self.channel.transport().stop();
        if let Some(task) = self.receive_task.get_mut().take() {
            task.abort();
        }
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint_url", &self.inner.config.endpoint_url)
            .field("in_flight", &self.inner.correlator.len())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Connect over TCP to `config.endpoint_url` and perform the handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the TCP connection
    /// fails or the server rejects the hello.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = TcpTransport::connect(&config.endpoint_url).await?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Perform the handshake over `transport` and start the background work.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] for an invalid configuration.
    /// - [`Error::Transport`] if the stream fails before the acknowledge.
    /// - [`Error::ProtocolFault`] if the server answers with an error frame.
    /// - [`Error::MalformedFrame`] if it answers with anything else.
    pub async fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let span = client_span(&config.endpoint_url);
        let result = Self::start(config, Arc::clone(&transport), span.clone())
            .instrument(span)
            .await;
        if result.is_err() {
            transport.stop();
        }
        result
    }

    async fn start(config: ClientConfig, transport: Arc<dyn Transport>, span: Span) -> Result<Self> {
        let mut reader = FrameReader::new(
            Arc::clone(&transport),
            config.receive_buffer_size as usize,
        );
        let acknowledge = handshake(&transport, &mut reader, &config.hello()).await?;
        let dispatcher = NotificationDispatcher::start(&span)?;

        let correlator = Arc::new(Correlator::new());
        let health = Arc::new(ConnectionHealth::default());
        let receive_task =
            ReceiveLoop::new(reader, Arc::clone(&correlator), Arc::clone(&health)).spawn(&span);

        info!("Connected");

        Ok(Self {
            inner: Arc::new(ClientInner {
                channel: SecureChannel::new(transport, config.connection_params(), &acknowledge),
                config,
                span,
                correlator,
                health,
                dispatcher,
                subscriptions: Arc::new(SubscriptionRegistry::default()),
                continuation: ContinuationPoints::default(),
                authentication_token: RwLock::new(NodeId::NULL),
                session_closed: Arc::new(AtomicBool::new(false)),
                accepting: AtomicBool::new(true),
                receive_task: Mutex::new(Some(receive_task)),
                acknowledge,
            }),
        })
    }

    /// A handle that does not keep the client alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakClient {
        WeakClient {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Send `request` and wait for its response.
    ///
    /// The request header is stamped with the session token, a fresh
    /// request handle and the current time. A timeout hint of zero is
    /// replaced by the configured request timeout, which is also how long
    /// this call waits.
    ///
    /// The response is returned as decoded, even when its service result
    /// is bad. A service fault becomes [`Error::ServiceFault`].
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] or [`Error::ConnectionBroken`] before
    ///   anything is sent.
    /// - [`Error::Send`] or [`Error::MessageTooLarge`] if the request could
    ///   not be written.
    /// - [`Error::ResponseTimeout`] if no response arrived in time.
    pub async fn send<R: ServiceRequest>(&self, mut request: R) -> Result<R::Response> {
        let handle = self.stamp(&mut request)?;
        let span = debug_span!(parent: &self.inner.span, "request", handle, type_id = R::TYPE_ID);
        self.send_stamped(request, handle).instrument(span).await
    }

    async fn send_stamped<R: ServiceRequest>(&self, request: R, handle: u32) -> Result<R::Response> {
        let wait = Duration::from_millis(u64::from(request.request_header().timeout_hint));
        let (sender, receiver) = oneshot::channel();

        self.write_with_slot(&request, handle, PendingSlot::Waiter(sender))
            .await?;

        let delivery = timeout(wait, receiver)
            .await
            .map_err(|_| {
                self.inner.correlator.take(handle);
                debug!("Request {} timed out after {:?}", handle, wait);
                Error::ResponseTimeout(wait)
            })?
            .map_err(|_| Error::ChannelClosed)?;

        delivery.into_response()
    }

    /// [`Client::send`], turning a bad service result into
    /// [`Error::ServiceFault`].
    pub(crate) async fn send_checked<R: ServiceRequest>(&self, request: R) -> Result<R::Response> {
        let response = self.send(request).await?;
        let status = response.response_header().service_result;
        if status.is_bad() {
            return Err(Error::ServiceFault { status });
        }
        Ok(response)
    }

    /// Check that the client can send and fill in the request header.
    /// Returns the allocated request handle.
    pub(crate) fn stamp<R: ServiceRequest>(&self, request: &mut R) -> Result<u32> {
        self.ensure_open()?;

        let handle = self.inner.correlator.next_handle();
        let authentication_token = self.inner.authentication_token.read().clone();
        let header = request.request_header_mut();
        header.authentication_token = authentication_token;
        header.request_handle = handle;
        header.timestamp = DateTime::now();
        if header.timeout_hint == 0 {
            header.timeout_hint = self.inner.config.request_timeout_ms;
        }

        Ok(handle)
    }

    /// Register `slot` under `handle` and write the request. On failure the
    /// slot is removed again.
    pub(crate) async fn write_with_slot<R: ServiceRequest>(
        &self,
        request: &R,
        handle: u32,
        slot: PendingSlot,
    ) -> Result<()> {
        if !self.inner.correlator.register(handle, slot) {
            // Only possible after the handle counter wrapped onto a request
            // that is still pending.
            return Err(Error::ChannelClosed);
        }
        debug!(
            "Registered pending request {} (total: {})",
            handle,
            self.inner.correlator.len()
        );

        if let Err(e) = self.inner.channel.write(request).await {
            self.inner.correlator.take(handle);
            warn!("Failed to send request {}: {}", handle, e);
            return Err(e);
        }

        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if !self.inner.accepting.load(Ordering::Acquire) {
            return Err(Error::ShuttingDown);
        }
        if let Some(reason) = self.inner.health.failure() {
            return Err(Error::ConnectionBroken(reason));
        }
        Ok(())
    }

    /// Tear the connection down.
    ///
    /// Stops accepting requests, stops the notification worker, stops the
    /// transport and waits for the receive task. Requests still waiting see
    /// [`Error::ChannelClosed`]. Idempotent.
    pub async fn shutdown(&self) {
        if !self.inner.accepting.swap(false, Ordering::AcqRel) {
            return;
        }
        info!(parent: &self.inner.span, "Shutting down");

        if let Some(worker) = self.inner.dispatcher.stop() {
            let _ = tokio::task::spawn_blocking(move || worker.join()).await;
        }

        self.inner.channel.transport().stop();

        let receive_task = self.inner.receive_task.lock().take();
        if let Some(task) = receive_task {
            let _ = task.await;
        }

        self.inner.correlator.clear();
        self.inner.subscriptions.clear();
        self.inner.continuation.clear();

        debug!(parent: &self.inner.span, "Shutdown complete");
    }

    /// The configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Limits the server acknowledged in the handshake.
    #[must_use]
    pub fn acknowledge(&self) -> &Acknowledge {
        &self.inner.acknowledge
    }

    /// The current secure channel token.
    #[must_use]
    pub fn security_token(&self) -> ChannelSecurityToken {
        self.inner.channel.token()
    }

    /// The current session authentication token, null without a session.
    #[must_use]
    pub fn authentication_token(&self) -> NodeId {
        self.inner.authentication_token.read().clone()
    }

    /// Number of requests waiting for a response, publish requests included.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.correlator.len()
    }

    /// Number of subscriptions with a registered callback.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.len()
    }

    /// Continuation points held from the last browse.
    #[must_use]
    pub fn continuation_points(&self) -> Vec<ByteString> {
        self.inner.continuation.snapshot()
    }

    /// Why the receive loop stopped, if it has.
    #[must_use]
    pub fn connection_error(&self) -> Option<String> {
        self.inner.health.failure()
    }

    /// `true` once a publish response reported the session closed.
    #[must_use]
    pub fn is_session_closed(&self) -> bool {
        self.inner.session_closed.load(Ordering::Acquire)
    }
}
