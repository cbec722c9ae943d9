//! The receive loop: the only reader of the transport.

use crate::correlator::{Correlator, PendingSlot};
use crate::error::{Error, Result};
use crate::framing::{Frame, FrameReader};
use crate::message::interpret;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, error, info_span, trace, warn};
use ua_transport::TransportError;

/// Why the receive loop stopped, if it has.
#[derive(Debug, Default)]
pub(crate) struct ConnectionHealth {
    failure: Mutex<Option<String>>,
}

impl ConnectionHealth {
    pub fn record(&self, reason: String) {
        self.failure.lock().get_or_insert(reason);
    }

    pub fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }
}

pub(crate) struct ReceiveLoop {
    reader: FrameReader,
    correlator: Arc<Correlator>,
    health: Arc<ConnectionHealth>,
    last_sequence: Option<u32>,
}

impl ReceiveLoop {
    pub const fn new(
        reader: FrameReader,
        correlator: Arc<Correlator>,
        health: Arc<ConnectionHealth>,
    ) -> Self {
        Self {
            reader,
            correlator,
            health,
            last_sequence: None,
        }
    }

    /// Run on the runtime inside a child of `parent`.
    pub fn spawn(self, parent: &Span) -> JoinHandle<()> {
        let span = info_span!(parent: parent, "receive");
        tokio::spawn(self.run().instrument(span))
    }

    async fn run(mut self) {
        debug!("Receive loop started");

        let error = loop {
            match self.reader.next_frame().await {
                Ok(Some(frame)) => {
                    if let Err(e) = self.dispatch(frame) {
                        break e;
                    }
                }
                Ok(None) => break Error::Transport(TransportError::ConnectionClosed),
                Err(e) => break e,
            }
        };

        if matches!(error, Error::Transport(TransportError::Stopped)) {
            debug!("Receive loop stopped");
        } else {
            error!("Receive loop terminated: {}", error);
        }
        self.health.record(error.to_string());
    }

    fn dispatch(&mut self, frame: Frame) -> Result<()> {
        let incoming = interpret(frame)?;
        self.observe_sequence(incoming.sequence.sequence_number);

        let delivery = incoming.delivery;
        let handle = delivery.header.request_handle;
        trace!(
            "Received {:?} frame on channel {}: type {}, handle {}",
            incoming.message_type, incoming.secure_channel_id, delivery.type_id, handle
        );

        // A fault still completes its waiter.
        if delivery.is_service_fault() {
            warn!(
                "Service fault {} for handle {}",
                delivery.header.service_result, handle
            );
        }

        match self.correlator.take(handle) {
            Some(PendingSlot::Waiter(sender)) => {
                if sender.send(delivery).is_err() {
                    debug!("Waiter for handle {} went away", handle);
                }
            }
            Some(PendingSlot::Publish(sink)) => sink.deliver(delivery),
            None => warn!("Discarding response for unknown handle {}", handle),
        }

        Ok(())
    }

    /// Gaps and repeats are logged; frames are never reordered or dropped.
    fn observe_sequence(&mut self, sequence_number: u32) {
        if let Some(last) = self.last_sequence {
            let expected = last.wrapping_add(1);
            if sequence_number != expected {
                warn!(
                    "Unexpected sequence number: expected {}, got {}",
                    expected, sequence_number
                );
            }
        }
        self.last_sequence = Some(sequence_number);
    }
}
