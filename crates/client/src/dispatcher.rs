//! Notification dispatcher.
//!
//! One OS thread runs deferred actions in FIFO order. Subscription
//! callbacks run here and never on the receive task, so a slow or
//! panicking callback cannot stall protocol I/O.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::oneshot;
use tracing::{Span, debug, error, info_span};

/// Name of the worker thread.
pub const WORKER_THREAD_NAME: &str = "ua-notify";

/// Whether the worker keeps running after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// A deferred unit of work.
pub(crate) type Action = Box<dyn FnOnce() -> Flow + Send>;

/// Cloneable handle for posting work.
#[derive(Clone)]
pub(crate) struct DispatcherHandle {
    sender: flume::Sender<Action>,
    stopped: Arc<AtomicBool>,
}

impl DispatcherHandle {
    /// Queue `action`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] once the worker has stopped.
    pub fn post(&self, action: Action) -> Result<()> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(Error::ShuttingDown);
        }
        self.sender.send(action).map_err(|_| Error::ShuttingDown)
    }
}

/// Owns the worker thread.
pub(crate) struct NotificationDispatcher {
    handle: DispatcherHandle,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl NotificationDispatcher {
    /// Start the worker. It logs inside a child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Worker`] if the thread cannot be spawned.
    pub fn start(parent: &Span) -> Result<Self> {
        let (sender, receiver) = flume::unbounded::<Action>();
        let stopped = Arc::new(AtomicBool::new(false));
        let span = info_span!(parent: parent, "notify");

        let worker_stopped = Arc::clone(&stopped);
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _entered = span.enter();
                run(&receiver, &worker_stopped);
            })
            .map_err(Error::Worker)?;

        Ok(Self {
            handle: DispatcherHandle { sender, stopped },
            worker_id: worker.thread().id(),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn handle(&self) -> DispatcherHandle {
        self.handle.clone()
    }

    /// Wait until every action queued before this call has finished.
    ///
    /// Returns immediately if the worker has stopped, or when called from
    /// the worker itself.
    pub async fn flush(&self) {
        if thread::current().id() == self.worker_id {
            return;
        }
        let (done, finished) = oneshot::channel();
        let fence = Box::new(move || {
            let _ = done.send(());
            Flow::Continue
        });
        // A fence dropped with the queue also ends the wait.
        if self.handle.post(fence).is_ok() {
            let _ = finished.await;
        }
    }

    /// Stop the worker. Queued actions that have not started are dropped.
    ///
    /// Returns the thread to join, or `None` if it was already taken or
    /// this is called from the worker itself.
    pub fn stop(&self) -> Option<JoinHandle<()>> {
        self.handle.stopped.store(true, Ordering::Release);
        // Wake the worker if it is waiting on an empty queue.
        let _ = self.handle.sender.send(Box::new(|| Flow::Stop));

        let worker = self.worker.lock().take()?;
        if worker.thread().id() == thread::current().id() {
            return None;
        }
        Some(worker)
    }
}

fn run(receiver: &flume::Receiver<Action>, stopped: &AtomicBool) {
    debug!("Notification worker started");

    'outer: while let Ok(first) = receiver.recv() {
        // Drain everything queued before waiting again.
        for action in std::iter::once(first).chain(receiver.try_iter()) {
            if stopped.load(Ordering::Acquire) {
                break 'outer;
            }

            match catch_unwind(AssertUnwindSafe(action)) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => {
                    stopped.store(true, Ordering::Release);
                    break 'outer;
                }
                Err(payload) => {
                    error!("Notification action panicked: {}", panic_message(&*payload));
                }
            }
        }
    }

    debug!("Notification worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_runs_actions_in_order_on_worker_thread() {
        let dispatcher = NotificationDispatcher::start(&Span::none()).unwrap();
        let handle = dispatcher.handle();
        let (tx, rx) = mpsc::channel();

        for i in 0..10 {
            let tx = tx.clone();
            handle
                .post(Box::new(move || {
                    let name = thread::current().name().map(ToString::to_string);
                    tx.send((i, name)).unwrap();
                    Flow::Continue
                }))
                .unwrap();
        }

        for i in 0..10 {
            let (seen, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(seen, i);
            assert_eq!(name.as_deref(), Some(WORKER_THREAD_NAME));
        }

        dispatcher.stop().unwrap().join().unwrap();
    }

    #[test]
    fn test_panicking_action_does_not_stop_worker() {
        let dispatcher = NotificationDispatcher::start(&Span::none()).unwrap();
        let handle = dispatcher.handle();
        let (tx, rx) = mpsc::channel();

        handle
            .post(Box::new(|| -> Flow { panic!("callback failed") }))
            .unwrap();
        handle
            .post(Box::new(move || {
                tx.send(()).unwrap();
                Flow::Continue
            }))
            .unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        dispatcher.stop().unwrap().join().unwrap();
    }

    #[test]
    fn test_stop_flow_ends_worker() {
        let dispatcher = NotificationDispatcher::start(&Span::none()).unwrap();
        let handle = dispatcher.handle();

        handle.post(Box::new(|| Flow::Stop)).unwrap();
        let worker = dispatcher.worker.lock().take().unwrap();
        worker.join().unwrap();

        assert!(matches!(
            handle.post(Box::new(|| Flow::Continue)),
            Err(Error::ShuttingDown)
        ));
    }

    #[tokio::test]
    async fn test_flush_waits_for_running_action() {
        let dispatcher = NotificationDispatcher::start(&Span::none()).unwrap();
        let finished = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&finished);
        dispatcher
            .handle()
            .post(Box::new(move || {
                thread::sleep(Duration::from_millis(200));
                flag.store(true, Ordering::Release);
                Flow::Continue
            }))
            .unwrap();

        dispatcher.flush().await;
        assert!(finished.load(Ordering::Acquire));

        dispatcher.stop().unwrap().join().unwrap();
        // Stopped: nothing to wait for.
        dispatcher.flush().await;
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dispatcher = NotificationDispatcher::start(&Span::none()).unwrap();
        dispatcher.stop().unwrap().join().unwrap();
        assert!(dispatcher.stop().is_none());
        assert!(matches!(
            dispatcher.handle().post(Box::new(|| Flow::Continue)),
            Err(Error::ShuttingDown)
        ));
    }
}
