//! FIFO outbound queue with a single writer task per session
//!
//! Producers enqueue from any task. The writer pulls one entry at a time and
//! awaits the completed write before pulling the next, so at most one write is
//! ever in flight on the transport and entries go out in enqueue order.
//!
//! After a failed write the writer stops. Unsent entries stay in the queue,
//! owned by the [`WriteFailures`] handle, until the session drops it.

use std::fmt;

use futures_util::{Sink, SinkExt};
use tokio::sync::{mpsc, oneshot};

use crate::error::{SessionError, SessionResult};

/// Producer side of a session's write queue
pub struct WriteQueue<T> {
    tx: mpsc::UnboundedSender<T>,
    label: &'static str,
}

impl<T> Clone for WriteQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            label: self.label,
        }
    }
}

impl<T> fmt::Debug for WriteQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteQueue")
            .field("label", &self.label)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<T: Send + 'static> WriteQueue<T> {
    /// Spawn the writer task for `sink`
    ///
    /// The sink is closed once every producer handle has been dropped and the
    /// queue has drained. A failed write is reported once through the returned
    /// [`WriteFailures`].
    pub fn spawn<S>(label: &'static str, sink: S) -> (Self, WriteFailures)
    where
        S: Sink<T> + Unpin + Send + 'static,
        S::Error: fmt::Display + Send,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (failed_tx, failed_rx) = oneshot::channel();

        tokio::spawn(writer_loop(label, sink, rx, failed_tx));

        (
            Self { tx, label },
            WriteFailures {
                rx: Some(failed_rx),
                unsent: None,
            },
        )
    }
}

impl<T> WriteQueue<T> {
    /// Append `item`; fails only when the writer task is gone
    pub fn enqueue(&self, item: T) -> SessionResult<()> {
        self.tx.send(item).map_err(|_| SessionError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

async fn writer_loop<T, S>(
    label: &'static str,
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<T>,
    failed: oneshot::Sender<Failure>,
) where
    T: Send + 'static,
    S: Sink<T> + Unpin,
    S::Error: fmt::Display,
{
    while let Some(item) = rx.recv().await {
        if let Err(e) = sink.send(item).await {
            tracing::warn!(
                queue = label,
                error = %e,
                unsent = rx.len(),
                "Write failed, queue stopped"
            );
            let _ = failed.send(Failure {
                error: SessionError::transport(e),
                unsent: Box::new(rx),
            });
            return;
        }
    }

    if let Err(e) = sink.close().await {
        tracing::debug!(queue = label, error = %e, "Closing transport failed");
    }
    tracing::trace!(queue = label, "Writer stopped");
}

struct Failure {
    error: SessionError,
    unsent: Box<dyn Send>,
}

/// Consumer side of the writer's failure report
///
/// Once a failure has been received this handle also holds the queue, so
/// producers can still enqueue until it is dropped.
pub struct WriteFailures {
    rx: Option<oneshot::Receiver<Failure>>,
    unsent: Option<Box<dyn Send>>,
}

impl fmt::Debug for WriteFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteFailures")
            .field("pending", &self.rx.is_some())
            .field("failed", &self.unsent.is_some())
            .finish()
    }
}

impl WriteFailures {
    /// Resolves with the first write failure; pends forever if the writer ends cleanly
    pub async fn recv(&mut self) -> SessionError {
        if let Some(rx) = self.rx.as_mut() {
            let result = rx.await;
            self.rx = None;
            if let Ok(failure) = result {
                self.unsent = Some(failure.unsent);
                return failure.error;
            }
        }
        std::future::pending().await
    }
}
