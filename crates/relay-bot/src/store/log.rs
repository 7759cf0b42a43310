//! Ordered hand-off from protocol handlers to the store
//!
//! Handlers run synchronously on the session task, so they cannot await a
//! database write. They push onto an unbounded channel instead; one task
//! writes entries in arrival order.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use relay_core::{ChatMessage, MessageStore, StoreError, StoreResult};

/// Cloneable producer side of the message log
#[derive(Debug, Clone)]
pub struct MessageLog {
    tx: mpsc::UnboundedSender<ChatMessage>,
}

impl MessageLog {
    /// Start the writer task; it ends once every `MessageLog` clone is dropped
    ///
    /// The task yields the number of messages stored.
    pub fn spawn(store: Arc<dyn MessageStore>) -> (Self, JoinHandle<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(write_all(store, rx));
        (Self { tx }, task)
    }

    pub fn record(&self, message: ChatMessage) -> StoreResult<()> {
        self.tx.send(message).map_err(|_| StoreError::Closed)
    }
}

async fn write_all(
    store: Arc<dyn MessageStore>,
    mut rx: mpsc::UnboundedReceiver<ChatMessage>,
) -> u64 {
    let mut stored = 0;
    while let Some(message) = rx.recv().await {
        match store.store_message(&message).await {
            Ok(()) => stored += 1,
            Err(e) => tracing::error!(
                error = %e,
                channel = %message.channel,
                nick = %message.nick,
                "Failed to store message"
            ),
        }
    }
    tracing::debug!(stored, "Message log closed");
    stored
}
