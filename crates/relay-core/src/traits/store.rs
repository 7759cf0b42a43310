//! Message storage port
//!
//! Adapters hand observed chat lines to a store; the concrete backend lives in
//! the binary crate.

use async_trait::async_trait;

use crate::entities::ChatMessage;
use crate::error::StoreError;

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist one message
    async fn store_message(&self, message: &ChatMessage) -> StoreResult<()>;

    /// Number of messages persisted so far
    async fn count(&self) -> StoreResult<u64>;
}
