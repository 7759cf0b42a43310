//! Runtime context shared by every task of a running agent

use tokio_util::sync::CancellationToken;

/// Cooperative shutdown signal handed to every long-lived task
///
/// Cloning is cheap; all clones observe the same shutdown.
#[derive(Debug, Clone, Default)]
pub struct RuntimeContext {
    token: CancellationToken,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown of every task holding this context
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("Shutdown requested");
        }
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been requested
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Derive a context that is shut down with this one but can also be shut down alone
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_wakes_waiters() {
        let ctx = RuntimeContext::new();
        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.cancelled().await })
        };

        ctx.shutdown();
        waiter.await.unwrap();
        assert!(ctx.is_shutdown());
    }

    #[test]
    fn test_child_does_not_stop_parent() {
        let parent = RuntimeContext::new();
        let child = parent.child();

        child.shutdown();
        assert!(child.is_shutdown());
        assert!(!parent.is_shutdown());

        let other = parent.child();
        parent.shutdown();
        assert!(other.is_shutdown());
    }
}
