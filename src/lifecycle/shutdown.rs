//! Shutdown coordination for the server.
//!
//! # Design Decisions
//! - Latched: a session that starts after the trigger still sees it
//! - Waiters get a plain future, never a raw channel receiver

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Server-wide stop flag. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    flag: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self { flag: Arc::new(flag) }
    }

    /// Raise the flag. Idempotent.
    pub fn trigger(&self) {
        if !self.flag.send_replace(true) {
            tracing::info!(waiters = self.flag.receiver_count(), "Shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once [`trigger`](Self::trigger) has been called, immediately
    /// if it already was.
    pub fn triggered(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut flag = self.flag.subscribe();
        async move {
            // Err means every handle was dropped, which is a shutdown too.
            let _ = flag.wait_for(|raised| *raised).await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
