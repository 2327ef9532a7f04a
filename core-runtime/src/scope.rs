//! Task scopes.
//!
//! A [`TaskScope`] pairs a Tokio runtime handle with a cancellation token.
//! Long-lived listeners (such as the session holder's auth-state forwarder)
//! are spawned into a scope supplied by their owner and stop when the owner
//! cancels it.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};

/// Execution context handed to components that run background tasks.
#[derive(Debug, Clone)]
pub struct TaskScope {
    handle: Handle,
    token: CancellationToken,
}

impl TaskScope {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            token: CancellationToken::new(),
        }
    }

    /// Scope bound to the runtime of the calling task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when called outside a Tokio runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| Error::CapabilityMissing {
                capability: "tokio runtime".to_string(),
                message: format!("TaskScope::current must run inside a runtime: {}", e),
            })
    }

    /// Child scope cancelled together with this one, or on its own.
    pub fn child(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            token: self.token.child_token(),
        }
    }

    /// Spawn `future` into the scope. It is dropped at its next await point
    /// once the scope is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScopeClosed`] if the scope was already cancelled.
    pub fn spawn<F>(&self, name: &'static str, future: F) -> Result<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.token.is_cancelled() {
            return Err(Error::ScopeClosed);
        }

        let token = self.token.clone();
        Ok(self.handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => debug!(task = name, "Scoped task cancelled"),
                _ = future => debug!(task = name, "Scoped task finished"),
            }
        }))
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
