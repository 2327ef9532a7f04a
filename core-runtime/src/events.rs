//! # Event Bus System
//!
//! Broadcasts what the core did (sign-ins, sign-outs, data refreshes) to any
//! interested host component using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: `CoreEvent` wraps the per-domain enums `AuthEvent` and
//!   `RefreshEvent`.
//! - **EventBus**: cloneable handle around a broadcast sender.
//!
//! The current signed-in user is *not* carried here: it lives in the session
//! holder, which keeps the latest value for late subscribers. Events are a
//! diagnostic trail.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Auth(AuthEvent::SignedIn { uid: "u1".to_string() })).ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.description(), "User signed in");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Receivers may observe `RecvError::Lagged(n)` when they fall behind; this is
//! non-fatal. `RecvError::Closed` means every `EventBus` clone was dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Auth(AuthEvent),
    Refresh(RefreshEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Refresh(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::SignInFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Refresh(RefreshEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Auth(AuthEvent::SignedIn { .. } | AuthEvent::SignedOut) => {
                EventSeverity::Info
            }
            CoreEvent::Refresh(RefreshEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Authentication events, as observed from the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// Provider confirmed a signed-in user.
    SignedIn { uid: String },
    /// Provider confirmed that no user is signed in.
    SignedOut,
    /// A sign-in attempt was rejected or failed.
    SignInFailed {
        /// Human-readable error message.
        message: String,
        /// `true` when the provider rejected the credential (user can retry
        /// with a fresh token), `false` for unexpected failures.
        recoverable: bool,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::SignedIn { .. } => "User signed in",
            AuthEvent::SignedOut => "User signed out",
            AuthEvent::SignInFailed { .. } => "Sign-in failed",
        }
    }
}

/// Conference data refresh events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum RefreshEvent {
    Started {
        conference: String,
        /// Whether a bearer token was attached
        authenticated: bool,
    },
    Completed { conference: String },
    Failed { conference: String, message: String },
}

impl RefreshEvent {
    fn description(&self) -> &str {
        match self {
            RefreshEvent::Started { .. } => "Conference refresh started",
            RefreshEvent::Completed { .. } => "Conference refresh completed",
            RefreshEvent::Failed { .. } => "Conference refresh failed",
        }
    }
}

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; all clones feed the same subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none. Callers that only report diagnostics ignore it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
