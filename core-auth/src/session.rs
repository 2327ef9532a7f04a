//! # Session Holder
//!
//! Publishes "current user or none" as a `tokio::sync::watch` value.
//!
//! The holder is seeded eagerly from the backend's cached user and then
//! follows the backend's auth-state notifications. The sender is owned by a
//! single forwarding task spawned on the caller's [`TaskScope`]; consumers
//! only ever get receivers, so there is no write path outside the backend.
//!
//! Equal consecutive users are collapsed: receivers are woken only when the
//! signed-in profile actually changes.

use bridge_traits::identity::{IdentityBackend, IdentityRecord};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use core_runtime::TaskScope;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::types::User;

/// Latest-value holder for the signed-in user.
#[derive(Debug, Clone)]
pub struct SessionHolder {
    rx: watch::Receiver<Option<User>>,
}

impl SessionHolder {
    /// Start following `backend` on `scope`.
    ///
    /// Subscribes to auth-state changes before reading the cached user so a
    /// transition racing with construction is not lost.
    pub fn follow(backend: Arc<dyn IdentityBackend>, scope: &TaskScope, events: EventBus) -> Self {
        let mut changes = backend.auth_state_changes();
        let initial = backend
            .current_user()
            .map(|record| User::from_record(&record, Arc::clone(&backend)));

        debug!(
            cached_uid = initial.as_ref().map(|u| u.uid()),
            "Seeding session holder"
        );

        let (tx, rx) = watch::channel(initial);

        let forward = async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    next = changes.next() => {
                        let Some(record) = next else {
                            debug!("Auth state stream ended");
                            break;
                        };
                        publish(&tx, &backend, &events, record);
                    }
                }
            }
        };

        if let Err(e) = scope.spawn("session-holder", forward) {
            warn!(error = %e, "Session holder not started; current user is frozen");
        }

        Self { rx }
    }

    /// Holder that never has a user.
    pub fn signed_out() -> Self {
        let (_, rx) = watch::channel(None);
        Self { rx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.rx.clone()
    }

    /// Snapshot of the latest value.
    pub fn current(&self) -> Option<User> {
        self.rx.borrow().clone()
    }
}

/// Stream of the values a watch receiver observes after this call.
pub(crate) fn changes<T>(rx: watch::Receiver<T>) -> BoxStream<'static, T>
where
    T: Clone + Send + Sync + 'static,
{
    stream::unfold(rx, |mut rx| async move {
        rx.changed().await.ok()?;
        let value = rx.borrow_and_update().clone();
        Some((value, rx))
    })
    .boxed()
}

fn publish(
    tx: &watch::Sender<Option<User>>,
    backend: &Arc<dyn IdentityBackend>,
    events: &EventBus,
    record: Option<IdentityRecord>,
) {
    let user = record.map(|r| User::from_record(&r, Arc::clone(backend)));
    let event = match &user {
        Some(u) => AuthEvent::SignedIn {
            uid: u.uid().to_string(),
        },
        None => AuthEvent::SignedOut,
    };

    let changed = tx.send_if_modified(|current| {
        if *current == user {
            false
        } else {
            *current = user;
            true
        }
    });

    if changed {
        info!(?event, "Auth state changed");
        let _ = events.emit(CoreEvent::Auth(event));
    }
}
