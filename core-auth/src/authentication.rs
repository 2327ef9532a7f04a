//! # Identity Provider Adapter
//!
//! [`Authentication`] is what the rest of the app sees of the identity
//! provider: sign in with an external ID token, sign out, and observe the
//! current user.
//!
//! Two implementations exist and one is chosen at composition time by
//! [`select_authentication`]:
//!
//! - [`DefaultAuthentication`] adapts a real [`IdentityBackend`].
//! - [`DisabledAuthentication`] stands in when no backend could be built.
//!   It never has a user and refuses every sign-in.
//!
//! ## Usage
//!
//! ```no_run
//! use bridge_traits::IdentityBackend;
//! use core_auth::{select_authentication, MemoryIdentityBackend};
//! use core_runtime::{events::EventBus, TaskScope};
//! use std::sync::Arc;
//!
//! # async fn example() -> core_runtime::Result<()> {
//! let scope = TaskScope::current()?;
//! let backend: Arc<dyn IdentityBackend> = Arc::new(MemoryIdentityBackend::new());
//! let auth = select_authentication(Ok(backend), &scope, EventBus::default());
//!
//! let result = auth.sign_in("google-id-token").await;
//! if result.is_success() {
//!     let mut user = auth.current_user();
//!     user.changed().await.ok();
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bridge_traits::error::BridgeError;
use bridge_traits::identity::IdentityBackend;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use core_runtime::TaskScope;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::error::AuthError;
use crate::session::SessionHolder;
use crate::types::{SignInResult, User};

/// Sign-in, sign-out and the observable current user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authentication: Send + Sync {
    /// Receiver of the current user. The initial value is the provider's
    /// cached user; later values follow provider notifications.
    fn current_user(&self) -> watch::Receiver<Option<User>>;

    /// Snapshot of the current user.
    fn current(&self) -> Option<User> {
        self.current_user().borrow().clone()
    }

    /// Exchange an external ID token for a provider session.
    ///
    /// Never fails outright: every failure is reported as
    /// [`SignInResult::Error`]. A successful result carries no user; it shows
    /// up on [`current_user`](Self::current_user) once the provider confirms.
    async fn sign_in(&self, id_token: &str) -> SignInResult;

    /// End the provider session. Blocks until the provider has signed out;
    /// failures are logged and swallowed.
    fn sign_out(&self);
}

/// Adapter over a real identity backend.
pub struct DefaultAuthentication {
    backend: Arc<dyn IdentityBackend>,
    session: SessionHolder,
    events: EventBus,
}

impl DefaultAuthentication {
    /// Build the adapter and start its session holder on `scope`.
    pub fn new(backend: Arc<dyn IdentityBackend>, scope: &TaskScope, events: EventBus) -> Self {
        let session = SessionHolder::follow(Arc::clone(&backend), scope, events.clone());
        Self {
            backend,
            session,
            events,
        }
    }

    fn report_failure(&self, err: AuthError) -> SignInResult {
        let _ = self.events.emit(CoreEvent::Auth(AuthEvent::SignInFailed {
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        }));
        SignInResult::Error(err)
    }
}

#[async_trait]
impl Authentication for DefaultAuthentication {
    fn current_user(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }

    #[instrument(skip_all)]
    async fn sign_in(&self, id_token: &str) -> SignInResult {
        let outcome = match self.backend.exchange_credential(id_token) {
            Ok(credential) => self.backend.sign_in_with_credential(credential).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(record) => {
                info!(uid = %record.uid, "Signed in with provider");
                SignInResult::Success
            }
            Err(BridgeError::AuthRejected { code, message }) => {
                warn!(%code, %message, "Provider rejected sign-in");
                self.report_failure(AuthError::Backend { code, message })
            }
            Err(e) => {
                error!(error = %e, "Sign-in failed unexpectedly");
                self.report_failure(AuthError::Unexpected(e.to_string()))
            }
        }
    }

    fn sign_out(&self) {
        match self.backend.sign_out_blocking() {
            Ok(()) => info!("Signed out from provider"),
            Err(e) => warn!(error = %e, "Provider sign-out failed"),
        }
    }
}

/// Stand-in used when the identity provider is unavailable.
#[derive(Debug, Clone)]
pub struct DisabledAuthentication {
    session: SessionHolder,
}

impl DisabledAuthentication {
    pub fn new() -> Self {
        Self {
            session: SessionHolder::signed_out(),
        }
    }
}

impl Default for DisabledAuthentication {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authentication for DisabledAuthentication {
    fn current_user(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }

    async fn sign_in(&self, _id_token: &str) -> SignInResult {
        SignInResult::Error(AuthError::ProviderUnavailable)
    }

    fn sign_out(&self) {}
}

/// Pick the adapter for this process.
///
/// A backend that failed to construct is logged and replaced by
/// [`DisabledAuthentication`]; startup continues either way.
pub fn select_authentication(
    backend: Result<Arc<dyn IdentityBackend>, AuthError>,
    scope: &TaskScope,
    events: EventBus,
) -> Arc<dyn Authentication> {
    match backend {
        Ok(backend) => Arc::new(DefaultAuthentication::new(backend, scope, events)),
        Err(e) => {
            warn!(error = %e, "Identity backend unavailable, authentication disabled");
            Arc::new(DisabledAuthentication::new())
        }
    }
}
