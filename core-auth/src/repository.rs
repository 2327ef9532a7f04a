//! Sign-in event plumbing between the native sign-in flow and the adapter.

use async_trait::async_trait;
use bridge_traits::signin::NativeAccount;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, instrument};

use crate::authentication::Authentication;
use crate::error::AuthError;
use crate::types::{SignInResult, User, UserProfile};

/// Receives accounts produced by a completed native sign-in.
#[async_trait]
pub trait SignInEventListener: Send + Sync {
    async fn on_signed_in(&self, account: NativeAccount) -> SignInResult;
}

/// Forwards native sign-ins to [`Authentication`] and exposes who is signed in.
#[derive(Clone)]
pub struct AuthUserRepository {
    authentication: Arc<dyn Authentication>,
}

impl AuthUserRepository {
    pub fn new(authentication: Arc<dyn Authentication>) -> Self {
        Self { authentication }
    }

    /// Profile of the signed-in user, if any.
    pub fn authenticated(&self) -> Option<UserProfile> {
        self.authentication.current().map(|u| u.profile().clone())
    }

    pub fn observe(&self) -> watch::Receiver<Option<User>> {
        self.authentication.current_user()
    }
}

#[async_trait]
impl SignInEventListener for AuthUserRepository {
    #[instrument(skip_all, fields(account = %account.id))]
    async fn on_signed_in(&self, account: NativeAccount) -> SignInResult {
        let Some(id_token) = account.id_token else {
            error!("Native account has no ID token; was the ID token scope requested?");
            return SignInResult::Error(AuthError::Unexpected(
                "Signed-in account carries no ID token".to_string(),
            ));
        };

        self.authentication.sign_in(&id_token).await
    }
}
