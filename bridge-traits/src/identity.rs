//! Identity Backend Abstraction
//!
//! The external identity provider (Firebase Auth on the phone and the watch)
//! seen through the narrow set of calls the core relies on.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// User record as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Stable provider identifier
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl IdentityRecord {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }
}

/// Provider credential obtained from an external identity token.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    /// Provider id of the federated identity (e.g. `google.com`)
    pub provider_id: String,
    pub id_token: String,
}

impl ProviderCredential {
    pub const GOOGLE: &'static str = "google.com";

    pub fn google(id_token: impl Into<String>) -> Self {
        Self {
            provider_id: Self::GOOGLE.to_string(),
            id_token: id_token.into(),
        }
    }
}

impl std::fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("provider_id", &self.provider_id)
            .field("id_token", &"[REDACTED]")
            .finish()
    }
}

/// Identity backend trait
///
/// Implementations own the provider session. Every change of the signed-in
/// user (sign-in, sign-out, session expiry) must be published on
/// [`auth_state_changes`](IdentityBackend::auth_state_changes).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::identity::IdentityBackend;
///
/// async fn sign_in(backend: &dyn IdentityBackend, id_token: &str) -> Result<()> {
///     let credential = backend.exchange_credential(id_token)?;
///     backend.sign_in_with_credential(credential).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Turn an identity token from a platform-native sign-in flow into a
    /// provider credential.
    fn exchange_credential(&self, id_token: &str) -> Result<ProviderCredential>;

    /// Establish a provider session with the given credential.
    ///
    /// # Errors
    ///
    /// Provider-side rejections are reported as
    /// [`BridgeError::AuthRejected`](crate::BridgeError::AuthRejected).
    async fn sign_in_with_credential(&self, credential: ProviderCredential)
        -> Result<IdentityRecord>;

    /// Terminate the provider session.
    async fn sign_out(&self) -> Result<()>;

    /// Synchronous sign-out.
    ///
    /// The default blocks the calling thread until [`sign_out`](Self::sign_out)
    /// completes, which is only acceptable because provider sign-out does not
    /// wait on the network. Backends whose sign-out is synchronous override
    /// this with a direct call.
    fn sign_out_blocking(&self) -> Result<()> {
        futures::executor::block_on(self.sign_out())
    }

    /// Stream of auth-state changes. Emits every change after the moment of
    /// subscription; the state at subscription time is available from
    /// [`current_user`](Self::current_user).
    fn auth_state_changes(&self) -> BoxStream<'static, Option<IdentityRecord>>;

    /// The cached signed-in user, if any.
    fn current_user(&self) -> Option<IdentityRecord>;

    /// Bearer token for the signed-in user `uid`.
    async fn id_token(&self, uid: &str, force_refresh: bool) -> Result<String>;
}
