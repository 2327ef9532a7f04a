//! Native Sign-In Client
//!
//! The platform's own account picker (Google Sign-In on Wear OS). It yields
//! an ID token which the core exchanges with the identity backend.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Scopes requested from the native sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignInScope {
    /// Request an OpenID Connect ID token for the configured client
    IdToken,
    Email,
    Profile,
}

/// Configuration handed to the native sign-in client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOptions {
    /// Web client id the ID token is minted for
    pub client_id: Option<String>,
    pub scopes: BTreeSet<SignInScope>,
}

impl SignInOptions {
    /// Start from the platform default (basic profile only).
    pub fn default_sign_in() -> SignInOptionsBuilder {
        SignInOptionsBuilder {
            client_id: None,
            scopes: BTreeSet::from([SignInScope::Profile]),
        }
    }

    pub fn requests(&self, scope: SignInScope) -> bool {
        self.scopes.contains(&scope)
    }
}

/// Builder for [`SignInOptions`].
#[derive(Debug, Clone)]
pub struct SignInOptionsBuilder {
    client_id: Option<String>,
    scopes: BTreeSet<SignInScope>,
}

impl SignInOptionsBuilder {
    /// Request an ID token minted for `client_id`.
    pub fn request_id_token(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.scopes.insert(SignInScope::IdToken);
        self
    }

    pub fn request_email(mut self) -> Self {
        self.scopes.insert(SignInScope::Email);
        self
    }

    /// # Errors
    ///
    /// Fails when an ID token is requested for an empty client id.
    pub fn build(self) -> Result<SignInOptions> {
        if self.scopes.contains(&SignInScope::IdToken)
            && self.client_id.as_deref().map_or(true, |id| id.trim().is_empty())
        {
            return Err(BridgeError::InvalidConfiguration(
                "ID token requested without a web client id. \
                 Set the web client id from the platform configuration."
                    .to_string(),
            ));
        }

        Ok(SignInOptions {
            client_id: self.client_id,
            scopes: self.scopes,
        })
    }
}

/// Account returned by a completed native sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct NativeAccount {
    pub id: String,
    pub id_token: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl std::fmt::Debug for NativeAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeAccount")
            .field("id", &self.id)
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Platform-native sign-in client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NativeSignInClient: Send + Sync {
    /// Run the interactive sign-in flow.
    ///
    /// Returns `Ok(None)` when the user dismissed the flow.
    async fn sign_in(&self, options: &SignInOptions) -> Result<Option<NativeAccount>>;

    /// Forget the account selected on this device.
    async fn sign_out(&self) -> Result<()>;
}
