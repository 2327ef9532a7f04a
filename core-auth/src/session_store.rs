//! Persisted Provider Session
//!
//! Keeps the identity provider session (user record plus tokens) in the
//! host's [`SecureStore`] so a relaunch starts with the cached user.
//!
//! ## Security
//!
//! - The record is serialized to JSON and written under a single key
//! - Token values are never logged
//! - A record that no longer deserializes is deleted rather than reported
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::SessionStore;
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let store = SessionStore::new(secure_store);
//!
//! if let Some(session) = store.load().await? {
//!     println!("Restoring session for {}", session.user.uid);
//! }
//!
//! store.clear().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::StoredSession;
use bridge_traits::storage::SecureStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Secure store key of the provider session.
pub const SESSION_KEY: &str = "confetti.auth.session";

/// Secure storage for the provider session.
#[derive(Clone)]
pub struct SessionStore {
    secure_store: Arc<dyn SecureStore>,
    key: String,
}

impl SessionStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        Self {
            secure_store,
            key: SESSION_KEY.to_string(),
        }
    }

    /// Persist `session`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`AuthError::Serialization`] if the record cannot be encoded,
    /// [`AuthError::SecureStorageUnavailable`] if the host store fails.
    pub async fn save(&self, session: &StoredSession) -> Result<()> {
        let json = serde_json::to_vec(session).map_err(|e| {
            warn!(uid = %session.user.uid, error = %e, "Failed to serialize session");
            AuthError::Serialization(e.to_string())
        })?;

        self.secure_store
            .set_secret(&self.key, &json)
            .await
            .map_err(|e| {
                warn!(uid = %session.user.uid, error = %e, "Failed to store session");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(
            uid = %session.user.uid,
            expires_at = %session.expires_at,
            "Session stored securely"
        );
        Ok(())
    }

    /// Load the persisted session.
    ///
    /// Returns `Ok(None)` when nothing is stored, and also when the stored
    /// record is corrupted (it is deleted first).
    pub async fn load(&self) -> Result<Option<StoredSession>> {
        let data = self.secure_store.get_secret(&self.key).await.map_err(|e| {
            warn!(error = %e, "Failed to read session from secure storage");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!("No stored session");
            return Ok(None);
        };

        match serde_json::from_slice::<StoredSession>(&data) {
            Ok(session) => {
                debug!(uid = %session.user.uid, "Stored session loaded");
                Ok(Some(session))
            }
            Err(e) => {
                warn!(error = %e, "Stored session is corrupted, discarding it");
                if let Err(delete_err) = self.secure_store.delete_secret(&self.key).await {
                    warn!(error = %delete_err, "Failed to delete corrupted session");
                }
                Ok(None)
            }
        }
    }

    /// Delete the persisted session. Succeeds when nothing is stored.
    pub async fn clear(&self) -> Result<()> {
        self.secure_store
            .delete_secret(&self.key)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete session from secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!("Stored session cleared");
        Ok(())
    }
}
