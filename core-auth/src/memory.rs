//! In-Memory Identity Backend
//!
//! An [`IdentityBackend`] that keeps the whole provider session in process.
//! Hosts without network identity (offline builds, the desktop harness) use
//! it, and so do tests: ID tokens are accepted only if registered with
//! [`MemoryIdentityBackend::accept_token`].

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::identity::{IdentityBackend, IdentityRecord, ProviderCredential};
use futures::stream::BoxStream;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::watch;
use tracing::debug;

use crate::session::changes;

/// Identity backend backed by a registry of accepted ID tokens.
pub struct MemoryIdentityBackend {
    state: watch::Sender<Option<IdentityRecord>>,
    accepted: Mutex<HashMap<String, IdentityRecord>>,
    token_generation: AtomicU64,
    fail_tokens: AtomicBool,
    offline: AtomicBool,
    sign_outs: AtomicUsize,
}

impl MemoryIdentityBackend {
    /// Backend with no signed-in user.
    pub fn new() -> Self {
        Self::from_state(None)
    }

    /// Backend that starts with `record` as the cached signed-in user.
    pub fn with_cached_user(record: IdentityRecord) -> Self {
        Self::from_state(Some(record))
    }

    fn from_state(initial: Option<IdentityRecord>) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            accepted: Mutex::new(HashMap::new()),
            token_generation: AtomicU64::new(1),
            fail_tokens: AtomicBool::new(false),
            offline: AtomicBool::new(false),
            sign_outs: AtomicUsize::new(0),
        }
    }

    /// Register `id_token` as a valid Google ID token for `record`.
    pub fn accept_token(&self, id_token: impl Into<String>, record: IdentityRecord) {
        self.accepted.lock().insert(id_token.into(), record);
    }

    /// Make every subsequent [`id_token`](IdentityBackend::id_token) call fail.
    pub fn fail_token_requests(&self, fail: bool) {
        self.fail_tokens.store(fail, Ordering::SeqCst);
    }

    /// Simulate a transport failure on sign-in.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of completed sign-outs.
    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    fn publish(&self, user: Option<IdentityRecord>) {
        debug!(signed_in = user.is_some(), "Memory backend auth state changed");
        self.state.send_replace(user);
    }

    fn sign_out_now(&self) {
        self.publish(None);
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MemoryIdentityBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityBackend for MemoryIdentityBackend {
    fn exchange_credential(&self, id_token: &str) -> Result<ProviderCredential> {
        if id_token.is_empty() {
            return Err(BridgeError::OperationFailed(
                "ID token must not be empty".to_string(),
            ));
        }
        Ok(ProviderCredential::google(id_token))
    }

    async fn sign_in_with_credential(
        &self,
        credential: ProviderCredential,
    ) -> Result<IdentityRecord> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("network unavailable".to_string()));
        }

        if credential.provider_id != ProviderCredential::GOOGLE {
            return Err(BridgeError::AuthRejected {
                code: "INVALID_PROVIDER_ID".to_string(),
                message: format!("Provider '{}' is not enabled", credential.provider_id),
            });
        }

        let record = self
            .accepted
            .lock()
            .get(&credential.id_token)
            .cloned()
            .ok_or_else(|| BridgeError::AuthRejected {
                code: "INVALID_IDP_RESPONSE".to_string(),
                message: "ID token is not accepted".to_string(),
            })?;

        self.publish(Some(record.clone()));
        Ok(record)
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_now();
        Ok(())
    }

    fn sign_out_blocking(&self) -> Result<()> {
        self.sign_out_now();
        Ok(())
    }

    fn auth_state_changes(&self) -> BoxStream<'static, Option<IdentityRecord>> {
        changes(self.state.subscribe())
    }

    fn current_user(&self) -> Option<IdentityRecord> {
        self.state.borrow().clone()
    }

    async fn id_token(&self, uid: &str, force_refresh: bool) -> Result<String> {
        if self.fail_tokens.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed(
                "token service unavailable".to_string(),
            ));
        }

        match self.current_user() {
            Some(user) if user.uid == uid => {
                let generation = if force_refresh {
                    self.token_generation.fetch_add(1, Ordering::SeqCst) + 1
                } else {
                    self.token_generation.load(Ordering::SeqCst)
                };
                Ok(format!("memory-id-token.{}.{}", uid, generation))
            }
            _ => Err(BridgeError::AuthRejected {
                code: "USER_NOT_FOUND".to_string(),
                message: format!("No session for user {}", uid),
            }),
        }
    }
}
