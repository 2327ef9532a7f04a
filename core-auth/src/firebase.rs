//! # Firebase Identity Backend
//!
//! [`IdentityBackend`] over the Firebase Auth REST API, reached through the
//! host [`HttpClient`].
//!
//! ## Flow
//!
//! 1. `exchange_credential` wraps the Google ID token in a provider credential.
//! 2. `sign_in_with_credential` posts it to `accounts:signInWithIdp` and
//!    receives a Firebase ID token, a refresh token and the user record.
//! 3. The session is persisted in the host secure store and restored by
//!    [`FirebaseBackend::restore`] on the next launch.
//! 4. `id_token` serves the cached ID token until it is within five minutes
//!    of expiry, then rotates it through the Secure Token endpoint.
//!
//! ## Errors
//!
//! Error bodies of the form `{"error":{"message":"CODE : detail"}}` and any
//! other 4xx answer become [`BridgeError::AuthRejected`]. Transport failures
//! and 5xx answers become [`BridgeError::OperationFailed`]. A refresh token
//! the provider reports as expired, revoked or belonging to a disabled or
//! deleted user ends the session locally; any other rejection (rate limits
//! included) is returned to the caller and the session is kept.
//!
//! ## Persistence
//!
//! Writes to the secure store are serialized. Every saved session bumps a
//! generation counter, and a sign-out only deletes the stored record when
//! no session was saved after it.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::identity::{IdentityBackend, IdentityRecord, ProviderCredential};
use bridge_traits::storage::SecureStore;
use bridge_traits::time::Clock;
use chrono::Duration;
use core_runtime::config::IdentityConfig;
use futures::stream::BoxStream;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::session::changes;
use crate::session_store::SessionStore;
use crate::types::StoredSession;

/// ID tokens this close to expiry are refreshed before use.
const TOKEN_REFRESH_BUFFER_SECS: i64 = 300;

/// Lifetime assumed when the provider omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Redirect URI reported to `signInWithIdp` for credentials minted on device.
const REQUEST_URI: &str = "http://localhost";

/// Secure Token error codes after which the refresh token is unusable.
const TERMINAL_REFRESH_CODES: &[&str] = &[
    "TOKEN_EXPIRED",
    "INVALID_REFRESH_TOKEN",
    "USER_DISABLED",
    "USER_NOT_FOUND",
];

/// Serialized access to the persisted session.
#[derive(Clone)]
struct SessionPersistence {
    store: SessionStore,
    write_lock: Arc<tokio::sync::Mutex<()>>,
    generation: Arc<AtomicU64>,
}

impl SessionPersistence {
    fn new(store: SessionStore) -> Self {
        Self {
            store,
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn advance(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Delete the stored record unless a session was saved after
    /// `generation` was read. Returns whether the record was deleted.
    async fn clear_since(&self, generation: u64) -> Result<bool> {
        let _write = self.write_lock.lock().await;
        if self.generation() != generation {
            debug!("Newer session saved, keeping stored record");
            return Ok(false);
        }
        self.store.clear().await?;
        Ok(true)
    }
}

/// Firebase Auth over REST.
pub struct FirebaseBackend {
    api_key: String,
    identity_toolkit_url: String,
    secure_token_url: String,
    http_timeout: std::time::Duration,
    http: Arc<dyn HttpClient>,
    persistence: SessionPersistence,
    clock: Arc<dyn Clock>,
    session: Mutex<Option<StoredSession>>,
    state: watch::Sender<Option<IdentityRecord>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl FirebaseBackend {
    /// Build a backend with no signed-in user.
    ///
    /// # Errors
    ///
    /// [`AuthError::Configuration`] when `config` carries no API key.
    pub fn new(
        config: &IdentityConfig,
        http: Arc<dyn HttpClient>,
        secure_store: Arc<dyn SecureStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AuthError::Configuration("Firebase API key is not set".to_string()))?
            .to_string();

        let (state, _) = watch::channel(None);

        Ok(Self {
            api_key,
            identity_toolkit_url: config.identity_toolkit_url.trim_end_matches('/').to_string(),
            secure_token_url: config.secure_token_url.trim_end_matches('/').to_string(),
            http_timeout: config.http_timeout,
            http,
            persistence: SessionPersistence::new(SessionStore::new(secure_store)),
            clock,
            session: Mutex::new(None),
            state,
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Build a backend and restore the persisted session, if any.
    ///
    /// An unreadable secure store is logged and treated as "no session".
    pub async fn restore(
        config: &IdentityConfig,
        http: Arc<dyn HttpClient>,
        secure_store: Arc<dyn SecureStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let backend = Self::new(config, http, secure_store, clock)?;

        match backend.persistence.store.load().await {
            Ok(Some(session)) => {
                info!(uid = %session.user.uid, "Restored Firebase session");
                backend.state.send_replace(Some(session.user.clone()));
                *backend.session.lock() = Some(session);
            }
            Ok(None) => debug!("No Firebase session to restore"),
            Err(e) => warn!(error = %e, "Could not read stored Firebase session"),
        }

        Ok(backend)
    }

    fn endpoint(&self, base: &str, path: &str) -> BridgeResult<String> {
        let query = serde_urlencoded::to_string([("key", self.api_key.as_str())])
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to encode query: {}", e)))?;
        Ok(format!("{}/{}?{}", base, path, query))
    }

    async fn post(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let response = self
            .http
            .execute(request.timeout(self.http_timeout))
            .await?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(error_from_response(&response))
        }
    }

    /// Persist `session` and install it as the active one.
    ///
    /// With `replacing`, nothing is installed unless that session is still
    /// active; a sign-out racing the write removes the record afterwards.
    async fn activate(&self, session: StoredSession, replacing: Option<&StoredSession>) -> bool {
        let _write = self.persistence.write_lock.lock().await;
        if replacing.is_some_and(|previous| !self.is_active(previous)) {
            return false;
        }

        if let Err(e) = self.persistence.store.save(&session).await {
            warn!(error = %e, "Session kept in memory only");
        }

        let mut active = self.session.lock();
        if let Some(previous) = replacing {
            if !active.as_ref().is_some_and(|s| same_session(s, previous)) {
                return false;
            }
        }
        let user = session.user.clone();
        *active = Some(session);
        self.persistence.advance();
        self.state.send_replace(Some(user));
        true
    }

    /// Drop the in-memory session and notify observers. Returns the
    /// persistence generation the stored record must still match to be
    /// deleted.
    fn end_session(&self) -> u64 {
        let (ended, generation) = {
            let mut active = self.session.lock();
            self.state.send_replace(None);
            (active.take().is_some(), self.persistence.generation())
        };
        if ended {
            info!("Firebase session ended");
        }
        generation
    }

    /// Whether `session` is still the active one.
    fn is_active(&self, session: &StoredSession) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|s| same_session(s, session))
    }

    async fn refresh(&self, session: &StoredSession) -> BridgeResult<StoredSession> {
        let form = serde_urlencoded::to_string([
            ("grant_type", "refresh_token"),
            ("refresh_token", session.refresh_token.as_str()),
        ])
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to encode refresh form: {}", e)))?;

        let request = HttpRequest::new(
            HttpMethod::Post,
            self.endpoint(&self.secure_token_url, "token")?,
        )
        .form(form);

        let body: SecureTokenResponse = self.post(request).await?.json()?;

        Ok(StoredSession::new(
            session.user.clone(),
            body.id_token,
            body.refresh_token,
            self.clock.now() + Duration::seconds(parse_lifetime(body.expires_in.as_deref())),
        ))
    }
}

#[async_trait]
impl IdentityBackend for FirebaseBackend {
    fn exchange_credential(&self, id_token: &str) -> BridgeResult<ProviderCredential> {
        if id_token.trim().is_empty() {
            return Err(BridgeError::OperationFailed(
                "ID token must not be empty".to_string(),
            ));
        }
        Ok(ProviderCredential::google(id_token))
    }

    #[instrument(skip_all, fields(provider = %credential.provider_id))]
    async fn sign_in_with_credential(
        &self,
        credential: ProviderCredential,
    ) -> BridgeResult<IdentityRecord> {
        let post_body = serde_urlencoded::to_string([
            ("id_token", credential.id_token.as_str()),
            ("providerId", credential.provider_id.as_str()),
        ])
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to encode credential: {}", e)))?;

        let request = HttpRequest::new(
            HttpMethod::Post,
            self.endpoint(&self.identity_toolkit_url, "accounts:signInWithIdp")?,
        )
        .json(&serde_json::json!({
            "postBody": post_body,
            "requestUri": REQUEST_URI,
            "returnSecureToken": true,
            "returnIdpCredential": true,
        }))?;

        let body: SignInWithIdpResponse = self.post(request).await?.json()?;

        let user = IdentityRecord {
            uid: body.local_id,
            display_name: body.display_name.filter(|name| !name.is_empty()),
            email: body.email.filter(|email| !email.is_empty()),
            photo_url: body.photo_url.filter(|url| !url.is_empty()),
        };
        let expires_at =
            self.clock.now() + Duration::seconds(parse_lifetime(body.expires_in.as_deref()));

        info!(uid = %user.uid, "Firebase sign-in succeeded");
        self.activate(
            StoredSession::new(user.clone(), body.id_token, body.refresh_token, expires_at),
            None,
        )
        .await;

        Ok(user)
    }

    async fn sign_out(&self) -> BridgeResult<()> {
        let generation = self.end_session();
        self.persistence
            .clear_since(generation)
            .await
            .map(|_| ())
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))
    }

    /// Ends the session immediately; the stored record is removed on the
    /// current runtime when there is one. A sign-in completing before the
    /// removal runs keeps its record.
    fn sign_out_blocking(&self) -> BridgeResult<()> {
        let generation = self.end_session();

        let persistence = self.persistence.clone();
        let clear = async move {
            if let Err(e) = persistence.clear_since(generation).await {
                warn!(error = %e, "Stored session not cleared");
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(clear);
            }
            Err(_) => futures::executor::block_on(clear),
        }
        Ok(())
    }

    fn auth_state_changes(&self) -> BoxStream<'static, Option<IdentityRecord>> {
        changes(self.state.subscribe())
    }

    fn current_user(&self) -> Option<IdentityRecord> {
        self.state.borrow().clone()
    }

    #[instrument(skip(self))]
    async fn id_token(&self, uid: &str, force_refresh: bool) -> BridgeResult<String> {
        let _guard = self.refresh_lock.lock().await;

        let session = self
            .session
            .lock()
            .clone()
            .filter(|s| s.user.uid == uid)
            .ok_or_else(|| BridgeError::AuthRejected {
                code: "USER_NOT_FOUND".to_string(),
                message: format!("No Firebase session for user {}", uid),
            })?;

        let buffer = Duration::seconds(TOKEN_REFRESH_BUFFER_SECS);
        if !force_refresh && !session.is_expired_at(self.clock.now(), buffer) {
            return Ok(session.id_token);
        }

        debug!(force_refresh, "Refreshing Firebase ID token");
        match self.refresh(&session).await {
            Ok(rotated) => {
                let token = rotated.id_token.clone();
                if !self.activate(rotated, Some(&session)).await {
                    debug!("Session changed during refresh, rotated tokens dropped");
                }
                Ok(token)
            }
            Err(BridgeError::AuthRejected { code, message })
                if TERMINAL_REFRESH_CODES.contains(&code.as_str()) =>
            {
                if self.is_active(&session) {
                    warn!(%code, "Refresh token rejected, signing out");
                    let generation = self.end_session();
                    if let Err(e) = self.persistence.clear_since(generation).await {
                        warn!(error = %e, "Stored session not cleared");
                    }
                } else {
                    debug!(%code, "Rejected refresh token no longer active");
                }
                Err(BridgeError::AuthRejected { code, message })
            }
            Err(BridgeError::AuthRejected { code, message }) => {
                warn!(%code, "Token refresh refused, keeping session");
                Err(BridgeError::AuthRejected { code, message })
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SecureTokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Same user, same refresh token.
fn same_session(a: &StoredSession, b: &StoredSession) -> bool {
    a.user.uid == b.user.uid && a.refresh_token == b.refresh_token
}

fn parse_lifetime(expires_in: Option<&str>) -> i64 {
    expires_in
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
}

/// Map a non-2xx answer to a bridge error.
fn error_from_response(response: &HttpResponse) -> BridgeError {
    let status = response.status;
    let text = response.text().unwrap_or_default();

    if !response.is_client_error() {
        return BridgeError::OperationFailed(format!(
            "Identity service returned HTTP {}: {}",
            status, text
        ));
    }

    match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => {
            let raw = envelope.error.message;
            match raw.split_once(" : ") {
                Some((code, detail)) => BridgeError::AuthRejected {
                    code: code.trim().to_string(),
                    message: detail.trim().to_string(),
                },
                None => BridgeError::AuthRejected {
                    code: raw.trim().to_string(),
                    message: raw,
                },
            }
        }
        Err(_) => BridgeError::AuthRejected {
            code: format!("HTTP_{}", status),
            message: text,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_store::SESSION_KEY;
    use crate::test_support::{InMemorySecureStore, ManualClock, ScriptedHttpClient};
    use futures::StreamExt;
    use serde_json::json;

    struct Harness {
        http: ScriptedHttpClient,
        store: InMemorySecureStore,
        clock: ManualClock,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                http: ScriptedHttpClient::default(),
                store: InMemorySecureStore::default(),
                clock: ManualClock::new(),
            }
        }

        fn config() -> IdentityConfig {
            IdentityConfig {
                api_key: Some("test-key".to_string()),
                identity_toolkit_url: "https://idp.test/v1".to_string(),
                secure_token_url: "https://sts.test/v1/".to_string(),
                http_timeout: std::time::Duration::from_secs(5),
            }
        }

        fn backend(&self) -> FirebaseBackend {
            FirebaseBackend::new(
                &Self::config(),
                Arc::new(self.http.clone()),
                Arc::new(self.store.clone()),
                Arc::new(self.clock.clone()),
            )
            .unwrap()
        }

        async fn restored(&self) -> FirebaseBackend {
            FirebaseBackend::restore(
                &Self::config(),
                Arc::new(self.http.clone()),
                Arc::new(self.store.clone()),
                Arc::new(self.clock.clone()),
            )
            .await
            .unwrap()
        }

        fn sign_in_ok(&self) {
            self.http.respond(
                200,
                json!({
                    "idToken": "fb-id-1",
                    "refreshToken": "fb-refresh-1",
                    "expiresIn": "3600",
                    "localId": "u1",
                    "email": "a@x.com",
                    "displayName": "Ann"
                }),
            );
        }
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let harness = Harness::new();
        let config = IdentityConfig {
            api_key: None,
            ..Harness::config()
        };

        let result = FirebaseBackend::new(
            &config,
            Arc::new(harness.http.clone()),
            Arc::new(harness.store.clone()),
            Arc::new(harness.clock.clone()),
        );
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_sign_in_posts_credential_and_persists() {
        let harness = Harness::new();
        harness.sign_in_ok();
        let backend = harness.backend();

        let credential = backend.exchange_credential("google-token").unwrap();
        let user = backend.sign_in_with_credential(credential).await.unwrap();

        assert_eq!(
            user,
            IdentityRecord::new("u1")
                .with_display_name("Ann")
                .with_email("a@x.com")
        );
        assert_eq!(backend.current_user(), Some(user));

        let requests = harness.http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://idp.test/v1/accounts:signInWithIdp?key=test-key"
        );
        let body: serde_json::Value =
            serde_json::from_slice(requests[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(body["postBody"], "id_token=google-token&providerId=google.com");
        assert_eq!(body["returnSecureToken"], true);
        assert_eq!(requests[0].timeout, Some(std::time::Duration::from_secs(5)));

        assert!(harness.store.raw(SESSION_KEY).is_some());
    }

    #[tokio::test]
    async fn test_error_body_maps_to_rejection() {
        let harness = Harness::new();
        harness.http.respond(
            400,
            json!({"error": {"code": 400, "message": "INVALID_IDP_RESPONSE : Invalid Idp Response: the Google id_token is not allowed"}}),
        );
        let backend = harness.backend();

        let err = backend
            .sign_in_with_credential(ProviderCredential::google("bad-token"))
            .await
            .unwrap_err();

        match err {
            BridgeError::AuthRejected { code, message } => {
                assert_eq!(code, "INVALID_IDP_RESPONSE");
                assert!(message.starts_with("Invalid Idp Response"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(backend.current_user().is_none());
    }

    #[tokio::test]
    async fn test_error_without_detail_uses_message_as_code() {
        let harness = Harness::new();
        harness
            .http
            .respond(400, json!({"error": {"message": "USER_DISABLED"}}));
        let backend = harness.backend();

        let err = backend
            .sign_in_with_credential(ProviderCredential::google("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::AuthRejected { ref code, .. } if code == "USER_DISABLED"));
    }

    #[tokio::test]
    async fn test_server_error_and_transport_failure_are_not_rejections() {
        let harness = Harness::new();
        harness.http.respond(503, json!({"error": {"message": "UNAVAILABLE"}}));
        harness.http.fail("connection reset");
        let backend = harness.backend();

        for _ in 0..2 {
            let err = backend
                .sign_in_with_credential(ProviderCredential::google("t"))
                .await
                .unwrap_err();
            assert!(matches!(err, BridgeError::OperationFailed(_)));
        }
    }

    #[tokio::test]
    async fn test_restore_publishes_cached_user() {
        let harness = Harness::new();
        harness.sign_in_ok();
        harness
            .backend()
            .sign_in_with_credential(ProviderCredential::google("google-token"))
            .await
            .unwrap();

        let relaunched = harness.restored().await;
        assert_eq!(
            relaunched.current_user().map(|u| u.uid),
            Some("u1".to_string())
        );
    }

    #[tokio::test]
    async fn test_restore_discards_corrupted_session() {
        let harness = Harness::new();
        harness.store.put_raw(SESSION_KEY, b"garbage");

        let backend = harness.restored().await;
        assert!(backend.current_user().is_none());
        assert!(harness.store.raw(SESSION_KEY).is_none());
    }

    #[tokio::test]
    async fn test_cached_token_reused_until_buffer() {
        let harness = Harness::new();
        harness.sign_in_ok();
        let backend = harness.backend();
        backend
            .sign_in_with_credential(ProviderCredential::google("google-token"))
            .await
            .unwrap();

        assert_eq!(backend.id_token("u1", false).await.unwrap(), "fb-id-1");
        assert_eq!(harness.http.requests().len(), 1);

        harness.clock.advance(Duration::minutes(56));
        harness.http.respond(
            200,
            json!({"id_token": "fb-id-2", "refresh_token": "fb-refresh-2", "expires_in": "3600", "user_id": "u1"}),
        );

        assert_eq!(backend.id_token("u1", false).await.unwrap(), "fb-id-2");
        let requests = harness.http.requests();
        assert_eq!(requests[1].url, "https://sts.test/v1/token?key=test-key");
        assert_eq!(
            requests[1].body.as_deref(),
            Some(&b"grant_type=refresh_token&refresh_token=fb-refresh-1"[..])
        );

        let stored: StoredSession =
            serde_json::from_slice(&harness.store.raw(SESSION_KEY).unwrap()).unwrap();
        assert_eq!(stored.refresh_token, "fb-refresh-2");
    }

    #[tokio::test]
    async fn test_force_refresh_skips_cache() {
        let harness = Harness::new();
        harness.sign_in_ok();
        let backend = harness.backend();
        backend
            .sign_in_with_credential(ProviderCredential::google("google-token"))
            .await
            .unwrap();
        harness.http.respond(
            200,
            json!({"id_token": "fb-id-2", "refresh_token": "fb-refresh-2", "expires_in": "3600"}),
        );

        assert_eq!(backend.id_token("u1", true).await.unwrap(), "fb-id-2");
    }

    #[tokio::test]
    async fn test_rejected_refresh_token_signs_out() {
        let harness = Harness::new();
        harness.sign_in_ok();
        let backend = harness.backend();
        backend
            .sign_in_with_credential(ProviderCredential::google("google-token"))
            .await
            .unwrap();
        let mut states = backend.auth_state_changes();
        harness
            .http
            .respond(400, json!({"error": {"message": "TOKEN_EXPIRED"}}));

        let err = backend.id_token("u1", true).await.unwrap_err();

        assert!(matches!(err, BridgeError::AuthRejected { ref code, .. } if code == "TOKEN_EXPIRED"));
        assert_eq!(states.next().await, Some(None));
        assert!(harness.store.raw(SESSION_KEY).is_none());
    }

    #[tokio::test]
    async fn test_token_for_unknown_user_rejected() {
        let harness = Harness::new();
        let backend = harness.backend();
        assert!(matches!(
            backend.id_token("nobody", false).await,
            Err(BridgeError::AuthRejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_sign_out_clears_state_and_storage() {
        let harness = Harness::new();
        harness.sign_in_ok();
        let backend = harness.backend();
        backend
            .sign_in_with_credential(ProviderCredential::google("google-token"))
            .await
            .unwrap();

        backend.sign_out().await.unwrap();
        backend.sign_out().await.unwrap();

        assert!(backend.current_user().is_none());
        assert!(harness.store.raw(SESSION_KEY).is_none());
    }

    #[test]
    fn test_blocking_sign_out_without_runtime() {
        let harness = Harness::new();
        harness.store.put_raw(SESSION_KEY, b"{}");
        let backend = harness.backend();

        backend.sign_out_blocking().unwrap();
        assert!(backend.current_user().is_none());
        assert!(harness.store.raw(SESSION_KEY).is_none());
    }

    #[tokio::test]
    async fn test_rate_limited_refresh_keeps_session() {
        let harness = Harness::new();
        harness.sign_in_ok();
        let backend = harness.backend();
        backend
            .sign_in_with_credential(ProviderCredential::google("google-token"))
            .await
            .unwrap();
        harness.http.respond(
            429,
            json!({"error": {"code": 429, "message": "TOO_MANY_ATTEMPTS_TRY_LATER : Too many attempts, try again later"}}),
        );

        let err = backend.id_token("u1", true).await.unwrap_err();

        assert!(matches!(err, BridgeError::AuthRejected { ref code, .. } if code == "TOO_MANY_ATTEMPTS_TRY_LATER"));
        assert_eq!(
            backend.current_user().map(|u| u.uid),
            Some("u1".to_string())
        );
        assert!(harness.store.raw(SESSION_KEY).is_some());
        assert_eq!(backend.id_token("u1", false).await.unwrap(), "fb-id-1");
    }

    #[tokio::test]
    async fn test_blocking_sign_out_clears_on_runtime() {
        let harness = Harness::new();
        harness.sign_in_ok();
        let backend = harness.backend();
        backend
            .sign_in_with_credential(ProviderCredential::google("google-token"))
            .await
            .unwrap();

        backend.sign_out_blocking().unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(backend.current_user().is_none());
        assert!(harness.store.raw(SESSION_KEY).is_none());
    }

    #[tokio::test]
    async fn test_blocking_sign_out_keeps_later_sign_in() {
        let harness = Harness::new();
        harness.sign_in_ok();
        let backend = harness.backend();
        backend
            .sign_in_with_credential(ProviderCredential::google("google-token"))
            .await
            .unwrap();

        backend.sign_out_blocking().unwrap();
        harness.sign_in_ok();
        backend
            .sign_in_with_credential(ProviderCredential::google("google-token"))
            .await
            .unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(harness.store.raw(SESSION_KEY).is_some());
        let relaunched = harness.restored().await;
        assert_eq!(
            relaunched.current_user().map(|u| u.uid),
            Some("u1".to_string())
        );
    }

    #[test]
    fn test_parse_lifetime() {
        assert_eq!(parse_lifetime(Some("1800")), 1800);
        assert_eq!(parse_lifetime(Some("soon")), DEFAULT_TOKEN_LIFETIME_SECS);
        assert_eq!(parse_lifetime(None), DEFAULT_TOKEN_LIFETIME_SECS);
    }
}
