use async_trait::async_trait;
use bridge_traits::identity::{IdentityBackend, IdentityRecord};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::error::AuthError;

/// Identity fields of a signed-in user.
///
/// # Examples
///
/// ```
/// use bridge_traits::IdentityRecord;
/// use core_auth::UserProfile;
///
/// let record = IdentityRecord::new("u1").with_email("a@x.com");
/// let profile = UserProfile::from(&record);
///
/// // A missing display name becomes the empty string
/// assert_eq!(profile.name, "");
/// assert_eq!(profile.photo_url, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    /// Display name; empty when the provider has none
    pub name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl From<&IdentityRecord> for UserProfile {
    fn from(record: &IdentityRecord) -> Self {
        Self {
            uid: record.uid.clone(),
            name: record.display_name.clone().unwrap_or_default(),
            email: record.email.clone(),
            photo_url: record.photo_url.clone(),
        }
    }
}

/// Source of bearer tokens for authenticated requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current bearer token, or `None` when it cannot be obtained.
    ///
    /// Failures are logged, never returned.
    async fn token(&self, force_refresh: bool) -> Option<String>;
}

/// The signed-in user as seen by the rest of the app.
///
/// Built fresh from every provider notification and never mutated. Two users
/// are equal when their profiles are equal.
#[derive(Clone)]
pub struct User {
    profile: UserProfile,
    backend: Arc<dyn IdentityBackend>,
}

impl User {
    pub fn from_record(record: &IdentityRecord, backend: Arc<dyn IdentityBackend>) -> Self {
        Self {
            profile: UserProfile::from(record),
            backend,
        }
    }

    pub fn uid(&self) -> &str {
        &self.profile.uid
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn email(&self) -> Option<&str> {
        self.profile.email.as_deref()
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.profile.photo_url.as_deref()
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }
}

#[async_trait]
impl TokenProvider for User {
    async fn token(&self, force_refresh: bool) -> Option<String> {
        match self.backend.id_token(&self.profile.uid, force_refresh).await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(uid = %self.profile.uid, force_refresh, error = %e, "Cannot get user token");
                None
            }
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.profile == other.profile
    }
}

impl Eq for User {}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("uid", &self.profile.uid)
            .field("name", &self.profile.name)
            .field("email", &self.profile.email)
            .field("photo_url", &self.profile.photo_url)
            .finish()
    }
}

/// Outcome of a sign-in attempt.
///
/// Success carries no user: the session holder picks the user up from the
/// provider's auth-state notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInResult {
    Success,
    Error(AuthError),
}

impl SignInResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SignInResult::Success)
    }

    pub fn error(&self) -> Option<&AuthError> {
        match self {
            SignInResult::Success => None,
            SignInResult::Error(e) => Some(e),
        }
    }
}

impl From<crate::Result<()>> for SignInResult {
    fn from(result: crate::Result<()>) -> Self {
        match result {
            Ok(()) => SignInResult::Success,
            Err(e) => SignInResult::Error(e),
        }
    }
}

/// Provider session persisted between launches.
///
/// `Debug` redacts both tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: IdentityRecord,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(
        user: IdentityRecord,
        id_token: String,
        refresh_token: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user,
            id_token,
            refresh_token,
            expires_at,
        }
    }

    /// Whether the ID token is expired at `now`, or will be within `buffer`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        now >= self.expires_at - buffer
    }
}

impl fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSession")
            .field("user", &self.user)
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryIdentityBackend;

    fn ann() -> IdentityRecord {
        IdentityRecord::new("u1")
            .with_display_name("Ann")
            .with_email("a@x.com")
    }

    #[test]
    fn test_profile_from_record() {
        let profile = UserProfile::from(&ann());
        assert_eq!(
            profile,
            UserProfile {
                uid: "u1".to_string(),
                name: "Ann".to_string(),
                email: Some("a@x.com".to_string()),
                photo_url: None,
            }
        );
    }

    #[test]
    fn test_profile_missing_name_is_empty() {
        let profile = UserProfile::from(&IdentityRecord::new("u2"));
        assert_eq!(profile.name, "");
        assert!(profile.email.is_none());
    }

    #[test]
    fn test_user_equality_ignores_backend() {
        let first = User::from_record(&ann(), Arc::new(MemoryIdentityBackend::new()));
        let second = User::from_record(&ann(), Arc::new(MemoryIdentityBackend::new()));
        assert_eq!(first, second);
        assert_eq!(first.name(), "Ann");
        assert_eq!(first.email(), Some("a@x.com"));
        assert_eq!(first.photo_url(), None);
    }

    #[tokio::test]
    async fn test_token_for_signed_in_user() {
        let backend = Arc::new(MemoryIdentityBackend::with_cached_user(ann()));
        let user = User::from_record(&ann(), backend);

        let token = user.token(false).await;
        assert!(token.is_some());
    }

    #[tokio::test]
    async fn test_token_failure_yields_none() {
        let backend = Arc::new(MemoryIdentityBackend::with_cached_user(ann()));
        backend.fail_token_requests(true);
        let user = User::from_record(&ann(), backend);

        assert_eq!(user.token(true).await, None);
    }

    #[test]
    fn test_sign_in_result_from_result() {
        assert!(SignInResult::from(Ok(())).is_success());

        let failed = SignInResult::from(Err(AuthError::ProviderUnavailable));
        assert_eq!(failed.error(), Some(&AuthError::ProviderUnavailable));
    }

    #[test]
    fn test_stored_session_expiry_buffer() {
        let now = Utc::now();
        let session = StoredSession::new(
            ann(),
            "id".to_string(),
            "refresh".to_string(),
            now + Duration::minutes(10),
        );

        assert!(!session.is_expired_at(now, Duration::minutes(5)));
        assert!(session.is_expired_at(now + Duration::minutes(6), Duration::minutes(5)));
        assert!(session.is_expired_at(now + Duration::minutes(11), Duration::zero()));
    }

    #[test]
    fn test_stored_session_debug_redacts() {
        let session = StoredSession::new(
            ann(),
            "secret-id-token".to_string(),
            "secret-refresh".to_string(),
            Utc::now(),
        );
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-id-token"));
        assert!(!debug.contains("secret-refresh"));
    }
}
