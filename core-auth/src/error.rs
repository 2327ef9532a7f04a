use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The identity provider rejected the credential or request.
    #[error("Identity provider rejected sign-in ({code}): {message}")]
    Backend { code: String, message: String },

    #[error("Unexpected authentication failure: {0}")]
    Unexpected(String),

    /// Authentication is disabled in this build.
    #[error("provider not available")]
    ProviderUnavailable,

    #[error("Authentication configuration error: {0}")]
    Configuration(String),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Whether the user can reasonably retry with a fresh credential.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AuthError::Backend { .. })
    }
}

impl From<BridgeError> for AuthError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::AuthRejected { code, message } => AuthError::Backend { code, message },
            BridgeError::InvalidConfiguration(msg) => AuthError::Configuration(msg),
            other => AuthError::Unexpected(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
