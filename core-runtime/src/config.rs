//! # Application Configuration
//!
//! Settings the composition root needs before any service is constructed.
//!
//! ## Overview
//!
//! `AppConfig` is assembled with a builder and validated fail-fast, so a
//! misconfigured build is reported at startup with an actionable message
//! rather than surfacing later as a failed sign-in.
//!
//! The identity backend is optional: a build without a Firebase API key still
//! starts, with authentication disabled.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .web_client_id("123-abc.apps.googleusercontent.com")
//!     .firebase_api_key("AIzaSyExample")
//!     .build()
//!     .expect("valid config");
//!
//! assert!(config.has_identity_backend());
//! ```

use crate::error::{Error, Result};
use std::time::Duration;

/// Environment variable holding the Firebase web API key
pub const ENV_FIREBASE_API_KEY: &str = "CONFETTI_FIREBASE_API_KEY";
/// Environment variable holding the OAuth web client id used for ID tokens
pub const ENV_WEB_CLIENT_ID: &str = "CONFETTI_WEB_CLIENT_ID";

pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_EVENT_BUFFER: usize = 64;

/// Identity provider endpoints and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Firebase web API key; `None` disables the Firebase backend
    pub api_key: Option<String>,
    pub identity_toolkit_url: String,
    pub secure_token_url: String,
    /// Timeout applied to every identity HTTP call
    pub http_timeout: Duration,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("identity_toolkit_url", &self.identity_toolkit_url)
            .field("secure_token_url", &self.secure_token_url)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            identity_toolkit_url: DEFAULT_IDENTITY_TOOLKIT_URL.to_string(),
            secure_token_url: DEFAULT_SECURE_TOKEN_URL.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Top-level configuration for the wear app core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    /// OAuth web client id the native sign-in flow mints ID tokens for
    pub web_client_id: String,
    /// Period of the background conference refresh
    pub refresh_interval: Duration,
    /// Capacity of the event bus channel
    pub event_buffer_size: usize,
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    pub fn has_identity_backend(&self) -> bool {
        self.identity.api_key.is_some()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.web_client_id.trim().is_empty() {
            return Err(Error::CapabilityMissing {
                capability: "web_client_id".to_string(),
                message: format!(
                    "A web client id is required to request ID tokens. \
                     Set {} or pass it from the platform resources.",
                    ENV_WEB_CLIENT_ID
                ),
            });
        }

        if let Some(key) = &self.identity.api_key {
            if key.trim().is_empty() {
                return Err(Error::Config(
                    "Firebase API key cannot be blank; omit it to disable authentication"
                        .to_string(),
                ));
            }
        }

        for (name, url) in [
            ("identity toolkit", &self.identity.identity_toolkit_url),
            ("secure token", &self.identity.secure_token_url),
        ] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(Error::Config(format!(
                    "The {} URL must be absolute, got '{}'",
                    name, url
                )));
            }
        }

        if self.identity.http_timeout.is_zero() {
            return Err(Error::Config("HTTP timeout must be greater than 0".to_string()));
        }

        if self.refresh_interval < Duration::from_secs(15 * 60) {
            return Err(Error::Config(
                "Refresh interval must be at least 15 minutes (platform minimum for periodic work)"
                    .to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`AppConfig`].
#[derive(Debug, Default, Clone)]
pub struct AppConfigBuilder {
    api_key: Option<String>,
    web_client_id: Option<String>,
    identity_toolkit_url: Option<String>,
    secure_token_url: Option<String>,
    http_timeout: Option<Duration>,
    refresh_interval: Option<Duration>,
    event_buffer_size: Option<usize>,
}

impl AppConfigBuilder {
    /// Seed the builder from `CONFETTI_*` environment variables. Values set
    /// afterwards on the builder take precedence.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_key: lookup(ENV_FIREBASE_API_KEY).filter(|v| !v.is_empty()),
            web_client_id: lookup(ENV_WEB_CLIENT_ID),
            ..Self::default()
        }
    }

    pub fn firebase_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn web_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.web_client_id = Some(client_id.into());
        self
    }

    /// Override the Identity Toolkit base URL (emulator, tests)
    pub fn identity_toolkit_url(mut self, url: impl Into<String>) -> Self {
        self.identity_toolkit_url = Some(url.into());
        self
    }

    /// Override the Secure Token base URL (emulator, tests)
    pub fn secure_token_url(mut self, url: impl Into<String>) -> Self {
        self.secure_token_url = Some(url.into());
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when no web client id was given
    /// and [`Error::Config`] for invalid values.
    pub fn build(self) -> Result<AppConfig> {
        let config = AppConfig {
            identity: IdentityConfig {
                api_key: self.api_key,
                identity_toolkit_url: self
                    .identity_toolkit_url
                    .unwrap_or_else(|| DEFAULT_IDENTITY_TOOLKIT_URL.to_string()),
                secure_token_url: self
                    .secure_token_url
                    .unwrap_or_else(|| DEFAULT_SECURE_TOKEN_URL.to_string()),
                http_timeout: self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
            },
            web_client_id: self.web_client_id.unwrap_or_default(),
            refresh_interval: self.refresh_interval.unwrap_or(DEFAULT_REFRESH_INTERVAL),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER),
        };

        config.validate()?;
        Ok(config)
    }
}
