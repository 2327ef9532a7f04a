//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host (phone, watch, desktop dev
//! harness) implements for the Confetti core.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and the
//! platform. Each trait represents a capability the core needs but cannot
//! provide itself: an identity backend, the platform-native sign-in client,
//! storage, scheduling and the rendering surfaces of the watch.
//!
//! ## Traits
//!
//! ### Identity
//! - [`IdentityBackend`](identity::IdentityBackend) - Provider session, credential exchange, auth-state notifications
//! - [`NativeSignInClient`](signin::NativeSignInClient) - Platform sign-in flow that yields an ID token
//!
//! ### Networking & Storage
//! - [`HttpClient`](http::HttpClient) - Async HTTP used by REST identity backends
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (Keystore/Keychain)
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//!
//! ### Platform Integration
//! - [`BackgroundExecutor`](background::BackgroundExecutor) - Work scheduling (WorkManager on Wear OS)
//! - [`SurfaceUpdater`](surface::SurfaceUpdater) - Tile/complication refresh requests
//! - [`ConferenceDataSource`](conference::ConferenceDataSource) - Token-consuming data refresh
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Identity
//! backends report provider-side rejections as
//! [`BridgeError::AuthRejected`](error::BridgeError::AuthRejected) so the core
//! can tell them apart from transport or programming failures.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind `Arc`.

pub mod background;
pub mod conference;
pub mod error;
pub mod http;
pub mod identity;
pub mod signin;
pub mod storage;
pub mod surface;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use background::{BackgroundExecutor, TaskConstraints, TaskId};
pub use conference::ConferenceDataSource;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use identity::{IdentityBackend, IdentityRecord, ProviderCredential};
pub use signin::{NativeAccount, NativeSignInClient, SignInOptions, SignInScope};
pub use storage::{SecureStore, SettingsStore};
pub use surface::{SurfaceKind, SurfaceUpdater};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
