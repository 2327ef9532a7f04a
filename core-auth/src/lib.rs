//! # Authentication Module
//!
//! Adapter over the external identity provider, and the session holder that
//! tells the rest of the app who is signed in.
//!
//! ## Overview
//!
//! Sign-in starts with an ID token from the platform-native Google sign-in
//! flow. [`Authentication::sign_in`] exchanges it for a provider credential
//! and opens a provider session; the provider then reports the new user and
//! the [`SessionHolder`] republishes it as a `watch` value. Sign-out runs the
//! same path in reverse.
//!
//! ## Features
//!
//! - Real and disabled adapters behind one trait, chosen once at startup
//! - Session holder seeded from the provider's cached user
//! - Firebase REST backend with persisted sessions and ID token refresh
//! - In-memory backend for offline hosts and tests
//! - Auth events on the core event bus

pub mod authentication;
pub mod error;
pub mod firebase;
pub mod memory;
pub mod repository;
pub mod session;
pub mod session_store;
pub mod types;

#[cfg(test)]
mod test_support;

pub use authentication::{
    select_authentication, Authentication, DefaultAuthentication, DisabledAuthentication,
};
pub use bridge_traits::signin::{SignInOptions, SignInScope};
pub use error::{AuthError, Result};
pub use firebase::FirebaseBackend;
pub use memory::MemoryIdentityBackend;
pub use repository::{AuthUserRepository, SignInEventListener};
pub use session::SessionHolder;
pub use session_store::{SessionStore, SESSION_KEY};
pub use types::{SignInResult, StoredSession, TokenProvider, User, UserProfile};
