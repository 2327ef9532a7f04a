//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the Confetti core crates:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//! - Task scopes that bound the lifetime of background listeners
//!
//! ## Overview
//!
//! Other crates depend on this one for their ambient concerns. It establishes
//! the logging conventions, the configuration builder and the broadcast
//! channels used to report auth and refresh activity to the host.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod scope;

pub use error::{Error, Result};
pub use scope::TaskScope;
