//! Workspace facade crate.
//!
//! Host applications can depend on `confetti-workspace` and enable the `wear`
//! feature instead of wiring `core-service` and its dependencies one by one.

#[cfg(feature = "wear")]
pub use core_service::*;
