//! Composition root of the Confetti wear app core.
//!
//! This crate wires host-provided bridge implementations (HTTP, secure and
//! settings storage, background execution, native sign-in, watch surfaces,
//! conference data) into the shared Rust core. The host assembles a
//! [`PlatformContext`] once and builds the [`WearAppGraph`] from it; every
//! consumer of authentication on the watch is obtained from the graph.
//!
//! ## Modules
//!
//! - [`graph`]: the object graph and view-model factories
//! - [`viewmodels`]: sign-in prompt, Google sign-in and sign-out
//! - [`refresh`]: scheduling and execution of conference data refreshes
//! - [`conference`]: conference ids and the persisted selection
//! - [`settings_sync`]: settings pushed from the phone
//! - [`surfaces`]: tile and complication update requests

pub mod conference;
pub mod context;
pub mod error;
pub mod graph;
pub mod refresh;
pub mod settings_sync;
pub mod surfaces;
pub mod viewmodels;

#[cfg(test)]
mod test_support;

pub use conference::{
    ConferenceId, ConferenceSetting, WearConferenceSetting, SELECTED_CONFERENCE_KEY,
};
pub use context::{PlatformContext, PlatformContextBuilder};
pub use error::{Result, ServiceError};
pub use graph::WearAppGraph;
pub use refresh::{
    conference_for_task, refresh_task_id, BackgroundConferenceRefresh, ConferenceRefresh,
    RefreshWorker, REFRESH_TASK_PREFIX,
};
pub use settings_sync::{PhoneSettings, PhoneSettingsSync};
pub use surfaces::{ComplicationUpdater, TileUpdater};
pub use viewmodels::{
    GoogleSignInState, GoogleSignInViewModel, SignInPromptState, SignInPromptViewModel,
    SignOutViewModel,
};
