//! Watch Surfaces
//!
//! Tiles and complications are rendered by the host; the core only asks for
//! them to be refreshed after new data or a session change.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceKind {
    Tile,
    Complication,
}

impl SurfaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceKind::Tile => "tile",
            SurfaceKind::Complication => "complication",
        }
    }
}

/// Host hook that schedules a re-render of a watch surface.
#[cfg_attr(test, mockall::automock)]
pub trait SurfaceUpdater: Send + Sync {
    /// Which surface this updater refreshes
    fn kind(&self) -> SurfaceKind;

    /// Request a refresh. Non-blocking; rendering happens on the host.
    fn request_update(&self) -> Result<()>;
}
