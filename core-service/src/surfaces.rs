//! Refresh triggers for the tile and the complication.
//!
//! Rendering is the host's job. These wrappers only ask for a re-render and
//! never fail the caller: a surface that cannot refresh now will on its own
//! schedule.

use std::sync::Arc;

use bridge_traits::surface::{SurfaceKind, SurfaceUpdater};
use tracing::{debug, warn};

use crate::error::{Result, ServiceError};

fn checked(updater: Arc<dyn SurfaceUpdater>, expected: SurfaceKind) -> Result<Arc<dyn SurfaceUpdater>> {
    if updater.kind() == expected {
        Ok(updater)
    } else {
        Err(ServiceError::InitializationFailed(format!(
            "expected a {} updater, got a {} updater",
            expected.as_str(),
            updater.kind().as_str()
        )))
    }
}

fn request(updater: &dyn SurfaceUpdater) -> bool {
    let kind = updater.kind().as_str();
    match updater.request_update() {
        Ok(()) => {
            debug!(surface = kind, "Surface update requested");
            true
        }
        Err(e) => {
            warn!(surface = kind, error = %e, "Surface update request failed");
            false
        }
    }
}

/// Asks the host to re-render the conference tile.
pub struct TileUpdater {
    updater: Arc<dyn SurfaceUpdater>,
}

impl TileUpdater {
    /// # Errors
    ///
    /// Fails if `updater` does not refresh [`SurfaceKind::Tile`].
    pub fn new(updater: Arc<dyn SurfaceUpdater>) -> Result<Self> {
        Ok(Self {
            updater: checked(updater, SurfaceKind::Tile)?,
        })
    }

    /// Returns whether the request reached the host.
    pub fn update(&self) -> bool {
        request(self.updater.as_ref())
    }
}

/// Asks the host to re-render the next-session complication.
pub struct ComplicationUpdater {
    updater: Arc<dyn SurfaceUpdater>,
}

impl ComplicationUpdater {
    /// # Errors
    ///
    /// Fails if `updater` does not refresh [`SurfaceKind::Complication`].
    pub fn new(updater: Arc<dyn SurfaceUpdater>) -> Result<Self> {
        Ok(Self {
            updater: checked(updater, SurfaceKind::Complication)?,
        })
    }

    pub fn update(&self) -> bool {
        request(self.updater.as_ref())
    }
}
