//! Settings pushed from the phone companion app.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conference::ConferenceSetting;
use crate::error::{Result, ServiceError};
use crate::refresh::ConferenceRefresh;

/// Payload of a phone settings sync message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneSettings {
    /// Selected conference id; `None` clears the selection.
    #[serde(default)]
    pub conference: Option<String>,
}

/// Applies [`PhoneSettings`] to the watch.
pub struct PhoneSettingsSync {
    setting: Arc<dyn ConferenceSetting>,
    refresh: Arc<dyn ConferenceRefresh>,
}

impl PhoneSettingsSync {
    pub fn new(setting: Arc<dyn ConferenceSetting>, refresh: Arc<dyn ConferenceRefresh>) -> Self {
        Self { setting, refresh }
    }

    /// Apply `settings`. Returns whether the selection changed.
    ///
    /// A new selection is persisted and a refresh of it is enqueued. A
    /// failed enqueue is logged; the periodic refresh catches up.
    pub async fn apply(&self, settings: PhoneSettings) -> Result<bool> {
        let incoming = settings
            .conference
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        let current = self.setting.selected_conference().await?;

        if incoming == current {
            debug!(conference = ?current, "Phone settings unchanged");
            return Ok(false);
        }

        match &incoming {
            Some(conference) => {
                self.setting.select_conference(conference).await?;
                info!(%conference, "Conference selected from phone");
                if let Err(e) = self.refresh.refresh(Some(conference)).await {
                    warn!(%conference, error = %e, "Could not enqueue refresh after sync");
                }
            }
            None => {
                self.setting.clear_selection().await?;
                info!("Conference selection cleared from phone");
            }
        }

        Ok(true)
    }

    /// Decode a JSON sync message and apply it.
    pub async fn apply_json(&self, payload: &[u8]) -> Result<bool> {
        let settings: PhoneSettings = serde_json::from_slice(payload)
            .map_err(|e| ServiceError::InvalidSettings(e.to_string()))?;
        self.apply(settings).await
    }
}
