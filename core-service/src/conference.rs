//! Conference identifiers and the watch's conference selection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::storage::SettingsStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ServiceError};

/// Settings key holding the selected conference id.
pub const SELECTED_CONFERENCE_KEY: &str = "selected_conference";

/// Conferences known to the app.
///
/// # Examples
///
/// ```
/// use core_service::ConferenceId;
///
/// assert_eq!(ConferenceId::from_id(Some("kotlinconf2023")), Some(ConferenceId::KotlinConf2023));
/// assert_eq!(ConferenceId::from_id(Some("unknown")), None);
/// assert_eq!(ConferenceId::from_id(None), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ConferenceId {
    DroidconSanFrancisco,
    DevFestNantes,
    FrenchKit2022,
    GraphQlSummit2022,
    DroidconLondon2022,
    Fosdem2023,
    KotlinConf2023,
    AndroidMakers2023,
    Test,
}

impl ConferenceId {
    pub const ALL: [ConferenceId; 9] = [
        ConferenceId::DroidconSanFrancisco,
        ConferenceId::DevFestNantes,
        ConferenceId::FrenchKit2022,
        ConferenceId::GraphQlSummit2022,
        ConferenceId::DroidconLondon2022,
        ConferenceId::Fosdem2023,
        ConferenceId::KotlinConf2023,
        ConferenceId::AndroidMakers2023,
        ConferenceId::Test,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConferenceId::DroidconSanFrancisco => "droidconsf",
            ConferenceId::DevFestNantes => "devfestnantes",
            ConferenceId::FrenchKit2022 => "frenchkit2022",
            ConferenceId::GraphQlSummit2022 => "graphqlsummit2022",
            ConferenceId::DroidconLondon2022 => "droidconlondon2022",
            ConferenceId::Fosdem2023 => "fosdem2023",
            ConferenceId::KotlinConf2023 => "kotlinconf2023",
            ConferenceId::AndroidMakers2023 => "androidmakers2023",
            ConferenceId::Test => "test",
        }
    }

    /// Look up a conference by id; `None` for a missing or unknown id.
    pub fn from_id(id: Option<&str>) -> Option<Self> {
        let id = id?;
        Self::ALL.into_iter().find(|c| c.as_str() == id)
    }
}

impl fmt::Display for ConferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConferenceId {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_id(Some(s)).ok_or_else(|| ServiceError::InvalidConference(s.to_string()))
    }
}

impl TryFrom<String> for ConferenceId {
    type Error = ServiceError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ConferenceId> for &'static str {
    fn from(id: ConferenceId) -> Self {
        id.as_str()
    }
}

/// The conference the watch shows.
///
/// Ids are kept as strings: the phone may select a conference this build
/// does not know yet.
#[async_trait]
pub trait ConferenceSetting: Send + Sync {
    async fn selected_conference(&self) -> Result<Option<String>>;

    /// # Errors
    ///
    /// [`ServiceError::InvalidConference`] for a blank id.
    async fn select_conference(&self, conference: &str) -> Result<()>;

    async fn clear_selection(&self) -> Result<()>;
}

/// [`ConferenceSetting`] persisted in the host settings store.
#[derive(Clone)]
pub struct WearConferenceSetting {
    settings: Arc<dyn SettingsStore>,
}

impl WearConferenceSetting {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ConferenceSetting for WearConferenceSetting {
    async fn selected_conference(&self) -> Result<Option<String>> {
        let selected = self
            .settings
            .get_string(SELECTED_CONFERENCE_KEY)
            .await?
            .filter(|id| !id.trim().is_empty());
        debug!(conference = ?selected, "Read selected conference");
        Ok(selected)
    }

    async fn select_conference(&self, conference: &str) -> Result<()> {
        let conference = conference.trim();
        if conference.is_empty() {
            return Err(ServiceError::InvalidConference(conference.to_string()));
        }

        self.settings
            .set_string(SELECTED_CONFERENCE_KEY, conference)
            .await?;
        info!(conference, "Conference selected");
        Ok(())
    }

    async fn clear_selection(&self) -> Result<()> {
        self.settings.delete(SELECTED_CONFERENCE_KEY).await?;
        info!("Conference selection cleared");
        Ok(())
    }
}
