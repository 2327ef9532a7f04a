//! # Conference Refresh
//!
//! Two halves:
//!
//! - [`BackgroundConferenceRefresh`] asks the host executor to run a refresh
//!   (once, or periodically). When the work actually runs is the host's
//!   decision.
//! - [`RefreshWorker`] is what runs: it attaches the signed-in user's bearer
//!   token, calls the conference data port and pokes the watch surfaces.
//!
//! Task ids are `conference_refresh` for the selected conference and
//! `conference_refresh:<id>` for a specific one; [`conference_for_task`]
//! reverses the mapping for hosts that dispatch scheduled work.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{
    background::{BackgroundExecutor, TaskConstraints, TaskId},
    conference::ConferenceDataSource,
};
use core_auth::{Authentication, TokenProvider};
use core_runtime::events::{CoreEvent, EventBus, RefreshEvent};
use tracing::{info, instrument, warn};

use crate::conference::ConferenceSetting;
use crate::error::{Result, ServiceError};
use crate::surfaces::{ComplicationUpdater, TileUpdater};

/// Prefix of every refresh task id.
pub const REFRESH_TASK_PREFIX: &str = "conference_refresh";

/// Task id for refreshing `conference`, or the selected conference.
pub fn refresh_task_id(conference: Option<&str>) -> String {
    match conference {
        Some(id) => format!("{}:{}", REFRESH_TASK_PREFIX, id),
        None => REFRESH_TASK_PREFIX.to_string(),
    }
}

/// Conference a refresh task id targets.
///
/// Returns `None` for ids that are not refresh tasks and `Some(None)` for
/// the selected-conference task.
pub fn conference_for_task(task_id: &str) -> Option<Option<&str>> {
    let rest = task_id.strip_prefix(REFRESH_TASK_PREFIX)?;
    if rest.is_empty() {
        return Some(None);
    }
    rest.strip_prefix(':')
        .filter(|id| !id.is_empty())
        .map(Some)
}

/// Trigger for conference data refreshes.
#[async_trait]
pub trait ConferenceRefresh: Send + Sync {
    /// Enqueue a one-off refresh of `conference` (selected one if `None`).
    async fn refresh(&self, conference: Option<&str>) -> Result<TaskId>;

    /// Enqueue the periodic refresh of the selected conference.
    async fn schedule_periodic(&self) -> Result<TaskId>;

    async fn cancel(&self, conference: Option<&str>) -> Result<()>;
}

/// [`ConferenceRefresh`] backed by the host background executor.
pub struct BackgroundConferenceRefresh {
    executor: Arc<dyn BackgroundExecutor>,
    interval: Duration,
}

impl BackgroundConferenceRefresh {
    pub fn new(executor: Arc<dyn BackgroundExecutor>, interval: Duration) -> Self {
        Self { executor, interval }
    }

    fn constraints() -> TaskConstraints {
        // Network only; the host's battery policy decides the rest.
        TaskConstraints::default()
    }
}

#[async_trait]
impl ConferenceRefresh for BackgroundConferenceRefresh {
    async fn refresh(&self, conference: Option<&str>) -> Result<TaskId> {
        let task_id = refresh_task_id(conference);
        let id = self
            .executor
            .schedule_once(&task_id, Duration::ZERO, Self::constraints())
            .await?;
        info!(task_id = id.as_str(), "Conference refresh enqueued");
        Ok(id)
    }

    async fn schedule_periodic(&self) -> Result<TaskId> {
        if !self.executor.is_available().await {
            return Err(ServiceError::CapabilityMissing {
                capability: "background_executor".to_string(),
                message: "Background execution is not available on this host".to_string(),
            });
        }

        let id = self
            .executor
            .schedule_task(REFRESH_TASK_PREFIX, self.interval, Self::constraints())
            .await?;
        info!(task_id = id.as_str(), interval = ?self.interval, "Periodic refresh scheduled");
        Ok(id)
    }

    async fn cancel(&self, conference: Option<&str>) -> Result<()> {
        let task_id = TaskId::new(refresh_task_id(conference));
        self.executor.cancel_task(&task_id).await?;
        info!(task_id = task_id.as_str(), "Conference refresh cancelled");
        Ok(())
    }
}

/// Executes a conference refresh.
pub struct RefreshWorker {
    authentication: Arc<dyn Authentication>,
    setting: Arc<dyn ConferenceSetting>,
    data_source: Arc<dyn ConferenceDataSource>,
    tile: Arc<TileUpdater>,
    complication: Arc<ComplicationUpdater>,
    events: EventBus,
}

impl RefreshWorker {
    pub fn new(
        authentication: Arc<dyn Authentication>,
        setting: Arc<dyn ConferenceSetting>,
        data_source: Arc<dyn ConferenceDataSource>,
        tile: Arc<TileUpdater>,
        complication: Arc<ComplicationUpdater>,
        events: EventBus,
    ) -> Self {
        Self {
            authentication,
            setting,
            data_source,
            tile,
            complication,
            events,
        }
    }

    /// Refresh `conference`, or the selected conference when `None`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NoConferenceSelected`] when there is nothing to
    /// refresh, [`ServiceError::Bridge`] when the data port fails.
    #[instrument(skip(self))]
    pub async fn run(&self, conference: Option<&str>) -> Result<()> {
        let conference = match conference {
            Some(id) => id.to_string(),
            None => self
                .setting
                .selected_conference()
                .await?
                .ok_or(ServiceError::NoConferenceSelected)?,
        };

        let token = match self.authentication.current() {
            Some(user) => user.token(false).await,
            None => None,
        };

        let _ = self.events.emit(CoreEvent::Refresh(RefreshEvent::Started {
            conference: conference.clone(),
            authenticated: token.is_some(),
        }));

        if let Err(e) = self.data_source.refresh(&conference, token).await {
            warn!(%conference, error = %e, "Conference refresh failed");
            let _ = self.events.emit(CoreEvent::Refresh(RefreshEvent::Failed {
                conference,
                message: e.to_string(),
            }));
            return Err(e.into());
        }

        self.tile.update();
        self.complication.update();

        info!(%conference, "Conference refreshed");
        let _ = self
            .events
            .emit(CoreEvent::Refresh(RefreshEvent::Completed { conference }));
        Ok(())
    }

    /// Run the refresh a scheduled task id stands for.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidConference`] if `task_id` is not a refresh task.
    pub async fn run_task(&self, task_id: &TaskId) -> Result<()> {
        let conference = conference_for_task(task_id.as_str())
            .ok_or_else(|| ServiceError::InvalidConference(task_id.as_str().to_string()))?;
        self.run(conference).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conference::WearConferenceSetting;
    use crate::test_support::{idle_surface, InMemorySettingsStore, MockDataSource, RecordingExecutor};
    use bridge_traits::identity::{IdentityBackend, IdentityRecord};
    use bridge_traits::surface::SurfaceKind;
    use bridge_traits::BridgeError;
    use core_auth::{select_authentication, DisabledAuthentication, MemoryIdentityBackend};
    use core_runtime::TaskScope;

    #[test]
    fn test_task_id_mapping() {
        assert_eq!(refresh_task_id(None), "conference_refresh");
        assert_eq!(refresh_task_id(Some("fosdem2023")), "conference_refresh:fosdem2023");

        assert_eq!(conference_for_task("conference_refresh"), Some(None));
        assert_eq!(
            conference_for_task("conference_refresh:fosdem2023"),
            Some(Some("fosdem2023"))
        );
        assert_eq!(conference_for_task("conference_refresh:"), None);
        assert_eq!(conference_for_task("conference_refreshed"), None);
        assert_eq!(conference_for_task("sync"), None);
    }

    #[tokio::test]
    async fn test_one_off_and_periodic_scheduling() {
        let executor = RecordingExecutor::default();
        let refresh =
            BackgroundConferenceRefresh::new(Arc::new(executor.clone()), Duration::from_secs(3600));

        refresh.refresh(Some("kotlinconf2023")).await.unwrap();
        refresh.schedule_periodic().await.unwrap();
        refresh.cancel(None).await.unwrap();

        let scheduled = executor.scheduled();
        assert_eq!(scheduled.len(), 2);
        assert_eq!(scheduled[0].id, "conference_refresh:kotlinconf2023");
        assert!(!scheduled[0].periodic);
        assert!(scheduled[0].constraints.requires_network);
        assert_eq!(scheduled[1].id, "conference_refresh");
        assert!(scheduled[1].periodic);
        assert_eq!(scheduled[1].after, Duration::from_secs(3600));
        assert_eq!(executor.cancelled(), vec!["conference_refresh".to_string()]);
    }

    struct Fixture {
        settings: Arc<InMemorySettingsStore>,
        events: EventBus,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                settings: Arc::new(InMemorySettingsStore::default()),
                events: EventBus::default(),
            }
        }

        fn worker(
            &self,
            authentication: Arc<dyn Authentication>,
            data_source: MockDataSource,
        ) -> RefreshWorker {
            RefreshWorker::new(
                authentication,
                Arc::new(WearConferenceSetting::new(self.settings.clone())),
                Arc::new(data_source),
                Arc::new(TileUpdater::new(Arc::new(idle_surface(SurfaceKind::Tile))).unwrap()),
                Arc::new(
                    ComplicationUpdater::new(Arc::new(idle_surface(SurfaceKind::Complication)))
                        .unwrap(),
                ),
                self.events.clone(),
            )
        }
    }

    #[tokio::test]
    async fn test_signed_in_refresh_attaches_token() {
        let fixture = Fixture::new();
        let scope = TaskScope::current().unwrap();
        let backend: Arc<dyn IdentityBackend> = Arc::new(MemoryIdentityBackend::with_cached_user(
            IdentityRecord::new("u1"),
        ));
        let auth = select_authentication(Ok(backend), &scope, fixture.events.clone());

        let mut data_source = MockDataSource::new();
        data_source
            .expect_refresh()
            .withf(|conference, token| {
                conference == "fosdem2023"
                    && token.as_deref().map_or(false, |t| t.starts_with("memory-id-token.u1"))
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut events = fixture.events.subscribe();
        fixture
            .worker(auth, data_source)
            .run(Some("fosdem2023"))
            .await
            .unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Refresh(RefreshEvent::Started {
                conference: "fosdem2023".to_string(),
                authenticated: true,
            })
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Refresh(RefreshEvent::Completed {
                conference: "fosdem2023".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_anonymous_refresh_uses_selected_conference() {
        let fixture = Fixture::new();
        WearConferenceSetting::new(fixture.settings.clone())
            .select_conference("androidmakers2023")
            .await
            .unwrap();

        let mut data_source = MockDataSource::new();
        data_source
            .expect_refresh()
            .withf(|conference, token| conference == "androidmakers2023" && token.is_none())
            .times(1)
            .returning(|_, _| Ok(()));

        fixture
            .worker(Arc::new(DisabledAuthentication::new()), data_source)
            .run(None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_nothing_selected() {
        let fixture = Fixture::new();
        let mut data_source = MockDataSource::new();
        data_source.expect_refresh().never();

        let result = fixture
            .worker(Arc::new(DisabledAuthentication::new()), data_source)
            .run(None)
            .await;
        assert!(matches!(result, Err(ServiceError::NoConferenceSelected)));
    }

    #[tokio::test]
    async fn test_data_failure_emits_failed_event() {
        let fixture = Fixture::new();
        let mut data_source = MockDataSource::new();
        data_source
            .expect_refresh()
            .returning(|_, _| Err(BridgeError::OperationFailed("HTTP 502".to_string())));
        let mut events = fixture.events.subscribe();

        let result = fixture
            .worker(Arc::new(DisabledAuthentication::new()), data_source)
            .run(Some("test"))
            .await;

        assert!(matches!(result, Err(ServiceError::Bridge(_))));
        let _started = events.recv().await.unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Refresh(RefreshEvent::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_task_dispatches_by_id() {
        let fixture = Fixture::new();
        let mut data_source = MockDataSource::new();
        data_source
            .expect_refresh()
            .withf(|conference, _| conference == "kotlinconf2023")
            .times(1)
            .returning(|_, _| Ok(()));
        let worker = fixture.worker(Arc::new(DisabledAuthentication::new()), data_source);

        worker
            .run_task(&TaskId::new("conference_refresh:kotlinconf2023"))
            .await
            .unwrap();
        assert!(matches!(
            worker.run_task(&TaskId::new("library_sync")).await,
            Err(ServiceError::InvalidConference(_))
        ));
    }
}
