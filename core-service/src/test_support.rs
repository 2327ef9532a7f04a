//! Test doubles for the host bridges.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{
    background::{BackgroundExecutor, TaskConstraints, TaskId},
    conference::ConferenceDataSource,
    error::Result,
    signin::{NativeAccount, NativeSignInClient, SignInOptions},
    storage::SettingsStore,
    surface::{SurfaceKind, SurfaceUpdater},
};
use mockall::mock;
use parking_lot::Mutex;

mock! {
    pub Surface {}
    impl SurfaceUpdater for Surface {
        fn kind(&self) -> SurfaceKind;
        fn request_update(&self) -> Result<()>;
    }
}

mock! {
    pub DataSource {}
    #[async_trait]
    impl ConferenceDataSource for DataSource {
        async fn refresh(&self, conference: &str, bearer_token: Option<String>) -> Result<()>;
    }
}

mock! {
    pub SignInClient {}
    #[async_trait]
    impl NativeSignInClient for SignInClient {
        async fn sign_in(&self, options: &SignInOptions) -> Result<Option<NativeAccount>>;
        async fn sign_out(&self) -> Result<()>;
    }
}

/// Surface mock that accepts any number of update requests.
pub fn idle_surface(kind: SurfaceKind) -> MockSurface {
    let mut mock = MockSurface::new();
    mock.expect_kind().return_const(kind);
    mock.expect_request_update().returning(|| Ok(()));
    mock
}

#[derive(Default)]
pub struct InMemorySettingsStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemorySettingsStore {
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: String,
    pub periodic: bool,
    pub after: Duration,
    pub constraints: TaskConstraints,
}

/// Executor that records what was scheduled.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    tasks: Arc<Mutex<Vec<ScheduledTask>>>,
    cancelled: Arc<Mutex<Vec<String>>>,
}

impl RecordingExecutor {
    pub fn scheduled(&self) -> Vec<ScheduledTask> {
        self.tasks.lock().clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().clone()
    }
}

#[async_trait]
impl BackgroundExecutor for RecordingExecutor {
    async fn schedule_task(
        &self,
        task_id: &str,
        interval: Duration,
        constraints: TaskConstraints,
    ) -> Result<TaskId> {
        self.tasks.lock().push(ScheduledTask {
            id: task_id.to_string(),
            periodic: true,
            after: interval,
            constraints,
        });
        Ok(TaskId::new(task_id))
    }

    async fn schedule_once(
        &self,
        task_id: &str,
        delay: Duration,
        constraints: TaskConstraints,
    ) -> Result<TaskId> {
        self.tasks.lock().push(ScheduledTask {
            id: task_id.to_string(),
            periodic: false,
            after: delay,
            constraints,
        });
        Ok(TaskId::new(task_id))
    }

    async fn cancel_task(&self, task_id: &TaskId) -> Result<()> {
        self.cancelled.lock().push(task_id.as_str().to_string());
        Ok(())
    }
}
