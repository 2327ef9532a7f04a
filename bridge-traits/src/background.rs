//! Background Work Scheduling
//!
//! The core decides *what* to refresh; the host decides *when* it actually
//! runs (WorkManager on Wear OS, respecting Doze and battery constraints).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Task execution constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConstraints {
    /// Require an unmetered connection
    pub requires_unmetered: bool,
    /// Require any network connection
    pub requires_network: bool,
    /// Require device to be charging
    pub requires_charging: bool,
}

impl Default for TaskConstraints {
    fn default() -> Self {
        Self {
            requires_unmetered: false,
            requires_network: true,
            requires_charging: false,
        }
    }
}

/// Scheduled task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Background task executor trait
///
/// Scheduling a task id that is already enqueued replaces the previous
/// request (WorkManager `REPLACE` semantics).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::background::{BackgroundExecutor, TaskConstraints};
/// use std::time::Duration;
///
/// async fn refresh_daily(executor: &dyn BackgroundExecutor) -> Result<()> {
///     executor
///         .schedule_task("conference_refresh", Duration::from_secs(86_400), TaskConstraints::default())
///         .await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait BackgroundExecutor: Send + Sync {
    /// Schedule a recurring task
    async fn schedule_task(
        &self,
        task_id: &str,
        interval: Duration,
        constraints: TaskConstraints,
    ) -> Result<TaskId>;

    /// Schedule a one-time task after `delay`
    async fn schedule_once(
        &self,
        task_id: &str,
        delay: Duration,
        constraints: TaskConstraints,
    ) -> Result<TaskId>;

    /// Cancel a scheduled task
    async fn cancel_task(&self, task_id: &TaskId) -> Result<()>;

    /// Check if background execution is available
    async fn is_available(&self) -> bool {
        true
    }
}
