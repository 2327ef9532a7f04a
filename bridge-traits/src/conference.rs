//! Conference data refresh port.
//!
//! Data fetching itself (GraphQL, caching) lives outside the core. The core
//! only triggers a refresh and hands over the bearer token of the signed-in
//! user so the data layer can load user-specific data such as bookmarks.

use async_trait::async_trait;

use crate::error::Result;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConferenceDataSource: Send + Sync {
    /// Refresh cached data for `conference`.
    ///
    /// `bearer_token` is `None` for anonymous refreshes.
    async fn refresh(&self, conference: &str, bearer_token: Option<String>) -> Result<()>;
}
