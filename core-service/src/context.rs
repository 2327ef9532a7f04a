//! Host-provided singletons the wear app graph is built from.

use std::sync::Arc;

use bridge_traits::{
    background::BackgroundExecutor,
    conference::ConferenceDataSource,
    http::HttpClient,
    identity::IdentityBackend,
    signin::NativeSignInClient,
    storage::{SecureStore, SettingsStore},
    surface::SurfaceUpdater,
    time::{Clock, SystemClock},
};
use core_runtime::{config::AppConfig, events::EventBus, TaskScope};

use crate::error::{Result, ServiceError};

/// Aggregated handle to all bridge dependencies the wear core requires.
#[derive(Clone)]
pub struct PlatformContext {
    pub config: AppConfig,
    /// Scope that owns the core's long-lived listeners
    pub scope: TaskScope,
    pub events: EventBus,
    pub http_client: Arc<dyn HttpClient>,
    pub secure_store: Arc<dyn SecureStore>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub background_executor: Arc<dyn BackgroundExecutor>,
    pub sign_in_client: Arc<dyn NativeSignInClient>,
    pub tile_updater: Arc<dyn SurfaceUpdater>,
    pub complication_updater: Arc<dyn SurfaceUpdater>,
    pub data_source: Arc<dyn ConferenceDataSource>,
    pub clock: Arc<dyn Clock>,
    /// Replaces the Firebase backend when set
    pub identity_backend: Option<Arc<dyn IdentityBackend>>,
}

impl PlatformContext {
    pub fn builder(config: AppConfig, scope: TaskScope) -> PlatformContextBuilder {
        PlatformContextBuilder {
            config,
            scope,
            events: None,
            http_client: None,
            secure_store: None,
            settings_store: None,
            background_executor: None,
            sign_in_client: None,
            tile_updater: None,
            complication_updater: None,
            data_source: None,
            clock: None,
            identity_backend: None,
        }
    }
}

/// Builder for [`PlatformContext`].
pub struct PlatformContextBuilder {
    config: AppConfig,
    scope: TaskScope,
    events: Option<EventBus>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    background_executor: Option<Arc<dyn BackgroundExecutor>>,
    sign_in_client: Option<Arc<dyn NativeSignInClient>>,
    tile_updater: Option<Arc<dyn SurfaceUpdater>>,
    complication_updater: Option<Arc<dyn SurfaceUpdater>>,
    data_source: Option<Arc<dyn ConferenceDataSource>>,
    clock: Option<Arc<dyn Clock>>,
    identity_backend: Option<Arc<dyn IdentityBackend>>,
}

impl PlatformContextBuilder {
    /// Share an existing event bus instead of creating one from the config.
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn background_executor(mut self, executor: Arc<dyn BackgroundExecutor>) -> Self {
        self.background_executor = Some(executor);
        self
    }

    pub fn sign_in_client(mut self, client: Arc<dyn NativeSignInClient>) -> Self {
        self.sign_in_client = Some(client);
        self
    }

    pub fn tile_updater(mut self, updater: Arc<dyn SurfaceUpdater>) -> Self {
        self.tile_updater = Some(updater);
        self
    }

    pub fn complication_updater(mut self, updater: Arc<dyn SurfaceUpdater>) -> Self {
        self.complication_updater = Some(updater);
        self
    }

    pub fn data_source(mut self, source: Arc<dyn ConferenceDataSource>) -> Self {
        self.data_source = Some(source);
        self
    }

    /// Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use `backend` instead of the Firebase REST backend.
    pub fn identity_backend(mut self, backend: Arc<dyn IdentityBackend>) -> Self {
        self.identity_backend = Some(backend);
        self
    }

    /// # Errors
    ///
    /// [`ServiceError::CapabilityMissing`] naming the first host bridge that
    /// was not provided.
    pub fn build(self) -> Result<PlatformContext> {
        let events = self
            .events
            .unwrap_or_else(|| EventBus::new(self.config.event_buffer_size));

        Ok(PlatformContext {
            http_client: required(self.http_client, "http_client")?,
            secure_store: required(self.secure_store, "secure_store")?,
            settings_store: required(self.settings_store, "settings_store")?,
            background_executor: required(self.background_executor, "background_executor")?,
            sign_in_client: required(self.sign_in_client, "sign_in_client")?,
            tile_updater: required(self.tile_updater, "tile_updater")?,
            complication_updater: required(self.complication_updater, "complication_updater")?,
            data_source: required(self.data_source, "data_source")?,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            identity_backend: self.identity_backend,
            config: self.config,
            scope: self.scope,
            events,
        })
    }
}

fn required<T: ?Sized>(value: Option<Arc<T>>, capability: &str) -> Result<Arc<T>> {
    value.ok_or_else(|| ServiceError::CapabilityMissing {
        capability: capability.to_string(),
        message: format!("The host must provide `{}` before building the graph", capability),
    })
}
