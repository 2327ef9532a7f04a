//! # Wear App Graph
//!
//! Composition root of the wear app. Built once at process start from a
//! [`PlatformContext`]; every long-lived component is a singleton owned here
//! and handed out as `Arc`s. View-models are created fresh per call.
//!
//! Resolution order is leaf-first: identity backend, authentication adapter,
//! sign-in options, then the components that depend on them.
//!
//! ```no_run
//! # async fn example(context: core_service::PlatformContext) -> core_service::Result<()> {
//! use core_service::WearAppGraph;
//!
//! let graph = WearAppGraph::build(context).await?;
//! let prompt = graph.sign_in_prompt_view_model();
//! println!("{:?}", prompt.state());
//! graph.conference_refresh().schedule_periodic().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use bridge_traits::identity::IdentityBackend;
use bridge_traits::signin::SignInOptions;
use core_auth::{
    select_authentication, AuthError, AuthUserRepository, Authentication, FirebaseBackend,
    SignInEventListener,
};
use core_runtime::events::EventBus;
use tracing::info;

use crate::conference::{ConferenceSetting, WearConferenceSetting};
use crate::context::PlatformContext;
use crate::error::Result;
use crate::refresh::{BackgroundConferenceRefresh, ConferenceRefresh, RefreshWorker};
use crate::settings_sync::PhoneSettingsSync;
use crate::surfaces::{ComplicationUpdater, TileUpdater};
use crate::viewmodels::{GoogleSignInViewModel, SignInPromptViewModel, SignOutViewModel};

/// Object graph of the wear app.
#[derive(Clone)]
pub struct WearAppGraph {
    context: PlatformContext,
    authentication: Arc<dyn Authentication>,
    sign_in_options: SignInOptions,
    user_repository: Arc<AuthUserRepository>,
    conference_setting: Arc<dyn ConferenceSetting>,
    conference_refresh: Arc<dyn ConferenceRefresh>,
    settings_sync: Arc<PhoneSettingsSync>,
    tile_updater: Arc<TileUpdater>,
    complication_updater: Arc<ComplicationUpdater>,
    refresh_worker: Arc<RefreshWorker>,
}

impl WearAppGraph {
    /// Resolve every singleton.
    ///
    /// An identity backend that cannot be built does not fail the graph:
    /// authentication is disabled instead.
    ///
    /// # Errors
    ///
    /// Invalid configuration, or surface updaters of the wrong kind.
    pub async fn build(context: PlatformContext) -> Result<Self> {
        context.config.validate()?;

        let backend = identity_backend(&context).await;
        let authentication =
            select_authentication(backend, &context.scope, context.events.clone());

        let sign_in_options = SignInOptions::default_sign_in()
            .request_id_token(context.config.web_client_id.as_str())
            .request_email()
            .build()?;

        let user_repository = Arc::new(AuthUserRepository::new(Arc::clone(&authentication)));
        let conference_setting: Arc<dyn ConferenceSetting> = Arc::new(WearConferenceSetting::new(
            Arc::clone(&context.settings_store),
        ));
        let conference_refresh: Arc<dyn ConferenceRefresh> =
            Arc::new(BackgroundConferenceRefresh::new(
                Arc::clone(&context.background_executor),
                context.config.refresh_interval,
            ));
        let settings_sync = Arc::new(PhoneSettingsSync::new(
            Arc::clone(&conference_setting),
            Arc::clone(&conference_refresh),
        ));
        let tile_updater = Arc::new(TileUpdater::new(Arc::clone(&context.tile_updater))?);
        let complication_updater = Arc::new(ComplicationUpdater::new(Arc::clone(
            &context.complication_updater,
        ))?);
        let refresh_worker = Arc::new(RefreshWorker::new(
            Arc::clone(&authentication),
            Arc::clone(&conference_setting),
            Arc::clone(&context.data_source),
            Arc::clone(&tile_updater),
            Arc::clone(&complication_updater),
            context.events.clone(),
        ));

        info!(
            signed_in = authentication.current().is_some(),
            "Wear app graph ready"
        );

        Ok(Self {
            context,
            authentication,
            sign_in_options,
            user_repository,
            conference_setting,
            conference_refresh,
            settings_sync,
            tile_updater,
            complication_updater,
            refresh_worker,
        })
    }

    pub fn context(&self) -> &PlatformContext {
        &self.context
    }

    pub fn events(&self) -> &EventBus {
        &self.context.events
    }

    pub fn authentication(&self) -> Arc<dyn Authentication> {
        Arc::clone(&self.authentication)
    }

    pub fn sign_in_options(&self) -> &SignInOptions {
        &self.sign_in_options
    }

    pub fn user_repository(&self) -> Arc<AuthUserRepository> {
        Arc::clone(&self.user_repository)
    }

    /// The repository, as seen by the native sign-in flow.
    pub fn sign_in_event_listener(&self) -> Arc<dyn SignInEventListener> {
        self.user_repository.clone()
    }

    pub fn conference_setting(&self) -> Arc<dyn ConferenceSetting> {
        Arc::clone(&self.conference_setting)
    }

    pub fn conference_refresh(&self) -> Arc<dyn ConferenceRefresh> {
        Arc::clone(&self.conference_refresh)
    }

    pub fn settings_sync(&self) -> Arc<PhoneSettingsSync> {
        Arc::clone(&self.settings_sync)
    }

    pub fn tile_updater(&self) -> Arc<TileUpdater> {
        Arc::clone(&self.tile_updater)
    }

    pub fn complication_updater(&self) -> Arc<ComplicationUpdater> {
        Arc::clone(&self.complication_updater)
    }

    pub fn refresh_worker(&self) -> Arc<RefreshWorker> {
        Arc::clone(&self.refresh_worker)
    }

    pub fn sign_in_prompt_view_model(&self) -> SignInPromptViewModel {
        SignInPromptViewModel::new(self.authentication(), self.context.scope.clone())
    }

    pub fn google_sign_in_view_model(&self) -> GoogleSignInViewModel {
        GoogleSignInViewModel::new(
            Arc::clone(&self.context.sign_in_client),
            self.sign_in_options.clone(),
            self.sign_in_event_listener(),
        )
    }

    pub fn sign_out_view_model(&self) -> SignOutViewModel {
        SignOutViewModel::new(Arc::clone(&self.context.sign_in_client), self.authentication())
    }

    /// Stop every listener spawned by the graph.
    ///
    /// The session holder keeps its last value; it just stops following the
    /// provider.
    pub fn shutdown(&self) {
        info!("Shutting down wear app graph");
        self.context.scope.cancel();
    }
}

async fn identity_backend(
    context: &PlatformContext,
) -> std::result::Result<Arc<dyn IdentityBackend>, AuthError> {
    if let Some(backend) = &context.identity_backend {
        return Ok(Arc::clone(backend));
    }

    if !context.config.has_identity_backend() {
        return Err(AuthError::Configuration(
            "Firebase API key is not set".to_string(),
        ));
    }

    let backend = FirebaseBackend::restore(
        &context.config.identity,
        Arc::clone(&context.http_client),
        Arc::clone(&context.secure_store),
        Arc::clone(&context.clock),
    )
    .await?;
    Ok(Arc::new(backend))
}
