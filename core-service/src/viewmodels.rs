//! Auth-facing view-models of the wear app.
//!
//! They hold no UI; the host observes their `watch` receivers and renders.

use std::sync::Arc;

use bridge_traits::signin::{NativeSignInClient, SignInOptions};
use core_auth::{Authentication, SignInEventListener, SignInResult, User, UserProfile};
use core_runtime::TaskScope;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// What the sign-in prompt shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInPromptState {
    SignedIn(UserProfile),
    SignedOut,
}

impl From<&Option<User>> for SignInPromptState {
    fn from(user: &Option<User>) -> Self {
        match user {
            Some(user) => SignInPromptState::SignedIn(user.profile().clone()),
            None => SignInPromptState::SignedOut,
        }
    }
}

/// Derives the prompt state from the session holder.
pub struct SignInPromptViewModel {
    authentication: Arc<dyn Authentication>,
    scope: TaskScope,
}

impl SignInPromptViewModel {
    pub fn new(authentication: Arc<dyn Authentication>, scope: TaskScope) -> Self {
        Self {
            authentication,
            scope,
        }
    }

    pub fn state(&self) -> SignInPromptState {
        SignInPromptState::from(&self.authentication.current())
    }

    /// Receiver of the prompt state, following the current user.
    ///
    /// The mapping task ends when every receiver is dropped or the scope is
    /// cancelled.
    pub fn watch_state(&self) -> watch::Receiver<SignInPromptState> {
        let mut users = self.authentication.current_user();
        let initial = SignInPromptState::from(&*users.borrow_and_update());
        let (tx, rx) = watch::channel(initial);

        let mapping = async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    changed = users.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = SignInPromptState::from(&*users.borrow_and_update());
                        tx.send_if_modified(|current| {
                            if *current == state {
                                false
                            } else {
                                *current = state;
                                true
                            }
                        });
                    }
                }
            }
        };

        if let Err(e) = self.scope.spawn("sign-in-prompt", mapping) {
            warn!(error = %e, "Prompt state will not follow the session");
        }
        rx
    }
}

/// Progress of the native Google sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleSignInState {
    Idle,
    InProgress,
    Success,
    Failed(String),
    /// The user dismissed the account picker
    Cancelled,
}

/// Runs the native sign-in and hands the account to the listener.
pub struct GoogleSignInViewModel {
    client: Arc<dyn NativeSignInClient>,
    options: SignInOptions,
    listener: Arc<dyn SignInEventListener>,
    state: watch::Sender<GoogleSignInState>,
}

impl GoogleSignInViewModel {
    pub fn new(
        client: Arc<dyn NativeSignInClient>,
        options: SignInOptions,
        listener: Arc<dyn SignInEventListener>,
    ) -> Self {
        let (state, _) = watch::channel(GoogleSignInState::Idle);
        Self {
            client,
            options,
            listener,
            state,
        }
    }

    pub fn state(&self) -> watch::Receiver<GoogleSignInState> {
        self.state.subscribe()
    }

    /// Run the flow to completion and return its final state.
    ///
    /// A call made while another is running returns
    /// [`GoogleSignInState::InProgress`] without starting a second flow.
    /// Dropping the returned future before it completes resets the state to
    /// [`GoogleSignInState::Idle`].
    #[instrument(skip(self))]
    pub async fn sign_in(&self) -> GoogleSignInState {
        let Some(running) = InProgress::start(&self.state) else {
            debug!("Sign-in already running");
            return GoogleSignInState::InProgress;
        };

        let outcome = match self.client.sign_in(&self.options).await {
            Ok(None) => {
                info!("Native sign-in dismissed");
                GoogleSignInState::Cancelled
            }
            Ok(Some(account)) => match self.listener.on_signed_in(account).await {
                SignInResult::Success => GoogleSignInState::Success,
                SignInResult::Error(e) => GoogleSignInState::Failed(e.to_string()),
            },
            Err(e) => {
                warn!(error = %e, "Native sign-in failed");
                GoogleSignInState::Failed(e.to_string())
            }
        };

        running.finish(outcome.clone());
        outcome
    }
}

/// Marks a sign-in as running until it is finished or dropped.
struct InProgress<'a> {
    state: &'a watch::Sender<GoogleSignInState>,
    finished: bool,
}

impl<'a> InProgress<'a> {
    fn start(state: &'a watch::Sender<GoogleSignInState>) -> Option<Self> {
        let started = state.send_if_modified(|current| {
            if *current == GoogleSignInState::InProgress {
                false
            } else {
                *current = GoogleSignInState::InProgress;
                true
            }
        });
        started.then(|| Self {
            state,
            finished: false,
        })
    }

    fn finish(mut self, outcome: GoogleSignInState) {
        self.finished = true;
        self.state.send_replace(outcome);
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Sign-in abandoned");
            self.state.send_replace(GoogleSignInState::Idle);
        }
    }
}

/// Signs out of the native client and the identity provider.
pub struct SignOutViewModel {
    client: Arc<dyn NativeSignInClient>,
    authentication: Arc<dyn Authentication>,
}

impl SignOutViewModel {
    pub fn new(client: Arc<dyn NativeSignInClient>, authentication: Arc<dyn Authentication>) -> Self {
        Self {
            client,
            authentication,
        }
    }

    /// A failing native sign-out is logged; the provider session is ended
    /// regardless.
    pub async fn sign_out(&self) {
        if let Err(e) = self.client.sign_out().await {
            warn!(error = %e, "Native sign-out failed");
        }
        self.authentication.sign_out();
    }
}
