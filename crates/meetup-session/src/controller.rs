//! Session lifecycle: startup validation, login, registration, logout.
//!
//! `SessionController` is the single writer of session state. Status and
//! current user change together under one lock, and every change is published
//! on a watch channel for observers.

use crate::error::{SessionError, SessionResult};
use crate::session_fsm::{AuthStatus, SessionInput, SessionMachine, SessionMachineState};
use crate::token::is_expired;
use chrono::Utc;
use meetup_api::models::{AuthPayload, Credentials, Identity, ProfileUpdate, Registration};
use meetup_api::{ApiClient, AuthApi};
use meetup_storage::TokenPair;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Observable session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: AuthStatus,
    /// Present iff `status` is `Authenticated`
    pub current_user: Option<Identity>,
}

struct SessionState {
    machine: SessionMachine,
    current_user: Option<Identity>,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: AuthStatus::from(self.machine.state()),
            current_user: self.current_user.clone(),
        }
    }
}

struct ControllerInner {
    api: ApiClient,
    auth: AuthApi,
    state: Mutex<SessionState>,
    updates: watch::Sender<SessionSnapshot>,
    started: AtomicBool,
}

impl ControllerInner {
    /// Apply an input and set the current user in the same step.
    fn apply(&self, input: &SessionInput, user: Option<Identity>) -> SessionResult<AuthStatus> {
        let mut state = self.state.lock();
        let old_status = AuthStatus::from(state.machine.state());

        state.machine.consume(input).map_err(|_| {
            SessionError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                state.machine.state()
            ))
        })?;
        state.current_user = match state.machine.state() {
            SessionMachineState::Authenticated => user,
            _ => None,
        };

        let snapshot = state.snapshot();
        if old_status != snapshot.status {
            debug!(
                old_state = %old_status,
                new_state = %snapshot.status,
                "Session state transition"
            );
        }
        let status = snapshot.status;
        self.updates.send_replace(snapshot);
        Ok(status)
    }

    /// Move to `Unauthenticated` with no user. Never fails.
    fn teardown(&self, input: &SessionInput) {
        if let Err(e) = self.apply(input, None) {
            warn!(error = %e, "Session teardown skipped");
        }
    }

    /// Overwrite the current user while authenticated.
    fn replace_user(&self, user: Identity) {
        let mut state = self.state.lock();
        if *state.machine.state() != SessionMachineState::Authenticated {
            debug!("Ignoring profile update for inactive session");
            return;
        }
        state.current_user = Some(user);
        self.updates.send_replace(state.snapshot());
    }

    fn machine_state(&self) -> SessionMachineState {
        self.state.lock().machine.state().clone()
    }
}

/// Owns the authenticated-user state.
///
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

impl SessionController {
    /// Create a controller over `api`, registering for session-lost
    /// notifications so a rejected refresh token tears the session down.
    pub fn new(api: ApiClient) -> Self {
        let state = SessionState {
            machine: SessionMachine::new(),
            current_user: None,
        };
        let (updates, _) = watch::channel(state.snapshot());

        let inner = Arc::new(ControllerInner {
            auth: AuthApi::new(api.clone()),
            api,
            state: Mutex::new(state),
            updates,
            started: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&inner);
        inner.api.on_session_lost(move || {
            if let Some(inner) = weak.upgrade() {
                info!("Refresh token rejected, session ended");
                inner.teardown(&SessionInput::SessionLost);
            }
        });

        Self { inner }
    }

    /// The API client requests should be issued through.
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Decide the initial state from stored tokens.
    ///
    /// - no access token: `Unauthenticated`
    /// - expired access token: logout cleanup, then `Unauthenticated`
    /// - otherwise the profile is fetched; success is `Authenticated`, any
    ///   failure runs logout cleanup
    ///
    /// Runs once; later calls return the current status.
    pub async fn start(&self) -> AuthStatus {
        if self.inner.started.swap(true, Ordering::SeqCst)
            || self.inner.machine_state() != SessionMachineState::Initializing
        {
            return self.status();
        }

        let stored = match self.inner.api.tokens().access_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored access token");
                None
            }
        };

        match stored {
            None => {
                info!("No stored session");
                self.inner.teardown(&SessionInput::NoStoredToken);
            }
            Some(token) if is_expired(&token, Utc::now()) => {
                info!("Stored access token expired, clearing session");
                self.clear_stored_session().await;
                self.inner.teardown(&SessionInput::StoredTokenExpired);
            }
            Some(_) => self.validate_stored_session().await,
        }

        self.status()
    }

    async fn validate_stored_session(&self) {
        if let Err(e) = self.inner.apply(&SessionInput::StoredTokenFresh, None) {
            warn!(error = %e, "Could not begin session validation");
            return;
        }

        match self.inner.auth.profile().await {
            Ok(user) => {
                info!(username = %user.username, "Session restored");
                if let Err(e) = self.inner.apply(&SessionInput::ProfileLoaded, Some(user)) {
                    warn!(error = %e, "Profile loaded for a session that already ended");
                }
            }
            Err(e) => {
                warn!(error = %e, "Stored session rejected, clearing session");
                if self.inner.machine_state() == SessionMachineState::Validating {
                    self.inner.teardown(&SessionInput::ProfileRejected);
                }
                self.logout().await;
            }
        }
    }

    /// Log in; on success tokens are stored and the session is authenticated.
    /// On failure the state is left unchanged.
    pub async fn login(&self, credentials: &Credentials) -> SessionResult<AuthPayload> {
        let payload = self.inner.auth.login(credentials).await?;
        self.establish(&payload)?;
        info!(username = %payload.user.username, "Logged in");
        Ok(payload)
    }

    /// Create an account; the server issues tokens, so this signs in too.
    pub async fn register(&self, form: &Registration) -> SessionResult<AuthPayload> {
        if form.password != form.password2 {
            return Err(SessionError::PasswordMismatch);
        }

        let payload = self.inner.auth.register(form).await?;
        self.establish(&payload)?;
        info!(username = %payload.user.username, "Registered and logged in");
        Ok(payload)
    }

    /// Store the issued pair and authenticate. The pair is removed again if
    /// the session can't move to `Authenticated`.
    fn establish(&self, payload: &AuthPayload) -> SessionResult<()> {
        let tokens = self.inner.api.tokens();
        tokens.store_pair(&TokenPair {
            access: payload.access.clone(),
            refresh: payload.refresh.clone(),
        })?;

        if let Err(e) = self
            .inner
            .apply(&SessionInput::LoginSucceeded, Some(payload.user.clone()))
        {
            if let Err(clear_err) = tokens.clear_all() {
                warn!(error = %clear_err, "Failed to clear tokens of rejected login");
            }
            return Err(e);
        }
        Ok(())
    }

    /// End the session. The server is asked to blacklist the refresh token,
    /// but local state is cleared whatever it answers.
    pub async fn logout(&self) {
        self.clear_stored_session().await;
        self.inner.teardown(&SessionInput::LoggedOut);
        info!("Logged out");
    }

    /// Blacklist the stored refresh token if there is one, then remove both
    /// tokens. Session state is left to the caller.
    async fn clear_stored_session(&self) {
        let refresh_token = match self.inner.api.tokens().refresh_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored refresh token");
                None
            }
        };

        if let Some(refresh_token) = refresh_token {
            if let Err(e) = self.inner.auth.logout(&refresh_token).await {
                warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }

        if let Err(e) = self.inner.api.tokens().clear_all() {
            warn!(error = %e, "Failed to clear stored tokens");
        }
    }

    /// Re-fetch the profile and replace the current user. The status is not
    /// changed.
    pub async fn refresh_user(&self) -> SessionResult<Identity> {
        let user = self.inner.auth.profile().await?;
        self.inner.replace_user(user.clone());
        Ok(user)
    }

    /// PATCH the profile, then reload the current user.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> SessionResult<Identity> {
        self.inner.auth.update_profile(update).await?;
        self.refresh_user().await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.lock().snapshot()
    }

    pub fn status(&self) -> AuthStatus {
        AuthStatus::from(self.inner.state.lock().machine.state())
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.inner.state.lock().current_user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    /// Watch session changes. The receiver starts at the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.updates.subscribe()
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
