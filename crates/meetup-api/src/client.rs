//! Authorized API client with one-shot refresh-and-retry on 401.
//!
//! Every request goes through the same pipeline:
//! 1. The access token (if stored) is attached as a bearer header.
//! 2. A 401 on the first attempt triggers one refresh call against
//!    `/accounts/token/refresh/` using the stored refresh token, after which
//!    the request is re-issued once.
//! 3. If the refresh call fails, both tokens are cleared and every
//!    session-lost hook runs before the refresh error is returned.
//!
//! No other status is ever retried.

use crate::error::ApiResult;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
use meetup_storage::TokenStore;
use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Path of the token refresh endpoint.
pub const TOKEN_REFRESH_PATH: &str = "/accounts/token/refresh/";

/// Which pass of the pipeline a request is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    Retried,
}

/// What to do with a received response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reauth {
    /// Hand the response to the caller as-is
    PassThrough,
    /// Refresh the access token and re-issue the request
    RefreshAndRetry,
}

/// Decide whether a response warrants a refresh. Only a 401 on the first
/// attempt does.
pub fn reauth_decision(status: StatusCode, attempt: Attempt) -> Reauth {
    match (status, attempt) {
        (StatusCode::UNAUTHORIZED, Attempt::Initial) => Reauth::RefreshAndRetry,
        _ => Reauth::PassThrough,
    }
}

/// Callback run when the refresh token is rejected and the session is gone.
pub type SessionLostHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

struct ClientInner {
    transport: Arc<dyn HttpTransport>,
    tokens: TokenStore,
    session_lost_hooks: RwLock<Vec<SessionLostHook>>,
}

/// Shared API client. Cloning is cheap; clones share tokens and hooks.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, tokens: TokenStore) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                tokens,
                session_lost_hooks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// The token store requests are authorized from.
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Register a hook run after an unrecoverable refresh failure.
    pub fn on_session_lost<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.session_lost_hooks.write().push(Arc::new(hook));
    }

    /// Send a request through the authorize/reauthorize pipeline.
    ///
    /// Returns the successful response, or the error class of the final
    /// response (or of the failed refresh).
    pub async fn execute(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let mut attempt = Attempt::Initial;
        loop {
            let response = self.send_authorized(request).await?;

            match reauth_decision(response.status, attempt) {
                Reauth::PassThrough => return response.into_result(),
                Reauth::RefreshAndRetry => {
                    let Some(refresh_token) = self.inner.tokens.refresh_token()? else {
                        debug!(path = %request.path, "Got 401 with no refresh token stored");
                        return response.into_result();
                    };

                    debug!(path = %request.path, "Got 401, refreshing access token");
                    self.refresh_session(&refresh_token).await?;
                    attempt = Attempt::Retried;
                }
            }
        }
    }

    /// Send a request without the bearer header or any reauthorization.
    pub async fn execute_anonymous(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        self.inner.transport.send(request).await?.into_result()
    }

    /// Execute and decode the response body.
    pub async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> ApiResult<T> {
        self.execute(request).await?.json()
    }

    /// Execute and discard the response body.
    pub async fn send(&self, request: &ApiRequest) -> ApiResult<()> {
        self.execute(request).await.map(|_| ())
    }

    async fn send_authorized(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let authorized = match self.inner.tokens.access_token()? {
            Some(token) => request.authorized(&token),
            None => request.clone(),
        };
        self.inner.transport.send(&authorized).await
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// On failure both tokens are cleared and session-lost hooks run.
    async fn refresh_session(&self, refresh_token: &str) -> ApiResult<()> {
        match self.request_new_access_token(refresh_token).await {
            Ok(()) => {
                info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                if let Err(clear_err) = self.inner.tokens.clear_all() {
                    warn!(error = %clear_err, "Failed to clear stored tokens");
                }
                self.notify_session_lost();
                Err(e)
            }
        }
    }

    async fn request_new_access_token(&self, refresh_token: &str) -> ApiResult<()> {
        let request = ApiRequest::post(TOKEN_REFRESH_PATH).with_json(&RefreshRequest {
            refresh: refresh_token,
        })?;
        let refreshed: RefreshResponse = self.execute_anonymous(&request).await?.json()?;

        self.inner.tokens.set_access_token(&refreshed.access)?;
        if let Some(rotated) = refreshed.refresh.as_deref() {
            self.inner
                .tokens
                .set(meetup_storage::TokenSlot::Refresh, rotated)?;
        }
        Ok(())
    }

    fn notify_session_lost(&self) {
        let hooks: Vec<SessionLostHook> = self.inner.session_lost_hooks.read().clone();
        for hook in hooks {
            hook();
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("tokens", &self.inner.tokens)
            .field("session_lost_hooks", &self.inner.session_lost_hooks.read().len())
            .finish_non_exhaustive()
    }
}
