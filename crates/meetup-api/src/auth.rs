//! Account endpoints.

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{AuthPayload, Credentials, Identity, ProfileUpdate, Registration};
use crate::transport::ApiRequest;
use serde::Serialize;

pub const REGISTER_PATH: &str = "/accounts/register/";
pub const LOGIN_PATH: &str = "/accounts/login/";
pub const LOGOUT_PATH: &str = "/accounts/logout/";
pub const PROFILE_PATH: &str = "/accounts/profile/";

#[derive(Serialize)]
struct LogoutRequest<'a> {
    refresh_token: &'a str,
}

/// Account endpoints. Token persistence is left to the caller.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn register(&self, form: &Registration) -> ApiResult<AuthPayload> {
        let request = ApiRequest::post(REGISTER_PATH).with_json(form)?;
        self.client.fetch(&request).await
    }

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<AuthPayload> {
        let request = ApiRequest::post(LOGIN_PATH).with_json(credentials)?;
        self.client.fetch(&request).await
    }

    /// Blacklist `refresh_token` on the server.
    pub async fn logout(&self, refresh_token: &str) -> ApiResult<()> {
        let request = ApiRequest::post(LOGOUT_PATH).with_json(&LogoutRequest { refresh_token })?;
        self.client.send(&request).await
    }

    pub async fn profile(&self) -> ApiResult<Identity> {
        self.client.fetch(&ApiRequest::get(PROFILE_PATH)).await
    }

    /// PATCH the profile; returns the fields the server accepted.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<ProfileUpdate> {
        let request = ApiRequest::patch(PROFILE_PATH).with_json(update)?;
        self.client.fetch(&request).await
    }
}
