//! # meetup-api
//!
//! HTTP client for the movie meetup REST API.
//!
//! [`ApiClient`] owns the request pipeline: it attaches the stored access
//! token to every request, and on a 401 performs a single token refresh and
//! retry before giving up. The typed endpoint groups ([`AuthApi`],
//! [`MovieApi`], [`MeetupApi`]) are thin wrappers over it.
//!
//! ```ignore
//! let transport = Arc::new(ReqwestTransport::new(&base_url, timeout)?);
//! let client = ApiClient::new(transport, TokenStore::new(Box::new(storage)));
//! let meetups = MeetupApi::new(client).list(&MeetupFilter::default()).await?;
//! ```

mod auth;
mod client;
mod error;
mod meetups;
pub mod models;
mod movies;
mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use auth::{AuthApi, LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH, REGISTER_PATH};
pub use client::{reauth_decision, ApiClient, Attempt, Reauth, SessionLostHook, TOKEN_REFRESH_PATH};
pub use error::{ApiError, ApiResult};
pub use meetups::{MeetupApi, MeetupFilter};
pub use movies::MovieApi;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

pub use reqwest::{Method, StatusCode};
