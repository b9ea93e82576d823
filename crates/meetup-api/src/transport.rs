//! Request/response values and the network seam.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// An outgoing API call, relative to the configured base URL.
///
/// Values are immutable once built; the authorizer produces a copy carrying
/// the `Authorization` header instead of editing the caller's request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, e.g. `/meetups/3/join/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter when `value` is present.
    pub fn with_optional_query<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    /// Set the JSON body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Copy of this request with an extra header.
    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut request = self.clone();
        request.headers.push((name.into(), value.into()));
        request
    }

    /// Copy of this request carrying `Authorization: Bearer <token>`.
    pub fn authorized(&self, access_token: &str) -> Self {
        self.with_header(AUTHORIZATION.as_str(), format!("Bearer {}", access_token))
    }

    /// Value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Bearer token attached to this request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION.as_str())?.strip_prefix("Bearer ")
    }
}

/// A received response. Every HTTP status lands here; only transport
/// failures are errors at this layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Parsed JSON body; `Null` when empty, a JSON string when not JSON
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// Build a response from raw body text.
    pub fn from_text(status: StatusCode, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        };
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a non-2xx response into its error class.
    pub fn into_result(self) -> ApiResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_response(self.status, self.body))
        }
    }

    /// Decode the body.
    pub fn json<T: DeserializeOwned>(self) -> ApiResult<T> {
        Ok(serde_json::from_value(self.body)?)
    }
}

/// The network seam. Implementations return every HTTP status as an
/// [`ApiResponse`] and reserve `Err` for failures where nothing was received.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse>;
}

/// reqwest-backed transport bound to a base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a transport for `base_url` (e.g. `http://localhost:8000/api`).
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let parsed = Url::parse(base_url)?;
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve an API path against the base URL.
    fn url_for(&self, request: &ApiRequest) -> ApiResult<Url> {
        let path = request.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let url = self.url_for(request)?;
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        debug!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            "Sending API request"
        );

        let mut builder = self
            .http_client
            .request(request.method.clone(), url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            debug!(request_id = %request_id, error = %e, "API request failed in transport");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        debug!(
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Received API response"
        );

        Ok(ApiResponse::from_text(status, &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_authorized_copies_request() {
        let request = ApiRequest::post("/meetups/")
            .with_json(&json!({ "title": "Heat" }))
            .unwrap();
        let authorized = request.authorized("abc");

        assert_eq!(request.header("Authorization"), None);
        assert_eq!(authorized.header("authorization"), Some("Bearer abc"));
        assert_eq!(authorized.bearer_token(), Some("abc"));
        assert_eq!(authorized.method, request.method);
        assert_eq!(authorized.body, request.body);
    }

    #[test]
    fn test_optional_query_skips_none() {
        let request = ApiRequest::get("/meetups/")
            .with_optional_query("status", Some("upcoming"))
            .with_optional_query::<u64>("movie", None);
        assert_eq!(
            request.query,
            vec![("status".to_string(), "upcoming".to_string())]
        );
    }

    #[test]
    fn test_response_body_parsing() {
        let empty = ApiResponse::from_text(StatusCode::NO_CONTENT, "");
        assert_eq!(empty.body, Value::Null);

        let json_body = ApiResponse::from_text(StatusCode::OK, r#"{"access":"a"}"#);
        assert_eq!(json_body.body, json!({ "access": "a" }));

        let html = ApiResponse::from_text(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(html.body, json!("<html>bad gateway</html>"));
    }

    #[test]
    fn test_into_result_classifies() {
        let ok = ApiResponse::new(StatusCode::CREATED, Value::Null).into_result();
        assert!(ok.is_ok());

        let err = ApiResponse::new(StatusCode::BAD_REQUEST, json!({ "detail": "nope" }))
            .into_result()
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[test]
    fn test_url_for_joins_base_and_query() {
        let transport =
            ReqwestTransport::new("http://localhost:8000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000/api");

        let request = ApiRequest::get("/movies/tmdb/search/").with_query("q", "blade runner");
        let url = transport.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/movies/tmdb/search/?q=blade+runner"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = ReqwestTransport::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }
}
