//! In-process transport for tests.

use crate::error::ApiResult;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use serde_json::Value;

type Handler = Box<dyn Fn(&ApiRequest) -> ApiResult<ApiResponse> + Send + Sync>;

/// Transport answering from a closure and recording every request it sees.
///
/// Each `send` yields to the runtime once before answering, so requests
/// joined on one task interleave the way concurrent network calls would.
pub struct ScriptedTransport {
    handler: Handler,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> ApiResult<ApiResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests sent to `method path`.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Requests sent to `path`, in order.
    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        self.requests.lock().push(request.clone());
        tokio::task::yield_now().await;
        (self.handler)(request)
    }
}

/// Shorthand for a scripted response.
pub fn respond(status: u16, body: Value) -> ApiResult<ApiResponse> {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(ApiResponse::new(status, body))
}
