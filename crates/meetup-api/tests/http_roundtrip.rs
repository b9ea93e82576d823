//! End-to-end tests of the reqwest transport and refresh pipeline against a
//! local mock server.

use meetup_api::models::{Credentials, MeetupDraft};
use meetup_api::{
    ApiClient, ApiError, ApiRequest, AuthApi, MeetupApi, ReqwestTransport, StatusCode,
};
use meetup_storage::{MemoryStorage, TokenPair, TokenStore};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn user_json() -> serde_json::Value {
    json!({
        "id": 1,
        "username": "alice",
        "email": "alice@example.com",
        "first_name": "Alice",
        "last_name": "",
        "profile": { "bio": "", "location": "", "birth_date": null, "profile_picture": null },
        "date_joined": "2024-05-01T10:00:00Z"
    })
}

fn client_for(server: &MockServer, pair: Option<(&str, &str)>) -> ApiClient {
    let transport = ReqwestTransport::new(&format!("{}/api", server.uri()), Duration::from_secs(5))
        .expect("transport");
    let tokens = TokenStore::new(Box::new(MemoryStorage::new()));
    if let Some((access, refresh)) = pair {
        tokens
            .store_pair(&TokenPair {
                access: access.to_string(),
                refresh: refresh.to_string(),
            })
            .unwrap();
    }
    ApiClient::new(Arc::new(transport), tokens)
}

#[tokio::test]
async fn login_sends_json_and_returns_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/login/"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .and(body_json(json!({ "username": "alice", "password": "correct horse" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "access-1",
            "refresh": "refresh-1",
            "user": user_json()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthApi::new(client_for(&server, None));
    let payload = auth
        .login(&Credentials {
            username: "alice".into(),
            password: "correct horse".into(),
        })
        .await
        .unwrap();

    assert_eq!(payload.access, "access-1");
    assert_eq!(payload.user.username, "alice");
}

#[tokio::test]
async fn login_failure_surfaces_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "Login failed" })))
        .mount(&server)
        .await;

    let auth = AuthApi::new(client_for(&server, None));
    let err = auth
        .login(&Credentials {
            username: "alice".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.user_message("Something went wrong"), "Login failed");
}

#[tokio::test]
async fn expired_access_token_is_refreshed_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/accounts/profile/"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/accounts/profile/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Given token not valid for any token type" })),
        )
        .with_priority(10)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/token/refresh/"))
        .and(body_json(json!({ "refresh": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "access-2" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some(("access-1", "refresh-1")));
    let user = AuthApi::new(client.clone()).profile().await.unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(
        client.tokens().access_token().unwrap(),
        Some("access-2".to_string())
    );
}

#[tokio::test]
async fn rejected_refresh_clears_tokens_and_fires_hook() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/meetups/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/accounts/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Token is invalid or expired" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some(("access-1", "refresh-1")));
    let lost = Arc::new(AtomicUsize::new(0));
    let counter = lost.clone();
    client.on_session_lost(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = MeetupApi::new(client.clone())
        .list(&Default::default())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(client.tokens().is_empty().unwrap());
    assert_eq!(lost.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn create_meetup_validation_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/meetups/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "max_participants": ["Ensure this value is greater than or equal to 2."]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = MeetupApi::new(client_for(&server, Some(("access-1", "refresh-1"))));
    let err = api
        .create(&MeetupDraft {
            title: "Solo night".into(),
            description: String::new(),
            movie: 3,
            location: "Home".into(),
            theater_name: String::new(),
            meetup_datetime: "2030-01-01T20:00:00Z".parse().unwrap(),
            max_participants: 1,
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message("Failed to create meetup"),
        "Ensure this value is greater than or equal to 2."
    );
}

#[tokio::test]
async fn html_error_pages_become_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/movies/tmdb/popular/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .execute(&ApiRequest::get("/movies/tmdb/popular/").with_query("page", 1))
        .await
        .unwrap_err();

    match err {
        ApiError::Server { status, body } => {
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert_eq!(body, json!("<html>Bad Gateway</html>"));
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    // bind then release a port so nothing is listening on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let transport = ReqwestTransport::new(
        &format!("http://127.0.0.1:{}/api", port),
        Duration::from_secs(2),
    )
    .unwrap();
    let client = ApiClient::new(
        Arc::new(transport),
        TokenStore::new(Box::new(MemoryStorage::new())),
    );

    let err = client
        .execute(&ApiRequest::get("/meetups/"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.status(), None);
}
