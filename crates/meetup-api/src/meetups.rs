//! Meetup endpoints: CRUD, participation and comments.

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{
    Comment, Listing, Meetup, MeetupDetail, MeetupDraft, MeetupStatus, MeetupUpdate, Participant,
};
use crate::transport::ApiRequest;
use serde::Serialize;

/// Server-side filters for the meetup list. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeetupFilter {
    pub status: Option<MeetupStatus>,
    /// Catalogue movie id
    pub movie: Option<u64>,
    /// Only upcoming meetups that have not started yet
    pub upcoming: bool,
    /// Only meetups organized by the signed-in user
    pub my_meetups: bool,
}

impl MeetupFilter {
    fn apply(&self, request: ApiRequest) -> ApiRequest {
        let mut request = request
            .with_optional_query("status", self.status)
            .with_optional_query("movie", self.movie);
        if self.upcoming {
            request = request.with_query("upcoming", "true");
        }
        if self.my_meetups {
            request = request.with_query("my_meetups", "true");
        }
        request
    }
}

#[derive(Serialize)]
struct JoinRequest<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct CommentRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Clone)]
pub struct MeetupApi {
    client: ApiClient,
}

impl MeetupApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &MeetupFilter) -> ApiResult<Vec<Meetup>> {
        let request = filter.apply(ApiRequest::get("/meetups/"));
        let listing: Listing<Meetup> = self.client.fetch(&request).await?;
        Ok(listing.into_items())
    }

    pub async fn get(&self, id: u64) -> ApiResult<MeetupDetail> {
        self.client
            .fetch(&ApiRequest::get(format!("/meetups/{}/", id)))
            .await
    }

    /// Create a meetup organized by the signed-in user.
    pub async fn create(&self, draft: &MeetupDraft) -> ApiResult<MeetupDraft> {
        let request = ApiRequest::post("/meetups/").with_json(draft)?;
        self.client.fetch(&request).await
    }

    pub async fn update(&self, id: u64, update: &MeetupUpdate) -> ApiResult<Meetup> {
        let request = ApiRequest::patch(format!("/meetups/{}/", id)).with_json(update)?;
        self.client.fetch(&request).await
    }

    pub async fn delete(&self, id: u64) -> ApiResult<()> {
        self.client
            .send(&ApiRequest::delete(format!("/meetups/{}/", id)))
            .await
    }

    pub async fn join(&self, id: u64, message: &str) -> ApiResult<Participant> {
        let request =
            ApiRequest::post(format!("/meetups/{}/join/", id)).with_json(&JoinRequest { message })?;
        self.client.fetch(&request).await
    }

    pub async fn leave(&self, id: u64) -> ApiResult<()> {
        self.client
            .send(&ApiRequest::post(format!("/meetups/{}/leave/", id)))
            .await
    }

    pub async fn participants(&self, id: u64) -> ApiResult<Vec<Participant>> {
        let listing: Listing<Participant> = self
            .client
            .fetch(&ApiRequest::get(format!("/meetups/{}/participants/", id)))
            .await?;
        Ok(listing.into_items())
    }

    pub async fn comment(&self, id: u64, text: &str) -> ApiResult<Comment> {
        let request = ApiRequest::post(format!("/meetups/{}/comment/", id))
            .with_json(&CommentRequest { text })?;
        self.client.fetch(&request).await
    }

    pub async fn comments(&self, id: u64) -> ApiResult<Vec<Comment>> {
        let listing: Listing<Comment> = self
            .client
            .fetch(&ApiRequest::get(format!("/meetups/{}/comments/", id)))
            .await?;
        Ok(listing.into_items())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{respond, ScriptedTransport};
    use meetup_storage::{MemoryStorage, TokenStore};
    use serde_json::json;
    use std::sync::Arc;

    fn api(transport: Arc<ScriptedTransport>) -> MeetupApi {
        let client = ApiClient::new(transport, TokenStore::new(Box::new(MemoryStorage::new())));
        MeetupApi::new(client)
    }

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_default_filter_sends_no_query() {
        let transport = Arc::new(ScriptedTransport::new(|_| respond(200, json!([]))));
        api(transport.clone())
            .list(&MeetupFilter::default())
            .await
            .unwrap();

        assert!(transport.requests()[0].query.is_empty());
    }

    #[tokio::test]
    async fn test_filter_maps_to_query_params() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            respond(200, json!({ "count": 0, "next": null, "previous": null, "results": [] }))
        }));
        let filter = MeetupFilter {
            status: Some(MeetupStatus::Upcoming),
            movie: Some(3),
            upcoming: true,
            my_meetups: true,
        };
        let meetups = api(transport.clone()).list(&filter).await.unwrap();

        assert!(meetups.is_empty());
        assert_eq!(
            transport.requests()[0].query,
            query(&[
                ("status", "upcoming"),
                ("movie", "3"),
                ("upcoming", "true"),
                ("my_meetups", "true"),
            ])
        );
    }

    #[tokio::test]
    async fn test_join_full_meetup_surfaces_server_message() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            respond(400, json!({ "error": "This meetup is full" }))
        }));
        let err = api(transport.clone()).join(4, "").await.unwrap_err();

        assert_eq!(err.user_message("Failed to join meetup"), "This meetup is full");
        let sent = &transport.requests()[0];
        assert_eq!(sent.path, "/meetups/4/join/");
        assert_eq!(sent.body, Some(json!({ "message": "" })));
    }

    #[tokio::test]
    async fn test_leave_posts_without_body() {
        let transport = Arc::new(ScriptedTransport::new(|_| respond(204, json!(null))));
        api(transport.clone()).leave(4).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, reqwest::Method::POST);
        assert_eq!(sent.path, "/meetups/4/leave/");
        assert_eq!(sent.body, None);
    }

    #[tokio::test]
    async fn test_comment_posts_text() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            respond(
                201,
                json!({
                    "id": 1,
                    "user": { "id": 2, "username": "bob" },
                    "text": "Popcorn on me",
                    "created_at": "2030-01-01T18:00:00Z",
                    "updated_at": "2030-01-01T18:00:00Z"
                }),
            )
        }));
        let comment = api(transport.clone()).comment(4, "Popcorn on me").await.unwrap();

        assert_eq!(comment.user.username, "bob");
        assert_eq!(
            transport.requests()[0].body,
            Some(json!({ "text": "Popcorn on me" }))
        );
    }
}
