//! Movie catalogue, TMDB proxy, ratings and favorites.

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{
    Favorite, FavoriteOutcome, Listing, Movie, MovieDetail, MovieDraft, MovieRating, NewRating,
    TmdbMovie, TmdbPage, TmdbReview,
};
use crate::transport::ApiRequest;
use reqwest::StatusCode;
use serde::Serialize;

#[derive(Serialize)]
struct FavoriteRequest {
    movie_id: u64,
}

#[derive(Debug, Clone)]
pub struct MovieApi {
    client: ApiClient,
}

impl MovieApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Local catalogue, one page at a time.
    pub async fn list(&self, page: Option<u32>) -> ApiResult<Vec<Movie>> {
        let request = ApiRequest::get("/movies/").with_optional_query("page", page);
        let listing: Listing<Movie> = self.client.fetch(&request).await?;
        Ok(listing.into_items())
    }

    /// Title search in the local catalogue.
    pub async fn search(&self, query: &str) -> ApiResult<Vec<Movie>> {
        let request = ApiRequest::get("/movies/search/").with_query("q", query);
        let listing: Listing<Movie> = self.client.fetch(&request).await?;
        Ok(listing.into_items())
    }

    pub async fn get(&self, id: u64) -> ApiResult<MovieDetail> {
        self.client
            .fetch(&ApiRequest::get(format!("/movies/{}/", id)))
            .await
    }

    pub async fn search_tmdb(&self, query: &str) -> ApiResult<TmdbPage<TmdbMovie>> {
        let request = ApiRequest::get("/movies/tmdb/search/").with_query("q", query);
        self.client.fetch(&request).await
    }

    pub async fn popular(&self, page: u32) -> ApiResult<TmdbPage<TmdbMovie>> {
        let request = ApiRequest::get("/movies/tmdb/popular/").with_query("page", page);
        self.client.fetch(&request).await
    }

    pub async fn tmdb_details(&self, tmdb_id: u64) -> ApiResult<TmdbMovie> {
        self.client
            .fetch(&ApiRequest::get(format!("/movies/tmdb/{}/", tmdb_id)))
            .await
    }

    pub async fn tmdb_recommendations(
        &self,
        tmdb_id: u64,
        page: u32,
    ) -> ApiResult<TmdbPage<TmdbMovie>> {
        let request = ApiRequest::get(format!("/movies/tmdb/{}/recommendations/", tmdb_id))
            .with_query("page", page);
        self.client.fetch(&request).await
    }

    pub async fn tmdb_reviews(&self, tmdb_id: u64, page: u32) -> ApiResult<TmdbPage<TmdbReview>> {
        let request =
            ApiRequest::get(format!("/movies/tmdb/{}/reviews/", tmdb_id)).with_query("page", page);
        self.client.fetch(&request).await
    }

    pub async fn create(&self, draft: &MovieDraft) -> ApiResult<Movie> {
        let request = ApiRequest::post("/movies/").with_json(draft)?;
        self.client.fetch(&request).await
    }

    pub async fn update(&self, id: u64, draft: &MovieDraft) -> ApiResult<Movie> {
        let request = ApiRequest::patch(format!("/movies/{}/", id)).with_json(draft)?;
        self.client.fetch(&request).await
    }

    pub async fn delete(&self, id: u64) -> ApiResult<()> {
        self.client
            .send(&ApiRequest::delete(format!("/movies/{}/", id)))
            .await
    }

    pub async fn rate(&self, rating: &NewRating) -> ApiResult<()> {
        let request = ApiRequest::post("/movies/ratings/").with_json(rating)?;
        self.client.send(&request).await
    }

    pub async fn ratings(&self, movie_id: u64) -> ApiResult<Vec<MovieRating>> {
        let request = ApiRequest::get("/movies/ratings/").with_query("movie", movie_id);
        let listing: Listing<MovieRating> = self.client.fetch(&request).await?;
        Ok(listing.into_items())
    }

    pub async fn favorites(&self) -> ApiResult<Vec<Favorite>> {
        let listing: Listing<Favorite> =
            self.client.fetch(&ApiRequest::get("/movies/favorites/")).await?;
        Ok(listing.into_items())
    }

    pub async fn add_favorite(&self, movie_id: u64) -> ApiResult<FavoriteOutcome> {
        let request =
            ApiRequest::post("/movies/favorites/").with_json(&FavoriteRequest { movie_id })?;
        let response = self.client.execute(&request).await?;
        if response.status == StatusCode::CREATED {
            Ok(FavoriteOutcome::Added(response.json()?))
        } else {
            Ok(FavoriteOutcome::AlreadyFavorite)
        }
    }

    /// DELETE with a JSON body naming the movie.
    pub async fn remove_favorite(&self, movie_id: u64) -> ApiResult<()> {
        let request = ApiRequest::delete("/movies/favorites/remove/")
            .with_json(&FavoriteRequest { movie_id })?;
        self.client.send(&request).await
    }
}
