//! Wire models for the movie meetup REST API.
//!
//! Unknown fields are ignored and optional fields default, so older or newer
//! servers decode without changes here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Profile block embedded in a user record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A user as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
}

impl Identity {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Tokens plus user returned by login and register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub access: String,
    pub refresh: String,
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Account creation form. `password2` must repeat `password`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
}

/// Partial profile update. Only fields that are set are sent; the server
/// echoes the accepted values back in the same shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }
}

/// A movie in the local catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    #[serde(default)]
    pub tmdb_id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub backdrop_url: String,
    #[serde(default)]
    pub genre: String,
    /// Minutes
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub average_user_rating: Option<f64>,
}

/// Fields for creating or patching a catalogue movie.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MovieDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// A catalogue movie with its user ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub ratings: Vec<MovieRating>,
    #[serde(default)]
    pub ratings_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRating {
    pub id: u64,
    #[serde(default)]
    pub user: Option<Identity>,
    pub movie: u64,
    #[serde(default)]
    pub movie_title: String,
    /// 1 to 5
    pub rating: u8,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewRating {
    pub movie: u64,
    pub rating: u8,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub review: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: u64,
    pub movie: Movie,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of adding a favorite; the server answers 200 when it already was one.
#[derive(Debug, Clone, PartialEq)]
pub enum FavoriteOutcome {
    Added(Favorite),
    AlreadyFavorite,
}

/// One page of a TMDB listing, proxied by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbPage<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    /// TMDB sends an empty string for unknown dates
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub runtime: Option<u32>,
}

impl TmdbMovie {
    /// Release year, when TMDB knows it.
    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .filter(|d| d.len() >= 4)
            .map(|d| &d[..4])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbReview {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetupStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl MeetupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MeetupStatus::Upcoming => "upcoming",
            MeetupStatus::Completed => "completed",
            MeetupStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for MeetupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MeetupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upcoming" => Ok(MeetupStatus::Upcoming),
            "completed" => Ok(MeetupStatus::Completed),
            "cancelled" => Ok(MeetupStatus::Cancelled),
            other => Err(format!("unknown meetup status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Pending,
    Accepted,
    Declined,
}

/// A meetup as listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meetup {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub movie: Movie,
    pub organizer: Identity,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub theater_name: String,
    pub meetup_datetime: DateTime<Utc>,
    pub max_participants: u32,
    pub status: MeetupStatus,
    #[serde(default)]
    pub participants_count: u32,
    #[serde(default)]
    pub is_full: bool,
    #[serde(default)]
    pub available_spots: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single meetup with its participants and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetupDetail {
    #[serde(flatten)]
    pub meetup: Meetup,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Fields for creating a meetup. The server echoes the accepted draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetupDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Catalogue movie id
    pub movie: u64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub theater_name: String,
    pub meetup_datetime: DateTime<Utc>,
    pub max_participants: u32,
}

/// Partial meetup update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeetupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theater_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meetup_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MeetupStatus>,
}

impl MeetupUpdate {
    pub fn is_empty(&self) -> bool {
        self == &MeetupUpdate::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: u64,
    pub user: Identity,
    pub status: ParticipantStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub user: Identity,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A list response: either a paginated envelope or a bare array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paged {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Paged { results, .. } => results,
            Listing::Bare(items) => items,
        }
    }

    /// URL of the next page, if the server paginated the listing.
    pub fn next_page(&self) -> Option<&str> {
        match self {
            Listing::Paged { next, .. } => next.as_deref(),
            Listing::Bare(_) => None,
        }
    }
}

/// Decimal fields arrive as strings ("7.5") from the server but as numbers
/// from some endpoints.
fn number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}
