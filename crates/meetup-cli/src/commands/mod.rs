//! CLI command implementations.

mod auth;
mod meetups;
mod movies;

pub use auth::{login, logout, profile, register, whoami, ProfileArgs, RegisterArgs};
pub use meetups::{
    meetups_comment, meetups_comments, meetups_create, meetups_delete, meetups_join,
    meetups_leave, meetups_list, meetups_participants, meetups_show, meetups_update,
    CreateMeetupArgs, ListMeetupsArgs, UpdateMeetupArgs,
};
pub use movies::{
    movies_favorite, movies_favorites, movies_list, movies_popular, movies_rate, movies_ratings,
    movies_recommendations, movies_reviews, movies_search, movies_show, movies_unfavorite,
};

use crate::output::{self, OutputFormat};
use anyhow::Result;
use meetup_api::{ApiClient, ApiError, ReqwestTransport};
use meetup_config_and_utils::{Config, Paths};
use meetup_session::{SessionController, SessionError};
use meetup_storage::{DurableStorage, FileStorage, MemoryStorage, TokenStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Where and how to run, resolved from global flags.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub base_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub log_level: Option<String>,
    pub ephemeral: bool,
    pub format: OutputFormat,
}

impl Settings {
    pub fn paths(&self) -> Result<Paths> {
        Ok(match &self.base_dir {
            Some(dir) => Paths::with_base_dir(dir.clone()),
            None => Paths::new()?,
        })
    }

    /// Config file and environment, then flags on top.
    pub fn config(&self, paths: &Paths) -> Result<Config> {
        let mut config = Config::load(paths)?;
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

/// Shared state for one command run.
pub struct Context {
    pub session: SessionController,
    pub format: OutputFormat,
}

impl Context {
    /// Build the client stack and settle the session from stored tokens.
    pub async fn open(settings: &Settings, paths: &Paths, config: &Config) -> Result<Self> {
        let storage: Box<dyn DurableStorage> = if settings.ephemeral {
            Box::new(MemoryStorage::new())
        } else {
            Box::new(FileStorage::new(paths.tokens_file()))
        };

        let transport = ReqwestTransport::new(
            &config.api_base_url()?,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let api = ApiClient::new(Arc::new(transport), TokenStore::new(storage));

        let format = settings.format;
        api.on_session_lost(move || {
            output::print_error(
                "Your session has expired. Run `moviemeetup login` to sign in again.",
                format,
            );
        });

        let session = SessionController::new(api);
        let status = session.start().await;
        debug!(status = %status, "Session ready");

        Ok(Self { session, format })
    }

    pub fn api(&self) -> ApiClient {
        self.session.api().clone()
    }

    /// True when signed in; otherwise prints the sign-in prompt.
    pub fn require_login(&self) -> bool {
        if self.session.is_authenticated() {
            return true;
        }
        output::print_error(
            "You are not signed in. Run `moviemeetup login` first.",
            self.format,
        );
        false
    }
}

/// Errors that carry a message fit for the user.
pub trait UserFacing: std::fmt::Display {
    fn user_message(&self, fallback: &str) -> String;
}

impl UserFacing for ApiError {
    fn user_message(&self, fallback: &str) -> String {
        ApiError::user_message(self, fallback)
    }
}

impl UserFacing for SessionError {
    fn user_message(&self, fallback: &str) -> String {
        SessionError::user_message(self, fallback)
    }
}

/// Convert a failure into the error reported to the user.
pub fn failure<E: UserFacing>(err: E, fallback: &str) -> anyhow::Error {
    debug!(error = %err, "Command failed");
    anyhow::anyhow!(err.user_message(fallback))
}
