//! Errors from loading configuration and resolving paths.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Config values present but unusable
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Config file is not valid JSON for [`crate::Config`]
    #[error("Malformed config file: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither a base dir flag nor a home directory is available
    #[error("Could not determine home directory; pass --base-dir")]
    NoHomeDir,
}

pub type CoreResult<T> = Result<T, CoreError>;
