//! Durable token storage for the Movie Meetup client.
//!
//! This crate provides:
//! - **`DurableStorage`**: string key-value backend trait
//! - **`FileStorage`**: JSON file that survives restarts
//! - **`MemoryStorage`**: process-local map for tests and ephemeral runs
//! - **`TokenStore`**: the two-slot access/refresh token API on top

mod file;
mod keys;
mod memory;
mod tokens;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use tokens::{TokenPair, TokenSlot, TokenStore};
pub use traits::DurableStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
