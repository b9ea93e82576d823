//! High-level API for the access/refresh token pair.

use crate::{DurableStorage, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Opaque bearer credentials issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived JWT attached to every request
    pub access: String,
    /// Long-lived token exchanged for new access tokens
    pub refresh: String,
}

/// The two logical token slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSlot {
    Access,
    Refresh,
}

impl TokenSlot {
    /// Both slots, in clearing order.
    pub const ALL: [TokenSlot; 2] = [TokenSlot::Access, TokenSlot::Refresh];

    /// Storage key backing this slot.
    pub fn key(self) -> &'static str {
        match self {
            TokenSlot::Access => StorageKeys::ACCESS_TOKEN,
            TokenSlot::Refresh => StorageKeys::REFRESH_TOKEN,
        }
    }
}

/// Token storage over a durable backend.
///
/// Writes are last-write-wins; there is no cross-slot transaction.
pub struct TokenStore {
    storage: Box<dyn DurableStorage>,
}

impl TokenStore {
    /// Create a new token store with the given storage backend
    pub fn new(storage: Box<dyn DurableStorage>) -> Self {
        Self { storage }
    }

    /// Read a slot.
    pub fn get(&self, slot: TokenSlot) -> StorageResult<Option<String>> {
        self.storage.get(slot.key())
    }

    /// Write a slot.
    pub fn set(&self, slot: TokenSlot, value: &str) -> StorageResult<()> {
        self.storage.set(slot.key(), value)
    }

    /// Remove the given slots. Every slot is attempted even if an earlier one
    /// fails; the first failure is returned.
    pub fn clear(&self, slots: &[TokenSlot]) -> StorageResult<()> {
        let mut first_error = None;
        for slot in slots {
            if let Err(e) = self.storage.delete(slot.key()) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> StorageResult<Option<String>> {
        self.get(TokenSlot::Access)
    }

    /// Current refresh token, if any.
    pub fn refresh_token(&self) -> StorageResult<Option<String>> {
        self.get(TokenSlot::Refresh)
    }

    /// Replace the access token only (after a refresh).
    pub fn set_access_token(&self, token: &str) -> StorageResult<()> {
        self.set(TokenSlot::Access, token)
    }

    /// Persist both tokens of a freshly issued pair.
    pub fn store_pair(&self, pair: &TokenPair) -> StorageResult<()> {
        self.set(TokenSlot::Access, &pair.access)?;
        self.set(TokenSlot::Refresh, &pair.refresh)?;
        debug!("Stored token pair");
        Ok(())
    }

    /// Remove both tokens: the canonical logged-out representation.
    pub fn clear_all(&self) -> StorageResult<()> {
        self.clear(&TokenSlot::ALL)?;
        debug!("Cleared stored tokens");
        Ok(())
    }

    /// True when neither slot holds a value.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(!self.storage.has(StorageKeys::ACCESS_TOKEN)?
            && !self.storage.has(StorageKeys::REFRESH_TOKEN)?)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
