//! Player identity resolution.
//!
//! The history feed identifies players by opaque ids. Resolving an id to a
//! username costs an API call, so results are cached in the store with a
//! bounded expiry. Alliance membership comes from a third-party roster
//! document that is refreshed as a whole when its freshness flag lapses.

use screeps_api::{ApiError, ScreepsApi};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use warreport_storage::{keys, KeyValueStore, StoreError};

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

/// Errors that can occur during identity resolution.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IdentityError {
    /// Whether retrying the operation later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(e) => e.is_transient(),
            Self::Store(e) => e.is_transient(),
        }
    }
}

/// Cached resolver for usernames and alliance tags.
#[derive(Clone)]
pub struct IdentityResolver {
    api: Arc<dyn ScreepsApi>,
    store: Arc<dyn KeyValueStore>,
}

impl IdentityResolver {
    pub fn new(api: Arc<dyn ScreepsApi>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { api, store }
    }

    /// Resolve an opaque player id to a username, via the cache.
    pub async fn username_of(&self, user_id: &str) -> Result<String, IdentityError> {
        let key = keys::username(user_id);
        if let Some(cached) = self.store.get(&key).await? {
            return Ok(cached);
        }

        let username = self.api.find_username(user_id).await?;
        debug!(user_id, username = %username, "Resolved username");
        self.store
            .set_with_expiry(&key, &username, keys::USERNAME_EXPIRY)
            .await?;
        Ok(username)
    }

    /// Look up the alliance tag of a player, refreshing the roster first
    /// when it has gone stale. `None` means the player is unaligned.
    pub async fn alliance_of(&self, username: &str) -> Result<Option<String>, IdentityError> {
        if !self.store.exists(&keys::alliances_fetched()).await? {
            self.refresh_alliances().await?;
        }
        Ok(self.store.get(&keys::alliance(username)).await?)
    }

    /// Re-fetch the alliance roster and rewrite every member entry.
    ///
    /// A failed roster fetch still arms the freshness flag: alliance tags
    /// are decoration, and hammering a dead roster host on every lookup
    /// helps nobody.
    async fn refresh_alliances(&self) -> Result<(), IdentityError> {
        match self.api.alliances().await {
            Ok(roster) => {
                let mut entries = Vec::new();
                for (tag, alliance) in &roster {
                    for member in &alliance.members {
                        entries.push((keys::alliance(member), tag.clone()));
                    }
                }
                info!(
                    alliances = roster.len(),
                    members = entries.len(),
                    "Refreshed alliance roster"
                );
                self.store
                    .set_with_expiry(
                        &keys::alliances_fetched(),
                        "1",
                        keys::ALLIANCES_FETCHED_EXPIRY,
                    )
                    .await?;
                self.store
                    .set_many_with_expiry(&entries, keys::ALLIANCE_EXPIRY)
                    .await?;
            }
            Err(error) => {
                warn!(%error, "Alliance roster fetch failed; continuing without tags");
                self.store
                    .set_with_expiry(
                        &keys::alliances_fetched(),
                        "1",
                        keys::ALLIANCES_FETCHED_EXPIRY,
                    )
                    .await?;
            }
        }
        Ok(())
    }
}
