//! Persistent store interface.
//!
//! The pipeline needs exactly three capabilities from its store: TTL'd
//! scalar values, an atomic pipelined multi-set, and an atomic
//! rotate-pop-push primitive on lists. Anything offering those operations
//! (Redis being the archetype) can implement this trait; the in-memory
//! provider in [`crate::memory`] is the reference implementation.

use crate::error::StoreError;
use async_trait::async_trait;
use std::time::Duration;

/// Minimal key-value and list store contract.
///
/// List operations treat each list as an ordered multiset of strings.
/// `rotate` plus `remove_value` together form the at-least-once queue
/// protocol: rotation never shrinks a list on its own, and removal is
/// idempotent.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a scalar value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a scalar value with an expiry.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Check whether a scalar key exists (and has not expired).
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete a scalar key. Deleting an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Set many scalar values with a shared expiry in one pipelined,
    /// atomic batch.
    async fn set_many_with_expiry(
        &self,
        entries: &[(String, String)],
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Append values to the tail of a list.
    async fn push_back(&self, list: &str, values: &[String]) -> Result<(), StoreError>;

    /// Atomically pop the head of a list and push the same element to its
    /// tail, returning the element. `None` when the list is empty.
    async fn rotate(&self, list: &str) -> Result<Option<String>, StoreError>;

    /// Remove one element equal to `value` from a list. Returns `false`
    /// (and changes nothing) when no such element is present.
    async fn remove_value(&self, list: &str, value: &str) -> Result<bool, StoreError>;

    /// Number of elements in a list.
    async fn list_len(&self, list: &str) -> Result<usize, StoreError>;
}
