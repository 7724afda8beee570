//! In-memory store implementation for testing and local operation.
//!
//! Mirrors the semantics the pipeline relies on from a real backing store:
//! lazy expiry on read, a single-lock pipelined multi-set, and an atomic
//! rotate on lists. Every operation takes the storage lock exactly once,
//! which is what makes the multi-key operations atomic.

use crate::error::StoreError;
use crate::store::KeyValueStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// A scalar value with its expiry deadline.
#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: DateTime<Utc>,
}

impl StoredValue {
    fn new(value: &str, ttl: Duration) -> Result<Self, StoreError> {
        let ttl = ChronoDuration::from_std(ttl).map_err(|e| StoreError::Backend {
            message: format!("expiry out of range: {}", e),
        })?;
        Ok(Self {
            value: value.to_string(),
            expires_at: Utc::now() + ttl,
        })
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct Storage {
    values: HashMap<String, StoredValue>,
    lists: HashMap<String, VecDeque<String>>,
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    storage: Mutex<Storage>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Storage>, StoreError> {
        self.storage.lock().map_err(|_| StoreError::Backend {
            message: "storage lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut storage = self.lock()?;
        match storage.values.get(key) {
            Some(stored) if stored.is_expired() => {
                storage.values.remove(key);
                Ok(None)
            }
            Some(stored) => Ok(Some(stored.value.clone())),
            None => Ok(None),
        }
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let stored = StoredValue::new(value, ttl)?;
        let mut storage = self.lock()?;
        storage.values.insert(key.to_string(), stored);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut storage = self.lock()?;
        storage.values.remove(key);
        Ok(())
    }

    async fn set_many_with_expiry(
        &self,
        entries: &[(String, String)],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut prepared = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            prepared.push((key.clone(), StoredValue::new(value, ttl)?));
        }
        let mut storage = self.lock()?;
        for (key, stored) in prepared {
            storage.values.insert(key, stored);
        }
        Ok(())
    }

    async fn push_back(&self, list: &str, values: &[String]) -> Result<(), StoreError> {
        let mut storage = self.lock()?;
        let entries = storage.lists.entry(list.to_string()).or_default();
        for value in values {
            entries.push_back(value.clone());
        }
        Ok(())
    }

    async fn rotate(&self, list: &str) -> Result<Option<String>, StoreError> {
        let mut storage = self.lock()?;
        let Some(entries) = storage.lists.get_mut(list) else {
            return Ok(None);
        };
        let Some(head) = entries.pop_front() else {
            return Ok(None);
        };
        entries.push_back(head.clone());
        Ok(Some(head))
    }

    async fn remove_value(&self, list: &str, value: &str) -> Result<bool, StoreError> {
        let mut storage = self.lock()?;
        let Some(entries) = storage.lists.get_mut(list) else {
            return Ok(false);
        };
        // Remove the most recently rotated match first (tail side), like
        // LREM with a negative count.
        if let Some(position) = entries.iter().rposition(|entry| entry == value) {
            entries.remove(position);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list_len(&self, list: &str) -> Result<usize, StoreError> {
        let storage = self.lock()?;
        Ok(storage.lists.get(list).map(VecDeque::len).unwrap_or(0))
    }
}
