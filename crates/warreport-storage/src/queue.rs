//! Typed rotating work queues.
//!
//! A [`RotatingQueue`] is a durable FIFO with at-least-once semantics:
//! `take_next` atomically rotates the head to the tail and hands it out, so
//! repeated calls cycle through all pending entries without ever shrinking
//! the queue on their own. An entry is removed only by an explicit
//! [`RotatingQueue::complete`], which is idempotent and a no-op once the
//! entry is gone. A worker crash between `take_next` and `complete` leaves
//! the entry in rotation for another attempt.
//!
//! Entries are stored as a versioned JSON envelope rather than delimited
//! strings, so identifiers containing a delimiter can never corrupt the
//! queue format.

use crate::error::StoreError;
use crate::store::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// Current queue entry format version.
const ENVELOPE_VERSION: u32 = 1;

/// Versioned wrapper around every stored queue entry.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u32,
    body: serde_json::Value,
}

/// An entry taken from a queue, paired with the removal receipt needed to
/// complete it.
#[derive(Debug, Clone)]
pub struct QueueEntry<T> {
    /// The deserialized payload.
    pub body: T,
    /// The exact stored string; `complete` removes this element.
    receipt: String,
}

impl<T> QueueEntry<T> {
    /// The raw stored form of this entry.
    pub fn receipt(&self) -> &str {
        &self.receipt
    }
}

/// A durable rotating FIFO of typed entries.
pub struct RotatingQueue<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    _entry: PhantomData<fn() -> T>,
}

impl<T> Clone for RotatingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            _entry: PhantomData,
        }
    }
}

impl<T> RotatingQueue<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a queue over the given store and list key.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _entry: PhantomData,
        }
    }

    /// Append entries to the tail of the queue.
    pub async fn push_back(&self, entries: &[T]) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut serialized = Vec::with_capacity(entries.len());
        for entry in entries {
            serialized.push(Self::encode(entry)?);
        }
        self.store.push_back(&self.key, &serialized).await
    }

    /// Rotate the head entry to the tail and return it, or `None` when the
    /// queue is empty.
    pub async fn take_next(&self) -> Result<Option<QueueEntry<T>>, StoreError> {
        let Some(raw) = self.store.rotate(&self.key).await? else {
            return Ok(None);
        };
        let body = Self::decode(&raw)?;
        Ok(Some(QueueEntry { body, receipt: raw }))
    }

    /// Remove a previously taken entry. Idempotent: completing an entry
    /// that is no longer present returns `false` and changes nothing.
    pub async fn complete(&self, entry: &QueueEntry<T>) -> Result<bool, StoreError> {
        self.store.remove_value(&self.key, &entry.receipt).await
    }

    /// Number of pending entries.
    pub async fn len(&self) -> Result<usize, StoreError> {
        self.store.list_len(&self.key).await
    }

    /// Whether the queue has no pending entries.
    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }

    fn encode(entry: &T) -> Result<String, StoreError> {
        let envelope = Envelope {
            v: ENVELOPE_VERSION,
            body: serde_json::to_value(entry)?,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    fn decode(raw: &str) -> Result<T, StoreError> {
        let envelope: Envelope = serde_json::from_str(raw)?;
        if envelope.v != ENVELOPE_VERSION {
            return Err(StoreError::VersionMismatch {
                found: envelope.v,
                expected: ENVELOPE_VERSION,
            });
        }
        Ok(serde_json::from_value(envelope.body)?)
    }
}
