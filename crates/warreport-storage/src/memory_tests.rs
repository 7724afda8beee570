//! Tests for the in-memory store.

use super::*;

#[tokio::test]
async fn test_get_set_round_trip() {
    let store = MemoryStore::new();
    store
        .set_with_expiry("key", "value", Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(store.get("key").await.unwrap(), Some("value".to_string()));
    assert!(store.exists("key").await.unwrap());
}

#[tokio::test]
async fn test_absent_key_is_none() {
    let store = MemoryStore::new();
    assert_eq!(store.get("missing").await.unwrap(), None);
    assert!(!store.exists("missing").await.unwrap());
}

#[tokio::test]
async fn test_expired_value_reads_as_absent() {
    let store = MemoryStore::new();
    store
        .set_with_expiry("key", "value", Duration::from_secs(0))
        .await
        .unwrap();
    assert_eq!(store.get("key").await.unwrap(), None);
    assert!(!store.exists("key").await.unwrap());
}

#[tokio::test]
async fn test_set_overwrites_and_renews_expiry() {
    let store = MemoryStore::new();
    store
        .set_with_expiry("key", "old", Duration::from_secs(0))
        .await
        .unwrap();
    store
        .set_with_expiry("key", "new", Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(store.get("key").await.unwrap(), Some("new".to_string()));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let store = MemoryStore::new();
    store
        .set_with_expiry("key", "value", Duration::from_secs(60))
        .await
        .unwrap();
    store.delete("key").await.unwrap();
    store.delete("key").await.unwrap();
    assert_eq!(store.get("key").await.unwrap(), None);
}

#[tokio::test]
async fn test_set_many_writes_all_entries() {
    let store = MemoryStore::new();
    let entries = vec![
        ("a".to_string(), "1".to_string()),
        ("b".to_string(), "2".to_string()),
        ("c".to_string(), "3".to_string()),
    ];
    store
        .set_many_with_expiry(&entries, Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(store.get("a").await.unwrap(), Some("1".to_string()));
    assert_eq!(store.get("b").await.unwrap(), Some("2".to_string()));
    assert_eq!(store.get("c").await.unwrap(), Some("3".to_string()));
}

#[tokio::test]
async fn test_rotate_cycles_through_entries() {
    let store = MemoryStore::new();
    store
        .push_back("queue", &["a".to_string(), "b".to_string(), "c".to_string()])
        .await
        .unwrap();

    assert_eq!(store.rotate("queue").await.unwrap(), Some("a".to_string()));
    assert_eq!(store.rotate("queue").await.unwrap(), Some("b".to_string()));
    assert_eq!(store.rotate("queue").await.unwrap(), Some("c".to_string()));
    // Full cycle: back to the first entry, nothing lost.
    assert_eq!(store.rotate("queue").await.unwrap(), Some("a".to_string()));
    assert_eq!(store.list_len("queue").await.unwrap(), 3);
}

#[tokio::test]
async fn test_rotate_empty_list() {
    let store = MemoryStore::new();
    assert_eq!(store.rotate("queue").await.unwrap(), None);
}

#[tokio::test]
async fn test_remove_value_removes_one_element() {
    let store = MemoryStore::new();
    store
        .push_back("queue", &["a".to_string(), "b".to_string(), "a".to_string()])
        .await
        .unwrap();

    assert!(store.remove_value("queue", "a").await.unwrap());
    assert_eq!(store.list_len("queue").await.unwrap(), 2);
    assert!(store.remove_value("queue", "a").await.unwrap());
    assert!(!store.remove_value("queue", "a").await.unwrap());
    assert_eq!(store.list_len("queue").await.unwrap(), 1);
}

#[tokio::test]
async fn test_remove_value_on_absent_list() {
    let store = MemoryStore::new();
    assert!(!store.remove_value("queue", "a").await.unwrap());
}
