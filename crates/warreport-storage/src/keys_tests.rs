//! Tests for store key formats.

use super::*;

#[test]
fn test_room_keys_embed_room_name() {
    assert_eq!(
        ongoing_battle("E15N53"),
        "screeps:warreport:ongoing-data:E15N53"
    );
    assert_eq!(username("abc123"), "screeps:warreport:cache:username:abc123");
}

#[test]
fn test_queue_keys_are_versioned() {
    assert!(processing_queue().contains(":1:"));
    assert!(reporting_queue().contains(":1:"));
}
