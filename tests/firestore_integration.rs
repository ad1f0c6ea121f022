// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore store integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST must be set); otherwise they are skipped.

use territory_tracker::db::{BlobStore, FirestoreStore};

mod common;

/// Unique key per run so tests don't see each other's writes.
fn unique_key(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("@{prefix}_{nanos}")
}

#[tokio::test]
async fn test_blob_round_trip() {
    require_emulator!();

    let store = FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator");
    let key = unique_key("territory_territories");

    assert_eq!(store.get(&key).await.unwrap(), None);

    store.set(&key, r#"[{"id":"1"}]"#.to_string()).await.unwrap();
    assert_eq!(
        store.get(&key).await.unwrap().as_deref(),
        Some(r#"[{"id":"1"}]"#)
    );

    store.set(&key, "[]".to_string()).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("[]"));

    store.remove(&key).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), None);
}
