// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed store tests.

use rand::rngs::StdRng;
use rand::SeedableRng;
use territory_tracker::db::{keys, BlobStore, FileStore, Storage};
use territory_tracker::models::Player;
use territory_tracker::services::TerritoryService;

mod common;
use common::square;

#[tokio::test]
async fn test_set_get_remove() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();

    assert_eq!(store.get(keys::USERS).await.unwrap(), None);

    store.set(keys::USERS, "[]".to_string()).await.unwrap();
    assert_eq!(store.get(keys::USERS).await.unwrap().as_deref(), Some("[]"));
    assert!(dir.path().join("_territory_users.json").exists());

    store.remove(keys::USERS).await.unwrap();
    assert_eq!(store.get(keys::USERS).await.unwrap(), None);

    // Removing twice is fine
    store.remove(keys::USERS).await.unwrap();
}

#[tokio::test]
async fn test_open_creates_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");

    let store = FileStore::open(&nested).await.unwrap();
    store.set("k", "v".to_string()).await.unwrap();

    assert!(nested.join("k.json").exists());
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let ana = Player::new("ana", "Ana");

    let claimed = {
        let store = Storage::File(FileStore::open(dir.path()).await.unwrap());
        let svc = TerritoryService::new(store, StdRng::seed_from_u64(3));
        svc.start_tracking(&ana).await;
        svc.add_route_points("ana", square(0.0, 0.0, 0.001)).await;
        svc.finish_tracking(&ana).await.unwrap()
    };

    let store = Storage::File(FileStore::open(dir.path()).await.unwrap());
    let svc = TerritoryService::load(store, StdRng::seed_from_u64(3)).await;

    assert_eq!(svc.territories().await, vec![claimed]);
    assert_eq!(svc.get_user_stats("ana").await.total_conquests, 1);
    assert_eq!(svc.ranking().await[0].user, ana);
}
