// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use territory_tracker::config::Config;
use territory_tracker::db::{MemoryStore, Storage};
use territory_tracker::middleware::auth::create_jwt;
use territory_tracker::models::{Coordinate, Player};
use territory_tracker::routes::create_router;
use territory_tracker::services::{IdentityClient, ProfileService, TerritoryService};
use territory_tracker::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test app backed by a fresh in-memory store.
/// Returns the router, the shared state and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryStore) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>, MemoryStore) {
    let store = MemoryStore::new();
    let territory_service = TerritoryService::new(
        Storage::Memory(store.clone()),
        StdRng::seed_from_u64(config.color_seed.unwrap_or(0)),
    );
    let profile_service = ProfileService::new(Storage::Memory(store.clone()));
    let identity = IdentityClient::new(&config.auth_url, &config.auth_api_key);

    let state = Arc::new(AppState {
        config,
        territory_service,
        profile_service,
        identity,
    });

    (create_router(state.clone()), state, store)
}

/// Bearer header value for `player`, signed with the test key.
#[allow(dead_code)]
pub fn bearer(player: &Player) -> String {
    let token = create_jwt(player, &Config::test_default().jwt_signing_key)
        .expect("Failed to create JWT");
    format!("Bearer {}", token)
}

/// Authenticated JSON request.
#[allow(dead_code)]
pub fn authed(
    method: &str,
    uri: &str,
    player: &Player,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(player));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&body).expect("Body is not JSON")
}

/// Square of `size` degrees with its south-west corner at (`lat`, `lon`).
#[allow(dead_code)]
pub fn square(lat: f64, lon: f64, size: f64) -> Vec<Coordinate> {
    vec![
        Coordinate::new(lat, lon),
        Coordinate::new(lat, lon + size),
        Coordinate::new(lat + size, lon + size),
        Coordinate::new(lat + size, lon),
    ]
}
