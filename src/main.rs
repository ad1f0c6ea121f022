// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Territory Tracker API Server
//!
//! Records GPS routes from the mobile client and turns each finished loop
//! into a territory, evicting whatever it overlaps.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use territory_tracker::{
    config::{Config, ConfigError, StorageBackend},
    db::{FileStore, FirestoreStore, MemoryStore, Storage},
    services::{IdentityClient, ProfileService, TerritoryEvent, TerritoryService},
    AppState,
};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Territory Tracker API");

    let storage = open_storage(&config).await?;
    tracing::info!(backend = storage.name(), "Storage initialized");

    let rng = match config.color_seed {
        Some(seed) => {
            tracing::info!(seed, "Using fixed territory color seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let profile_service = ProfileService::load(storage.clone()).await;
    let territory_service = TerritoryService::load(storage, rng).await;
    let identity = IdentityClient::new(&config.auth_url, &config.auth_api_key);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        territory_service,
        profile_service,
        identity,
    });

    spawn_event_logger(&state);

    // Build router
    let app = territory_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn open_storage(config: &Config) -> Result<Storage, Box<dyn std::error::Error>> {
    let storage = match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; state is lost on restart");
            MemoryStore::new().into()
        }
        StorageBackend::File => FileStore::open(&config.storage_dir).await?.into(),
        StorageBackend::Firestore => {
            let project_id = config
                .gcp_project_id
                .as_deref()
                .ok_or(ConfigError::Missing("GCP_PROJECT_ID"))?;
            FirestoreStore::new(project_id).await?.into()
        }
    };
    Ok(storage)
}

/// Log every claim as it is committed.
fn spawn_event_logger(state: &Arc<AppState>) {
    let mut events = state.territory_service.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TerritoryEvent::Claimed { territory, evicted }) => {
                    tracing::info!(
                        territory_id = %territory.id,
                        owner_id = %territory.owner_id,
                        area = territory.area,
                        evicted_count = evicted.len(),
                        "Territory event"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("territory_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
