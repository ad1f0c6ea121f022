// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Territory Tracker: walk a loop, claim the ground inside it.
//!
//! This crate provides the backend API that records GPS routes, turns closed
//! routes into territories, and evicts whatever the new claim overlaps.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Storage;
use services::{IdentityClient, ProfileService, TerritoryService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub territory_service: TerritoryService<Storage>,
    pub profile_service: ProfileService<Storage>,
    pub identity: IdentityClient,
}
