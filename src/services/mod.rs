// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod geometry;
pub mod identity;
pub mod profile;
pub mod recorder;
pub mod resolver;
pub mod territory;

pub use identity::{IdentityClient, IdentityError};
pub use profile::ProfileService;
pub use recorder::RouteRecorder;
pub use resolver::{Claim, TerritoryResolver};
pub use territory::{TerritoryEvent, TerritoryService, TrackingStatus};
