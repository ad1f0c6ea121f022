// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod coordinate;
pub mod profile;
pub mod stats;
pub mod territory;
pub mod user;

pub use activity::Activity;
pub use coordinate::Coordinate;
pub use profile::{Profile, ProfileUpdate};
pub use stats::{RankingEntry, UserStats};
pub use territory::{Territory, TERRITORY_COLORS};
pub use user::Player;
