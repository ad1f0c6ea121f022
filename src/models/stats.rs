// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-player aggregates and the ranking board.
//!
//! Aggregates are derived on demand from the in-memory collections; nothing
//! here is persisted.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Activity, Player, Territory};

/// Profile statistics for one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserStats {
    /// Territories currently held
    pub territories_owned: u32,
    /// Sum of held territory areas (square meters)
    pub total_area: f64,
    /// Same value as `territories_owned`; there is no weekly window yet
    pub weekly_score: u32,
    /// Activities that produced a territory, including ones since evicted
    pub total_conquests: u32,
}

impl UserStats {
    /// Aggregate the collections for `user_id`.
    pub fn compute(user_id: &str, territories: &[Territory], activities: &[Activity]) -> Self {
        let (territories_owned, total_area) = territories
            .iter()
            .filter(|t| t.owner_id == user_id)
            .fold((0u32, 0.0), |(count, area), t| (count + 1, area + t.area));

        let total_conquests = activities
            .iter()
            .filter(|a| a.user_id == user_id && a.is_conquest())
            .count() as u32;

        Self {
            territories_owned,
            total_area,
            weekly_score: territories_owned,
            total_conquests,
        }
    }
}

/// One row of the ranking board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RankingEntry {
    pub user: Player,
    pub territories_count: u32,
    pub total_area: f64,
}

/// Rank players by territory count, then by total area (both descending).
///
/// Every known player gets a row, even with nothing held. Territory owners
/// missing from `players` are added under the name stored on their territory.
pub fn build_ranking(players: &[Player], territories: &[Territory]) -> Vec<RankingEntry> {
    let mut rows: Vec<RankingEntry> = Vec::with_capacity(players.len());
    let mut index: HashMap<&str, usize> = HashMap::new();

    for player in players {
        if index.contains_key(player.id.as_str()) {
            continue;
        }
        index.insert(player.id.as_str(), rows.len());
        rows.push(RankingEntry {
            user: player.clone(),
            territories_count: 0,
            total_area: 0.0,
        });
    }

    for territory in territories {
        let slot = match index.get(territory.owner_id.as_str()) {
            Some(&slot) => slot,
            None => {
                index.insert(territory.owner_id.as_str(), rows.len());
                rows.push(RankingEntry {
                    user: Player::new(territory.owner_id.clone(), territory.owner_name.clone()),
                    territories_count: 0,
                    total_area: 0.0,
                });
                rows.len() - 1
            }
        };
        rows[slot].territories_count += 1;
        rows[slot].total_area += territory.area;
    }

    // Stable sort keeps first-seen order for full ties
    rows.sort_by(|a, b| {
        b.territories_count.cmp(&a.territories_count).then_with(|| {
            b.total_area
                .partial_cmp(&a.total_area)
                .unwrap_or(Ordering::Equal)
        })
    });
    rows
}
