// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Claim resolution: turn a closed route into a territory and evict every
//! existing territory it overlaps.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::models::{Coordinate, Player, Territory, TERRITORY_COLORS};
use crate::services::geometry::{compute_area, polygons_intersect};

/// Outcome of a single claim.
#[derive(Debug, Clone)]
pub struct Claim {
    /// The freshly created territory
    pub territory: Territory,
    /// Territories that stay, in their original order, with `territory` last
    pub survivors: Vec<Territory>,
    /// Territories removed because they overlap the new one
    pub evicted: Vec<Territory>,
}

/// Hands out time-derived ids that never repeat.
///
/// Ids are milliseconds since the epoch; two ids requested within the same
/// millisecond (or after a clock step backwards) are bumped past the last
/// one issued.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    last: i64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume after previously issued numeric ids.
    pub fn observe(&mut self, id: &str) {
        if let Ok(value) = id.parse::<i64>() {
            self.last = self.last.max(value);
        }
    }

    pub fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let candidate = now.timestamp_millis();
        self.last = candidate.max(self.last + 1);
        self.last.to_string()
    }
}

/// Builds territories and decides evictions.
///
/// Holds the color source and id sequence so outcomes are reproducible with
/// a seeded RNG. Never touches storage.
#[derive(Debug, Clone)]
pub struct TerritoryResolver<R> {
    palette: Vec<String>,
    rng: R,
    ids: IdSequence,
}

impl<R: Rng> TerritoryResolver<R> {
    /// Resolver using the default [`TERRITORY_COLORS`] palette.
    pub fn new(rng: R) -> Self {
        Self::with_palette(rng, TERRITORY_COLORS.iter().map(|c| c.to_string()).collect())
    }

    /// Resolver with a custom palette. An empty palette falls back to the
    /// default one.
    pub fn with_palette(rng: R, palette: Vec<String>) -> Self {
        let palette = if palette.is_empty() {
            TERRITORY_COLORS.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };
        Self {
            palette,
            rng,
            ids: IdSequence::new(),
        }
    }

    /// Id source shared with activity records.
    pub fn ids_mut(&mut self) -> &mut IdSequence {
        &mut self.ids
    }

    /// Claim `route` for `owner` against the `current` territory set.
    ///
    /// The caller guarantees `route` has at least 3 points. Any overlapping
    /// territory is evicted regardless of owner or size, including the
    /// claimant's own.
    pub fn claim(
        &mut self,
        current: &[Territory],
        owner: &Player,
        route: &[Coordinate],
        now: DateTime<Utc>,
    ) -> Claim {
        let color = self.palette[self.rng.random_range(0..self.palette.len())].clone();

        let territory = Territory {
            id: self.ids.next_id(now),
            owner_id: owner.id.clone(),
            owner_name: owner.name.clone(),
            coordinates: route.to_vec(),
            area: compute_area(route),
            conquered_at: now,
            color,
        };

        let (evicted, mut survivors): (Vec<Territory>, Vec<Territory>) = current
            .iter()
            .cloned()
            .partition(|existing| {
                polygons_intersect(&existing.coordinates, &territory.coordinates)
            });

        survivors.push(territory.clone());

        Claim {
            territory,
            survivors,
            evicted,
        }
    }
}
