// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Territory session coordinator.
//!
//! Owns the authoritative collections and every live tracking session:
//! 1. Record samples while a player is tracking
//! 2. On finish, resolve the claim against the current territories
//! 3. Commit survivors + the new activity in memory
//! 4. Write both collections to the blob store (best effort)
//! 5. Publish a [`TerritoryEvent`] to subscribers

use chrono::{DateTime, Utc};
use geojson::FeatureCollection;
use rand::rngs::StdRng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{broadcast, Mutex};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::{keys, load_collection, save_collection, BlobStore};
use crate::models::stats::build_ranking;
use crate::models::territory::to_feature_collection;
use crate::models::{Activity, Coordinate, Player, RankingEntry, Territory, UserStats};
use crate::services::recorder::RouteRecorder;
use crate::services::resolver::TerritoryResolver;

/// Shortest route that can be turned into a territory.
pub const MIN_ROUTE_POINTS: usize = 3;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change notifications for observers (leaderboards, live maps).
#[derive(Debug, Clone)]
pub enum TerritoryEvent {
    Claimed {
        territory: Territory,
        /// Ids of territories removed by this claim
        evicted: Vec<String>,
    },
}

/// Snapshot of one player's tracking session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackingStatus {
    pub tracking: bool,
    pub route: Vec<Coordinate>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub started_at: Option<DateTime<Utc>>,
}

/// Everything guarded by the service lock.
struct WorldState {
    territories: Vec<Territory>,
    activities: Vec<Activity>,
    players: Vec<Player>,
    /// Only players currently tracking have an entry
    sessions: HashMap<String, RouteRecorder>,
    resolver: TerritoryResolver<StdRng>,
}

/// Coordinator for tracking sessions, claims and persistence.
///
/// A single lock covers route accumulation, claim resolution and collection
/// replacement, so concurrent finishes cannot break the non-overlap
/// invariant. Store writes also happen under the lock, keeping them in
/// commit order.
pub struct TerritoryService<S> {
    store: S,
    state: Mutex<WorldState>,
    events: broadcast::Sender<TerritoryEvent>,
}

impl<S: BlobStore> TerritoryService<S> {
    /// Empty service; nothing is read from `store`.
    pub fn new(store: S, rng: StdRng) -> Self {
        Self::from_parts(store, rng, Vec::new(), Vec::new(), Vec::new())
    }

    /// Restore the collections persisted in `store`.
    ///
    /// A collection that cannot be read or parsed is logged and starts empty.
    pub async fn load(store: S, rng: StdRng) -> Self {
        let territories: Vec<Territory> = load_or_empty(&store, keys::TERRITORIES).await;
        let activities: Vec<Activity> = load_or_empty(&store, keys::ACTIVITIES).await;
        let players: Vec<Player> = load_or_empty(&store, keys::USERS).await;

        tracing::info!(
            territories = territories.len(),
            activities = activities.len(),
            players = players.len(),
            "Loaded territory state"
        );

        Self::from_parts(store, rng, territories, activities, players)
    }

    fn from_parts(
        store: S,
        rng: StdRng,
        territories: Vec<Territory>,
        activities: Vec<Activity>,
        players: Vec<Player>,
    ) -> Self {
        let mut resolver = TerritoryResolver::new(rng);
        for id in territories
            .iter()
            .map(|t| &t.id)
            .chain(activities.iter().map(|a| &a.id))
        {
            resolver.ids_mut().observe(id);
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            store,
            state: Mutex::new(WorldState {
                territories,
                activities,
                players,
                sessions: HashMap::new(),
                resolver,
            }),
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Receive a [`TerritoryEvent`] for every successful claim.
    pub fn subscribe(&self) -> broadcast::Receiver<TerritoryEvent> {
        self.events.subscribe()
    }

    // ─── Tracking ────────────────────────────────────────────────

    /// Begin tracking for `player`. Restarting discards the buffered route.
    pub async fn start_tracking(&self, player: &Player) -> TrackingStatus {
        let now = Utc::now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let recorder = state.sessions.entry(player.id.clone()).or_default();
        let restarted = recorder.is_active();
        recorder.start(now);

        tracing::info!(user_id = %player.id, restarted, "Tracking started");

        if remember_player(&mut state.players, player) {
            self.write_collection(keys::USERS, &state.players).await;
        }

        TrackingStatus {
            tracking: true,
            route: Vec::new(),
            started_at: Some(now),
        }
    }

    /// Append one sample. Returns false when the player is not tracking.
    pub async fn add_route_point(&self, user_id: &str, point: Coordinate) -> bool {
        let (kept, _) = self.add_route_points(user_id, [point]).await;
        kept == 1
    }

    /// Append samples in order.
    ///
    /// Returns how many were kept and whether the player was tracking, both
    /// read under the same lock. Samples that arrive after finish or abort
    /// are dropped silently.
    pub async fn add_route_points<I>(&self, user_id: &str, points: I) -> (usize, bool)
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut state = self.state.lock().await;

        match state.sessions.get_mut(user_id) {
            Some(recorder) if recorder.is_active() => {
                let kept = points.into_iter().filter(|p| recorder.add_point(*p)).count();
                (kept, true)
            }
            _ => {
                tracing::debug!(user_id, "Dropping samples outside a tracking session");
                (0, false)
            }
        }
    }

    /// Discard the current route without claiming anything.
    ///
    /// Returns whether a session was active.
    pub async fn abort_tracking(&self, user_id: &str) -> bool {
        let mut state = self.state.lock().await;
        let aborted = state
            .sessions
            .remove(user_id)
            .is_some_and(|recorder| recorder.is_active());

        tracing::info!(user_id, aborted, "Tracking aborted");
        aborted
    }

    /// Close the route and claim it as a territory.
    ///
    /// Routes shorter than [`MIN_ROUTE_POINTS`] are discarded and produce
    /// neither a territory nor an activity. Store write failures are logged
    /// only; the claim stays committed in memory.
    pub async fn finish_tracking(&self, player: &Player) -> Option<Territory> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(mut recorder) = state.sessions.remove(&player.id) else {
            tracing::debug!(user_id = %player.id, "Finish without an active session");
            return None;
        };

        let started_at = recorder.started_at();
        let route = recorder.finish();

        if route.len() < MIN_ROUTE_POINTS {
            tracing::info!(
                user_id = %player.id,
                points = route.len(),
                "Route too short to claim, discarding"
            );
            return None;
        }

        let now = Utc::now();
        let claim = state
            .resolver
            .claim(&state.territories, player, &route, now);
        let evicted: Vec<String> = claim.evicted.iter().map(|t| t.id.clone()).collect();
        state.territories = claim.survivors;

        let activity = Activity {
            id: state.resolver.ids_mut().next_id(now),
            user_id: player.id.clone(),
            coordinates: route,
            started_at: started_at.unwrap_or(now),
            finished_at: now,
            distance: 0.0,
            territory_created: Some(claim.territory.clone()),
        };
        state.activities.push(activity);

        tracing::info!(
            user_id = %player.id,
            territory_id = %claim.territory.id,
            area = claim.territory.area,
            evicted = ?evicted,
            "Territory claimed"
        );

        self.write_collection(keys::TERRITORIES, &state.territories)
            .await;
        self.write_collection(keys::ACTIVITIES, &state.activities)
            .await;

        // No subscribers is not an error
        let _ = self.events.send(TerritoryEvent::Claimed {
            territory: claim.territory.clone(),
            evicted,
        });

        Some(claim.territory)
    }

    /// Current session state for `user_id`.
    pub async fn tracking_status(&self, user_id: &str) -> TrackingStatus {
        let state = self.state.lock().await;
        match state.sessions.get(user_id) {
            Some(recorder) if recorder.is_active() => TrackingStatus {
                tracking: true,
                route: recorder.points().to_vec(),
                started_at: recorder.started_at(),
            },
            _ => TrackingStatus {
                tracking: false,
                route: Vec::new(),
                started_at: None,
            },
        }
    }

    // ─── Queries ─────────────────────────────────────────────────

    pub async fn territories(&self) -> Vec<Territory> {
        self.state.lock().await.territories.clone()
    }

    pub async fn user_territories(&self, user_id: &str) -> Vec<Territory> {
        self.state
            .lock()
            .await
            .territories
            .iter()
            .filter(|t| t.owner_id == user_id)
            .cloned()
            .collect()
    }

    /// Activities for `user_id` in the order they were recorded.
    pub async fn activities_for_user(&self, user_id: &str) -> Vec<Activity> {
        self.state
            .lock()
            .await
            .activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn get_user_stats(&self, user_id: &str) -> UserStats {
        let state = self.state.lock().await;
        UserStats::compute(user_id, &state.territories, &state.activities)
    }

    pub async fn ranking(&self) -> Vec<RankingEntry> {
        let state = self.state.lock().await;
        build_ranking(&state.players, &state.territories)
    }

    pub async fn territories_geojson(&self) -> FeatureCollection {
        to_feature_collection(&self.state.lock().await.territories)
    }

    // ─── Persistence ─────────────────────────────────────────────

    /// Store one collection. Failures are logged, not returned.
    async fn write_collection<T: Serialize + Sync>(&self, key: &str, items: &[T]) -> bool {
        match save_collection(&self.store, key, items).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to persist collection");
                false
            }
        }
    }
}

/// Record `player` (or refresh their name). Returns whether anything changed.
fn remember_player(players: &mut Vec<Player>, player: &Player) -> bool {
    match players.iter_mut().find(|p| p.id == player.id) {
        Some(existing) if existing.name == player.name => false,
        Some(existing) => {
            existing.name = player.name.clone();
            true
        }
        None => {
            players.push(player.clone());
            true
        }
    }
}

/// A collection that cannot be read or parsed starts empty.
pub(crate) async fn load_or_empty<S, T>(store: &S, key: &str) -> Vec<T>
where
    S: BlobStore,
    T: DeserializeOwned,
{
    match load_collection(store, key).await {
        Ok(items) => items,
        Err(e) => {
            tracing::error!(key, error = %e, "Failed to load stored collection, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_player() {
        let mut players = Vec::new();
        assert!(remember_player(&mut players, &Player::new("a", "Ana")));
        assert!(!remember_player(&mut players, &Player::new("a", "Ana")));
        assert!(remember_player(&mut players, &Player::new("a", "Ana Maria")));
        assert_eq!(players, vec![Player::new("a", "Ana Maria")]);
    }
}
