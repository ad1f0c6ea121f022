// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Activity, Player, Profile, ProfileUpdate, RankingEntry, Territory, UserStats};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route(
            "/api/me/profile",
            get(get_my_profile).patch(update_my_profile),
        )
        .route("/api/me/stats", get(get_my_stats))
        .route("/api/me/territories", get(get_my_territories))
        .route("/api/territories", get(get_territories))
        .route("/api/territories/geojson", get(get_territories_geojson))
        .route("/api/activities", get(get_activities))
        .route("/api/ranking", get(get_ranking))
}

// ─── Player ──────────────────────────────────────────────────

async fn get_me(Extension(user): Extension<AuthUser>) -> Json<Player> {
    Json(user.player())
}

async fn get_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    state
        .profile_service
        .get_profile(&user.user_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// Update name, avatar or bio. Fields left out are unchanged.
async fn update_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let update = payload.trimmed();
    update.validate()?;
    if update.is_empty() {
        return Err(AppError::BadRequest("No profile fields to update".to_string()));
    }

    state
        .profile_service
        .update_profile(&user.user_id, update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

async fn get_my_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<UserStats> {
    Json(state.territory_service.get_user_stats(&user.user_id).await)
}

async fn get_my_territories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<Vec<Territory>> {
    Json(state.territory_service.user_territories(&user.user_id).await)
}

// ─── Map ─────────────────────────────────────────────────────

async fn get_territories(State(state): State<Arc<AppState>>) -> Json<Vec<Territory>> {
    Json(state.territory_service.territories().await)
}

/// All territories as a GeoJSON FeatureCollection for map layers.
async fn get_territories_geojson(State(state): State<Arc<AppState>>) -> Json<FeatureCollection> {
    Json(state.territory_service.territories_geojson().await)
}

// ─── Ranking ─────────────────────────────────────────────────

async fn get_ranking(State(state): State<Arc<AppState>>) -> Json<Vec<RankingEntry>> {
    Json(state.territory_service.ranking().await)
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ActivitiesQuery {
    /// Cursor for forward pagination (opaque token).
    cursor: Option<String>,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    50
}

const MAX_PER_PAGE: u32 = 100;
const CURSOR_PARTS: usize = 3;

/// Position of the last activity on the previous page.
#[derive(Debug, Clone, PartialEq)]
struct ActivityCursor {
    finished_at: DateTime<Utc>,
    activity_id: String,
}

fn parse_cursor(cursor: Option<&str>) -> Result<Option<ActivityCursor>> {
    cursor
        .map(|raw| {
            let invalid_cursor = || AppError::BadRequest("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            // The id is last so it may contain ':'
            let parts: Vec<&str> = decoded_str.splitn(CURSOR_PARTS, ':').collect();
            if parts.len() != CURSOR_PARTS || parts[2].is_empty() {
                return Err(invalid_cursor());
            }

            let seconds = parts[0].parse::<i64>().map_err(|_| invalid_cursor())?;
            let nanos = parts[1].parse::<u32>().map_err(|_| invalid_cursor())?;
            let finished_at = DateTime::from_timestamp(seconds, nanos).ok_or_else(invalid_cursor)?;

            Ok(ActivityCursor {
                finished_at,
                activity_id: parts[2].to_string(),
            })
        })
        .transpose()
}

fn encode_cursor(cursor: &ActivityCursor) -> String {
    let payload = format!(
        "{}:{}:{}",
        cursor.finished_at.timestamp(),
        cursor.finished_at.timestamp_subsec_nanos(),
        cursor.activity_id
    );
    URL_SAFE_NO_PAD.encode(payload)
}

/// Numeric ids of different lengths compare by length first.
fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Newest first; ties on time broken by id, also descending.
fn newest_first(a: &Activity, b: &Activity) -> Ordering {
    b.finished_at
        .cmp(&a.finished_at)
        .then_with(|| compare_ids(&b.id, &a.id))
}

/// Whether `activity` sorts strictly after the cursor position.
fn is_after_cursor(activity: &Activity, cursor: &ActivityCursor) -> bool {
    match activity.finished_at.cmp(&cursor.finished_at) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => compare_ids(&activity.id, &cursor.activity_id) == Ordering::Less,
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivitySummary>,
    pub per_page: u32,
    pub next_cursor: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitySummary {
    pub id: String,
    pub started_at: String,
    pub finished_at: String,
    pub point_count: usize,
    /// Route as an encoded polyline (precision 5)
    pub polyline: Option<String>,
    /// Territory this activity created, if any
    pub territory_id: Option<String>,
    pub area: Option<f64>,
}

impl From<Activity> for ActivitySummary {
    fn from(a: Activity) -> Self {
        let polyline =
            polyline::encode_coordinates(a.coordinates.iter().map(|c| c.to_lon_lat()), 5).ok();

        Self {
            id: a.id,
            started_at: format_utc_rfc3339(a.started_at),
            finished_at: format_utc_rfc3339(a.finished_at),
            point_count: a.coordinates.len(),
            polyline,
            territory_id: a.territory_created.as_ref().map(|t| t.id.clone()),
            area: a.territory_created.as_ref().map(|t| t.area),
        }
    }
}

/// Get the current player's activity log, newest first.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<ActivitiesResponse>> {
    tracing::debug!(
        user_id = %user.user_id,
        cursor = ?params.cursor,
        per_page = params.per_page,
        "Fetching activities"
    );

    if params.per_page == 0 {
        return Err(AppError::BadRequest(
            "per_page must be greater than 0".to_string(),
        ));
    }
    let limit = params.per_page.min(MAX_PER_PAGE);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    let mut activities = state
        .territory_service
        .activities_for_user(&user.user_id)
        .await;
    activities.sort_by(newest_first);

    let (page, next_cursor) = paginate(activities, cursor.as_ref(), limit as usize);

    Ok(Json(ActivitiesResponse {
        activities: page.into_iter().map(ActivitySummary::from).collect(),
        per_page: limit,
        next_cursor,
    }))
}

/// Slice one page out of activities already sorted newest first.
fn paginate(
    sorted: Vec<Activity>,
    cursor: Option<&ActivityCursor>,
    limit: usize,
) -> (Vec<Activity>, Option<String>) {
    // Fetch one extra item to determine if another page is available.
    let mut page: Vec<Activity> = sorted
        .into_iter()
        .filter(|a| cursor.is_none_or(|c| is_after_cursor(a, c)))
        .take(limit.saturating_add(1))
        .collect();

    let has_more = page.len() > limit;
    if has_more {
        page.truncate(limit);
    }

    let next_cursor = if has_more {
        page.last().map(|a| {
            encode_cursor(&ActivityCursor {
                finished_at: a.finished_at,
                activity_id: a.id.clone(),
            })
        })
    } else {
        None
    };

    (page, next_cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    fn activity(id: &str, finished_secs: i64) -> Activity {
        Activity {
            id: id.to_string(),
            user_id: "ana".to_string(),
            coordinates: vec![
                Coordinate::new(38.5, -120.2),
                Coordinate::new(40.7, -120.95),
            ],
            started_at: DateTime::from_timestamp(finished_secs - 60, 0).unwrap(),
            finished_at: DateTime::from_timestamp(finished_secs, 0).unwrap(),
            distance: 0.0,
            territory_created: None,
        }
    }

    #[test]
    fn test_cursor_round_trip() {
        let cursor = ActivityCursor {
            finished_at: DateTime::from_timestamp(1_704_103_200, 123).unwrap(),
            activity_id: "1704103200000".to_string(),
        };

        let encoded = encode_cursor(&cursor);
        let decoded = parse_cursor(Some(&encoded)).unwrap().unwrap();

        assert_eq!(decoded, cursor);
    }

    #[test]
    fn test_cursor_rejects_invalid_input() {
        let err = parse_cursor(Some("not-base64!")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let missing_id = URL_SAFE_NO_PAD.encode("1704103200:0:");
        assert!(parse_cursor(Some(&missing_id)).is_err());
    }

    #[test]
    fn test_pagination_walks_newest_first() {
        let mut all = vec![
            activity("100", 100),
            activity("300", 300),
            activity("200", 200),
            activity("201", 200),
        ];
        all.sort_by(newest_first);

        let (first, cursor) = paginate(all.clone(), None, 2);
        let ids: Vec<&str> = first.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["300", "201"]);
        let cursor = parse_cursor(cursor.as_deref()).unwrap();

        let (second, next) = paginate(all, cursor.as_ref(), 2);
        let ids: Vec<&str> = second.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["200", "100"]);
        assert!(next.is_none());
    }

    #[test]
    fn test_summary_encodes_route() {
        let summary = ActivitySummary::from(activity("1", 60));
        assert_eq!(summary.point_count, 2);
        assert_eq!(summary.polyline.as_deref(), Some("_p~iF~ps|U_ulLnnqC"));
        assert_eq!(summary.territory_id, None);
        assert_eq!(summary.finished_at, "1970-01-01T00:01:00Z");
    }
}
