// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live tracking session routes.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Coordinate, Territory};
use crate::services::TrackingStatus;
use crate::AppState;

/// Precision used by encoded polylines from the mobile client.
const POLYLINE_PRECISION: u32 = 5;

/// Largest batch accepted in one request.
const MAX_POINTS_PER_REQUEST: usize = 10_000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tracking", get(get_status))
        .route("/api/tracking/start", post(start))
        .route("/api/tracking/points", post(add_points))
        .route("/api/tracking/finish", post(finish))
        .route("/api/tracking/abort", post(abort))
}

/// A batch of samples, either as a list or as an encoded polyline.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PointsRequest {
    #[serde(default)]
    #[validate(nested)]
    pub points: Vec<Coordinate>,
    #[serde(default)]
    pub polyline: Option<String>,
}

impl PointsRequest {
    /// Validated samples in arrival order.
    fn into_coordinates(self) -> Result<Vec<Coordinate>> {
        self.validate()?;

        let coordinates = match self.polyline {
            Some(_) if !self.points.is_empty() => {
                return Err(AppError::BadRequest(
                    "Send either 'points' or 'polyline', not both".to_string(),
                ));
            }
            Some(encoded) => decode_polyline(&encoded)?,
            None => self.points,
        };

        if coordinates.len() > MAX_POINTS_PER_REQUEST {
            return Err(AppError::BadRequest(format!(
                "At most {} points per request",
                MAX_POINTS_PER_REQUEST
            )));
        }
        Ok(coordinates)
    }
}

fn decode_polyline(encoded: &str) -> Result<Vec<Coordinate>> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|e| AppError::BadRequest(format!("Invalid polyline: {}", e)))?;

    line.0
        .into_iter()
        .map(Coordinate::from_lon_lat)
        .map(|c| -> Result<Coordinate> {
            c.validate()?;
            Ok(c)
        })
        .collect()
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PointsResponse {
    /// Samples appended to the route (0 when not tracking)
    pub accepted: usize,
    pub tracking: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FinishResponse {
    /// Claimed territory, or null when the route was too short
    pub territory: Option<Territory>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AbortResponse {
    pub aborted: bool,
}

async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TrackingStatus> {
    Json(state.territory_service.tracking_status(&user.user_id).await)
}

async fn start(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TrackingStatus> {
    Json(state.territory_service.start_tracking(&user.player()).await)
}

async fn add_points(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<PointsRequest>,
) -> Result<Json<PointsResponse>> {
    let coordinates = payload.into_coordinates()?;
    let received = coordinates.len();

    let (accepted, tracking) = state
        .territory_service
        .add_route_points(&user.user_id, coordinates)
        .await;

    tracing::debug!(user_id = %user.user_id, received, accepted, tracking, "Route samples");

    Ok(Json(PointsResponse { accepted, tracking }))
}

async fn finish(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<FinishResponse> {
    let territory = state.territory_service.finish_tracking(&user.player()).await;
    Json(FinishResponse { territory })
}

async fn abort(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<AbortResponse> {
    let aborted = state.territory_service.abort_tracking(&user.user_id).await;
    Json(AbortResponse { aborted })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_list_passes_through() {
        let req = PointsRequest {
            points: vec![Coordinate::new(1.0, 2.0), Coordinate::new(3.0, 4.0)],
            polyline: None,
        };
        assert_eq!(
            req.into_coordinates().unwrap(),
            vec![Coordinate::new(1.0, 2.0), Coordinate::new(3.0, 4.0)]
        );
    }

    #[test]
    fn test_polyline_decodes_lat_lon() {
        // Reference polyline from the encoding format documentation
        let req = PointsRequest {
            points: vec![],
            polyline: Some("_p~iF~ps|U_ulLnnqC_mqNvxq`@".to_string()),
        };
        let coords = req.into_coordinates().unwrap();

        assert_eq!(coords.len(), 3);
        assert!((coords[0].latitude - 38.5).abs() < 1e-9);
        assert!((coords[0].longitude + 120.2).abs() < 1e-9);
        assert!((coords[2].latitude - 43.252).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_out_of_range_points() {
        let req = PointsRequest {
            points: vec![Coordinate::new(91.0, 0.0)],
            polyline: None,
        };
        assert!(matches!(
            req.into_coordinates(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_rejects_both_encodings() {
        let req = PointsRequest {
            points: vec![Coordinate::new(1.0, 2.0)],
            polyline: Some("_p~iF~ps|U".to_string()),
        };
        assert!(req.into_coordinates().is_err());
    }
}
