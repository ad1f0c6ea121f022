// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GPS sample model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// A single location sample in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Coordinate {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Map-ready position (`x` = longitude, `y` = latitude).
    pub fn to_lon_lat(self) -> geo::Coord<f64> {
        geo::Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }

    /// Inverse of [`Coordinate::to_lon_lat`].
    pub fn from_lon_lat(coord: geo::Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}
