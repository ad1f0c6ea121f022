// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Planar polygon math over raw GPS coordinates.
//!
//! Latitude is treated as `x` and longitude as `y` on a flat plane. This is
//! only a fair approximation for small, near-equatorial extents; no
//! projection or latitude correction is applied anywhere in this module.

use geo::{Area, Coord, LineString, Polygon};

use crate::models::Coordinate;

/// Meters per degree, applied once per axis to turn degree² into m².
pub const METERS_PER_DEGREE: f64 = 111_000.0;

fn planar(c: &Coordinate) -> Coord<f64> {
    Coord {
        x: c.latitude,
        y: c.longitude,
    }
}

/// Area of the (implicitly closed) ring in square meters.
///
/// Shoelace area on the degree plane, scaled by [`METERS_PER_DEGREE`]².
/// Returns 0 for fewer than 3 points. Winding direction does not matter.
pub fn compute_area(coordinates: &[Coordinate]) -> f64 {
    if coordinates.len() < 3 {
        return 0.0;
    }

    let ring: LineString<f64> = coordinates.iter().map(planar).collect::<Vec<_>>().into();
    Polygon::new(ring, vec![]).unsigned_area() * METERS_PER_DEGREE * METERS_PER_DEGREE
}

/// Even-odd ray casting test.
///
/// Casts a ray along `x` from `point` and flips the result for every edge
/// it crosses. Degenerate polygons (fewer than 3 points) contain nothing.
/// Points exactly on an edge may land on either side.
pub fn point_in_polygon(point: &Coordinate, polygon: &[Coordinate]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let p = planar(point);
    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let vi = planar(&polygon[i]);
        let vj = planar(&polygon[j]);

        let straddles = (vi.y > p.y) != (vj.y > p.y);
        if straddles && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Overlap test used for eviction.
///
/// True when any vertex of either polygon lies inside the other. Edges that
/// cross while every vertex stays outside are not reported; claim outcomes
/// depend on this exact behavior.
pub fn polygons_intersect(a: &[Coordinate], b: &[Coordinate]) -> bool {
    b.iter().any(|v| point_in_polygon(v, a)) || a.iter().any(|v| point_in_polygon(v, b))
}
