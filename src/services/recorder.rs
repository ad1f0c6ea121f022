// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory route accumulation for one tracking session.

use chrono::{DateTime, Utc};

use crate::models::Coordinate;

/// Ordered GPS samples captured while a session is active.
#[derive(Debug, Clone, Default)]
pub struct RouteRecorder {
    active: bool,
    points: Vec<Coordinate>,
    started_at: Option<DateTime<Utc>>,
}

impl RouteRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or restart) a session, discarding any buffered points.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.active = true;
        self.points.clear();
        self.started_at = Some(now);
    }

    /// Append a sample. Samples outside a session are ignored.
    ///
    /// Returns whether the sample was kept.
    pub fn add_point(&mut self, point: Coordinate) -> bool {
        if !self.active {
            return false;
        }
        self.points.push(point);
        true
    }

    /// End the session and hand back everything recorded.
    ///
    /// Never fails; callers decide whether the route is long enough.
    pub fn finish(&mut self) -> Vec<Coordinate> {
        self.active = false;
        self.started_at = None;
        std::mem::take(&mut self.points)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// When the current session began, if one is active.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}
