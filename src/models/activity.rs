// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking activity log record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::{Coordinate, Territory};

/// One finished tracking session. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Activity {
    pub id: String,
    /// Player who walked the route
    pub user_id: String,
    /// Route snapshot at finish
    pub coordinates: Vec<Coordinate>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub started_at: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub finished_at: DateTime<Utc>,
    /// Distance in meters (not populated yet, always 0)
    #[serde(default)]
    pub distance: f64,
    /// Territory produced by this activity, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory_created: Option<Territory>,
}

impl Activity {
    /// Whether this activity produced a territory.
    pub fn is_conquest(&self) -> bool {
        self.territory_created.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_territory_is_omitted() {
        let activity = Activity {
            id: "1".to_string(),
            user_id: "u".to_string(),
            coordinates: vec![],
            started_at: DateTime::from_timestamp(0, 0).unwrap(),
            finished_at: DateTime::from_timestamp(60, 0).unwrap(),
            distance: 0.0,
            territory_created: None,
        };

        let json = serde_json::to_value(&activity).unwrap();
        assert!(json.get("territoryCreated").is_none());
        assert_eq!(json["userId"], "u");
        assert!(!activity.is_conquest());

        let back: Activity = serde_json::from_value(json).unwrap();
        assert_eq!(back, activity);
    }
}
