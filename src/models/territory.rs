// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Claimed territory model and its GeoJSON representation.

use chrono::{DateTime, Utc};
use geo::{LineString, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::Coordinate;

/// Fill colors handed out to new territories.
pub const TERRITORY_COLORS: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E2",
];

/// A closed polygon claimed by a player.
///
/// Every field is fixed at claim time. Owner identity is copied in so a
/// territory still renders after the player renames or disappears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Territory {
    /// Time-derived identifier, unique per service instance
    pub id: String,
    pub owner_id: String,
    pub owner_name: String,
    /// Route as walked; the ring is implicitly closed
    pub coordinates: Vec<Coordinate>,
    /// Square meters (flat-earth approximation)
    pub area: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub conquered_at: DateTime<Utc>,
    /// Hex color from [`TERRITORY_COLORS`]
    pub color: String,
}

impl Territory {
    /// Polygon in GeoJSON axis order (`x` = longitude).
    pub fn to_polygon(&self) -> Polygon<f64> {
        let ring: LineString<f64> = self
            .coordinates
            .iter()
            .map(|c| c.to_lon_lat())
            .collect::<Vec<_>>()
            .into();
        Polygon::new(ring, vec![])
    }

    /// GeoJSON feature carrying the territory's metadata as properties.
    pub fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("ownerId".to_string(), self.owner_id.clone().into());
        properties.insert("ownerName".to_string(), self.owner_name.clone().into());
        properties.insert("area".to_string(), self.area.into());
        properties.insert("color".to_string(), self.color.clone().into());
        properties.insert(
            "conqueredAt".to_string(),
            self.conquered_at.to_rfc3339().into(),
        );

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(&self.to_polygon()))),
            id: Some(geojson::feature::Id::String(self.id.clone())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Build a feature collection for map clients.
pub fn to_feature_collection(territories: &[Territory]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: territories.iter().map(Territory::to_feature).collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Territory {
        Territory {
            id: "1700000000000".to_string(),
            owner_id: "user-1".to_string(),
            owner_name: "Ana".to_string(),
            coordinates: vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Coordinate::new(1.0, 1.0),
            ],
            area: 12.5,
            conquered_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            color: TERRITORY_COLORS[0].to_string(),
        }
    }

    #[test]
    fn test_persisted_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        for key in [
            "id",
            "ownerId",
            "ownerName",
            "coordinates",
            "area",
            "conqueredAt",
            "color",
        ] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
        assert_eq!(json["coordinates"][1]["longitude"], 1.0);
    }

    #[test]
    fn test_feature_uses_lon_lat_order() {
        let feature = sample().to_feature();
        let geometry = feature.geometry.unwrap();
        let geojson::Value::Polygon(rings) = geometry.value else {
            panic!("expected polygon geometry");
        };
        // Second vertex is latitude 0, longitude 1
        assert_eq!(rings[0][1], vec![1.0, 0.0]);
        // Ring is closed on export
        assert_eq!(rings[0].first(), rings[0].last());
        assert_eq!(
            feature.properties.unwrap()["ownerName"],
            serde_json::json!("Ana")
        );
    }

    #[test]
    fn test_feature_collection_counts() {
        let collection = to_feature_collection(&[sample(), sample()]);
        assert_eq!(collection.features.len(), 2);
    }
}
