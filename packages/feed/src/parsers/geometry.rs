//! `GeoJSON` feature helpers shared by the NSW and QLD normalizers.

use aus_emergency_geofence::vertex_mean;
use geojson::{Feature, Geometry, Value as GeoValue, feature::Id};
use serde_json::Value;

use crate::parsing::valid_coordinates;

/// Decodes one raw feature, logging and skipping it on failure.
pub fn decode_feature(raw: Value, label: &str) -> Option<Feature> {
    match serde_json::from_value::<Feature>(raw) {
        Ok(feature) => Some(feature),
        Err(e) => {
            log::debug!("{label}: skipping undecodable GeoJSON feature: {e}");
            None
        }
    }
}

/// The feature's `id` member as text.
pub fn feature_id(feature: &Feature) -> Option<String> {
    match feature.id.as_ref()? {
        Id::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Id::Number(n) => Some(n.to_string()),
    }
}

/// Position of a feature: the first point found (searching through
/// geometry collections), else the mean of raw polygon vertices.
pub fn feature_position(feature: &Feature) -> Option<(f64, f64)> {
    let geometry = feature.geometry.as_ref()?;
    first_point(geometry).or_else(|| polygon_vertex_mean(geometry))
}

/// First `Point` (or first `MultiPoint` member), as `(lat, lon)`.
pub fn first_point(geometry: &Geometry) -> Option<(f64, f64)> {
    match &geometry.value {
        GeoValue::Point(position) => lon_lat(position),
        GeoValue::MultiPoint(positions) => positions.iter().find_map(|p| lon_lat(p)),
        GeoValue::GeometryCollection(geometries) => geometries.iter().find_map(first_point),
        _ => None,
    }
}

/// Mean of every raw vertex of the first polygonal geometry found.
///
/// Ring vertices are averaged as published, closing vertex included. This
/// is not an area-weighted centroid.
pub fn polygon_vertex_mean(geometry: &Geometry) -> Option<(f64, f64)> {
    let mean = match &geometry.value {
        GeoValue::Polygon(rings) => vertex_mean(rings.iter().flatten().map(Vec::as_slice)),
        GeoValue::MultiPolygon(polygons) => vertex_mean(
            polygons
                .iter()
                .flatten()
                .flatten()
                .map(Vec::as_slice),
        ),
        GeoValue::GeometryCollection(geometries) => {
            return geometries.iter().find_map(polygon_vertex_mean);
        }
        _ => None,
    }?;
    valid_coordinates(mean.0, mean.1)
}

fn lon_lat(position: &[f64]) -> Option<(f64, f64)> {
    match position {
        [lon, lat, ..] => valid_coordinates(*lat, *lon),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(json: serde_json::Value) -> Feature {
        decode_feature(json, "test").unwrap()
    }

    #[test]
    fn reads_point_as_lat_lon() {
        let f = feature(serde_json::json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [150.7, -33.5]},
            "properties": {}
        }));
        assert_eq!(feature_position(&f), Some((-33.5, 150.7)));
    }

    #[test]
    fn searches_geometry_collections_for_points_first() {
        let f = feature(serde_json::json!({
            "type": "Feature",
            "geometry": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "coordinates": [[[150.0, -33.0], [151.0, -33.0], [151.0, -34.0], [150.0, -33.0]]]},
                    {"type": "GeometryCollection", "geometries": [
                        {"type": "Point", "coordinates": [150.5, -33.4]}
                    ]}
                ]
            },
            "properties": {}
        }));
        assert_eq!(feature_position(&f), Some((-33.4, 150.5)));
    }

    #[test]
    fn falls_back_to_raw_polygon_vertex_mean() {
        let f = feature(serde_json::json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[153.0, -27.0], [153.2, -27.0], [153.2, -27.2], [153.0, -27.0]]]},
            "properties": {}
        }));
        let (lat, lon) = feature_position(&f).unwrap();
        assert!((lat - -27.05).abs() < 1e-9);
        assert!((lon - 153.1).abs() < 1e-9);
    }

    #[test]
    fn missing_geometry_has_no_position() {
        let f = feature(serde_json::json!({
            "type": "Feature",
            "geometry": null,
            "properties": {},
            "id": 42
        }));
        assert!(feature_position(&f).is_none());
        assert_eq!(feature_id(&f).as_deref(), Some("42"));
    }

    #[test]
    fn undecodable_feature_is_skipped() {
        assert!(decode_feature(serde_json::json!({"type": "Feature", "geometry": {"type": "Point"}}), "test").is_none());
    }
}
