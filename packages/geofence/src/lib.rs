#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone membership and centroid helpers.
//!
//! Zones are circles (center + radius in meters) and membership is a
//! great-circle distance test. CAP alert areas are reduced to a single
//! point by averaging every polygon vertex and circle center across all
//! areas. This is a plain arithmetic mean of the samples, not an
//! area-weighted polygon centroid.

use aus_emergency_incident_models::{CapArea, Zone};
use geo::{Distance as _, Haversine, Point};

/// Great-circle distance between two WGS84 points, in meters.
#[must_use]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    Haversine.distance(Point::new(lon1, lat1), Point::new(lon2, lat2))
}

/// Returns `true` iff the point lies within `zone.radius` meters of the
/// zone center.
///
/// Zones with a radius of zero, a negative radius or a non-finite radius
/// contain nothing.
#[must_use]
pub fn point_in_zone(lat: f64, lon: f64, zone: &Zone) -> bool {
    if !zone.radius.is_finite() || zone.radius <= 0.0 {
        return false;
    }
    haversine_distance(lat, lon, zone.latitude, zone.longitude) <= zone.radius
}

/// Names of all zones containing the point, in configuration order.
#[must_use]
pub fn zones_containing(lat: f64, lon: f64, zones: &[Zone]) -> Vec<String> {
    zones
        .iter()
        .filter(|zone| point_in_zone(lat, lon, zone))
        .map(|zone| zone.name.clone())
        .collect()
}

/// Computes the centroid of a set of CAP areas.
///
/// Every polygon vertex and every circle center across all areas
/// contributes one sample; the result is the mean latitude and mean
/// longitude of those samples. Returns `None` when nothing parsed.
#[must_use]
pub fn centroid(areas: &[CapArea]) -> Option<(f64, f64)> {
    let mut samples = Vec::new();

    for area in areas {
        for polygon in &area.polygons {
            samples.extend(parse_polygon(polygon));
        }
        for circle in &area.circles {
            if let Some((lat, lon, _radius)) = parse_circle(circle) {
                samples.push((lat, lon));
            }
        }
    }

    mean(&samples)
}

/// Mean of raw `GeoJSON` positions (`[lon, lat, ...]`), returned as
/// `(lat, lon)`.
///
/// Used as a location fallback for polygon geometries. Every vertex
/// counts once, including a ring's repeated closing vertex.
#[must_use]
pub fn vertex_mean<'a, I>(positions: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let samples: Vec<(f64, f64)> = positions
        .into_iter()
        .filter_map(|position| match position {
            [lon, lat, ..] if lat.is_finite() && lon.is_finite() => Some((*lat, *lon)),
            _ => None,
        })
        .collect();

    mean(&samples)
}

/// Parses a CAP polygon (`"lat,lon lat,lon ..."`) into `(lat, lon)` pairs.
///
/// Malformed pairs are skipped.
#[must_use]
pub fn parse_polygon(polygon: &str) -> Vec<(f64, f64)> {
    normalize_minus(polygon)
        .split_whitespace()
        .filter_map(|pair| {
            let parsed = parse_lat_lon(pair);
            if parsed.is_none() {
                log::debug!("Skipping malformed polygon vertex {pair:?}");
            }
            parsed
        })
        .collect()
}

/// Parses a CAP circle (`"lat,lon radius"`, also accepting
/// `"lat,lon,radius"`) into `(lat, lon, radius_km)`.
///
/// The radius is optional and defaults to zero.
#[must_use]
pub fn parse_circle(circle: &str) -> Option<(f64, f64, f64)> {
    let normalized = normalize_minus(circle);
    let mut parts = normalized
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());

    let lat = parts.next()?.parse::<f64>().ok()?;
    let lon = parts.next()?.parse::<f64>().ok()?;
    let radius = parts
        .next()
        .and_then(|r| r.parse::<f64>().ok())
        .unwrap_or(0.0);

    if !lat.is_finite() || !lon.is_finite() {
        log::debug!("Skipping non-finite circle {circle:?}");
        return None;
    }

    Some((lat, lon, radius))
}

/// Parses a `"lat,lon"` pair.
#[must_use]
pub fn parse_lat_lon(pair: &str) -> Option<(f64, f64)> {
    let normalized = normalize_minus(pair);
    let (lat, lon) = normalized.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
}

/// Replaces typographic minus and hyphen characters with ASCII `-`.
fn normalize_minus(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2212}' => '-',
            other => other,
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean(samples: &[(f64, f64)]) -> Option<(f64, f64)> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let (lat_sum, lon_sum) = samples
        .iter()
        .fold((0.0, 0.0), |(la, lo), (lat, lon)| (la + lat, lo + lon));
    Some((lat_sum / n, lon_sum / n))
}
