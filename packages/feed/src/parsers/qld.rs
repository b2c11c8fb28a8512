//! QLD Fire Department bushfire warnings `GeoJSON`.
//!
//! Warning areas are often published as polygons only. Those get the mean
//! of their raw ring vertices as a position.

use aus_emergency_incident_models::{AustralianState, Incident};
use geojson::Feature;

use super::geometry::{decode_feature, feature_id, feature_position};
use super::{finish, geojson_features};
use crate::FeedError;
use crate::parsing::{parse_datetime, value_as_text};
use crate::severity::qld_severity;

/// Parses a QLD payload.
///
/// # Errors
///
/// Returns [`FeedError`] if the body is not a `GeoJSON` feature collection.
pub fn parse(state: AustralianState, body: &str) -> Result<Vec<Incident>, FeedError> {
    let label = state.to_string();
    Ok(geojson_features(body)?
        .into_iter()
        .filter_map(|raw| decode_feature(raw, &label))
        .map(|feature| finish(incident(state, &feature)))
        .collect())
}

fn property(feature: &Feature, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| feature.property(key).and_then(value_as_text))
}

fn incident(state: AustralianState, feature: &Feature) -> Incident {
    let mut incident = Incident::new(state);

    incident.incident_no = property(feature, &["UniqueID", "OBJECTID"])
        .or_else(|| feature_id(feature))
        .unwrap_or_default();
    incident.level = property(feature, &["WarningLevel"]);
    incident.status = property(feature, &["CurrentStatus"]);
    incident.incident_type = property(feature, &["EventType", "WarningTitle"]);
    incident.message = property(feature, &["Header", "WarningTitle"]);
    incident.location_name = property(feature, &["Locality"]);
    incident.region = property(feature, &["WarningArea", "Region"]);
    incident.message_link = property(feature, &["Link"]);
    incident.agency = property(feature, &["Agency"]);

    incident.severity = qld_severity(incident.level.as_deref(), incident.status.as_deref());

    incident.incident_datetime = property(feature, &["PublishDate", "LastUpdate"])
        .as_deref()
        .and_then(parse_datetime);

    if let Some((lat, lon)) = feature_position(feature) {
        incident.latitude = Some(lat);
        incident.longitude = Some(lon);
    }

    incident
}
