//! VIC Emergency Management Victoria incident JSON.
//!
//! Either `{"results": [...]}` or a bare array. Coordinates may be strings
//! or numbers.

use aus_emergency_incident_models::{AustralianState, Incident};
use serde_json::Value;

use super::{finish, json_records};
use crate::FeedError;
use crate::parsing::{lat_lon_fields, parse_datetime, text_field};
use crate::severity::classify;

/// Parses a VIC EMV payload.
///
/// # Errors
///
/// Returns [`FeedError`] if the body is not JSON or has no results array.
pub fn parse(state: AustralianState, body: &str) -> Result<Vec<Incident>, FeedError> {
    let value: Value = serde_json::from_str(body)?;
    let records = json_records(value, &["results", "incidents"])?;

    Ok(records
        .into_iter()
        .filter_map(|record| match record {
            Value::Object(object) => Some(finish(incident(state, &object))),
            other => {
                log::debug!("{state}: skipping non-object incident record: {other}");
                None
            }
        })
        .collect())
}

fn incident(state: AustralianState, object: &serde_json::Map<String, Value>) -> Incident {
    let mut incident = Incident::new(state);

    incident.incident_no = text_field(object, &["incidentNo", "id"]).unwrap_or_default();
    incident.incident_type = text_field(object, &["incidentType", "category1"]);
    incident.status = text_field(object, &["incidentStatus", "status"]);
    incident.level = text_field(object, &["alertLevel", "warningLevel"]);
    incident.location_name = text_field(object, &["incidentLocation", "name"]);
    incident.region = text_field(object, &["territory", "municipality"]);
    incident.resources = text_field(object, &["resourceCount"]);
    incident.agency = text_field(object, &["agency"]);
    incident.message = text_field(object, &["name", "incidentName"]);
    incident.message_link = text_field(object, &["url", "webLink"]);

    incident.severity = classify(
        incident.level.as_deref().unwrap_or_default(),
        incident.status.as_deref().unwrap_or_default(),
    );

    incident.incident_datetime = text_field(object, &["originDateTime", "lastUpdateDateTime"])
        .as_deref()
        .and_then(parse_datetime);

    if let Some((lat, lon)) =
        lat_lon_fields(object, &["latitude", "lat"], &["longitude", "lon", "lng"])
    {
        incident.latitude = Some(lat);
        incident.longitude = Some(lon);
    }

    incident
}
