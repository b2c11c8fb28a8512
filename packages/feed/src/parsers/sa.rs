//! SA CFS CRIIMSON current-incidents JSON.
//!
//! A bare array of objects with capitalized keys. `Location` carries the
//! coordinates as a `"lat,lon"` string.

use aus_emergency_incident_models::{AustralianState, Incident};
use serde_json::Value;

use super::{finish, json_records};
use crate::FeedError;
use crate::parsing::{parse_datetime, parse_lat_lon_str, text_field};
use crate::severity::classify;

/// Parses an SA CFS payload.
///
/// # Errors
///
/// Returns [`FeedError`] if the body is not JSON or not an array.
pub fn parse(state: AustralianState, body: &str) -> Result<Vec<Incident>, FeedError> {
    let value: Value = serde_json::from_str(body)?;
    let records = json_records(value, &["incidents"])?;

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

    incident.incident_no = text_field(object, &["IncidentNo"]).unwrap_or_default();
    incident.incident_type = text_field(object, &["Type"]);
    incident.status = text_field(object, &["Status"]);
    incident.level = text_field(object, &["Level"]);
    incident.region = text_field(object, &["Region"]);
    incident.location_name = text_field(object, &["Location_name"]);
    incident.date = text_field(object, &["Date"]);
    incident.time = text_field(object, &["Time"]);
    incident.message = text_field(object, &["Message"]);
    incident.message_link = text_field(object, &["Message_link"]);
    incident.resources = text_field(object, &["Resources"]);
    incident.aircraft = text_field(object, &["Aircraft"]);
    incident.agency = text_field(object, &["Service", "Agency"]);

    incident.severity = classify(
        incident.level.as_deref().unwrap_or_default(),
        incident.status.as_deref().unwrap_or_default(),
    );

    incident.incident_datetime = match (&incident.date, &incident.time) {
        (Some(date), Some(time)) => parse_datetime(&format!("{date} {time}")),
        (Some(date), None) => parse_datetime(date),
        _ => None,
    };

    if let Some((lat, lon)) = text_field(object, &["Location"])
        .as_deref()
        .and_then(parse_lat_lon_str)
    {
        incident.latitude = Some(lat);
        incident.longitude = Some(lon);
    }

    incident
}
