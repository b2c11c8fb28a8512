//! Per-format feed normalizers.
//!
//! Every normalizer takes the raw response body and returns records in the
//! shared schema. Individual records that cannot be read are skipped with a
//! debug log; only a payload that is malformed at the top level is an
//! error.

pub mod cap;
pub mod geometry;
pub mod nsw;
pub mod qld;
pub mod sa;
pub mod tas;
pub mod vic;
pub mod wa;

use aus_emergency_incident_models::{AustralianState, Incident};
use serde_json::Value;

use crate::FeedError;
use crate::feed_def::FeedFormat;
use crate::identity::assign_identity;

/// Normalizes an incident feed payload.
///
/// `warnings` is the body of the separate warnings feed for formats that
/// have one (WA) and is ignored otherwise.
///
/// # Errors
///
/// Returns [`FeedError`] if the payload is malformed at the top level.
pub fn parse_incidents(
    format: FeedFormat,
    state: AustralianState,
    body: &str,
    warnings: Option<&str>,
) -> Result<Vec<Incident>, FeedError> {
    let incidents = match format {
        FeedFormat::SaJson => sa::parse(state, body)?,
        FeedFormat::NswGeojson => nsw::parse(state, body)?,
        FeedFormat::VicJson => vic::parse(state, body)?,
        FeedFormat::QldGeojson => qld::parse(state, body)?,
        FeedFormat::TasGeorss => tas::parse(state, body)?,
        FeedFormat::WaJson => wa::parse(state, body, warnings)?,
    };

    log::debug!(
        "{state}: normalized {} incident(s) from {format:?} payload",
        incidents.len()
    );

    Ok(incidents)
}

/// Assigns the identity key once all fields are populated.
pub(crate) fn finish(mut incident: Incident) -> Incident {
    assign_identity(&mut incident);
    incident
}

/// Extracts the record array from a JSON payload that is either a bare
/// array or an object wrapping the array under one of `keys`.
pub(crate) fn json_records(value: Value, keys: &[&str]) -> Result<Vec<Value>, FeedError> {
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut object) => {
            for key in keys {
                match object.remove(*key) {
                    Some(Value::Array(records)) => return Ok(records),
                    Some(Value::Null) | None => {}
                    Some(other) => {
                        return Err(FeedError::format(format!(
                            "expected `{key}` to be an array, found {}",
                            json_type(&other)
                        )));
                    }
                }
            }
            Err(FeedError::format(format!(
                "expected a JSON array or an object with one of {keys:?}"
            )))
        }
        other => Err(FeedError::format(format!(
            "expected a JSON array or object, found {}",
            json_type(&other)
        ))),
    }
}

/// Returns the `features` array of a `GeoJSON` `FeatureCollection`.
pub(crate) fn geojson_features(body: &str) -> Result<Vec<Value>, FeedError> {
    let value: Value = serde_json::from_str(body)?;
    json_records(value, &["features"])
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
