//! WA DFES incidents and warnings JSON.
//!
//! DFES publishes incidents (`{"incidents": [...]}`) and public warnings
//! (`{"warnings": [...]}`) as two documents. Warnings become incidents of
//! kind [`IncidentKind::Warning`]. A warning that names an incident of the
//! same poll through `incidentId` also escalates that incident's level.

use std::collections::BTreeMap;

use aus_emergency_incident_models::{AustralianState, Incident, IncidentKind, Severity};
use serde_json::{Map, Value};

use super::{finish, json_records};
use crate::FeedError;
use crate::parsing::{lat_lon_fields, parse_datetime, text_field};
use crate::severity::{classify, warning_level};

/// Prefix applied to warning ids so they never collide with incident ids.
const WARNING_ID_PREFIX: &str = "warning-";

/// Parses a WA DFES incidents payload plus the optional warnings payload.
///
/// A malformed warnings document is logged and ignored; the incidents are
/// still returned.
///
/// # Errors
///
/// Returns [`FeedError`] if the incidents document is malformed.
pub fn parse(
    state: AustralianState,
    body: &str,
    warnings: Option<&str>,
) -> Result<Vec<Incident>, FeedError> {
    let value: Value = serde_json::from_str(body)?;
    let mut incidents: Vec<Incident> = objects(state, json_records(value, &["incidents"])?)
        .map(|object| finish(incident(state, &object)))
        .collect();

    let Some(warnings) = warnings else {
        return Ok(incidents);
    };

    let warnings = match parse_warnings(state, warnings) {
        Ok(warnings) => warnings,
        Err(e) => {
            log::warn!("{state}: ignoring malformed warnings payload: {e}");
            return Ok(incidents);
        }
    };

    let index: BTreeMap<String, usize> = incidents
        .iter()
        .enumerate()
        .map(|(i, incident)| (incident.incident_no.clone(), i))
        .collect();

    for (linked_incident, warning) in &warnings {
        let Some(&i) = linked_incident.as_ref().and_then(|id| index.get(id)) else {
            continue;
        };
        escalate(&mut incidents[i], warning);
    }

    incidents.extend(warnings.into_iter().map(|(_, warning)| warning));

    Ok(incidents)
}

/// Parses the warnings document into `(linked incident id, warning)`
/// pairs.
fn parse_warnings(
    state: AustralianState,
    body: &str,
) -> Result<Vec<(Option<String>, Incident)>, FeedError> {
    let value: Value = serde_json::from_str(body)?;
    Ok(objects(state, json_records(value, &["warnings"])?)
        .map(|object| {
            let linked = text_field(&object, &["incidentId", "incident_id"]);
            (linked, finish(warning(state, &object)))
        })
        .collect())
}

fn objects(
    state: AustralianState,
    records: Vec<Value>,
) -> impl Iterator<Item = Map<String, Value>> {
    records.into_iter().filter_map(move |record| match record {
        Value::Object(object) => Some(object),
        other => {
            log::debug!("{state}: skipping non-object record: {other}");
            None
        }
    })
}

fn escalate(incident: &mut Incident, warning: &Incident) {
    if warning.severity.rank() <= incident.severity.rank() {
        return;
    }
    log::debug!(
        "{}: warning {} escalates incident {} to {}",
        incident.state,
        warning.incident_no,
        incident.incident_no,
        warning.severity
    );
    incident.level.clone_from(&warning.level);
    incident.severity = warning.severity;
}

fn incident(state: AustralianState, object: &Map<String, Value>) -> Incident {
    let mut incident = Incident::new(state);

    incident.incident_no =
        text_field(object, &["id", "incidentId", "incidentNumber"]).unwrap_or_default();
    incident.incident_type = text_field(object, &["incidentType", "type"]);
    incident.status = text_field(object, &["status", "incidentStatus"]);
    incident.level = text_field(object, &["alertLevel", "level"]);
    incident.location_name = text_field(object, &["suburb", "location", "locationName"]);
    incident.region = text_field(object, &["lga", "region"]);
    incident.message = text_field(object, &["description", "message"]);
    incident.message_link = text_field(object, &["url", "link"]);
    incident.resources = text_field(object, &["resources"]);
    incident.agency = text_field(object, &["agency"]);

    incident.severity = classify(
        incident.level.as_deref().unwrap_or_default(),
        incident.status.as_deref().unwrap_or_default(),
    );

    incident.incident_datetime = text_field(object, &["startTime", "updatedTime", "lastUpdated"])
        .as_deref()
        .and_then(parse_datetime);

    set_position(&mut incident, object);

    incident
}

fn warning(state: AustralianState, object: &Map<String, Value>) -> Incident {
    let mut warning = Incident::new(state);
    warning.kind = IncidentKind::Warning;

    if let Some(id) = text_field(object, &["id", "warningId"]) {
        warning.incident_no = format!("{WARNING_ID_PREFIX}{id}");
    }
    warning.level = text_field(object, &["warningLevel", "alertLevel", "level"]);
    warning.status = text_field(object, &["status"]);
    warning.incident_type = text_field(object, &["incidentType", "hazardType", "type"]);
    warning.message = text_field(object, &["title", "headline"]);
    warning.location_name = text_field(object, &["suburb", "location", "area"]);
    warning.region = text_field(object, &["lga", "region"]);
    warning.message_link = text_field(object, &["url", "link"]);
    warning.agency = text_field(object, &["agency"]);

    warning.severity = warning_severity(warning.level.as_deref(), warning.status.as_deref());

    warning.incident_datetime =
        text_field(object, &["publishedTime", "issuedTime", "updatedTime"])
            .as_deref()
            .and_then(parse_datetime);

    set_position(&mut warning, object);

    warning
}

fn warning_severity(level: Option<&str>, status: Option<&str>) -> Severity {
    level
        .and_then(warning_level)
        .unwrap_or_else(|| classify(level.unwrap_or_default(), status.unwrap_or_default()))
}

fn set_position(incident: &mut Incident, object: &Map<String, Value>) {
    if let Some((lat, lon)) =
        lat_lon_fields(object, &["lat", "latitude"], &["lng", "lon", "longitude"])
    {
        incident.latitude = Some(lat);
        incident.longitude = Some(lon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INCIDENTS: &str = r#"{"incidents": [
        {
            "id": "DFES-1001",
            "incidentType": "Bushfire",
            "status": "Not yet controlled",
            "alertLevel": "Advice",
            "suburb": "Gidgegannup",
            "lga": "Mundaring",
            "lat": "-31.79",
            "lng": "116.20",
            "startTime": "2025-10-14 10:05:00"
        },
        {
            "id": "DFES-1002",
            "incidentType": "Bushfire",
            "status": "Contained",
            "suburb": "Collie",
            "lat": -33.36,
            "lng": 116.15
        }
    ]}"#;

    const WARNINGS: &str = r#"{"warnings": [
        {
            "id": "W-77",
            "incidentId": "DFES-1001",
            "warningLevel": "Emergency Warning",
            "title": "Bushfire Emergency Warning for Gidgegannup",
            "suburb": "Gidgegannup",
            "lat": -31.80,
            "lng": 116.21,
            "publishedTime": "2025-10-14T11:00:00+08:00"
        },
        {
            "id": "W-78",
            "incidentId": "DFES-1002",
            "warningLevel": "Advice",
            "title": "Bushfire Advice for Collie"
        },
        "noise"
    ]}"#;

    #[test]
    fn parses_incidents_without_warnings() {
        let incidents = parse(AustralianState::Wa, INCIDENTS, None).unwrap();
        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[0].position(), Some((-31.79, 116.20)));
        assert_eq!(incidents[0].severity, Severity::Advice);
        assert_eq!(incidents[1].severity, Severity::Info);
    }

    #[test]
    fn warnings_become_incidents_and_escalate_linked_ones() {
        let incidents = parse(AustralianState::Wa, INCIDENTS, Some(WARNINGS)).unwrap();
        assert_eq!(incidents.len(), 4);

        let escalated = &incidents[0];
        assert_eq!(escalated.severity, Severity::EmergencyWarning);
        assert_eq!(escalated.level.as_deref(), Some("Emergency Warning"));

        // Advice on an Info incident also escalates.
        assert_eq!(incidents[1].severity, Severity::Advice);

        let warning = &incidents[2];
        assert_eq!(warning.kind, IncidentKind::Warning);
        assert_eq!(warning.incident_no, "warning-W-77");
        assert_eq!(
            warning.message.as_deref(),
            Some("Bushfire Emergency Warning for Gidgegannup")
        );
        assert_eq!(warning.position(), Some((-31.80, 116.21)));
    }

    #[test]
    fn warnings_never_downgrade() {
        let warnings = r#"{"warnings": [{"id": "W-1", "incidentId": "DFES-1001", "warningLevel": "Advice"}]}"#;
        let incidents = parse(
            AustralianState::Wa,
            &INCIDENTS.replace("\"Advice\"", "\"Watch and Act\""),
            Some(warnings),
        )
        .unwrap();
        assert_eq!(incidents[0].severity, Severity::WatchAndAct);
    }

    #[test]
    fn malformed_warnings_are_ignored() {
        let incidents = parse(AustralianState::Wa, INCIDENTS, Some("<html>")).unwrap();
        assert_eq!(incidents.len(), 2);
        assert!(parse(AustralianState::Wa, "{}", None).is_err());
    }
}
