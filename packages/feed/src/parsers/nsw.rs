//! NSW RFS major incidents `GeoJSON`.
//!
//! Most attributes live in the HTML `description` as `KEY: value<br />`
//! pairs. `alertLevel` (or `category`) is the Australian Warning System
//! level.

use aus_emergency_incident_models::{AustralianState, Incident};
use geojson::Feature;

use super::geometry::{decode_feature, feature_id, feature_position};
use super::{finish, geojson_features};
use crate::FeedError;
use crate::parsing::{labeled_fields, parse_datetime, strip_tags, value_as_text};
use crate::severity::nsw_severity;

/// Parses an NSW RFS payload.
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

fn property(feature: &Feature, key: &str) -> Option<String> {
    feature.property(key).and_then(value_as_text)
}

fn incident(state: AustralianState, feature: &Feature) -> Incident {
    let description = property(feature, "description").unwrap_or_default();
    let fields = labeled_fields(&description);
    let field = |key: &str| fields.get(key).cloned();

    let mut incident = Incident::new(state);

    incident.incident_no = property(feature, "guid")
        .or_else(|| feature_id(feature))
        .unwrap_or_default();
    incident.location_name = property(feature, "title").or_else(|| field("location"));
    incident.level = property(feature, "alertLevel")
        .or_else(|| property(feature, "category"))
        .or_else(|| field("alert level"));
    incident.status = field("status");
    incident.incident_type = field("type");
    incident.region = field("council area");
    incident.agency = field("responsible agency");
    incident.message_link = property(feature, "link");
    incident.message = Some(strip_tags(&description)).filter(|m| !m.is_empty());

    incident.severity = nsw_severity(incident.level.as_deref(), incident.status.as_deref());

    incident.incident_datetime = property(feature, "pubDate")
        .as_deref()
        .and_then(parse_datetime)
        .or_else(|| field("updated").as_deref().and_then(parse_datetime));

    if let Some((lat, lon)) = feature_position(feature) {
        incident.latitude = Some(lat);
        incident.longitude = Some(lon);
    }

    incident
}

#[cfg(test)]
mod tests {
    use aus_emergency_incident_models::Severity;

    use super::*;

    const PAYLOAD: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {"type": "Point", "coordinates": [150.69, -33.47]},
                        {"type": "Polygon", "coordinates": [[[150.6, -33.4], [150.8, -33.4], [150.8, -33.5], [150.6, -33.4]]]}
                    ]
                },
                "properties": {
                    "title": "Smiths Rd, Kurrajong",
                    "link": "https://www.rfs.nsw.gov.au/fire-information/fires-near-me",
                    "category": "Advice",
                    "guid": "https://incidents.rfs.nsw.gov.au/api/v1/incidents/555001",
                    "pubDate": "14/10/2025 9:24:00 AM",
                    "description": "ALERT LEVEL: Advice <br />LOCATION: Smiths Rd, Kurrajong <br />COUNCIL AREA: Hawkesbury <br />STATUS: Being controlled <br />TYPE: Bush Fire <br />FIRE: Yes <br />SIZE: 12 ha <br />RESPONSIBLE AGENCY: Rural Fire Service <br />UPDATED: 14 Oct 2025 09:20"
                }
            },
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[151.0, -32.0], [151.2, -32.0], [151.2, -32.2], [151.0, -32.0]]]},
                "properties": {
                    "title": "Wollombi",
                    "alertLevel": "Not Applicable",
                    "guid": "555002",
                    "description": "STATUS: Under control <br />TYPE: Grass Fire"
                }
            },
            {"type": "Feature", "geometry": {"type": "Point"}, "properties": {}}
        ]
    }"#;

    #[test]
    fn parses_features_and_description_fields() {
        let incidents = parse(AustralianState::Nsw, PAYLOAD).unwrap();
        assert_eq!(incidents.len(), 2);

        let first = &incidents[0];
        assert_eq!(
            first.incident_no,
            "https://incidents.rfs.nsw.gov.au/api/v1/incidents/555001"
        );
        assert_eq!(first.position(), Some((-33.47, 150.69)));
        assert_eq!(first.level.as_deref(), Some("Advice"));
        assert_eq!(first.severity, Severity::Advice);
        assert_eq!(first.status.as_deref(), Some("Being controlled"));
        assert_eq!(first.incident_type.as_deref(), Some("Bush Fire"));
        assert_eq!(first.region.as_deref(), Some("Hawkesbury"));
        assert_eq!(first.agency.as_deref(), Some("Rural Fire Service"));
        assert_eq!(
            first.incident_datetime.map(|dt| dt.to_string()).as_deref(),
            Some("2025-10-14 09:24:00")
        );

        let second = &incidents[1];
        assert_eq!(second.incident_no, "555002");
        assert_eq!(second.severity, Severity::Info);
        let (lat, lon) = second.position().unwrap();
        assert!((lat - -32.05).abs() < 1e-9);
        assert!((lon - 151.1).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_collections() {
        assert!(parse(AustralianState::Nsw, "[1, 2]").is_ok());
        assert!(parse(AustralianState::Nsw, r#"{"type": "Feature"}"#).is_err());
        assert!(parse(AustralianState::Nsw, "<xml/>").is_err());
    }
}
