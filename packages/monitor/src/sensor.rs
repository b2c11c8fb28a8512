//! Per-state "active incidents" summary.

use aus_emergency_feed::feed_def::FeedDefinition;
use aus_emergency_incident_models::{Incident, Severity};
use serde::Serialize;

use crate::pipeline::EntityView;

/// Device the state's entities are grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Stable device identifier (the feed source slug).
    pub identifier: String,
    /// `"Australian Emergency (<STATE>)"`.
    pub name: String,
    /// Publishing agency.
    pub manufacturer: String,
    /// Feed model.
    pub model: String,
}

impl From<&FeedDefinition> for DeviceInfo {
    fn from(definition: &FeedDefinition) -> Self {
        Self {
            identifier: definition.source.clone(),
            name: definition.device_name(),
            manufacturer: definition.manufacturer.clone(),
            model: definition.model.clone(),
        }
    }
}

/// One incident as listed by the sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveIncident {
    /// Agency incident number.
    pub incident_no: String,
    /// Incident type, e.g. `"Grass Fire"`.
    #[serde(rename = "type")]
    pub incident_type: Option<String>,
    /// Agency status, e.g. `"Going"`.
    pub status: Option<String>,
    /// Raw warning level as published.
    pub level: Option<String>,
    /// Normalized severity.
    pub severity: Severity,
    /// Suburb or locality.
    pub location_name: Option<String>,
    /// Agency region.
    pub region: Option<String>,
    /// Local date as published.
    pub date: Option<String>,
    /// Local time as published.
    pub time: Option<String>,
    /// Link to the agency's incident page.
    pub message_link: Option<String>,
    /// Responding agency.
    pub agency: Option<String>,
    /// WGS84 latitude.
    pub latitude: Option<f64>,
    /// WGS84 longitude.
    pub longitude: Option<f64>,
}

impl From<&Incident> for ActiveIncident {
    fn from(incident: &Incident) -> Self {
        Self {
            incident_no: incident.incident_no.clone(),
            incident_type: incident.incident_type.clone(),
            status: incident.status.clone(),
            level: incident.level.clone(),
            severity: incident.severity,
            location_name: incident.location_name.clone(),
            region: incident.region.clone(),
            date: incident.date.clone(),
            time: incident.time.clone(),
            message_link: incident.message_link.clone(),
            agency: incident.agency.clone(),
            latitude: incident.latitude,
            longitude: incident.longitude,
        }
    }
}

/// Count of currently available incidents for one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveIncidentsSensor {
    /// `"<source>_active_incidents"`.
    pub unique_id: String,
    /// Display name.
    pub name: String,
    /// Number of available incidents.
    pub value: usize,
    /// Feed source slug.
    pub source: String,
    /// The available incidents.
    pub incidents: Vec<ActiveIncident>,
    /// Owning device.
    pub device: DeviceInfo,
}

impl ActiveIncidentsSensor {
    /// Builds the sensor from tracked incidents; unavailable ones are left out.
    #[must_use]
    pub fn new(definition: &FeedDefinition, tracked: &[EntityView<Incident>]) -> Self {
        let incidents: Vec<ActiveIncident> = tracked
            .iter()
            .filter(|view| view.available)
            .map(|view| ActiveIncident::from(&view.item))
            .collect();

        Self {
            unique_id: format!("{}_active_incidents", definition.source),
            name: "Active incidents".to_string(),
            value: incidents.len(),
            source: definition.source.clone(),
            incidents,
            device: DeviceInfo::from(definition),
        }
    }
}

#[cfg(test)]
mod tests {
    use aus_emergency_feed::registry::feed_for;
    use aus_emergency_incident_models::AustralianState;
    use chrono::Utc;

    use super::*;

    fn view(no: &str, available: bool) -> EntityView<Incident> {
        let mut item = Incident::new(AustralianState::Sa);
        item.incident_no = no.to_string();
        EntityView {
            unique_id: format!("sa_cfs_{no}"),
            item,
            first_seen: Utc::now(),
            last_seen: Utc::now(),
            last_changed: Utc::now(),
            duration_minutes: 0,
            in_zone: Vec::new(),
            available,
        }
    }

    #[test]
    fn counts_only_available_incidents() {
        let definition = feed_for(AustralianState::Sa).unwrap();
        let sensor =
            ActiveIncidentsSensor::new(&definition, &[view("1", true), view("2", false)]);

        assert_eq!(sensor.value, 1);
        assert_eq!(sensor.incidents[0].incident_no, "1");
        assert_eq!(sensor.unique_id, "sa_cfs_active_incidents");
        assert_eq!(sensor.device.name, "Australian Emergency (SA)");
        assert_eq!(sensor.device.manufacturer, "SA CFS / SES");
        assert_eq!(sensor.device.model, "CRIIMSON Feed");
    }

    #[test]
    fn incident_type_serializes_as_type() {
        let mut incident = Incident::new(AustralianState::Sa);
        incident.incident_no = "2110123".to_string();
        incident.incident_type = Some("Grass Fire".to_string());

        let json = serde_json::to_value(ActiveIncident::from(&incident)).unwrap();
        assert_eq!(json["type"], "Grass Fire");
        assert_eq!(json["incident_no"], "2110123");
        assert!(json.get("incident_type").is_none());
    }
}
