//! Diagnostics snapshot of every configured entry.

use std::collections::BTreeMap;

use aus_emergency_coordinator::{CoordinatorStatus, FeedCoordinator};
use aus_emergency_incident_models::{CapAlert, FeedSnapshot, Incident, Severity, Zone};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::EntrySettings;

/// Full diagnostics document.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    /// When the document was built.
    pub generated_at: DateTime<Utc>,
    /// One section per configured entry.
    pub entries: Vec<EntryDiagnostics>,
}

/// Effective configuration of one entry.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigDiagnostics {
    /// Monitored state.
    pub state: String,
    /// Base poll interval in seconds.
    pub update_interval: u64,
    /// Stale-removal policy.
    pub remove_stale: bool,
    /// Names of monitored zones.
    pub monitored_zones: Vec<String>,
}

/// Counts over the latest snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Incidents in the last successful incident poll.
    pub total_incidents: usize,
    /// Incidents at watch and act or emergency warning.
    pub high_severity_incidents: usize,
    /// Alerts in the last successful CAP poll.
    pub total_cap_alerts: usize,
    /// Incident count per severity; every severity is present.
    pub severity_breakdown: BTreeMap<String, usize>,
}

impl Summary {
    /// Summarizes `incidents` and `alerts`.
    #[must_use]
    pub fn new(incidents: &[Incident], alerts: &[CapAlert]) -> Self {
        let mut severity_breakdown: BTreeMap<String, usize> = Severity::all()
            .iter()
            .map(|severity| (severity.to_string(), 0))
            .collect();
        for incident in incidents {
            *severity_breakdown
                .entry(incident.severity.to_string())
                .or_default() += 1;
        }

        Self {
            total_incidents: incidents.len(),
            high_severity_incidents: incidents.iter().filter(|i| i.severity.is_high()).count(),
            total_cap_alerts: alerts.len(),
            severity_breakdown,
        }
    }
}

/// Short form of one incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidentDigest {
    /// Identity key.
    pub incident_no: String,
    /// Incident type.
    #[serde(rename = "type")]
    pub incident_type: Option<String>,
    /// Normalized severity.
    pub severity: Severity,
    /// Upstream status.
    pub status: Option<String>,
    /// Region.
    pub region: Option<String>,
    /// Location name.
    pub location_name: Option<String>,
    /// Whether both coordinates are known.
    pub has_coordinates: bool,
}

impl From<&Incident> for IncidentDigest {
    fn from(incident: &Incident) -> Self {
        Self {
            incident_no: incident.incident_no.clone(),
            incident_type: incident.incident_type.clone(),
            severity: incident.severity,
            status: incident.status.clone(),
            region: incident.region.clone(),
            location_name: incident.location_name.clone(),
            has_coordinates: incident.position().is_some(),
        }
    }
}

/// Short form of one CAP alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapAlertDigest {
    /// CAP identifier.
    pub id: String,
    /// Event.
    pub event: String,
    /// CAP severity.
    pub severity: String,
    /// Headline.
    pub headline: Option<String>,
    /// Number of areas.
    pub area_count: usize,
}

impl From<&CapAlert> for CapAlertDigest {
    fn from(alert: &CapAlert) -> Self {
        Self {
            id: alert.id.clone(),
            event: alert.event.clone(),
            severity: alert.severity.clone(),
            headline: alert.headline.clone(),
            area_count: alert.areas.len(),
        }
    }
}

/// Diagnostics for one configured entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryDiagnostics {
    /// Effective configuration.
    pub config: ConfigDiagnostics,
    /// Incident coordinator status.
    pub incident_coordinator: CoordinatorStatus,
    /// CAP coordinator status.
    pub cap_coordinator: CoordinatorStatus,
    /// Counts.
    pub summary: Summary,
    /// Incidents from the last successful poll.
    pub incidents: Vec<IncidentDigest>,
    /// CAP alerts from the last successful poll.
    pub cap_alerts: Vec<CapAlertDigest>,
}

impl EntryDiagnostics {
    /// Builds the section from the entry's coordinators.
    #[must_use]
    pub fn new(
        settings: &EntrySettings,
        zones: &[Zone],
        incident_coordinator: &FeedCoordinator,
        cap_coordinator: &FeedCoordinator,
    ) -> Self {
        let incidents = match incident_coordinator.last_snapshot() {
            Some(FeedSnapshot::Incidents(items)) => items.as_slice(),
            _ => &[],
        };
        let alerts = match cap_coordinator.last_snapshot() {
            Some(FeedSnapshot::Alerts(items)) => items.as_slice(),
            _ => &[],
        };

        Self {
            config: ConfigDiagnostics {
                state: settings.state.to_string(),
                update_interval: settings.update_interval.as_secs(),
                remove_stale: settings.remove_stale,
                monitored_zones: zones.iter().map(|zone| zone.name.clone()).collect(),
            },
            incident_coordinator: incident_coordinator.status(),
            cap_coordinator: cap_coordinator.status(),
            summary: Summary::new(incidents, alerts),
            incidents: incidents.iter().map(IncidentDigest::from).collect(),
            cap_alerts: alerts.iter().map(CapAlertDigest::from).collect(),
        }
    }
}
