#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalized emergency incident and CAP alert types.
//!
//! Every state feed (SA, NSW, VIC, QLD, TAS, WA) produces [`Incident`]
//! records that conform to this one schema, and every CAP feed produces
//! [`CapAlert`] records. A single successful poll is carried around as a
//! [`FeedSnapshot`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// An Australian state or territory with a supported emergency feed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum AustralianState {
    /// South Australia
    Sa,
    /// New South Wales
    Nsw,
    /// Victoria
    Vic,
    /// Queensland
    Qld,
    /// Tasmania
    Tas,
    /// Western Australia
    Wa,
}

impl AustralianState {
    /// Returns all supported states.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Sa, Self::Nsw, Self::Vic, Self::Qld, Self::Tas, Self::Wa]
    }

    /// Returns the full state name.
    #[must_use]
    pub const fn full_name(self) -> &'static str {
        match self {
            Self::Sa => "South Australia",
            Self::Nsw => "New South Wales",
            Self::Vic => "Victoria",
            Self::Qld => "Queensland",
            Self::Tas => "Tasmania",
            Self::Wa => "Western Australia",
        }
    }
}

/// Normalized warning severity, shared by every state feed.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    /// General information, no action required
    #[default]
    Info,
    /// Advice: stay informed
    Advice,
    /// Watch and Act: conditions are changing, act now
    WatchAndAct,
    /// Emergency Warning: highest level, immediate danger
    EmergencyWarning,
    /// All clear / safe
    AllClear,
}

impl Severity {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Info,
            Self::Advice,
            Self::WatchAndAct,
            Self::EmergencyWarning,
            Self::AllClear,
        ]
    }

    /// Whether this severity counts as "high" for summaries
    /// (watch and act or emergency warning).
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::WatchAndAct | Self::EmergencyWarning)
    }

    /// Warning escalation rank. Info and all clear share the lowest rank.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Info | Self::AllClear => 0,
            Self::Advice => 1,
            Self::WatchAndAct => 2,
            Self::EmergencyWarning => 3,
        }
    }
}

/// Which kind of feed a coordinator polls.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeedKind {
    /// The state's incident feed (JSON, `GeoJSON` or `GeoRSS`)
    Incidents,
    /// The state's CAP 1.2 alert feed
    Cap,
}

/// Whether a normalized record came from an incident list or a warning list.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentKind {
    /// A reported incident
    #[default]
    Incident,
    /// A public warning (WA publishes these separately from incidents)
    Warning,
}

/// One reported emergency event, normalized from any state feed.
///
/// Coordinates are optional: some records only carry a locality name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// State whose feed reported this incident.
    pub state: AustralianState,
    /// Identity key. Upstream id when present, otherwise synthesized.
    pub incident_no: String,
    /// Whether [`Self::incident_no`] was synthesized from location/date/time.
    pub synthesized_id: bool,
    /// Incident or warning.
    pub kind: IncidentKind,
    /// Incident type (e.g. "Grass Fire", "Bushfire").
    #[serde(rename = "type")]
    pub incident_type: Option<String>,
    /// Operational status (e.g. "Going", "Contained", "Safe").
    pub status: Option<String>,
    /// Upstream alert level text.
    pub level: Option<String>,
    /// Normalized severity.
    pub severity: Severity,
    /// Region, district, council area or territory.
    pub region: Option<String>,
    /// Locality or descriptive location.
    pub location_name: Option<String>,
    /// Upstream date text (as published).
    pub date: Option<String>,
    /// Upstream time text (as published).
    pub time: Option<String>,
    /// Parsed incident start/publish time, in the publisher's local time.
    pub incident_datetime: Option<NaiveDateTime>,
    /// Free-text message.
    pub message: Option<String>,
    /// Link to the full message or warning page.
    pub message_link: Option<String>,
    /// Resources assigned (count or description).
    pub resources: Option<String>,
    /// Aircraft assigned.
    pub aircraft: Option<String>,
    /// Responsible agency.
    pub agency: Option<String>,
    /// Latitude (WGS84).
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    pub longitude: Option<f64>,
}

impl Incident {
    /// Creates an empty incident for `state` with no identity yet.
    #[must_use]
    pub const fn new(state: AustralianState) -> Self {
        Self {
            state,
            incident_no: String::new(),
            synthesized_id: false,
            kind: IncidentKind::Incident,
            incident_type: None,
            status: None,
            level: None,
            severity: Severity::Info,
            region: None,
            location_name: None,
            date: None,
            time: None,
            incident_datetime: None,
            message: None,
            message_link: None,
            resources: None,
            aircraft: None,
            agency: None,
            latitude: None,
            longitude: None,
        }
    }

    /// Returns `(latitude, longitude)` when both are known.
    #[must_use]
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    /// Human-readable name: `"<type> - <location> - <agency>"`, skipping
    /// missing parts.
    #[must_use]
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [
            self.incident_type.as_deref(),
            self.location_name.as_deref(),
            self.agency.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();

        if parts.is_empty() {
            format!("{} Emergency Incident", self.state)
        } else {
            parts.join(" - ")
        }
    }

    /// Entity state value: the status, falling back to the level.
    #[must_use]
    pub fn state_value(&self) -> Option<&str> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.level.as_deref())
    }
}

/// One `<area>` of a CAP alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapArea {
    /// `<areaDesc>` text.
    pub area_desc: Option<String>,
    /// Raw `<polygon>` strings (`"lat,lon lat,lon ..."`).
    pub polygons: Vec<String>,
    /// Raw `<circle>` strings (`"lat,lon radius"`).
    pub circles: Vec<String>,
}

/// An OASIS CAP 1.2 alert (first `<info>` block only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapAlert {
    /// State whose CAP feed published the alert.
    pub state: AustralianState,
    /// CAP `<identifier>`.
    pub id: String,
    /// Affected areas.
    pub areas: Vec<CapArea>,
    /// `<headline>`.
    pub headline: Option<String>,
    /// `<description>`.
    pub description: Option<String>,
    /// `<instruction>`.
    pub instruction: Option<String>,
    /// `<severity>` (`"Unknown"` when absent).
    pub severity: String,
    /// `<urgency>` (`"Unknown"` when absent).
    pub urgency: String,
    /// `<certainty>` (`"Unknown"` when absent).
    pub certainty: String,
    /// `<event>` (`"Unknown"` when absent).
    pub event: String,
    /// `<effective>` timestamp text.
    pub effective: Option<String>,
    /// `<expires>` timestamp text.
    pub expires: Option<String>,
}

impl CapAlert {
    /// Human-readable name: the headline, else the event.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.headline
            .as_deref()
            .filter(|s| !s.is_empty())
            .map_or_else(|| self.event.clone(), str::to_string)
    }
}

/// A monitored circular zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone name reported in `in_zone`.
    pub name: String,
    /// Center latitude (WGS84).
    pub latitude: f64,
    /// Center longitude (WGS84).
    pub longitude: f64,
    /// Radius in meters.
    pub radius: f64,
}

/// The normalized result of one successful poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSnapshot {
    /// Output of an incident feed.
    Incidents(Vec<Incident>),
    /// Output of a CAP feed.
    Alerts(Vec<CapAlert>),
}

impl FeedSnapshot {
    /// Number of records in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Incidents(items) => items.len(),
            Self::Alerts(items) => items.len(),
        }
    }

    /// Whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The feed kind that produces this snapshot shape.
    #[must_use]
    pub const fn kind(&self) -> FeedKind {
        match self {
            Self::Incidents(_) => FeedKind::Incidents,
            Self::Alerts(_) => FeedKind::Cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn state_codes_parse_case_insensitively() {
        assert_eq!(
            AustralianState::from_str("nsw").unwrap(),
            AustralianState::Nsw
        );
        assert_eq!(AustralianState::from_str("SA").unwrap(), AustralianState::Sa);
        assert!(AustralianState::from_str("NT").is_err());
        assert_eq!(AustralianState::Qld.to_string(), "QLD");
    }

    #[test]
    fn severity_serializes_snake_case() {
        assert_eq!(Severity::WatchAndAct.to_string(), "watch_and_act");
        assert_eq!(
            serde_json::to_string(&Severity::EmergencyWarning).unwrap(),
            "\"emergency_warning\""
        );
        assert!(Severity::EmergencyWarning.is_high());
        assert!(!Severity::AllClear.is_high());
    }

    #[test]
    fn severity_rank_orders_escalation() {
        assert!(Severity::EmergencyWarning.rank() > Severity::WatchAndAct.rank());
        assert!(Severity::WatchAndAct.rank() > Severity::Advice.rank());
        assert_eq!(Severity::Info.rank(), Severity::AllClear.rank());
    }

    #[test]
    fn display_name_skips_missing_parts() {
        let mut incident = Incident::new(AustralianState::Sa);
        assert_eq!(incident.display_name(), "SA Emergency Incident");

        incident.incident_type = Some("Grass Fire".to_string());
        incident.agency = Some("CFS".to_string());
        assert_eq!(incident.display_name(), "Grass Fire - CFS");

        incident.location_name = Some("Mount Barker".to_string());
        assert_eq!(incident.display_name(), "Grass Fire - Mount Barker - CFS");
    }

    #[test]
    fn state_value_falls_back_to_level() {
        let mut incident = Incident::new(AustralianState::Vic);
        incident.level = Some("Advice".to_string());
        assert_eq!(incident.state_value(), Some("Advice"));
        incident.status = Some("Going".to_string());
        assert_eq!(incident.state_value(), Some("Going"));
    }

    #[test]
    fn incident_type_serializes_as_type() {
        let mut incident = Incident::new(AustralianState::Tas);
        incident.incident_type = Some("Bushfire".to_string());
        let json = serde_json::to_value(&incident).unwrap();
        assert_eq!(json["type"], "Bushfire");
        assert_eq!(json["state"], "TAS");
    }
}
