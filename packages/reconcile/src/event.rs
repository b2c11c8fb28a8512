//! Lifecycle events emitted by a [`crate::Tracker`].

use aus_emergency_incident_models::AustralianState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// What happened to a tracked entity.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum EventKind {
    /// First sighting.
    Created,
    /// Change-hash differs from the previous sighting, or the entity
    /// reappeared after being unavailable.
    Updated,
    /// No longer present in the feed.
    Removed,
}

/// Entity snapshot carried by every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Source state.
    pub state: AustralianState,
    /// Feed source slug (e.g. `"sa_cfs"`).
    pub source: String,
    /// `"<source>_<identity>"`, lowercased.
    pub unique_id: String,
    /// Identity key (incident number or CAP identifier).
    pub identity: String,
    /// Display title.
    pub title: String,
    /// Severity label.
    pub severity: String,
    /// Latitude, if known.
    pub latitude: Option<f64>,
    /// Longitude, if known.
    pub longitude: Option<f64>,
    /// First observation.
    pub first_seen: DateTime<Utc>,
    /// Most recent observation.
    pub last_seen: DateTime<Utc>,
    /// Most recent change-hash change.
    pub last_changed: DateTime<Utc>,
    /// Minutes since first observation.
    pub duration_minutes: i64,
    /// Hex SHA-256 over the tracked fields.
    pub change_hash: String,
    /// Names of monitored zones containing the entity.
    pub in_zone: Vec<String>,
    /// Whether the entity is currently reported by a healthy feed.
    pub available: bool,
    /// Whether the entity was deleted rather than marked unavailable.
    pub deleted: bool,
}

/// A named lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Event name, e.g. `aus_emergency_incident_created`.
    pub event_type: String,
    /// Lifecycle transition.
    pub kind: EventKind,
    /// Entity snapshot at the time of the event.
    pub payload: EventPayload,
}

impl DomainEvent {
    /// Builds an event named `aus_emergency_<entity>_<kind>`.
    #[must_use]
    pub fn new(entity: &str, kind: EventKind, payload: EventPayload) -> Self {
        Self {
            event_type: event_name(entity, kind),
            kind,
            payload,
        }
    }
}

/// `aus_emergency_<entity>_<kind>`.
#[must_use]
pub fn event_name(entity: &str, kind: EventKind) -> String {
    format!("aus_emergency_{entity}_{kind}")
}
