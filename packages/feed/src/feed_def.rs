//! Config-driven feed definition.
//!
//! A [`FeedDefinition`] captures everything unique about one state's
//! feeds: where to fetch them, which normalizer understands the payload,
//! and the descriptive metadata reported alongside the entities.

use aus_emergency_incident_models::AustralianState;
use serde::{Deserialize, Serialize};

/// Wire format of a state's incident feed, selecting the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFormat {
    /// SA CFS CRIIMSON JSON array.
    SaJson,
    /// NSW RFS major incidents `GeoJSON`.
    NswGeojson,
    /// Emergency Management Victoria incident JSON.
    VicJson,
    /// Queensland bushfire alerts `GeoJSON`.
    QldGeojson,
    /// Tasmania Fire Service RSS 2.0 with `GeoRSS` points.
    TasGeorss,
    /// Emergency WA incidents JSON plus a separate warnings JSON.
    WaJson,
}

/// One state's feed endpoints and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDefinition {
    /// State served by this feed.
    pub state: AustralianState,
    /// Source slug used to build entity ids (e.g. `"sa_cfs"`).
    pub source: String,
    /// Human-readable publisher name.
    pub name: String,
    /// Device manufacturer reported for the state's entities.
    pub manufacturer: String,
    /// Device model reported for the state's entities.
    pub model: String,
    /// Incident feed wire format.
    pub format: FeedFormat,
    /// Incident feed URL.
    pub incidents_url: String,
    /// Separate warnings feed URL (WA only).
    #[serde(default)]
    pub warnings_url: Option<String>,
    /// CAP 1.2 feed URL, if the state publishes one.
    #[serde(default)]
    pub cap_url: Option<String>,
}

impl FeedDefinition {
    /// Device name shown for the state's entities.
    #[must_use]
    pub fn device_name(&self) -> String {
        format!("Australian Emergency ({})", self.state)
    }
}

/// Parses a feed definition from TOML.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or missing required fields.
pub fn parse_feed_toml(toml_str: &str) -> Result<FeedDefinition, toml::de::Error> {
    toml::from_str(toml_str)
}
