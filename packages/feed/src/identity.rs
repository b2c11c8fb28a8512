//! Incident identity keys.
//!
//! Upstream ids are used as-is. Records without one get a synthesized key
//! derived from `(location_name, date, time)`. The key is a pure function
//! of that tuple, so the same record seen on consecutive polls maps to the
//! same entity. Two different incidents sharing all three values collide
//! and are tracked as one.

use aus_emergency_incident_models::Incident;
use sha2::{Digest as _, Sha256};

/// Length of a synthesized key, in hex characters.
const SYNTHESIZED_KEY_LEN: usize = 16;

/// Field separator that cannot appear in feed text.
const SEPARATOR: char = '\u{1f}';

/// Synthesizes a deterministic incident key from location, date and time.
#[must_use]
pub fn synthesize_incident_no(location_name: &str, date: &str, time: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(location_name.trim().as_bytes());
    hasher.update(SEPARATOR.to_string().as_bytes());
    hasher.update(date.trim().as_bytes());
    hasher.update(SEPARATOR.to_string().as_bytes());
    hasher.update(time.trim().as_bytes());

    let mut key = hex::encode(hasher.finalize());
    key.truncate(SYNTHESIZED_KEY_LEN);
    key
}

/// Ensures `incident` has an identity key.
///
/// Fills `date` / `time` from the parsed datetime when the feed did not
/// publish them separately, then synthesizes `incident_no` if it is empty.
pub fn assign_identity(incident: &mut Incident) {
    if let Some(dt) = incident.incident_datetime {
        if incident.date.is_none() {
            incident.date = Some(dt.format("%d/%m/%Y").to_string());
        }
        if incident.time.is_none() {
            incident.time = Some(dt.format("%H:%M").to_string());
        }
    }

    let trimmed = incident.incident_no.trim();
    if trimmed.is_empty() {
        incident.incident_no = synthesize_incident_no(
            incident.location_name.as_deref().unwrap_or("unknown"),
            incident.date.as_deref().unwrap_or_default(),
            incident.time.as_deref().unwrap_or_default(),
        );
        incident.synthesized_id = true;
    } else if trimmed.len() != incident.incident_no.len() {
        incident.incident_no = trimmed.to_string();
    }
}
