#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Entity reconciliation.
//!
//! A [`Tracker`] holds one [`TrackedEntity`] per identity key and diffs
//! every successful snapshot against it, producing `created`, `updated`
//! and `removed` [`DomainEvent`]s. Anything that can be tracked implements
//! [`Reconcilable`].

pub mod event;
pub mod tracker;

use aus_emergency_geofence::centroid;
use aus_emergency_incident_models::{AustralianState, CapAlert, Incident};
use sha2::{Digest as _, Sha256};

pub use event::{DomainEvent, EventKind, EventPayload};
pub use tracker::{TrackedEntity, Tracker};

/// A record that can be tracked across polls.
pub trait Reconcilable: Clone {
    /// Entity name used in event names (`aus_emergency_<ENTITY>_created`).
    const ENTITY: &'static str;

    /// State whose feed produced the record.
    fn state(&self) -> AustralianState;

    /// Identity key, stable across polls.
    fn identity(&self) -> &str;

    /// Human-readable title.
    fn title(&self) -> String;

    /// Severity label as published in events.
    fn severity_label(&self) -> String;

    /// Representative `(lat, lon)`, if any.
    fn position(&self) -> Option<(f64, f64)>;

    /// Values whose change counts as an update, in a fixed order.
    fn change_fields(&self) -> Vec<String>;
}

/// Field separator for the change hash.
const SEPARATOR: &str = "\u{1f}";

/// SHA-256 (hex) over [`Reconcilable::change_fields`].
#[must_use]
pub fn change_hash<T: Reconcilable>(item: &T) -> String {
    let mut hasher = Sha256::new();
    for (i, field) in item.change_fields().iter().enumerate() {
        if i > 0 {
            hasher.update(SEPARATOR.as_bytes());
        }
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn optional_text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Reconcilable for Incident {
    const ENTITY: &'static str = "incident";

    fn state(&self) -> AustralianState {
        self.state
    }

    fn identity(&self) -> &str {
        &self.incident_no
    }

    fn title(&self) -> String {
        self.display_name()
    }

    fn severity_label(&self) -> String {
        self.severity.to_string()
    }

    fn position(&self) -> Option<(f64, f64)> {
        Self::position(self)
    }

    fn change_fields(&self) -> Vec<String> {
        vec![
            optional_text(self.status.as_deref()),
            optional_text(self.level.as_deref()),
            optional_text(self.incident_type.as_deref()),
            optional_text(self.message_link.as_deref()),
            optional_number(self.latitude),
            optional_number(self.longitude),
        ]
    }
}

impl Reconcilable for CapAlert {
    const ENTITY: &'static str = "cap_alert";

    fn state(&self) -> AustralianState {
        self.state
    }

    fn identity(&self) -> &str {
        &self.id
    }

    fn title(&self) -> String {
        self.display_name()
    }

    fn severity_label(&self) -> String {
        self.severity.clone()
    }

    fn position(&self) -> Option<(f64, f64)> {
        centroid(&self.areas)
    }

    fn change_fields(&self) -> Vec<String> {
        let (lat, lon) = self.position().unzip();
        vec![
            optional_text(self.headline.as_deref()),
            self.severity.clone(),
            self.urgency.clone(),
            self.certainty.clone(),
            self.event.clone(),
            optional_text(self.expires.as_deref()),
            optional_number(lat),
            optional_number(lon),
        ]
    }
}
