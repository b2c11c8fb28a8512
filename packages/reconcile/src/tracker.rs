//! Tracked entity map and the snapshot diff.

use std::collections::{BTreeMap, BTreeSet};

use aus_emergency_geofence::zones_containing;
use aus_emergency_incident_models::{AustralianState, Zone};
use chrono::{DateTime, Utc};

use crate::event::{DomainEvent, EventKind, EventPayload};
use crate::{Reconcilable, change_hash};

/// One tracked record with its observation metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntity<T> {
    /// Latest version of the record.
    pub item: T,
    /// `"<source>_<identity>"`, lowercased.
    pub unique_id: String,
    /// First observation.
    pub first_seen: DateTime<Utc>,
    /// Most recent observation.
    pub last_seen: DateTime<Utc>,
    /// Most recent change-hash change.
    pub last_changed: DateTime<Utc>,
    /// Hash over the tracked fields.
    pub change_hash: String,
    /// Monitored zones containing the record's position.
    pub in_zone: Vec<String>,
    /// Present in the most recent successful poll.
    pub available: bool,
}

impl<T> TrackedEntity<T> {
    /// Whole minutes elapsed since first observation.
    #[must_use]
    pub fn duration_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.first_seen).num_minutes().max(0)
    }
}

/// Diffs successive snapshots of one feed into lifecycle events.
#[derive(Debug, Clone)]
pub struct Tracker<T> {
    state: AustralianState,
    source: String,
    zones: Vec<Zone>,
    remove_stale: bool,
    feed_healthy: bool,
    entities: BTreeMap<String, TrackedEntity<T>>,
}

impl<T: Reconcilable> Tracker<T> {
    /// Creates an empty tracker.
    ///
    /// With `remove_stale`, records missing from a successful poll are
    /// deleted; otherwise they are kept and marked unavailable.
    #[must_use]
    pub fn new(
        state: AustralianState,
        source: impl Into<String>,
        zones: Vec<Zone>,
        remove_stale: bool,
    ) -> Self {
        Self {
            state,
            source: source.into(),
            zones,
            remove_stale,
            feed_healthy: true,
            entities: BTreeMap::new(),
        }
    }

    /// Source slug used in unique ids.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of tracked entities (available or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Records whether the feed's last update succeeded. Entities are
    /// reported unavailable while it is failing.
    pub const fn set_feed_healthy(&mut self, healthy: bool) {
        self.feed_healthy = healthy;
    }

    /// Applies one successful snapshot and returns the resulting events.
    ///
    /// Later records with the same identity replace earlier ones, so each
    /// key produces at most one event per call.
    pub fn reconcile(&mut self, items: &[T], now: DateTime<Utc>) -> Vec<DomainEvent> {
        self.feed_healthy = true;

        let mut latest: BTreeMap<&str, usize> = BTreeMap::new();
        for (i, item) in items.iter().enumerate() {
            if let Some(previous) = latest.insert(item.identity(), i) {
                log::debug!(
                    "{}: duplicate identity {:?} in one poll, keeping the later record (#{i} over #{previous})",
                    self.state,
                    item.identity()
                );
            }
        }

        let mut events = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();

        for (i, item) in items.iter().enumerate() {
            if latest.get(item.identity()) != Some(&i) {
                continue;
            }
            seen.insert(item.identity().to_string());
            if let Some(event) = self.observe(item, now) {
                events.push(event);
            }
        }

        let stale: Vec<String> = self
            .entities
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();

        for key in stale {
            if self.remove_stale {
                if let Some(entity) = self.entities.remove(&key) {
                    log::debug!("{}: removing stale entity {}", self.state, entity.unique_id);
                    events.push(self.event(EventKind::Removed, &entity, now, true));
                }
            } else if let Some(entity) = self.entities.get_mut(&key) {
                if entity.available {
                    entity.available = false;
                    log::debug!("{}: marking {} unavailable", self.state, entity.unique_id);
                    let entity = entity.clone();
                    events.push(self.event(EventKind::Removed, &entity, now, false));
                }
            }
        }

        events
    }

    fn observe(&mut self, item: &T, now: DateTime<Utc>) -> Option<DomainEvent> {
        let hash = change_hash(item);
        let in_zone = item
            .position()
            .map(|(lat, lon)| zones_containing(lat, lon, &self.zones))
            .unwrap_or_default();

        let Some(entity) = self.entities.get_mut(item.identity()) else {
            let entity = TrackedEntity {
                item: item.clone(),
                unique_id: unique_id(&self.source, item.identity()),
                first_seen: now,
                last_seen: now,
                last_changed: now,
                change_hash: hash,
                in_zone,
                available: true,
            };
            let event = self.event(EventKind::Created, &entity, now, false);
            self.entities.insert(item.identity().to_string(), entity);
            return Some(event);
        };

        let reappeared = !entity.available;
        let changed = entity.change_hash != hash;

        entity.item = item.clone();
        entity.last_seen = now;
        entity.in_zone = in_zone;
        entity.available = true;
        if changed {
            entity.change_hash = hash;
            entity.last_changed = now;
        }

        if changed || reappeared {
            let entity = entity.clone();
            return Some(self.event(EventKind::Updated, &entity, now, false));
        }
        None
    }

    /// Drops every tracked entity, emitting a `removed` event for each.
    pub fn clear(&mut self, now: DateTime<Utc>) -> Vec<DomainEvent> {
        let entities = std::mem::take(&mut self.entities);
        entities
            .values()
            .map(|entity| self.event(EventKind::Removed, entity, now, true))
            .collect()
    }

    /// Tracked entities in identity order.
    pub fn current(&self) -> impl Iterator<Item = &TrackedEntity<T>> {
        self.entities.values()
    }

    /// Whether `entity` is reported available: present in the last
    /// successful poll and the feed's last update succeeded.
    #[must_use]
    pub const fn is_available(&self, entity: &TrackedEntity<T>) -> bool {
        entity.available && self.feed_healthy
    }

    /// Event payload for `entity`.
    #[must_use]
    pub fn payload(
        &self,
        entity: &TrackedEntity<T>,
        now: DateTime<Utc>,
        deleted: bool,
    ) -> EventPayload {
        let (latitude, longitude) = entity.item.position().unzip();
        EventPayload {
            state: entity.item.state(),
            source: self.source.clone(),
            unique_id: entity.unique_id.clone(),
            identity: entity.item.identity().to_string(),
            title: entity.item.title(),
            severity: entity.item.severity_label(),
            latitude,
            longitude,
            first_seen: entity.first_seen,
            last_seen: entity.last_seen,
            last_changed: entity.last_changed,
            duration_minutes: entity.duration_minutes(now),
            change_hash: entity.change_hash.clone(),
            in_zone: entity.in_zone.clone(),
            available: !deleted && self.is_available(entity),
            deleted,
        }
    }

    fn event(
        &self,
        kind: EventKind,
        entity: &TrackedEntity<T>,
        now: DateTime<Utc>,
        deleted: bool,
    ) -> DomainEvent {
        DomainEvent::new(T::ENTITY, kind, self.payload(entity, now, deleted))
    }
}

/// `"<source>_<identity>"`, lowercased.
#[must_use]
pub fn unique_id(source: &str, identity: &str) -> String {
    format!("{source}_{identity}").to_lowercase()
}
