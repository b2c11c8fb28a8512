//! A coordinator paired with the tracker that consumes its snapshots.

use aus_emergency_coordinator::{CoordinatorError, FeedCoordinator};
use aus_emergency_incident_models::{CapAlert, FeedKind, FeedSnapshot, Incident, Zone};
use aus_emergency_reconcile::{DomainEvent, Reconcilable, TrackedEntity, Tracker};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Tracker matching the coordinator's feed kind.
#[derive(Debug)]
pub enum EntityTracker {
    /// Tracks incidents.
    Incidents(Tracker<Incident>),
    /// Tracks CAP alerts.
    Alerts(Tracker<CapAlert>),
}

impl EntityTracker {
    const fn set_feed_healthy(&mut self, healthy: bool) {
        match self {
            Self::Incidents(tracker) => tracker.set_feed_healthy(healthy),
            Self::Alerts(tracker) => tracker.set_feed_healthy(healthy),
        }
    }
}

/// Queryable view of one tracked entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView<T> {
    /// `"<source>_<identity>"`, lowercased.
    pub unique_id: String,
    /// Latest version of the record.
    pub item: T,
    /// First observation.
    pub first_seen: DateTime<Utc>,
    /// Most recent observation.
    pub last_seen: DateTime<Utc>,
    /// Most recent change-hash change.
    pub last_changed: DateTime<Utc>,
    /// Minutes since first observation.
    pub duration_minutes: i64,
    /// Monitored zones containing the record.
    pub in_zone: Vec<String>,
    /// Present in the last successful poll of a healthy feed.
    pub available: bool,
}

fn views<T: Reconcilable>(tracker: &Tracker<T>, now: DateTime<Utc>) -> Vec<EntityView<T>> {
    tracker
        .current()
        .map(|entity: &TrackedEntity<T>| EntityView {
            unique_id: entity.unique_id.clone(),
            item: entity.item.clone(),
            first_seen: entity.first_seen,
            last_seen: entity.last_seen,
            last_changed: entity.last_changed,
            duration_minutes: entity.duration_minutes(now),
            in_zone: entity.in_zone.clone(),
            available: tracker.is_available(entity),
        })
        .collect()
}

/// One fetch-then-reconcile cycle per [`FeedPipeline::refresh`].
#[derive(Debug)]
pub struct FeedPipeline {
    coordinator: FeedCoordinator,
    tracker: EntityTracker,
}

impl FeedPipeline {
    /// Pairs `coordinator` with an empty tracker of the matching kind.
    #[must_use]
    pub fn new(
        coordinator: FeedCoordinator,
        source: &str,
        zones: Vec<Zone>,
        remove_stale: bool,
    ) -> Self {
        let state = coordinator.state();
        let tracker = match coordinator.kind() {
            FeedKind::Incidents => {
                EntityTracker::Incidents(Tracker::new(state, source, zones, remove_stale))
            }
            FeedKind::Cap => EntityTracker::Alerts(Tracker::new(state, source, zones, remove_stale)),
        };
        Self {
            coordinator,
            tracker,
        }
    }

    /// The wrapped coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &FeedCoordinator {
        &self.coordinator
    }

    /// Polls once and reconciles the result.
    ///
    /// A failed poll leaves tracked entities in place but reports them
    /// unavailable until the next successful poll.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError`] if the poll failed.
    pub async fn refresh(&mut self) -> Result<Vec<DomainEvent>, CoordinatorError> {
        match self.coordinator.fetch().await {
            Ok(snapshot) => Ok(self.apply(&snapshot, Utc::now())),
            Err(e) => {
                self.tracker.set_feed_healthy(false);
                Err(e)
            }
        }
    }

    fn apply(&mut self, snapshot: &FeedSnapshot, now: DateTime<Utc>) -> Vec<DomainEvent> {
        match (&mut self.tracker, snapshot) {
            (EntityTracker::Incidents(tracker), FeedSnapshot::Incidents(items)) => {
                tracker.reconcile(items, now)
            }
            (EntityTracker::Alerts(tracker), FeedSnapshot::Alerts(items)) => {
                tracker.reconcile(items, now)
            }
            _ => {
                log::error!(
                    "{}: snapshot kind {} does not match tracker",
                    self.coordinator.name(),
                    snapshot.kind()
                );
                Vec::new()
            }
        }
    }

    /// Drops every tracked entity.
    pub fn clear(&mut self, now: DateTime<Utc>) -> Vec<DomainEvent> {
        match &mut self.tracker {
            EntityTracker::Incidents(tracker) => tracker.clear(now),
            EntityTracker::Alerts(tracker) => tracker.clear(now),
        }
    }

    /// Tracked incidents; empty for a CAP pipeline.
    #[must_use]
    pub fn incidents(&self, now: DateTime<Utc>) -> Vec<EntityView<Incident>> {
        match &self.tracker {
            EntityTracker::Incidents(tracker) => views(tracker, now),
            EntityTracker::Alerts(_) => Vec::new(),
        }
    }

    /// Tracked CAP alerts; empty for an incident pipeline.
    #[must_use]
    pub fn alerts(&self, now: DateTime<Utc>) -> Vec<EntityView<CapAlert>> {
        match &self.tracker {
            EntityTracker::Alerts(tracker) => views(tracker, now),
            EntityTracker::Incidents(_) => Vec::new(),
        }
    }

    /// Releases the coordinator's session.
    pub fn close(&mut self) -> bool {
        self.coordinator.close()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;
    use aus_emergency_coordinator::BackoffPolicy;
    use aus_emergency_feed::{FeedError, Fetcher};
    use aus_emergency_incident_models::AustralianState;
    use aus_emergency_reconcile::EventKind;

    use super::*;

    struct Scripted(VecDeque<Result<FeedSnapshot, FeedError>>);

    #[async_trait]
    impl Fetcher for Scripted {
        fn name(&self) -> &str {
            "SA Incident Data"
        }

        fn state(&self) -> AustralianState {
            AustralianState::Sa
        }

        fn kind(&self) -> FeedKind {
            FeedKind::Incidents
        }

        async fn fetch(&mut self) -> Result<FeedSnapshot, FeedError> {
            self.0
                .pop_front()
                .unwrap_or_else(|| Ok(FeedSnapshot::Incidents(Vec::new())))
        }

        fn close(&mut self) -> bool {
            false
        }
    }

    fn incident(no: &str) -> Incident {
        let mut incident = Incident::new(AustralianState::Sa);
        incident.incident_no = no.to_string();
        incident
    }

    fn pipeline(responses: Vec<Result<FeedSnapshot, FeedError>>) -> FeedPipeline {
        let coordinator = FeedCoordinator::new(
            Box::new(Scripted(responses.into())),
            Duration::from_secs(600),
            BackoffPolicy::default(),
        );
        FeedPipeline::new(coordinator, "sa_cfs", Vec::new(), false)
    }

    #[tokio::test]
    async fn failed_poll_marks_entities_unavailable_without_removing() {
        let mut pipeline = pipeline(vec![
            Ok(FeedSnapshot::Incidents(vec![incident("1")])),
            Err(FeedError::Format {
                message: "truncated".to_string(),
            }),
            Ok(FeedSnapshot::Incidents(vec![incident("1")])),
        ]);

        let events = pipeline.refresh().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Created);

        assert!(pipeline.refresh().await.is_err());
        let views = pipeline.incidents(Utc::now());
        assert_eq!(views.len(), 1);
        assert!(!views[0].available);

        assert!(pipeline.refresh().await.unwrap().is_empty());
        assert!(pipeline.incidents(Utc::now())[0].available);
        assert!(pipeline.alerts(Utc::now()).is_empty());
    }
}
