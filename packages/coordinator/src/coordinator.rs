//! One polling coordinator per (state, feed kind).

use std::time::Duration;

use aus_emergency_feed::{FailureKind, FeedError, Fetcher};
use aus_emergency_incident_models::{AustralianState, FeedKind, FeedSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backoff::{BackoffController, BackoffPolicy, BackoffState};

/// Errors surfaced by [`FeedCoordinator::fetch`].
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The poll failed; the coordinator has already backed off.
    #[error("Error fetching {name}: {source}")]
    UpdateFailed {
        /// Coordinator name.
        name: String,
        /// Underlying feed failure.
        #[source]
        source: FeedError,
    },
}

impl CoordinatorError {
    /// Category of the underlying failure.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::UpdateFailed { source, .. } => source.kind(),
        }
    }
}

/// Point-in-time view of a coordinator, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorStatus {
    /// Coordinator name (e.g. `"SA CAP Data"`).
    pub name: String,
    /// Polled state.
    pub state: AustralianState,
    /// Polled feed kind.
    pub kind: FeedKind,
    /// Whether the most recent poll succeeded.
    pub last_update_success: bool,
    /// Time of the most recent successful poll.
    pub last_success: Option<DateTime<Utc>>,
    /// Current poll interval in seconds.
    pub update_interval_secs: u64,
    /// Consecutive failed polls.
    pub consecutive_failures: u32,
    /// Backoff health.
    pub backoff: BackoffState,
    /// Whether an upstream feed exists for this state and kind.
    pub has_feed: bool,
}

/// Polls one feed, applies backoff and keeps the last successful snapshot.
pub struct FeedCoordinator {
    fetcher: Box<dyn Fetcher>,
    backoff: BackoffController,
    last_snapshot: Option<FeedSnapshot>,
    last_update_success: bool,
    last_success: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for FeedCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedCoordinator")
            .field("name", &self.fetcher.name())
            .field("backoff", &self.backoff)
            .field("last_update_success", &self.last_update_success)
            .finish_non_exhaustive()
    }
}

impl FeedCoordinator {
    /// Creates a coordinator polling every `update_interval` while healthy.
    #[must_use]
    pub fn new(
        fetcher: Box<dyn Fetcher>,
        update_interval: Duration,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            fetcher,
            backoff: BackoffController::new(update_interval, policy),
            last_snapshot: None,
            last_update_success: false,
            last_success: None,
        }
    }

    /// Coordinator name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        self.fetcher.name()
    }

    /// Polled state.
    #[must_use]
    pub fn state(&self) -> AustralianState {
        self.fetcher.state()
    }

    /// Polled feed kind.
    #[must_use]
    pub fn kind(&self) -> FeedKind {
        self.fetcher.kind()
    }

    /// Whether an upstream feed exists.
    #[must_use]
    pub fn has_feed(&self) -> bool {
        self.fetcher.has_feed()
    }

    /// Polls the feed once.
    ///
    /// On success the backoff is reset and the snapshot is recorded as the
    /// last successful one. On failure the backoff advances and the failure
    /// is logged by category.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::UpdateFailed`] if the fetch failed or
    /// produced a snapshot of the wrong kind.
    pub async fn fetch(&mut self) -> Result<FeedSnapshot, CoordinatorError> {
        let result = match self.fetcher.fetch().await {
            Ok(snapshot) if snapshot.kind() != self.kind() => Err(FeedError::Unexpected {
                message: format!(
                    "expected a {} snapshot, got {}",
                    self.kind(),
                    snapshot.kind()
                ),
            }),
            other => other,
        };

        match result {
            Ok(snapshot) => {
                self.record_success(&snapshot);
                Ok(snapshot)
            }
            Err(source) => {
                self.record_failure(&source);
                Err(CoordinatorError::UpdateFailed {
                    name: self.name().to_string(),
                    source,
                })
            }
        }
    }

    fn record_success(&mut self, snapshot: &FeedSnapshot) {
        if self.backoff.on_success() {
            log::info!(
                "{}: feed recovered, reset update interval to {} seconds",
                self.name(),
                self.backoff.base_interval().as_secs()
            );
        }
        log::debug!("{}: fetched {} record(s)", self.name(), snapshot.len());

        self.last_update_success = true;
        self.last_success = Some(Utc::now());
        self.last_snapshot = Some(snapshot.clone());
    }

    fn record_failure(&mut self, error: &FeedError) {
        self.last_update_success = false;
        let interval = self.backoff.on_failure();

        match error.kind() {
            FailureKind::Transport | FailureKind::Format => {
                log::warn!("{}: update failed: {error}", self.name());
            }
            FailureKind::Unexpected => {
                log::error!("{}: unexpected error during update: {error}", self.name());
            }
        }
        log::warn!(
            "{}: failure #{}, backing off to {} seconds",
            self.name(),
            self.backoff.consecutive_failures(),
            interval.as_secs()
        );
    }

    /// Interval to wait before the next poll.
    #[must_use]
    pub const fn current_interval(&self) -> Duration {
        self.backoff.current_interval()
    }

    /// Consecutive failed polls.
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.backoff.consecutive_failures()
    }

    /// Whether the most recent poll succeeded.
    #[must_use]
    pub const fn last_update_success(&self) -> bool {
        self.last_update_success
    }

    /// The most recent successful snapshot.
    #[must_use]
    pub const fn last_snapshot(&self) -> Option<&FeedSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Diagnostics view.
    #[must_use]
    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            name: self.name().to_string(),
            state: self.state(),
            kind: self.kind(),
            last_update_success: self.last_update_success,
            last_success: self.last_success,
            update_interval_secs: self.current_interval().as_secs(),
            consecutive_failures: self.consecutive_failures(),
            backoff: self.backoff.state(),
            has_feed: self.has_feed(),
        }
    }

    /// Releases the fetcher's session. Returns `true` if something was
    /// open; a second call is a no-op.
    pub fn close(&mut self) -> bool {
        let closed = self.fetcher.close();
        if closed {
            log::debug!("{}: closed", self.name());
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use aus_emergency_incident_models::Incident;

    use super::*;

    struct ScriptedFetcher {
        kind: FeedKind,
        responses: VecDeque<Result<FeedSnapshot, FeedError>>,
        open: bool,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptedFetcher {
        fn new(kind: FeedKind, responses: Vec<Result<FeedSnapshot, FeedError>>) -> Self {
            Self {
                kind,
                responses: responses.into(),
                open: false,
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        fn name(&self) -> &str {
            "SA Test Data"
        }

        fn state(&self) -> AustralianState {
            AustralianState::Sa
        }

        fn kind(&self) -> FeedKind {
            self.kind
        }

        async fn fetch(&mut self) -> Result<FeedSnapshot, FeedError> {
            self.open = true;
            self.responses
                .pop_front()
                .unwrap_or_else(|| Ok(FeedSnapshot::Incidents(Vec::new())))
        }

        fn close(&mut self) -> bool {
            if !self.open {
                return false;
            }
            self.open = false;
            self.closes.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn transport_error() -> FeedError {
        FeedError::Status {
            url: "https://example.invalid/feed".to_string(),
            status: 503,
        }
    }

    fn incidents(n: usize) -> FeedSnapshot {
        FeedSnapshot::Incidents(
            (0..n)
                .map(|i| {
                    let mut incident = Incident::new(AustralianState::Sa);
                    incident.incident_no = i.to_string();
                    incident
                })
                .collect(),
        )
    }

    fn coordinator(fetcher: ScriptedFetcher) -> FeedCoordinator {
        FeedCoordinator::new(
            Box::new(fetcher),
            Duration::from_secs(600),
            BackoffPolicy::default(),
        )
    }

    #[tokio::test]
    async fn failures_back_off_and_success_resets() {
        let mut coordinator = coordinator(ScriptedFetcher::new(
            FeedKind::Incidents,
            vec![
                Err(transport_error()),
                Err(FeedError::Format {
                    message: "bad".to_string(),
                }),
                Ok(incidents(2)),
            ],
        ));

        let err = coordinator.fetch().await.unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::Transport);
        assert_eq!(coordinator.current_interval(), Duration::from_secs(30));
        assert!(!coordinator.last_update_success());

        let err = coordinator.fetch().await.unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::Format);
        assert_eq!(coordinator.current_interval(), Duration::from_secs(60));
        assert_eq!(coordinator.consecutive_failures(), 2);

        let snapshot = coordinator.fetch().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(coordinator.current_interval(), Duration::from_secs(600));
        assert_eq!(coordinator.consecutive_failures(), 0);
        assert!(coordinator.last_update_success());
        assert_eq!(coordinator.last_snapshot(), Some(&incidents(2)));
    }

    #[tokio::test]
    async fn failure_keeps_last_successful_snapshot() {
        let mut coordinator = coordinator(ScriptedFetcher::new(
            FeedKind::Incidents,
            vec![Ok(incidents(1)), Err(transport_error())],
        ));
        coordinator.fetch().await.unwrap();
        coordinator.fetch().await.unwrap_err();

        assert_eq!(coordinator.last_snapshot(), Some(&incidents(1)));
        let status = coordinator.status();
        assert!(!status.last_update_success);
        assert!(status.last_success.is_some());
        assert_eq!(status.update_interval_secs, 30);
        assert_eq!(status.backoff, BackoffState::Backoff(1));
    }

    #[tokio::test]
    async fn wrong_snapshot_kind_is_unexpected() {
        let mut coordinator = coordinator(ScriptedFetcher::new(
            FeedKind::Cap,
            vec![Ok(incidents(1))],
        ));
        let err = coordinator.fetch().await.unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::Unexpected);
        assert!(coordinator.last_snapshot().is_none());
    }

    #[tokio::test]
    async fn last_snapshot_changes_on_success_only() {
        let mut coordinator = coordinator(ScriptedFetcher::new(
            FeedKind::Incidents,
            vec![Ok(incidents(3)), Err(transport_error()), Ok(incidents(2))],
        ));
        assert!(coordinator.last_snapshot().is_none());

        let returned = coordinator.fetch().await.unwrap();
        assert_eq!(coordinator.last_snapshot(), Some(&returned));
        assert_eq!(returned.len(), 3);

        coordinator.fetch().await.unwrap_err();
        assert_eq!(coordinator.last_snapshot().map(FeedSnapshot::len), Some(3));

        coordinator.fetch().await.unwrap();
        assert_eq!(coordinator.last_snapshot().map(FeedSnapshot::len), Some(2));
    }

    #[tokio::test]
    async fn close_happens_once() {
        let fetcher = ScriptedFetcher::new(FeedKind::Incidents, vec![]);
        let closes = Arc::clone(&fetcher.closes);
        let mut coordinator = coordinator(fetcher);

        assert!(!coordinator.close());
        coordinator.fetch().await.unwrap();
        assert!(coordinator.close());
        assert!(!coordinator.close());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
