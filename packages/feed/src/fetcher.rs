//! HTTP-backed [`Fetcher`] for a registered state feed.

use async_trait::async_trait;
use aus_emergency_incident_models::{AustralianState, FeedKind, FeedSnapshot};

use crate::feed_def::FeedDefinition;
use crate::http::FeedSession;
use crate::parsers::{cap, parse_incidents};
use crate::{FeedError, Fetcher};

/// Polls one of a state's feeds over a long-lived [`FeedSession`].
#[derive(Debug)]
pub struct HttpFeedFetcher {
    definition: FeedDefinition,
    kind: FeedKind,
    name: String,
    session: FeedSession,
}

impl HttpFeedFetcher {
    /// Fetcher for the state's incident feed.
    #[must_use]
    pub fn incidents(definition: FeedDefinition) -> Self {
        Self::new(definition, FeedKind::Incidents)
    }

    /// Fetcher for the state's CAP feed. States without one yield empty
    /// alert snapshots.
    #[must_use]
    pub fn cap(definition: FeedDefinition) -> Self {
        Self::new(definition, FeedKind::Cap)
    }

    fn new(definition: FeedDefinition, kind: FeedKind) -> Self {
        let name = match kind {
            FeedKind::Incidents => format!("{} Incident Data", definition.state),
            FeedKind::Cap => format!("{} CAP Data", definition.state),
        };
        Self {
            session: FeedSession::new(name.clone()),
            definition,
            kind,
            name,
        }
    }

    /// The feed definition this fetcher polls.
    #[must_use]
    pub const fn definition(&self) -> &FeedDefinition {
        &self.definition
    }

    async fn fetch_incidents(&mut self) -> Result<FeedSnapshot, FeedError> {
        let body = self.session.get_text(&self.definition.incidents_url).await?;

        let warnings = match &self.definition.warnings_url {
            Some(url) => match self.session.get_text(url).await {
                Ok(warnings) => Some(warnings),
                Err(e) => {
                    log::warn!(
                        "{}: warnings feed unavailable, continuing without: {e}",
                        self.name
                    );
                    None
                }
            },
            None => None,
        };

        let incidents = parse_incidents(
            self.definition.format,
            self.definition.state,
            &body,
            warnings.as_deref(),
        )?;
        Ok(FeedSnapshot::Incidents(incidents))
    }

    async fn fetch_alerts(&mut self) -> Result<FeedSnapshot, FeedError> {
        let Some(url) = &self.definition.cap_url else {
            log::trace!("{}: no CAP feed, returning no alerts", self.name);
            return Ok(FeedSnapshot::Alerts(Vec::new()));
        };

        let body = self.session.get_text(url).await?;
        let alerts = cap::parse(self.definition.state, &body)?;
        Ok(FeedSnapshot::Alerts(alerts))
    }
}

#[async_trait]
impl Fetcher for HttpFeedFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> AustralianState {
        self.definition.state
    }

    fn kind(&self) -> FeedKind {
        self.kind
    }

    fn has_feed(&self) -> bool {
        match self.kind {
            FeedKind::Incidents => true,
            FeedKind::Cap => self.definition.cap_url.is_some(),
        }
    }

    async fn fetch(&mut self) -> Result<FeedSnapshot, FeedError> {
        match self.kind {
            FeedKind::Incidents => self.fetch_incidents().await,
            FeedKind::Cap => self.fetch_alerts().await,
        }
    }

    fn close(&mut self) -> bool {
        self.session.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::feed_for;

    #[test]
    fn names_follow_state_and_kind() {
        let sa = feed_for(AustralianState::Sa).unwrap();
        assert_eq!(HttpFeedFetcher::incidents(sa.clone()).name(), "SA Incident Data");
        assert_eq!(HttpFeedFetcher::cap(sa).name(), "SA CAP Data");
    }

    #[test]
    fn cap_feed_presence_follows_definition() {
        let sa = feed_for(AustralianState::Sa).unwrap();
        let vic = feed_for(AustralianState::Vic).unwrap();
        assert!(HttpFeedFetcher::cap(sa).has_feed());
        assert!(!HttpFeedFetcher::cap(vic.clone()).has_feed());
        assert!(HttpFeedFetcher::incidents(vic).has_feed());
    }

    #[tokio::test]
    async fn missing_cap_feed_yields_empty_alerts_without_a_session() {
        let vic = feed_for(AustralianState::Vic).unwrap();
        let mut fetcher = HttpFeedFetcher::cap(vic);

        let snapshot = fetcher.fetch().await.unwrap();
        assert_eq!(snapshot, FeedSnapshot::Alerts(Vec::new()));
        assert!(!fetcher.session.is_open());
        assert!(!fetcher.close());
    }
}
