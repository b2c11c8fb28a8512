//! Explicitly owned monitor state: one entry per configured state, each with
//! an incident pipeline and a CAP pipeline.

use std::sync::Arc;

use aus_emergency_coordinator::FeedCoordinator;
use aus_emergency_feed::Fetcher;
use aus_emergency_feed::feed_def::FeedDefinition;
use aus_emergency_feed::fetcher::HttpFeedFetcher;
use aus_emergency_feed::registry::feed_for;
use aus_emergency_incident_models::{AustralianState, CapAlert, FeedKind, Incident, Zone};
use aus_emergency_reconcile::DomainEvent;
use chrono::Utc;
use tokio::sync::{Mutex, broadcast, watch};

use crate::commands::{Command, CommandError, CommandOutcome};
use crate::config::{EntrySettings, MonitorConfig};
use crate::diagnostics::{Diagnostics, EntryDiagnostics};
use crate::pipeline::{EntityView, FeedPipeline};
use crate::sensor::ActiveIncidentsSensor;

/// Buffered events per subscriber before it starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// A pipeline shared between the scheduler and command handlers.
pub type SharedPipeline = Arc<Mutex<FeedPipeline>>;

/// One configured state.
#[derive(Debug)]
pub struct StateEntry {
    definition: FeedDefinition,
    settings: EntrySettings,
    incidents: SharedPipeline,
    alerts: SharedPipeline,
}

impl StateEntry {
    /// Configured state.
    #[must_use]
    pub const fn state(&self) -> AustralianState {
        self.settings.state
    }

    /// The state's feed definition.
    #[must_use]
    pub const fn definition(&self) -> &FeedDefinition {
        &self.definition
    }

    /// Effective settings.
    #[must_use]
    pub const fn settings(&self) -> &EntrySettings {
        &self.settings
    }

    /// Incident pipeline then CAP pipeline.
    #[must_use]
    pub const fn pipelines(&self) -> [&SharedPipeline; 2] {
        [&self.incidents, &self.alerts]
    }
}

/// Everything a running monitor owns.
#[derive(Debug)]
pub struct MonitorContext {
    zones: Vec<Zone>,
    entries: Vec<StateEntry>,
    events: broadcast::Sender<DomainEvent>,
    shutdown: watch::Sender<bool>,
}

impl MonitorContext {
    /// Builds a context polling the registered HTTP feeds.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NoFeed`] if a configured state has no
    /// registered feed.
    pub fn new(config: &MonitorConfig) -> Result<Self, CommandError> {
        Self::with_fetchers(config, |definition, kind| -> Box<dyn Fetcher> {
            match kind {
                FeedKind::Incidents => Box::new(HttpFeedFetcher::incidents(definition.clone())),
                FeedKind::Cap => Box::new(HttpFeedFetcher::cap(definition.clone())),
            }
        })
    }

    /// Builds a context whose fetchers come from `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NoFeed`] if a configured state has no
    /// registered feed.
    pub fn with_fetchers<F>(config: &MonitorConfig, factory: F) -> Result<Self, CommandError>
    where
        F: Fn(&FeedDefinition, FeedKind) -> Box<dyn Fetcher>,
    {
        let mut entries = Vec::new();
        for settings in config.settings() {
            let definition =
                feed_for(settings.state).ok_or(CommandError::NoFeed(settings.state))?;

            let pipeline = |kind| {
                let coordinator = FeedCoordinator::new(
                    factory(&definition, kind),
                    settings.update_interval,
                    config.backoff,
                );
                Arc::new(Mutex::new(FeedPipeline::new(
                    coordinator,
                    &definition.source,
                    config.zones.clone(),
                    settings.remove_stale,
                )))
            };
            let incidents = pipeline(FeedKind::Incidents);
            let alerts = pipeline(FeedKind::Cap);

            log::info!(
                "{}: monitoring {} every {} seconds",
                settings.state,
                definition.name,
                settings.update_interval.as_secs()
            );
            entries.push(StateEntry {
                definition,
                settings,
                incidents,
                alerts,
            });
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            zones: config.zones.clone(),
            entries,
            events,
            shutdown,
        })
    }

    /// Configured entries in configuration order.
    #[must_use]
    pub fn entries(&self) -> &[StateEntry] {
        &self.entries
    }

    /// The entry for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotConfigured`] if `state` has no entry.
    pub fn entry(&self, state: AustralianState) -> Result<&StateEntry, CommandError> {
        self.entries
            .iter()
            .find(|entry| entry.state() == state)
            .ok_or(CommandError::NotConfigured(state))
    }

    /// Subscribes to domain events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    /// Receiver that flips to `true` when [`Self::shutdown`] is called.
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Runs one fetch-then-reconcile cycle on `pipeline` and publishes the
    /// resulting events. A failed poll publishes nothing.
    pub async fn poll(&self, pipeline: &SharedPipeline) -> Vec<DomainEvent> {
        let mut pipeline = pipeline.lock().await;
        match pipeline.refresh().await {
            Ok(events) => {
                self.publish(&events);
                events
            }
            Err(e) => {
                log::debug!("{e}");
                Vec::new()
            }
        }
    }

    fn publish(&self, events: &[DomainEvent]) {
        for event in events {
            log::info!("{} {}", event.event_type, event.payload.unique_id);
            if self.events.send(event.clone()).is_err() {
                log::trace!("no event subscribers");
            }
        }
    }

    /// Refreshes both of `state`'s feeds.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotConfigured`] if `state` has no entry.
    pub async fn refresh(&self, state: AustralianState) -> Result<Vec<DomainEvent>, CommandError> {
        let entry = self.entry(state)?;
        log::info!("{state}: manual refresh");
        let mut events = Vec::new();
        for pipeline in entry.pipelines() {
            events.extend(self.poll(pipeline).await);
        }
        Ok(events)
    }

    /// Refreshes every configured entry, one after another.
    pub async fn refresh_all(&self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        for entry in &self.entries {
            for pipeline in entry.pipelines() {
                events.extend(self.poll(pipeline).await);
            }
        }
        events
    }

    /// Drops every tracked entity of `state`, publishing `removed` events.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotConfigured`] if `state` has no entry.
    pub async fn remove_state_devices(
        &self,
        state: AustralianState,
    ) -> Result<Vec<DomainEvent>, CommandError> {
        let entry = self.entry(state)?;
        let now = Utc::now();
        let mut events = Vec::new();
        for pipeline in entry.pipelines() {
            events.extend(pipeline.lock().await.clear(now));
        }
        log::info!("{state}: removed {} tracked entities", events.len());
        self.publish(&events);
        Ok(events)
    }

    /// Tracked incidents of `state`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotConfigured`] if `state` has no entry.
    pub async fn incidents(
        &self,
        state: AustralianState,
    ) -> Result<Vec<EntityView<Incident>>, CommandError> {
        let entry = self.entry(state)?;
        Ok(entry.incidents.lock().await.incidents(Utc::now()))
    }

    /// Tracked CAP alerts of `state`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotConfigured`] if `state` has no entry.
    pub async fn alerts(
        &self,
        state: AustralianState,
    ) -> Result<Vec<EntityView<CapAlert>>, CommandError> {
        let entry = self.entry(state)?;
        Ok(entry.alerts.lock().await.alerts(Utc::now()))
    }

    /// Active-incidents summary of `state`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotConfigured`] if `state` has no entry.
    pub async fn active_incidents(
        &self,
        state: AustralianState,
    ) -> Result<ActiveIncidentsSensor, CommandError> {
        let tracked = self.incidents(state).await?;
        let entry = self.entry(state)?;
        Ok(ActiveIncidentsSensor::new(entry.definition(), &tracked))
    }

    /// Diagnostics for every entry.
    pub async fn diagnostics(&self) -> Diagnostics {
        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let incidents = entry.incidents.lock().await;
            let alerts = entry.alerts.lock().await;
            entries.push(EntryDiagnostics::new(
                &entry.settings,
                &self.zones,
                incidents.coordinator(),
                alerts.coordinator(),
            ));
        }
        Diagnostics {
            generated_at: Utc::now(),
            entries,
        }
    }

    /// Executes a parsed command.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotConfigured`] if the command names a state
    /// without an entry.
    pub async fn execute(&self, command: Command) -> Result<CommandOutcome, CommandError> {
        Ok(match command {
            Command::Refresh(Some(state)) => CommandOutcome::Events(self.refresh(state).await?),
            Command::Refresh(None) => CommandOutcome::Events(self.refresh_all().await),
            Command::RemoveStateDevices(state) => {
                CommandOutcome::Events(self.remove_state_devices(state).await?)
            }
            Command::Diagnostics => {
                CommandOutcome::Diagnostics(Box::new(self.diagnostics().await))
            }
            Command::Quit => CommandOutcome::Quit,
        })
    }

    /// Signals shutdown and closes every session. Returns how many sessions
    /// were open.
    pub async fn shutdown(&self) -> usize {
        self.shutdown.send_replace(true);
        let mut closed = 0;
        for entry in &self.entries {
            for pipeline in entry.pipelines() {
                if pipeline.lock().await.close() {
                    closed += 1;
                }
            }
        }
        log::info!("Shut down, closed {closed} feed session(s)");
        closed
    }
}
