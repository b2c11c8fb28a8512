//! Periodic polling: one task per pipeline.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::context::{MonitorContext, SharedPipeline};

/// Spawns a polling task for every pipeline of every entry.
///
/// Each task sleeps for its coordinator's current interval, polls, and
/// repeats until [`MonitorContext::shutdown`] is called.
#[must_use]
pub fn spawn(context: &Arc<MonitorContext>) -> Vec<JoinHandle<()>> {
    context
        .entries()
        .iter()
        .flat_map(|entry| entry.pipelines())
        .map(|pipeline| {
            tokio::spawn(poll_loop(
                Arc::clone(context),
                Arc::clone(pipeline),
                context.shutdown_signal(),
            ))
        })
        .collect()
}

async fn poll_loop(
    context: Arc<MonitorContext>,
    pipeline: SharedPipeline,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let (name, interval) = {
            let pipeline = pipeline.lock().await;
            let coordinator = pipeline.coordinator();
            (coordinator.name().to_string(), coordinator.current_interval())
        };
        log::debug!("{name}: next poll in {} seconds", interval.as_secs());

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }
        if *shutdown.borrow() {
            break;
        }

        context.poll(&pipeline).await;
    }
    log::debug!("poll loop stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use aus_emergency_feed::{FeedError, Fetcher};
    use aus_emergency_incident_models::{AustralianState, FeedKind, FeedSnapshot};

    use super::*;
    use crate::config::MonitorConfig;

    struct CountingFetcher {
        kind: FeedKind,
        polls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
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
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(match self.kind {
                FeedKind::Incidents => FeedSnapshot::Incidents(Vec::new()),
                FeedKind::Cap => FeedSnapshot::Alerts(Vec::new()),
            })
        }

        fn close(&mut self) -> bool {
            false
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval_until_shutdown() {
        let polls = Arc::new(AtomicUsize::new(0));
        let config = MonitorConfig {
            update_interval: 60,
            ..MonitorConfig::default()
        };
        let context = Arc::new(
            MonitorContext::with_fetchers(&config, |_, kind| -> Box<dyn Fetcher> {
                Box::new(CountingFetcher {
                    kind,
                    polls: Arc::clone(&polls),
                })
            })
            .unwrap(),
        );

        let handles = spawn(&context);
        assert_eq!(handles.len(), 2);

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(polls.load(Ordering::SeqCst), 4);

        context.shutdown().await;
        for handle in handles {
            handle.await.unwrap();
        }
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }
}
