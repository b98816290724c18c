// src/pipeline/scheduler.rs

//! Refresh scheduler for a single monitored instance.
//!
//! A [`Monitor`] runs its source on a fixed interval and folds every attempt
//! into its snapshot: success replaces the records, failure keeps them and
//! counts the error. No failure ever stops the loop.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{ErrorInfo, FetchError};
use crate::models::{InstanceKey, MAX_RECORDS, RefreshConfig};
use crate::services::AnnouncementSource;
use crate::storage::{SnapshotReader, SnapshotStore};

/// Result of one refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fetch succeeded; `count` records are now current (may be zero).
    Updated { count: usize },
    /// Fetch failed; previous records were kept.
    Failed(ErrorInfo),
    /// Another fetch for this instance was still running.
    Skipped,
}

/// Scheduler state for one municipality/instance pair.
pub struct Monitor {
    key: InstanceKey,
    config: RefreshConfig,
    source: Arc<dyn AnnouncementSource>,
    store: SnapshotStore,
    in_flight: Mutex<()>,
}

impl Monitor {
    pub fn new(
        key: InstanceKey,
        config: RefreshConfig,
        source: Arc<dyn AnnouncementSource>,
    ) -> Self {
        Self {
            key,
            config,
            source,
            store: SnapshotStore::new(),
            in_flight: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &InstanceKey {
        &self.key
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn reader(&self) -> SnapshotReader {
        self.store.reader()
    }

    /// Run one fetch and write the result back to the snapshot.
    ///
    /// At most one fetch is in flight per monitor; an overlapping call
    /// returns [`RefreshOutcome::Skipped`] without touching the snapshot.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            log::debug!("Refresh for {} already in progress, skipping", self.key);
            return RefreshOutcome::Skipped;
        };

        log::debug!("Fetching Planviewer data for {}", self.key);
        match self.source.fetch(self.config.municipality_id()).await {
            Ok(records) => {
                let count = records.len().min(MAX_RECORDS);
                if count == 0 {
                    log::debug!("No announcements received for {}", self.key);
                } else {
                    log::debug!("Received {} announcement(s) for {}", count, self.key);
                }
                self.store.apply_success(records, Utc::now());
                RefreshOutcome::Updated { count }
            }
            Err(err) => {
                match &err {
                    FetchError::NotFound { .. } => log::warn!(
                        "Planviewer page not found for municipality: {}",
                        self.config.municipality_id()
                    ),
                    FetchError::Connection(_) => {
                        log::error!("Error communicating with Planviewer for {}: {}", self.key, err)
                    }
                    FetchError::Data(_) => {
                        log::error!("Error fetching Planviewer data for {}: {}", self.key, err)
                    }
                }
                let info = ErrorInfo::from(&err);
                self.store.apply_failure(info.clone());
                RefreshOutcome::Failed(info)
            }
        }
    }

    /// Perform the first refresh, then keep refreshing on the interval.
    ///
    /// Returns once the first refresh has completed, so readers never see
    /// an uninitialized snapshot.
    pub async fn start(self) -> MonitorHandle {
        let monitor = Arc::new(self);
        let first = monitor.refresh().await;
        log::info!("Monitor {} ready: {:?}", monitor.key, first);

        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(run_loop(Arc::clone(&monitor), Arc::clone(&shutdown)));

        MonitorHandle {
            monitor,
            shutdown,
            task,
        }
    }
}

async fn run_loop(monitor: Arc<Monitor>, shutdown: Arc<Notify>) {
    let period = monitor.config.interval();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                log::info!("Monitor {} stopping", monitor.key);
                break;
            }
            _ = ticker.tick() => {
                monitor.refresh().await;
            }
        }
    }
}

/// Handle to a running monitor.
pub struct MonitorHandle {
    monitor: Arc<Monitor>,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn key(&self) -> &InstanceKey {
        self.monitor.key()
    }

    pub fn config(&self) -> &RefreshConfig {
        self.monitor.config()
    }

    pub fn reader(&self) -> SnapshotReader {
        self.monitor.reader()
    }

    /// Refresh outside the timer, e.g. on user request.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.monitor.refresh().await
    }

    /// Stop the refresh loop, letting an in-flight fetch finish first.
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Err(e) = (&mut self.task).await {
            log::warn!("Monitor {} task ended abnormally: {}", self.monitor.key, e);
        }
    }
}

/// A dropped handle stops its loop after any in-flight fetch.
impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            self.shutdown.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{AnnouncementRecord, HealthStatus};

    type FetchResult = std::result::Result<Vec<AnnouncementRecord>, FetchError>;

    /// Source that replays scripted results, then repeats empty successes.
    struct ScriptedSource {
        script: std::sync::Mutex<VecDeque<FetchResult>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<FetchResult>) -> Arc<Self> {
            Arc::new(Self {
                script: std::sync::Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnnouncementSource for ScriptedSource {
        async fn fetch(&self, _municipality_id: &str) -> FetchResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Source that blocks until released.
    struct GatedSource {
        gate: Notify,
    }

    #[async_trait]
    impl AnnouncementSource for GatedSource {
        async fn fetch(&self, _municipality_id: &str) -> FetchResult {
            self.gate.notified().await;
            Ok(records(1))
        }
    }

    fn records(count: usize) -> Vec<AnnouncementRecord> {
        (0..count)
            .map(|i| AnnouncementRecord {
                title: format!("melding {i}"),
                start_date: None,
                end_date: None,
                link: format!("https://www.planviewer.nl/lb/overheid/utrecht/melding-{i}"),
            })
            .collect()
    }

    fn monitor(source: Arc<dyn AnnouncementSource>) -> Monitor {
        Monitor::new(
            InstanceKey::new("utrecht", "home"),
            RefreshConfig::new("utrecht", 300).unwrap(),
            source,
        )
    }

    #[tokio::test]
    async fn test_success_replaces_records() {
        let source = ScriptedSource::new(vec![Ok(records(5))]);
        let monitor = monitor(source);
        let reader = monitor.reader();

        let before = Utc::now();
        let outcome = monitor.refresh().await;

        assert_eq!(outcome, RefreshOutcome::Updated { count: 3 });
        let snapshot = reader.snapshot();
        assert_eq!(snapshot.records.len(), 3);
        assert_eq!(snapshot.consecutive_error_count, 0);
        assert!(snapshot.last_success_at.unwrap() >= before);
    }

    #[tokio::test]
    async fn test_failures_keep_records_and_count() {
        let source = ScriptedSource::new(vec![
            Ok(records(2)),
            Err(FetchError::connection("timed out")),
            Err(FetchError::not_found("https://www.planviewer.nl/lb/overheid/utrecht")),
        ]);
        let monitor = monitor(source);
        let reader = monitor.reader();

        monitor.refresh().await;
        let good = reader.snapshot();

        let outcome = monitor.refresh().await;
        assert!(matches!(outcome, RefreshOutcome::Failed(ref e) if e.kind == ErrorKind::Connection));
        assert_eq!(reader.snapshot().records, good.records);
        assert_eq!(reader.health().consecutive_error_count, 1);

        monitor.refresh().await;
        let health = reader.health();
        assert_eq!(reader.current_records(), good.records);
        assert_eq!(health.consecutive_error_count, 2);
        assert_eq!(health.status, HealthStatus::Error);
        assert_eq!(health.last_success_at, good.last_success_at);
        assert_eq!(health.last_error.unwrap().kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_empty_result_is_success() {
        let source = ScriptedSource::new(vec![
            Err(FetchError::data("unexpected markup")),
            Ok(Vec::new()),
        ]);
        let monitor = monitor(source);
        let reader = monitor.reader();

        monitor.refresh().await;
        assert_eq!(reader.health().consecutive_error_count, 1);

        let outcome = monitor.refresh().await;

        assert_eq!(outcome, RefreshOutcome::Updated { count: 0 });
        let health = reader.health();
        assert_eq!(health.consecutive_error_count, 0);
        assert!(health.last_error.is_none());
        assert!(health.last_success_at.is_some());
        assert_eq!(health.status, HealthStatus::Ok);
    }

    #[tokio::test]
    async fn test_overlapping_refresh_is_skipped() {
        let source = Arc::new(GatedSource {
            gate: Notify::new(),
        });
        let monitor = Arc::new(monitor(source.clone()));

        let running = {
            let monitor = Arc::clone(&monitor);
            tokio::spawn(async move { monitor.refresh().await })
        };
        tokio::task::yield_now().await;

        assert_eq!(monitor.refresh().await, RefreshOutcome::Skipped);

        source.gate.notify_one();
        assert_eq!(running.await.unwrap(), RefreshOutcome::Updated { count: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_refreshes_immediately_then_on_interval() {
        let source = ScriptedSource::new(vec![
            Ok(records(1)),
            Err(FetchError::connection("refused")),
            Err(FetchError::connection("refused")),
        ]);
        let handle = monitor(source.clone()).start().await;
        let reader = handle.reader();

        assert_eq!(source.calls(), 1);
        assert_eq!(reader.current_records().len(), 1);

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(source.calls(), 2);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(reader.health().consecutive_error_count, 2);
        assert_eq!(reader.current_records().len(), 1);

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(900)).await;
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_stops_refreshing() {
        let source = ScriptedSource::new(Vec::new());
        let handle = monitor(source.clone()).start().await;
        let reader = handle.reader();
        assert_eq!(source.calls(), 1);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(3001)).await;

        assert_eq!(source.calls(), 1);
        // Readers outlive the monitor and keep the last snapshot.
        assert!(reader.health().last_success_at.is_some());
    }
}
