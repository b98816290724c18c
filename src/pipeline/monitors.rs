// src/pipeline/monitors.rs

//! Collection of independently scheduled monitors.
//!
//! Owned by whoever wires the application together and passed around
//! explicitly; there is no process-wide registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::error::{AppError, Result};
use crate::models::{InstanceConfig, InstanceKey, RefreshConfig};
use crate::pipeline::scheduler::{Monitor, MonitorHandle, RefreshOutcome};
use crate::services::AnnouncementSource;
use crate::storage::SnapshotReader;

/// Running monitors, keyed by instance.
pub struct MonitorSet {
    source: Arc<dyn AnnouncementSource>,
    handles: BTreeMap<InstanceKey, MonitorHandle>,
}

impl MonitorSet {
    /// Create an empty set; every monitor shares `source`.
    pub fn new(source: Arc<dyn AnnouncementSource>) -> Self {
        Self {
            source,
            handles: BTreeMap::new(),
        }
    }

    /// Start every configured instance.
    ///
    /// First refreshes run concurrently; the call returns once all of them
    /// have completed.
    pub async fn start_all(
        source: Arc<dyn AnnouncementSource>,
        instances: &[InstanceConfig],
    ) -> Result<Self> {
        let mut set = Self::new(source);

        let mut monitors = Vec::with_capacity(instances.len());
        let mut keys = Vec::with_capacity(instances.len());
        for instance in instances {
            let key = instance.key();
            if keys.contains(&key) {
                return Err(AppError::validation(format!(
                    "instance {key} is already configured"
                )));
            }
            let config = instance.refresh_config()?;
            monitors.push(Monitor::new(key.clone(), config, Arc::clone(&set.source)));
            keys.push(key);
        }

        let handles = join_all(monitors.into_iter().map(Monitor::start)).await;
        for handle in handles {
            set.handles.insert(handle.key().clone(), handle);
        }

        log::info!("Started {} monitor(s)", set.handles.len());
        Ok(set)
    }

    /// Start a single instance, after its first refresh has completed.
    pub async fn start(
        &mut self,
        key: InstanceKey,
        config: RefreshConfig,
    ) -> Result<SnapshotReader> {
        check_key(&key, &config)?;
        if self.handles.contains_key(&key) {
            return Err(AppError::validation(format!(
                "instance {key} is already configured"
            )));
        }
        Ok(self.launch(key, config).await)
    }

    /// Restart an instance with new refresh settings.
    ///
    /// The old monitor is stopped and the new one starts from an empty
    /// snapshot, as a reload does.
    pub async fn reconfigure(
        &mut self,
        key: InstanceKey,
        config: RefreshConfig,
    ) -> Result<SnapshotReader> {
        check_key(&key, &config)?;
        let Some(old) = self.handles.remove(&key) else {
            return Err(AppError::config(format!("instance {key} is not running")));
        };
        log::debug!("Reloading {} with interval {}s", key, config.interval_seconds());
        old.shutdown().await;
        Ok(self.launch(key, config).await)
    }

    /// Stop one instance. Returns `false` if it was not running.
    pub async fn stop(&mut self, key: &InstanceKey) -> bool {
        match self.handles.remove(key) {
            Some(handle) => {
                handle.shutdown().await;
                true
            }
            None => false,
        }
    }

    /// Refresh one instance immediately.
    pub async fn refresh_now(&self, key: &InstanceKey) -> Option<RefreshOutcome> {
        match self.handles.get(key) {
            Some(handle) => Some(handle.refresh_now().await),
            None => None,
        }
    }

    pub fn reader(&self, key: &InstanceKey) -> Option<SnapshotReader> {
        self.handles.get(key).map(MonitorHandle::reader)
    }

    /// Readers for every running instance, ordered by key.
    pub fn readers(&self) -> Vec<(InstanceKey, SnapshotReader)> {
        self.handles
            .iter()
            .map(|(key, handle)| (key.clone(), handle.reader()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop every monitor.
    pub async fn shutdown(self) {
        join_all(self.handles.into_values().map(MonitorHandle::shutdown)).await;
        log::info!("All monitors stopped");
    }

    async fn launch(&mut self, key: InstanceKey, config: RefreshConfig) -> SnapshotReader {
        let handle = Monitor::new(key.clone(), config, Arc::clone(&self.source))
            .start()
            .await;
        let reader = handle.reader();
        self.handles.insert(key, handle);
        reader
    }
}

/// A key must name the municipality its monitor actually fetches.
fn check_key(key: &InstanceKey, config: &RefreshConfig) -> Result<()> {
    if key.municipality != config.municipality_id() {
        return Err(AppError::validation(format!(
            "instance {key} cannot fetch municipality '{}'",
            config.municipality_id()
        )));
    }
    Ok(())
}
