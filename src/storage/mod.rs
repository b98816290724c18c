//! In-memory snapshot storage.
//!
//! One [`SnapshotStore`] exists per monitored instance. Only the scheduler
//! writes to it; consumers hold [`SnapshotReader`]s, which can observe but
//! never mutate. State lives for the life of the process only.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::error::ErrorInfo;
use crate::models::{AnnouncementRecord, Health, Snapshot};

/// Writer side of an instance's snapshot.
#[derive(Debug)]
pub struct SnapshotStore {
    tx: watch::Sender<Snapshot>,
}

impl SnapshotStore {
    /// Create a store holding an empty snapshot.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::new());
        Self { tx }
    }

    /// Read-only view for consumers.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Replace records after a completed, error-free fetch.
    pub(crate) fn apply_success(&self, records: Vec<AnnouncementRecord>, at: DateTime<Utc>) {
        self.tx.send_modify(|snapshot| snapshot.record_success(records, at));
    }

    /// Record a classified failure, keeping the previous records.
    pub(crate) fn apply_failure(&self, error: ErrorInfo) {
        self.tx.send_modify(|snapshot| snapshot.record_failure(error));
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only consumer view of an instance's snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Snapshot>,
}

impl SnapshotReader {
    /// Records of the most recent successful fetch (at most three).
    pub fn current_records(&self) -> Vec<AnnouncementRecord> {
        self.rx.borrow().records.clone()
    }

    /// Status, last success time and consecutive error count.
    pub fn health(&self) -> Health {
        self.rx.borrow().health()
    }

    /// Copy of the whole snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Wait until the snapshot is written again.
    ///
    /// Returns `false` once the owning monitor has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::HealthStatus;

    fn record(title: &str) -> AnnouncementRecord {
        AnnouncementRecord {
            title: title.to_string(),
            start_date: None,
            end_date: Some("31-12-2024".to_string()),
            link: format!("https://www.planviewer.nl/lb/{title}"),
        }
    }

    #[test]
    fn test_reader_sees_writes() {
        let store = SnapshotStore::new();
        let reader = store.reader();
        assert!(reader.current_records().is_empty());

        store.apply_success(vec![record("a"), record("b")], Utc::now());

        assert_eq!(reader.current_records().len(), 2);
        assert_eq!(reader.health().status, HealthStatus::Ok);
    }

    #[test]
    fn test_failure_preserves_records() {
        let store = SnapshotStore::new();
        let reader = store.reader();
        store.apply_success(vec![record("a")], Utc::now());
        let before = reader.snapshot();

        store.apply_failure(ErrorInfo::from(&FetchError::not_found("u")));

        let after = reader.snapshot();
        assert_eq!(after.records, before.records);
        assert_eq!(after.last_success_at, before.last_success_at);
        assert_eq!(after.consecutive_error_count, 1);
        assert_eq!(reader.health().status, HealthStatus::Error);
    }

    #[tokio::test]
    async fn test_changed_notifies_and_ends_with_store() {
        let store = SnapshotStore::new();
        let mut reader = store.reader();

        store.apply_failure(ErrorInfo::from(&FetchError::data("x")));
        assert!(reader.changed().await);

        drop(store);
        assert!(!reader.changed().await);
    }
}
