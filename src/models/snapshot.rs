//! Latest known-good records plus health metadata for one instance.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ErrorInfo;
use crate::models::AnnouncementRecord;

/// Most announcements a snapshot keeps.
pub const MAX_RECORDS: usize = 3;

/// In-memory state of one monitored instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Most recent announcements in page order, at most [`MAX_RECORDS`]
    pub records: Vec<AnnouncementRecord>,

    /// Time of the last successful fetch
    pub last_success_at: Option<DateTime<Utc>>,

    /// Classified error of the last attempt, cleared on success
    pub last_error: Option<ErrorInfo>,

    /// Failed attempts since the last success
    pub consecutive_error_count: u32,
}

impl Snapshot {
    /// Empty snapshot, as created at startup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the records after a fetch that raised no error.
    ///
    /// An empty `records` is still a success.
    pub(crate) fn record_success(
        &mut self,
        mut records: Vec<AnnouncementRecord>,
        at: DateTime<Utc>,
    ) {
        records.truncate(MAX_RECORDS);
        self.records = records;
        self.last_success_at = Some(at);
        self.last_error = None;
        self.consecutive_error_count = 0;
    }

    /// Keep the previous records and note the failure.
    pub(crate) fn record_failure(&mut self, error: ErrorInfo) {
        self.last_error = Some(error);
        self.consecutive_error_count = self.consecutive_error_count.saturating_add(1);
    }

    pub fn status(&self) -> HealthStatus {
        if self.last_error.is_some() {
            HealthStatus::Error
        } else {
            HealthStatus::Ok
        }
    }

    pub fn health(&self) -> Health {
        Health {
            status: self.status(),
            last_success_at: self.last_success_at,
            consecutive_error_count: self.consecutive_error_count,
            last_error: self.last_error.clone(),
        }
    }
}

/// Overall status readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Error")]
    Error,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HealthStatus::Ok => "OK",
            HealthStatus::Error => "Error",
        })
    }
}

/// Diagnostic readouts for consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub status: HealthStatus,
    pub last_success_at: Option<DateTime<Utc>>,
    pub consecutive_error_count: u32,
    pub last_error: Option<ErrorInfo>,
}
