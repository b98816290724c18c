// src/models/mod.rs

//! Domain models for the announcement monitor.

mod announcement;
mod config;
mod layout;
mod snapshot;

// Re-export all public types
pub use announcement::AnnouncementRecord;
pub use config::{
    ClientConfig, Config, DEFAULT_INTERVAL_SECS, InstanceConfig, InstanceKey, LoggingConfig,
    MIN_INTERVAL_SECS, RefreshConfig,
};
pub(crate) use layout::PageLayout;
pub use snapshot::{Health, HealthStatus, MAX_RECORDS, Snapshot};
