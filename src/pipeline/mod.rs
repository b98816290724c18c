//! Refresh pipeline.
//!
//! - `Monitor`: timer-driven refresh of one instance's snapshot
//! - `MonitorSet`: the independently scheduled monitors of an application

pub mod monitors;
pub mod scheduler;

pub use monitors::MonitorSet;
pub use scheduler::{Monitor, MonitorHandle, RefreshOutcome};
