//! Service layer for the announcement monitor.
//!
//! This module contains the business logic for:
//! - HTML extraction (`Extractor`)
//! - Page fetching (`PlanviewerClient`, behind `AnnouncementSource`)

mod extractor;
mod fetcher;

pub use extractor::Extractor;
pub use fetcher::{AnnouncementSource, PlanviewerClient};
