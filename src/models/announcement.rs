//! Announcement data structure.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An announcement scraped from a municipality listing page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnouncementRecord {
    /// Readable label, derived from the link slug
    pub title: String,

    /// Start date, parsed from `dd-mm-yyyy`
    pub start_date: Option<NaiveDate>,

    /// End date as displayed on the page
    pub end_date: Option<String>,

    /// Absolute URL to the announcement detail page
    pub link: String,
}

impl AnnouncementRecord {
    /// Format the record for display using a template.
    ///
    /// Supported placeholders: `{title}`, `{start_date}`, `{end_date}`, `{link}`.
    /// Absent dates render as `-`.
    pub fn format(&self, template: &str) -> String {
        let start = self
            .start_date
            .map(|d| d.format("%d-%m-%Y").to_string())
            .unwrap_or_else(|| "-".to_string());
        let end = self.end_date.as_deref().unwrap_or("-");

        template
            .replace("{title}", &self.title)
            .replace("{start_date}", &start)
            .replace("{end_date}", end)
            .replace("{link}", &self.link)
    }
}
