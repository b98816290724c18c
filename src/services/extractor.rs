// src/services/extractor.rs

//! Announcement extraction.
//!
//! Turns a municipality listing page into at most [`MAX_RECORDS`] records.
//! Extraction never fails on parseable HTML: a page without the expected
//! panel, or a panel without announcement rows, yields an empty list.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{AnnouncementRecord, MAX_RECORDS, PageLayout};
use crate::utils::{absolute_link, slug_title};

/// Format of the start date cell, e.g. `05-03-2024`.
const START_DATE_FORMAT: &str = "%d-%m-%Y";

/// Title used when neither the slug nor the marker text is usable.
const PLACEHOLDER_TITLE: &str = "Announcement";

/// Pure HTML to record extractor for the fixed listing layout.
#[derive(Debug)]
pub struct Extractor {
    base_url: String,
    container: Selector,
    item: Selector,
    title: Selector,
    start_date: Selector,
    end_date: Selector,
    attr_name: String,
}

impl Extractor {
    /// Create an extractor for the default page layout.
    ///
    /// `base_url` is prepended verbatim to every row's href.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_layout(base_url, &PageLayout::default())
    }

    fn with_layout(base_url: impl Into<String>, layout: &PageLayout) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into(),
            container: Self::parse_selector(&layout.container_selector)?,
            item: Self::parse_selector(&layout.item_selector)?,
            title: Self::parse_selector(&layout.title_selector)?,
            start_date: Self::parse_selector(&layout.start_date_selector)?,
            end_date: Self::parse_selector(&layout.end_date_selector)?,
            attr_name: layout.attr_name.clone(),
        })
    }

    /// Extract the first announcements of a listing page, in page order.
    pub fn extract(&self, html: &str) -> Vec<AnnouncementRecord> {
        let document = Html::parse_document(html);

        let Some(container) = document.select(&self.container).next() else {
            log::warn!("Could not find announcement container");
            return Vec::new();
        };

        // Only links carrying the title marker are announcement rows.
        let items: Vec<ElementRef> = container
            .select(&self.item)
            .filter(|item| item.select(&self.title).next().is_some())
            .collect();

        if items.is_empty() {
            log::info!("No announcements found in container");
            return Vec::new();
        }

        items
            .iter()
            .filter_map(|item| self.parse_item(item))
            .take(MAX_RECORDS)
            .collect()
    }

    fn parse_item(&self, item: &ElementRef) -> Option<AnnouncementRecord> {
        let title_elem = item.select(&self.title).next();
        let href = item
            .value()
            .attr(&self.attr_name)
            .filter(|href| !href.is_empty());

        let (Some(title_elem), Some(href)) = (title_elem, href) else {
            log::debug!("Skipping item without expected elements: {}", item.html());
            return None;
        };

        let title = slug_title(href).unwrap_or_else(|| {
            let text = element_text(title_elem);
            if text.is_empty() {
                PLACEHOLDER_TITLE.to_string()
            } else {
                text
            }
        });

        let start_date = item
            .select(&self.start_date)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty())
            .and_then(|s| parse_start_date(&s));

        let end_date = item
            .select(&self.end_date)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());

        Some(AnnouncementRecord {
            title,
            start_date,
            end_date,
            link: absolute_link(&self.base_url, href),
        })
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Parse a `dd-mm-yyyy` start date, logging and discarding anything else.
fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, START_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            log::warn!("Could not parse start date: {}", raw);
            None
        }
    }
}

fn element_text(elem: ElementRef) -> String {
    elem.text().collect::<String>().trim().to_string()
}
