// src/models/layout.rs

//! CSS selectors describing the announcement listing layout.

/// CSS selectors for scraping the announcements panel.
#[derive(Debug, Clone)]
pub(crate) struct PageLayout {
    /// Selector for the single panel holding the announcement rows
    pub container_selector: String,

    /// Selector for the row links inside the panel
    pub item_selector: String,

    /// Selector for the title marker that identifies a real announcement row
    pub title_selector: String,

    /// Selector for the start date cell within a row
    pub start_date_selector: String,

    /// Selector for the end date cell within a row
    pub end_date_selector: String,

    /// HTML attribute holding the page-relative link (usually "href")
    pub attr_name: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            container_selector:
                "div.container > div:nth-child(6) > div.col-12.imro-address-list-page > div"
                    .to_string(),
            item_selector: "a".to_string(),
            title_selector: "div > span.col-10.col-sm-6.col-md-7.tbl-btm-row-icon-col"
                .to_string(),
            start_date_selector: "div > span:nth-child(2)".to_string(),
            end_date_selector: "div > span:nth-child(3)".to_string(),
            attr_name: "href".to_string(),
        }
    }
}
