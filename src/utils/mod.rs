//! Utility functions and helpers.

use url::Url;

/// Build the listing page URL for a municipality: `{base}/lb/overheid/{municipality}`.
///
/// The municipality is appended as a single, percent-encoded path segment.
/// Returns `None` if `base` cannot carry a path.
pub fn municipality_url(base: &Url, municipality: &str) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(["lb", "overheid", municipality]);
    Some(url)
}

/// Absolute link for a page-relative href: the base followed by the href, verbatim.
pub fn absolute_link(base: &str, href: &str) -> String {
    format!("{base}{href}")
}

/// Readable title from the last path segment of an href.
///
/// `/lb/overheid/x/bouw-van-een-schuur` becomes `bouw van een schuur`.
/// Returns `None` when the href has no `/` or its last segment is blank.
pub fn slug_title(href: &str) -> Option<String> {
    let parts: Vec<&str> = href.split('/').collect();
    if parts.len() < 2 {
        return None;
    }
    let title = parts[parts.len() - 1].replace('-', " ").trim().to_string();
    if title.is_empty() { None } else { Some(title) }
}
