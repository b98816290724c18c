// src/services/fetcher.rs

//! Planviewer page fetcher.
//!
//! Issues one GET per call against `{base}/lb/overheid/{municipality}` and
//! classifies every failure as a [`FetchError`]. Retrying is left to the
//! scheduler's interval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use url::Url;

use crate::error::{AppError, FetchError, Result};
use crate::models::{AnnouncementRecord, ClientConfig};
use crate::services::Extractor;
use crate::utils::municipality_url;

/// Source of announcement records for a municipality.
#[async_trait]
pub trait AnnouncementSource: Send + Sync {
    /// Fetch the current announcements, or the classified reason it failed.
    async fn fetch(
        &self,
        municipality_id: &str,
    ) -> std::result::Result<Vec<AnnouncementRecord>, FetchError>;
}

/// HTTP fetcher for Planviewer municipality pages.
pub struct PlanviewerClient {
    client: Client,
    base_url: Url,
    user_agent: String,
    extractor: Arc<Extractor>,
}

impl PlanviewerClient {
    /// Create a fetcher with its own HTTP client.
    ///
    /// The client carries the configured user agent and per-request timeout;
    /// it is cheap to clone and safe to share between monitors.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Self::with_client(client, config)
    }

    /// Create a fetcher on top of an existing (possibly shared) HTTP client.
    pub fn with_client(client: Client, config: &ClientConfig) -> Result<Self> {
        let base = config.base_url.trim_end_matches('/');
        let base_url = Url::parse(base)?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::config(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            user_agent: config.user_agent.clone(),
            extractor: Arc::new(Extractor::new(base)?),
        })
    }

    /// Listing page URL for a municipality.
    pub fn page_url(&self, municipality_id: &str) -> std::result::Result<Url, FetchError> {
        municipality_url(&self.base_url, municipality_id).ok_or_else(|| {
            FetchError::data(format!(
                "cannot build page URL for municipality '{municipality_id}'"
            ))
        })
    }
}

#[async_trait]
impl AnnouncementSource for PlanviewerClient {
    async fn fetch(
        &self,
        municipality_id: &str,
    ) -> std::result::Result<Vec<AnnouncementRecord>, FetchError> {
        let url = self.page_url(municipality_id)?;
        log::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(FetchError::connection)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::not_found(url.as_str()));
        }
        if !status.is_success() {
            return Err(FetchError::connection(format!("{status} from {url}")));
        }

        let html = response.text().await.map_err(|e| {
            if e.is_decode() {
                FetchError::data(e)
            } else {
                FetchError::connection(e)
            }
        })?;

        // Parsing is CPU-bound; keep it off the async workers.
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || extractor.extract(&html))
            .await
            .map_err(FetchError::data)
    }
}
