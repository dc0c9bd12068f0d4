//! HTTP client for the schedule provider
//!
//! Fetches lesson schedules for a group or teacher name and the flat list of
//! known names used to build the entity directory.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::directory::RawDirectoryEntry;
use super::ScheduleDocument;

/// Default request timeout for provider calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to the schedule provider
///
/// Callers treat every variant as "provider unavailable".
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Provider answered with anything other than 200 OK
    #[error("Provider returned HTTP {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configured URL cannot carry a path segment
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),
}

/// Anything that can produce a schedule document for an entity name
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<ScheduleDocument, FetchError>;
}

/// Client for the schedule provider's REST API
#[derive(Debug, Clone)]
pub struct ScheduleClient {
    client: Client,
    /// Endpoint that schedules are appended to as a path segment
    lessons_url: Url,
    /// Endpoint returning every known group and teacher name
    directory_url: Url,
}

impl ScheduleClient {
    /// Creates a client with the given endpoints and request timeout
    pub fn new(lessons_url: &str, directory_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(
            client,
            parse_url(lessons_url)?,
            parse_url(directory_url)?,
        ))
    }

    /// Creates a client around an existing HTTP client
    pub fn with_client(client: Client, lessons_url: Url, directory_url: Url) -> Self {
        Self {
            client,
            lessons_url,
            directory_url,
        }
    }

    /// Builds `{lessons_url}/{name}` with `name` encoded as one path segment
    fn lessons_endpoint(&self, name: &str) -> Result<Url, FetchError> {
        let mut url = self.lessons_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.lessons_url.to_string()))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    /// Fetch the schedule for a group or teacher
    ///
    /// # Returns
    /// * `Ok(ScheduleDocument)` on a 200 response with a well-formed body
    /// * `Err(FetchError)` on network failure, timeout, any other status or bad JSON
    pub async fn fetch_schedule(&self, name: &str) -> Result<ScheduleDocument, FetchError> {
        let url = self.lessons_endpoint(name)?;
        info!(%name, %url, "fetching schedule from provider");

        let text = self.get_text(url).await?;
        let document: ScheduleDocument = serde_json::from_str(&text)?;

        debug!(%name, weeks = document.weeks.len(), "schedule parsed");
        Ok(document)
    }

    /// Fetch the raw list of known group and teacher names
    pub async fn fetch_directory(&self) -> Result<Vec<RawDirectoryEntry>, FetchError> {
        info!(url = %self.directory_url, "fetching entity directory");

        let text = self.get_text(self.directory_url.clone()).await?;
        let entries: Vec<RawDirectoryEntry> = serde_json::from_str(&text)?;

        debug!(count = entries.len(), "directory parsed");
        Ok(entries)
    }

    async fn get_text(&self, url: Url) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "provider request failed");
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ScheduleSource for ScheduleClient {
    async fn fetch(&self, name: &str) -> Result<ScheduleDocument, FetchError> {
        self.fetch_schedule(name).await
    }
}

fn parse_url(raw: &str) -> Result<Url, FetchError> {
    Url::parse(raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))
}
