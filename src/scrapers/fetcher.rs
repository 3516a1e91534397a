//! HTTP retrieval of article pages.
//!
//! One GET per URL with a browser-like User-Agent and a fixed timeout. Any
//! status other than `200 OK` is a failure. Nothing is retried.

use crate::config::Settings;
use crate::error::{ConfigError, FetchError};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct ArticleFetcher {
    http: reqwest::Client,
}

impl ArticleFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { http })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Self::new(settings.fetch_timeout(), &settings.user_agent)
    }

    /// Fetch the raw HTML of `url`.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let html = response.text().await?;
        debug!(bytes = html.len(), "Fetched page");
        Ok(html)
    }
}
