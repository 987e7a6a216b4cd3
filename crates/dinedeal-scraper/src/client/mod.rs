//! HTTP client for provider pages and their secondary JSON endpoints.

mod origin;

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::ScraperError;

pub use origin::host_of;

/// Fetches provider pages with a fixed timeout and browser-like headers.
///
/// Status classification happens here: 403/429 become
/// [`ScraperError::RateLimited`], any other status >= 400 becomes
/// [`ScraperError::UnexpectedStatus`]. Nothing is retried; a failed task is
/// retried on a later run.
#[derive(Debug, Clone)]
pub struct PageClient {
    client: Client,
}

impl PageClient {
    /// Creates a `PageClient` with the given request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches an HTML page and returns its body.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] HTTP 403 or 429.
    /// - [`ScraperError::UnexpectedStatus`] any other status >= 400.
    /// - [`ScraperError::Http`] network failure or timeout.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-IN,en;q=0.9")
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            let host = host_of(url).unwrap_or_else(|| url.to_owned());
            return Err(ScraperError::RateLimited {
                host,
                status: status.as_u16(),
            });
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }

    /// Fetches a JSON document.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnexpectedStatus`] any status >= 400, including
    ///   403 and 429.
    /// - [`ScraperError::Http`] network failure or timeout.
    /// - [`ScraperError::Deserialize`] body is not valid JSON.
    pub async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json,*/*;q=0.8")
            .send()
            .await?;
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
            context: format!("data document from {url}"),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
