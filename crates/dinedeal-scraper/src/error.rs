use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP 403 or 429: the host wants us to back off.
    #[error("rate limited by {host} (HTTP {status})")]
    RateLimited { host: String, status: u16 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ScraperError {
    /// The HTTP status carried by this error, if any.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ScraperError::RateLimited { status, .. }
            | ScraperError::UnexpectedStatus { status, .. } => Some(*status),
            ScraperError::Http(e) => e.status().map(|s| s.as_u16()),
            ScraperError::Deserialize { .. } | ScraperError::InvalidUrl { .. } => None,
        }
    }
}
