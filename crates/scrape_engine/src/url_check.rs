use thiserror::Error;
use url::Url;

use crate::types::ScrapeError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("url must not be empty")]
    Empty,
    #[error("malformed url: {0}")]
    Malformed(String),
    #[error("unsupported scheme `{0}`: only http and https are allowed")]
    UnsupportedScheme(String),
}

impl From<UrlError> for ScrapeError {
    fn from(err: UrlError) -> Self {
        match err {
            UrlError::Empty => ScrapeError::EmptyUrl,
            UrlError::Malformed(message) => ScrapeError::InvalidUrl(message),
            UrlError::UnsupportedScheme(scheme) => ScrapeError::UnsupportedScheme(scheme),
        }
    }
}

/// Constrain raw input to an absolute http/https URL and return it trimmed.
/// Performs no I/O.
pub fn validate_url(raw: &str) -> Result<String, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    let parsed = Url::parse(trimmed).map_err(|err| UrlError::Malformed(err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(UrlError::UnsupportedScheme(other.to_string())),
    }
}
