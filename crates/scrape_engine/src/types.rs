use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub status: u16,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
    /// Number of attempts made before this error was surfaced.
    pub attempts: u32,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            attempts: 1,
        }
    }

    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl FailureKind {
    /// Permanent failures are surfaced immediately; a retry cannot change them.
    pub fn is_permanent(&self) -> bool {
        match self {
            FailureKind::HttpStatus(code) => matches!(*code, 403 | 404),
            FailureKind::InvalidUrl
            | FailureKind::RedirectLimitExceeded
            | FailureKind::TooLarge { .. }
            | FailureKind::UnsupportedContentType { .. } => true,
            FailureKind::Timeout | FailureKind::Network => false,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Character-count thresholds and ratios used by extraction and validation.
///
/// The values are empirically tuned; they are carried as data so callers can
/// adjust them without touching the cascade logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Minimum accepted content length for any site.
    pub min_content_chars: usize,
    /// Floor for the exhaustive selector-ranking stage.
    pub ranking_floor_chars: usize,
    /// Minimum accepted length for the generic-container stage.
    pub generic_min_chars: usize,
    /// Minimum accepted length for a specialized-site selector hit.
    pub specialized_min_chars: usize,
    /// Minimum cleaned length for a whole-body chapter capture.
    pub chapter_min_chars: usize,
    /// Minimum raw length of a chapter-heading segment before cleanup.
    pub chapter_match_min_chars: usize,
    /// Fragments shorter than this are dropped by the aggregation fallback.
    pub min_fragment_chars: usize,
    /// Upper bound on fragments joined by the aggregation fallback.
    pub max_fragments: usize,
    /// Heading/selector title strategies must reach this length to win.
    pub min_title_chars: usize,
    /// Reading-UI keyword character ratio above which content is rejected.
    pub max_ui_ratio: f32,
    /// Stricter ratio applied to whole-body chapter captures.
    pub strict_ui_ratio: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_content_chars: 20,
            ranking_floor_chars: 50,
            generic_min_chars: 200,
            specialized_min_chars: 500,
            chapter_min_chars: 800,
            chapter_match_min_chars: 1000,
            min_fragment_chars: 10,
            max_fragments: 200,
            min_title_chars: 5,
            max_ui_ratio: 0.10,
            strict_ui_ratio: 0.05,
        }
    }
}

/// The one artifact a successful scrape returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedDocument {
    pub title: String,
    pub content: String,
    pub url: String,
    pub word_count: usize,
    pub extracted_at: String,
}

/// Why an extraction was rejected, in enough detail to debug a site.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub title: String,
    pub content_chars: usize,
    pub matched_flags: Vec<String>,
    pub ui_ratio: f32,
    pub suggestion: String,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "title `{}`, {} chars, flags [{}], ui ratio {:.2}",
            self.title,
            self.content_chars,
            self.matched_flags.join(", "),
            self.ui_ratio
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScrapeError {
    #[error("url must not be empty")]
    EmptyUrl,
    #[error("malformed url: {0}")]
    InvalidUrl(String),
    #[error("unsupported scheme `{0}`: only http and https are allowed")]
    UnsupportedScheme(String),
    #[error("target site refused the request (403)")]
    Forbidden,
    #[error("page not found (404)")]
    NotFound,
    #[error("request timed out after {attempts} attempt(s)")]
    TimedOut { attempts: u32 },
    #[error("upstream returned status {status} after {attempts} attempt(s)")]
    UpstreamStatus { status: u16, attempts: u32 },
    #[error("network failure after {attempts} attempt(s): {message}")]
    Network { message: String, attempts: u32 },
    #[error("content extraction failed: {0}")]
    ExtractionFailed(Diagnostics),
    #[error("extracted content is reading-ui chrome, not narrative: {0}")]
    Contaminated(Diagnostics),
}

impl ScrapeError {
    /// HTTP-style status this error maps to at the service boundary.
    pub fn wire_status(&self) -> u16 {
        match self {
            ScrapeError::EmptyUrl
            | ScrapeError::InvalidUrl(_)
            | ScrapeError::UnsupportedScheme(_) => 400,
            ScrapeError::Forbidden => 403,
            ScrapeError::NotFound => 404,
            ScrapeError::TimedOut { .. } => 408,
            ScrapeError::UpstreamStatus { status, .. } if *status >= 500 => 502,
            ScrapeError::UpstreamStatus { .. } | ScrapeError::Network { .. } => 500,
            ScrapeError::ExtractionFailed(_) | ScrapeError::Contaminated(_) => 422,
        }
    }

    /// Short, stable error label for the failure payload.
    pub fn wire_label(&self) -> &'static str {
        match self {
            ScrapeError::EmptyUrl
            | ScrapeError::InvalidUrl(_)
            | ScrapeError::UnsupportedScheme(_) => "Invalid URL",
            ScrapeError::Forbidden => "Access forbidden",
            ScrapeError::NotFound => "Page not found",
            ScrapeError::TimedOut { .. } => "Request timeout",
            ScrapeError::UpstreamStatus { status, .. } if *status >= 500 => {
                "Upstream server error"
            }
            ScrapeError::UpstreamStatus { .. } | ScrapeError::Network { .. } => "Scrape failed",
            ScrapeError::ExtractionFailed(_) | ScrapeError::Contaminated(_) => {
                "Content extraction failed"
            }
        }
    }

    /// Diagnostics payload, present for extraction-stage failures.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            ScrapeError::ExtractionFailed(diag) | ScrapeError::Contaminated(diag) => Some(diag),
            _ => None,
        }
    }
}

impl From<FetchError> for ScrapeError {
    fn from(err: FetchError) -> Self {
        let FetchError {
            kind,
            message,
            attempts,
        } = err;
        match kind {
            FailureKind::HttpStatus(403) => ScrapeError::Forbidden,
            FailureKind::HttpStatus(404) => ScrapeError::NotFound,
            FailureKind::HttpStatus(status) => ScrapeError::UpstreamStatus { status, attempts },
            FailureKind::Timeout => ScrapeError::TimedOut { attempts },
            FailureKind::InvalidUrl => ScrapeError::InvalidUrl(message),
            kind @ (FailureKind::RedirectLimitExceeded
            | FailureKind::TooLarge { .. }
            | FailureKind::UnsupportedContentType { .. }
            | FailureKind::Network) => ScrapeError::Network {
                message: format!("{kind}: {message}"),
                attempts,
            },
        }
    }
}
