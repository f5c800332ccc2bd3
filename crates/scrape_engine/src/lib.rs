//! Scrape engine: retrieval and extraction pipeline for web-fiction pages.
mod decode;
mod engine;
mod extract;
mod fetch;
mod patterns;
mod response;
mod sites;
mod text;
mod types;
mod url_check;
mod validate;

pub use decode::{decode_html, detect_encoding, DecodedHtml, DetectionSource, EncodingDecision};
pub use engine::{ScrapeSuccess, Scraper};
pub use extract::{Candidate, ContentExtractor, ExtractedPage};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, RetryPolicy};
pub use patterns::{
    apply_cleanup, contamination_flags, has_chapter_heading, strip_trailing_controls,
    ui_keyword_ratio,
};
pub use response::{failure_payload, success_payload, FailureResponse, SuccessResponse};
pub use sites::{is_known_gbk_host, specialized_pack, SitePack};
pub use text::{normalize_whitespace, word_count};
pub use types::{
    Diagnostics, FailureKind, FetchError, FetchMetadata, FetchOutput, Limits, ScrapeError,
    ScrapedDocument,
};
pub use url_check::{validate_url, UrlError};
pub use validate::{validate_content, ValidationFailure};
