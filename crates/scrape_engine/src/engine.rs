use std::time::Instant;

use engine_logging::{engine_debug, engine_info};

use crate::decode;
use crate::extract::ContentExtractor;
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::sites;
use crate::text;
use crate::types::{Limits, ScrapeError, ScrapedDocument};
use crate::url_check;
use crate::validate::{self, ValidationFailure};

/// Result of one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSuccess {
    pub document: ScrapedDocument,
    /// Name of the encoding the response bytes were decoded with.
    pub encoding: String,
    pub processing_time_ms: u64,
}

/// One-shot scrape pipeline: validate → fetch → decode → extract → validate.
///
/// Holds no mutable state, so a single instance can serve concurrent scrapes;
/// every invocation is independent and nothing is cached across calls.
pub struct Scraper<F = ReqwestFetcher> {
    fetcher: F,
    limits: Limits,
}

impl Scraper<ReqwestFetcher> {
    pub fn new(settings: FetchSettings) -> Self {
        Self {
            fetcher: ReqwestFetcher::new(settings),
            limits: Limits::default(),
        }
    }
}

impl Default for Scraper<ReqwestFetcher> {
    fn default() -> Self {
        Self::new(FetchSettings::default())
    }
}

impl<F: Fetcher> Scraper<F> {
    /// Build a scraper around any fetcher implementation, e.g. for tests.
    pub fn with_fetcher(fetcher: F, limits: Limits) -> Self {
        Self { fetcher, limits }
    }

    pub async fn scrape(&self, raw_url: &str) -> Result<ScrapeSuccess, ScrapeError> {
        let started = Instant::now();
        let url = url_check::validate_url(raw_url)?;

        let output = self.fetcher.fetch(&url).await?;

        let decision = decode::detect_encoding(
            output.metadata.content_type.as_deref(),
            &output.bytes,
            &url,
        );
        let decoded = decode::decode_html(&output.bytes, decision);
        engine_debug!(
            "decoded {} bytes from {} as {} (via {:?})",
            output.metadata.byte_len,
            output.metadata.final_url,
            decoded.encoding_label,
            decoded.source
        );

        let pack = sites::specialized_pack(&url);
        let page = ContentExtractor::new(self.limits).extract(&decoded.html, pack);

        validate::validate_content(&page.title, &page.content, pack.is_some(), &self.limits)
            .map_err(|failure| match failure {
                ValidationFailure::TooShort(diag) => ScrapeError::ExtractionFailed(diag),
                ValidationFailure::Contaminated(diag) => ScrapeError::Contaminated(diag),
            })?;

        let word_count = text::word_count(&page.content);
        let document = ScrapedDocument {
            title: page.title,
            content: page.content,
            url: output.metadata.final_url,
            word_count,
            extracted_at: chrono::Utc::now().to_rfc3339(),
        };
        engine_info!(
            "scraped {} ({} words via `{}`)",
            document.url,
            document.word_count,
            page.strategy
        );

        Ok(ScrapeSuccess {
            document,
            encoding: decoded.encoding_label,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}
