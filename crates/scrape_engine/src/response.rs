//! Outward wire payloads for service callers.

use serde::Serialize;
use serde_json::Value;

use crate::engine::ScrapeSuccess;
use crate::types::ScrapeError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload<'a> {
    title: &'a str,
    content: &'a str,
    url: &'a str,
    word_count: usize,
    extracted_at: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessMeta<'a> {
    encoding: &'a str,
    /// Milliseconds spent in the pipeline, network time included.
    processing_time: u64,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse<'a> {
    success: bool,
    data: DocumentPayload<'a>,
    meta: SuccessMeta<'a>,
}

#[derive(Debug, Serialize)]
pub struct FailureResponse {
    status: u16,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

pub fn success_payload(outcome: &ScrapeSuccess) -> SuccessResponse<'_> {
    SuccessResponse {
        success: true,
        data: DocumentPayload {
            title: &outcome.document.title,
            content: &outcome.document.content,
            url: &outcome.document.url,
            word_count: outcome.document.word_count,
            extracted_at: &outcome.document.extracted_at,
        },
        meta: SuccessMeta {
            encoding: &outcome.encoding,
            processing_time: outcome.processing_time_ms,
        },
    }
}

pub fn failure_payload(err: &ScrapeError) -> FailureResponse {
    FailureResponse {
        status: err.wire_status(),
        error: err.wire_label(),
        message: err.to_string(),
        details: err
            .diagnostics()
            .and_then(|diag| serde_json::to_value(diag).ok()),
    }
}
