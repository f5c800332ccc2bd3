//! Charset detection and byte decoding.
//!
//! Web-fiction hosts are notoriously sloppy about declaring their encoding,
//! so detection is a priority cascade over several weak signals. It is total:
//! every input resolves to some encoding, falling back to UTF-8, and the
//! decode itself is lossy and never fails.

use std::sync::LazyLock;

use encoding_rs::{Encoding, GBK, UTF_8};
use regex::Regex;

use crate::sites;

/// How far into the document the meta-charset scan reaches.
const META_SCAN_BYTES: usize = 2048;
/// Sample size for the high-byte statistic.
const STAT_SAMPLE_BYTES: usize = 1000;
/// High-byte fraction above which bytes are assumed to be double-byte CJK.
const HIGH_BYTE_GBK_THRESHOLD: f32 = 0.30;

/// Match `<meta charset="...">` tag.
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>]+)"#).expect("valid regex")
});

/// Match `<meta http-equiv="Content-Type" content="...; charset=...">` tag.
#[allow(clippy::expect_used)]
static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>]+)"#).expect("valid regex")
});

/// GB-family labels all normalize to canonical GBK.
#[allow(clippy::expect_used)]
static GB_FAMILY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^gb(?:k|2312|_2312|18030)?$").expect("valid regex"));

/// Which cascade step decided the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    HeaderCharset,
    ByteOrderMark,
    MetaTag,
    DomainHint,
    ByteHistogram,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingDecision {
    pub encoding: &'static Encoding,
    pub source: DetectionSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding_label: String,
    pub source: DetectionSource,
}

/// Resolve the decode encoding for a response. Total; first signal wins:
/// Content-Type charset, UTF-8 BOM, meta tag, domain hint, byte statistics,
/// then the UTF-8 default.
pub fn detect_encoding(
    content_type: Option<&str>,
    bytes: &[u8],
    url: &str,
) -> EncodingDecision {
    if let Some(encoding) = content_type
        .and_then(extract_charset)
        .and_then(|label| resolve_label(&label))
    {
        return EncodingDecision {
            encoding,
            source: DetectionSource::HeaderCharset,
        };
    }

    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return EncodingDecision {
            encoding: UTF_8,
            source: DetectionSource::ByteOrderMark,
        };
    }

    if let Some(encoding) = meta_declared_encoding(bytes) {
        return EncodingDecision {
            encoding,
            source: DetectionSource::MetaTag,
        };
    }

    if sites::is_known_gbk_host(url) {
        return EncodingDecision {
            encoding: GBK,
            source: DetectionSource::DomainHint,
        };
    }

    if high_byte_fraction(bytes) > HIGH_BYTE_GBK_THRESHOLD {
        return EncodingDecision {
            encoding: GBK,
            source: DetectionSource::ByteHistogram,
        };
    }

    EncodingDecision {
        encoding: UTF_8,
        source: DetectionSource::Default,
    }
}

/// Decode bytes with the decided encoding. Lossy: undecodable sequences
/// become replacement characters rather than errors.
pub fn decode_html(bytes: &[u8], decision: EncodingDecision) -> DecodedHtml {
    let (text, used, _had_errors) = decision.encoding.decode(bytes);
    DecodedHtml {
        html: text.into_owned(),
        encoding_label: used.name().to_string(),
        source: decision.source,
    }
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let part = part.trim();
            part.strip_prefix("charset=")
                .or_else(|| part.strip_prefix("Charset="))
                .or_else(|| part.strip_prefix("CHARSET="))
                .map(|v| v.trim_matches([' ', '"', '\''].as_ref()))
        })
        .next()
        .map(|s| s.to_string())
}

/// Map a charset label to an encoding, folding the GB family onto GBK.
fn resolve_label(label: &str) -> Option<&'static Encoding> {
    if GB_FAMILY_RE.is_match(label) {
        return Some(GBK);
    }
    Encoding::for_label(label.as_bytes())
}

fn meta_declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SCAN_BYTES)];
    // Lossy ASCII view is enough: charset declarations are ASCII.
    let head_str = String::from_utf8_lossy(head);
    let label = CHARSET_META_RE
        .captures(&head_str)
        .or_else(|| CONTENT_TYPE_CHARSET_RE.captures(&head_str))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())?;
    resolve_label(&label)
}

fn high_byte_fraction(bytes: &[u8]) -> f32 {
    let sample = &bytes[..bytes.len().min(STAT_SAMPLE_BYTES)];
    if sample.is_empty() {
        return 0.0;
    }
    let high = sample.iter().filter(|byte| **byte > 0x7F).count();
    high as f32 / sample.len() as f32
}
