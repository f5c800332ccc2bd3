//! Post-extraction quality gate.
//!
//! The extractor is heuristic, so its output is never trusted blindly: text
//! that is too short, or that still reads like reading-UI chrome on a
//! specialized host, is rejected with diagnostics instead of being returned
//! as a degraded success.

use crate::patterns;
use crate::text;
use crate::types::{Diagnostics, Limits};

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    TooShort(Diagnostics),
    Contaminated(Diagnostics),
}

/// Validate extracted content. `specialized` selects the stricter rules used
/// for hosts with bespoke selector packs, where a full chapter is expected.
pub fn validate_content(
    title: &str,
    content: &str,
    specialized: bool,
    limits: &Limits,
) -> Result<(), ValidationFailure> {
    let content_chars = text::char_len(content);
    if content_chars < limits.min_content_chars {
        return Err(ValidationFailure::TooShort(Diagnostics {
            title: title.to_string(),
            content_chars,
            matched_flags: Vec::new(),
            ui_ratio: 0.0,
            suggestion: "page may need a browser to render, or served an interstitial; inspect the raw html".to_string(),
        }));
    }

    if !specialized {
        return Ok(());
    }

    let mut matched_flags: Vec<String> = patterns::contamination_flags(content)
        .into_iter()
        .map(str::to_string)
        .collect();
    if !patterns::has_chapter_heading(content) {
        matched_flags.push("missing-chapter-heading".to_string());
    }
    let ui_ratio = patterns::ui_keyword_ratio(content);

    let contaminated = !matched_flags.is_empty() || ui_ratio > limits.max_ui_ratio;
    if contaminated {
        return Err(ValidationFailure::Contaminated(Diagnostics {
            title: title.to_string(),
            content_chars,
            matched_flags,
            ui_ratio,
            suggestion:
                "extraction grabbed reader chrome instead of a chapter; check the site selector pack"
                    .to_string(),
        }));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_content, ValidationFailure};
    use crate::types::Limits;

    const LIMITS: Limits = Limits {
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
    };

    fn chapter(sentences: usize) -> String {
        format!("第一章 远行\n{}", "他背着旧行囊，沿着河岸走了很久很久。".repeat(sentences))
    }

    #[test]
    fn rejects_short_content_for_any_site() {
        let err = validate_content("T", "十五个字符的内容", false, &LIMITS).unwrap_err();
        match err {
            ValidationFailure::TooShort(diag) => {
                assert_eq!(diag.content_chars, 8);
                assert!(diag.matched_flags.is_empty());
            }
            other => panic!("expected TooShort, got {other:?}"),
        }
    }

    #[test]
    fn accepts_modest_generic_content() {
        let content = "这是一段足够长的普通网页正文内容，超过二十个字符。";
        assert!(validate_content("T", content, false, &LIMITS).is_ok());
    }

    #[test]
    fn specialized_rejects_navigation_phrases_regardless_of_length() {
        let content = format!("{}上一章 目录 下一章", chapter(60));
        let err = validate_content("T", &content, true, &LIMITS).unwrap_err();
        match err {
            ValidationFailure::Contaminated(diag) => {
                assert!(diag.matched_flags.contains(&"nav-controls".to_string()));
            }
            other => panic!("expected Contaminated, got {other:?}"),
        }
    }

    #[test]
    fn specialized_requires_a_chapter_heading() {
        let content = "没有任何章节标题的长文本。".repeat(40);
        let err = validate_content("T", &content, true, &LIMITS).unwrap_err();
        match err {
            ValidationFailure::Contaminated(diag) => {
                assert_eq!(diag.matched_flags, vec!["missing-chapter-heading".to_string()]);
            }
            other => panic!("expected Contaminated, got {other:?}"),
        }
    }

    #[test]
    fn specialized_rejects_high_ui_keyword_density() {
        let content = format!("第一章 短文{}", "加入书签投推荐票".repeat(10));
        let err = validate_content("T", &content, true, &LIMITS).unwrap_err();
        assert!(matches!(err, ValidationFailure::Contaminated(_)));
    }

    #[test]
    fn specialized_accepts_a_clean_chapter() {
        assert!(validate_content("T", &chapter(60), true, &LIMITS).is_ok());
    }
}
