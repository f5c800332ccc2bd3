//! Title and narrative-content extraction.
//!
//! Both run as ordered strategy cascades over the parsed document. Each
//! content stage is a pure function `(document) -> Option<Candidate>`; the
//! first stage that satisfies its own acceptance predicate wins. Within a
//! scoring stage, strictly longer text wins and ties keep the earlier entry,
//! so extraction is deterministic for a given document.

use ego_tree::NodeRef;
use engine_logging::engine_debug;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::patterns;
use crate::sites::SitePack;
use crate::text;
use crate::types::Limits;

/// Placeholder when every title strategy comes up empty.
const FALLBACK_TITLE: &str = "Untitled";

/// Title selectors reflecting common web-fiction markup conventions.
const TITLE_SELECTORS: &[&str] = &[
    ".bookname h1",
    ".booknav2 h1",
    ".chapter-title",
    ".chaptertitle",
    "#chapterTitle",
    ".book_title",
    ".title",
];

/// Containers commonly wrapping the main content on generic layouts.
const GENERIC_CONTAINERS: &[&str] = &[
    "article",
    "main",
    "#content",
    ".content",
    ".article-content",
    ".post-content",
    ".entry-content",
    "#chaptercontent",
];

/// Broad selector sweep for the exhaustive ranking stage, in declared order.
const RANKING_SELECTORS: &[&str] = &[
    r#"[id*="content"]"#,
    r#"[class*="content"]"#,
    r#"[id*="chapter"]"#,
    r#"[class*="chapter"]"#,
    r#"[id*="text"]"#,
    r#"[class*="text"]"#,
    r#"[class*="read"]"#,
    r#"[id*="read"]"#,
    r#"[class*="novel"]"#,
    r#"[class*="story"]"#,
    r#"[id*="article"]"#,
    r#"[class*="article"]"#,
    "article",
    "section",
    "main",
    "td",
];

/// Tags consulted by the paragraph-aggregation fallback.
const FRAGMENT_TAGS: &str = "p, div, span, td, li, pre";

/// A provisional extraction from one strategy, pre-normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub strategy: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub content: String,
    /// Which cascade stage produced the content; empty content carries "none".
    pub strategy: &'static str,
}

#[derive(Debug, Clone)]
pub struct ContentExtractor {
    limits: Limits,
}

impl ContentExtractor {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Extract title and content from decoded HTML. Always returns a page;
    /// when every content stage fails the content is empty and the validator
    /// rejects it downstream with the title still attached.
    pub fn extract(&self, html: &str, pack: Option<&SitePack>) -> ExtractedPage {
        let doc = Html::parse_document(html);
        let title = self.extract_title(&doc);
        let candidate = self.extract_content(&doc, pack);
        match candidate {
            Some(candidate) => {
                engine_debug!(
                    "content extracted via `{}` strategy ({} chars)",
                    candidate.strategy,
                    text::char_len(&candidate.text)
                );
                ExtractedPage {
                    title,
                    content: text::normalize_whitespace(&candidate.text),
                    strategy: candidate.strategy,
                }
            }
            None => ExtractedPage {
                title,
                content: String::new(),
                strategy: "none",
            },
        }
    }

    /// Title cascade: document title, then first h1, then site-convention
    /// selectors, then a literal placeholder. The heuristic strategies must
    /// clear the minimum-length gate; the document title only has to be
    /// non-empty.
    fn extract_title(&self, doc: &Html) -> String {
        if let Some(el) = select_first(doc, "title") {
            let title = full_text(el);
            let title = title.trim();
            if !title.is_empty() {
                return title.to_string();
            }
        }

        for css in std::iter::once("h1").chain(TITLE_SELECTORS.iter().copied()) {
            if let Some(el) = select_first(doc, css) {
                let title = full_text(el);
                let title = title.trim();
                if text::char_len(title) >= self.limits.min_title_chars {
                    return title.to_string();
                }
            }
        }

        FALLBACK_TITLE.to_string()
    }

    fn extract_content(&self, doc: &Html, pack: Option<&SitePack>) -> Option<Candidate> {
        if let Some(pack) = pack {
            if let Some(candidate) = self.specialized_scan(doc, pack) {
                return Some(candidate);
            }
        }
        self.body_chapter_capture(doc)
            .or_else(|| self.generic_containers(doc))
            .or_else(|| self.selector_ranking(doc))
            .or_else(|| self.paragraph_aggregation(doc))
    }

    /// Stage: specialized selector scan. Only for recognized hosts; the first
    /// selector whose concatenated, cleaned text is long enough and raises no
    /// contamination flag wins.
    fn specialized_scan(&self, doc: &Html, pack: &SitePack) -> Option<Candidate> {
        for css in pack.content_selectors {
            let Some(selector) = parse_selector(css) else {
                continue;
            };
            let parts: Vec<String> = doc.select(&selector).map(block_text).collect();
            if parts.is_empty() {
                continue;
            }
            let cleaned = patterns::apply_cleanup(&parts.join("\n\n"));
            if text::char_len(&cleaned) > self.limits.specialized_min_chars
                && patterns::contamination_flags(&cleaned).is_empty()
            {
                return Some(Candidate {
                    strategy: "site-selector",
                    text: cleaned,
                });
            }
        }
        None
    }

    /// Stage: whole-body chapter capture. Takes the longest heading-to-heading
    /// segment of the body text and accepts it only after cleanup if it still
    /// reads like a full chapter under the stricter contamination rules.
    fn body_chapter_capture(&self, doc: &Html) -> Option<Candidate> {
        let body = select_first(doc, "body").map(block_text)?;
        let segments = patterns::chapter_segments(&body);
        let best = segments
            .iter()
            .copied()
            .fold(None::<&str>, |best, segment| match best {
                Some(current) if text::char_len(segment) <= text::char_len(current) => best,
                _ => Some(segment),
            })?;
        if text::char_len(best) <= self.limits.chapter_match_min_chars {
            return None;
        }
        let cleaned = patterns::apply_cleanup(best);
        let accepted = text::char_len(&cleaned) > self.limits.chapter_min_chars
            && patterns::has_chapter_heading(&cleaned)
            && patterns::contamination_flags(&cleaned).is_empty()
            && patterns::ui_keyword_ratio(&cleaned) <= self.limits.strict_ui_ratio;
        accepted.then_some(Candidate {
            strategy: "chapter-pattern",
            text: cleaned,
        })
    }

    /// Stage: generic container best-effort. Longest common-container text;
    /// when that is still short, fall back to the body text cut from the
    /// first chapter heading. Only minimal cleanup is applied.
    fn generic_containers(&self, doc: &Html) -> Option<Candidate> {
        let mut best: Option<String> = None;
        for css in GENERIC_CONTAINERS {
            let Some(selector) = parse_selector(css) else {
                continue;
            };
            for el in doc.select(&selector) {
                let candidate = block_text(el);
                let longer = best
                    .as_deref()
                    .is_none_or(|current| text::char_len(&candidate) > text::char_len(current));
                if longer {
                    best = Some(candidate);
                }
            }
        }

        let mut content = best.unwrap_or_default();
        if text::char_len(&content) <= self.limits.generic_min_chars {
            if let Some(body) = select_first(doc, "body").map(block_text) {
                if let Some(start) = patterns::first_chapter_heading(&body) {
                    content = body[start..].to_string();
                }
            }
        }

        let cleaned = text::normalize_whitespace(&patterns::strip_trailing_controls(&content));
        (text::char_len(&cleaned) > self.limits.generic_min_chars).then_some(Candidate {
            strategy: "generic-container",
            text: cleaned,
        })
    }

    /// Stage: exhaustive selector ranking. Every element matched by the broad
    /// sweep is scored by cleaned length; the best above the floor wins.
    fn selector_ranking(&self, doc: &Html) -> Option<Candidate> {
        let mut best: Option<String> = None;
        for css in RANKING_SELECTORS {
            let Some(selector) = parse_selector(css) else {
                continue;
            };
            for el in doc.select(&selector) {
                let cleaned = patterns::apply_cleanup(&block_text(el));
                let longer = best
                    .as_deref()
                    .is_none_or(|current| text::char_len(&cleaned) > text::char_len(current));
                if longer {
                    best = Some(cleaned);
                }
            }
        }
        let best = best?;
        (text::char_len(&best) > self.limits.ranking_floor_chars).then_some(Candidate {
            strategy: "selector-ranking",
            text: best,
        })
    }

    /// Stage: paragraph aggregation. Collects the direct text of block and
    /// text-bearing elements, skipping navigation/ad subtrees and fragments
    /// too short to be narrative, up to a bounded fragment count.
    fn paragraph_aggregation(&self, doc: &Html) -> Option<Candidate> {
        let selector = parse_selector(FRAGMENT_TAGS)?;
        let mut fragments: Vec<String> = Vec::new();
        for el in doc.select(&selector) {
            if fragments.len() >= self.limits.max_fragments {
                break;
            }
            if in_nav_container(el) {
                continue;
            }
            let own = direct_text(el);
            let own = own.trim();
            if text::char_len(own) < self.limits.min_fragment_chars {
                continue;
            }
            fragments.push(own.to_string());
        }
        (!fragments.is_empty()).then(|| Candidate {
            strategy: "paragraph-aggregation",
            text: fragments.join("\n\n"),
        })
    }
}

fn parse_selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn select_first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = parse_selector(css)?;
    doc.select(&selector).next()
}

/// All descendant text joined without separators; for short inline content
/// such as titles.
fn full_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

/// Descendant text joined with newlines so `<br>`/`<p>` separated lines stay
/// distinct until normalization.
fn block_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for chunk in el.text() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(chunk);
    }
    out
}

/// Text of the element's own text-node children only. Child elements are
/// visited separately by the caller's selector, so this avoids counting the
/// same text twice and never sees script/style bodies.
fn direct_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for child in el.children() {
        append_text_node(child, &mut out);
    }
    out
}

fn append_text_node(node: NodeRef<'_, Node>, out: &mut String) {
    if let Node::Text(chunk) = node.value() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(chunk);
    }
}

/// Whether the element or one of its ancestors looks like navigation, chrome
/// or an ad slot, judged by tag name and class/id substrings.
fn in_nav_container(el: ElementRef<'_>) -> bool {
    for node in std::iter::once(*el).chain(el.ancestors()) {
        let Some(ancestor) = ElementRef::wrap(node) else {
            continue;
        };
        let tag = ancestor.value().name();
        if matches!(tag, "nav" | "header" | "footer" | "aside") {
            return true;
        }
        let mut blob = String::new();
        if let Some(class) = ancestor.value().attr("class") {
            blob.push_str(class);
        }
        if let Some(id) = ancestor.value().attr("id") {
            blob.push(' ');
            blob.push_str(id);
        }
        if !blob.is_empty() && patterns::looks_like_nav_container(&blob) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{ContentExtractor, FALLBACK_TITLE};
    use crate::sites::specialized_pack;
    use crate::types::Limits;

    fn extractor() -> ContentExtractor {
        ContentExtractor::new(Limits::default())
    }

    fn narrative(sentences: usize) -> String {
        "他沿着山路一直向北走，风把衣角吹得猎猎作响。".repeat(sentences)
    }

    #[test]
    fn document_title_wins_even_when_short() {
        let html = "<html><head><title>Test</title></head><body><h1>Longer Heading</h1></body></html>";
        let page = extractor().extract(html, None);
        assert_eq!(page.title, "Test");
    }

    #[test]
    fn heading_fallback_requires_minimum_length() {
        let html = r#"<html><body><h1>口口</h1><div class="chapter-title">第一章 长夜将至</div></body></html>"#;
        let page = extractor().extract(html, None);
        assert_eq!(page.title, "第一章 长夜将至");
    }

    #[test]
    fn title_falls_back_to_placeholder() {
        let html = "<html><body><p>nothing here</p></body></html>";
        let page = extractor().extract(html, None);
        assert_eq!(page.title, FALLBACK_TITLE);
    }

    #[test]
    fn specialized_selector_wins_on_recognized_host() {
        let pack = specialized_pack("https://www.69shu.com/txt/9/9.html");
        let body = format!("第一章 出发\n{}", narrative(30));
        let html = format!(
            r#"<html><head><title>书名：测试</title></head>
            <body><div class="nav">上一章 目录 下一章</div>
            <div class="txtnav">{body}</div></body></html>"#
        );
        let page = extractor().extract(&html, pack);
        assert_eq!(page.strategy, "site-selector");
        assert!(page.content.contains("第一章 出发"));
        assert!(!page.content.contains("上一章"));
    }

    #[test]
    fn chapter_capture_handles_table_layouts() {
        // No recognized container markup at all; the chapter segment is dug
        // out of the whole body text.
        let body = format!("第一章 风雪\n{}", narrative(60));
        let html = format!(
            "<html><body><table><tr><td>站内公告栏</td></tr><tr><td>{body}</td></tr></table></body></html>"
        );
        let page = extractor().extract(&html, None);
        assert_eq!(page.strategy, "chapter-pattern");
        assert!(page.content.starts_with("第一章 风雪"));
    }

    #[test]
    fn generic_container_accepts_long_article() {
        let content = narrative(15);
        let html = format!("<html><body><article>{content}</article></body></html>");
        let page = extractor().extract(&html, None);
        assert_eq!(page.strategy, "generic-container");
        assert!(page.content.contains("山路"));
    }

    #[test]
    fn ranking_stage_prefers_the_longest_scored_element() {
        let long = narrative(4);
        let html = format!(
            r#"<html><body>
            <div class="mycontent">short text here</div>
            <div class="reader-text">{long}</div>
            </body></html>"#
        );
        let page = extractor().extract(&html, None);
        assert_eq!(page.strategy, "selector-ranking");
        assert!(page.content.contains("山路"));
    }

    #[test]
    fn paragraph_aggregation_skips_nav_and_short_fragments() {
        let html = r#"<html><body>
            <nav><p>首页 排行 分类 完本 书单 排行榜单页面</p></nav>
            <p>ok</p>
            <p>这是第一段正文，讲述旅途的开始与告别。</p>
            <p>这是第二段正文，继续讲述旅途中的风景。</p>
            </body></html>"#;
        let page = extractor().extract(html, None);
        assert_eq!(page.strategy, "paragraph-aggregation");
        assert!(page.content.contains("第一段正文"));
        assert!(page.content.contains("第二段正文"));
        assert!(!page.content.contains("排行榜"));
        assert!(!page.content.contains("ok"));
    }

    #[test]
    fn empty_page_yields_empty_content_with_title() {
        let html = "<html><head><title>Just A Shell</title></head><body></body></html>";
        let page = extractor().extract(html, None);
        assert_eq!(page.strategy, "none");
        assert!(page.content.is_empty());
        assert_eq!(page.title, "Just A Shell");
    }
}
