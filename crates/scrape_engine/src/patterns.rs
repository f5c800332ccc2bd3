//! Compiled regex patterns for content cleanup and contamination detection.
//!
//! All patterns are compiled once at first use via `LazyLock`. The cleanup
//! list is ordered and applied as removals, so re-applying it to already
//! clean text is a no-op.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

use crate::text;

/// Ordered cleanup removals for reading-UI chrome embedded in element text.
/// Every entry replaces with the empty string; order only matters for the
/// line-anchored entries that expect surrounding tokens to still be present.
static CLEANUP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Reader controls and chapter navigation widgets.
        Regex::new(
            r"(?:上一[章页]|下一[章页]|返回目录|回目录|章节目录|章节报错|加入书[签架]|投推荐票|推荐本书|点击下载|夜间模式|护眼模式|字体大小|翻页设置|繁體中文)",
        )
        .expect("reader controls regex"),
        // Author / update-time / word-count metadata lines.
        Regex::new(r"(?m)^\s*(?:作者[:：][^\n]*|更新时间[:：][^\n]*|上传时间[:：][^\n]*|字数[:：]\s*\d[^\n]*)$")
            .expect("author metadata regex"),
        // Site branding and footer fragments, up to end of sentence or line.
        Regex::new(r"(?:69书吧|笔趣阁|顶点小说)[^。\n]*").expect("site branding regex"),
        // "Remember this site" ad phrases.
        Regex::new(
            r"(?:天才一秒记住本站地址|请记住本站域名|请收藏本站|收藏本站|手机版阅读网址|手机用户请浏览|本章未完[，,]?\s*点击下一页继续阅读)[^。\n]*",
        )
        .expect("ad phrase regex"),
        Regex::new(r"最新章节[！!]?").expect("latest chapter regex"),
    ]
});

/// Named contamination detectors. These fire on residual UI phrasing that
/// survived cleanup, or on raw candidates that never went through it.
static CONTAMINATION_FLAGS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "nav-controls",
            Regex::new(r"上一[章页]|下一[章页]|返回目录|章节目录").expect("nav regex"),
        ),
        (
            "bookmark-ui",
            Regex::new(r"加入书[签架]|投推荐票|章节报错").expect("bookmark regex"),
        ),
        (
            "reader-settings",
            Regex::new(r"字体大小|夜间模式|护眼模式|翻页设置").expect("settings regex"),
        ),
        (
            "site-branding",
            Regex::new(r"69书吧|笔趣阁|顶点小说").expect("branding regex"),
        ),
        (
            "reader-ads",
            Regex::new(r"天才一秒记住|请收藏本站|手机版阅读|点击下载").expect("ads regex"),
        ),
    ]
});

/// Chapter headings: numeric `Chapter N` and CJK-numeral `第...章` variants.
static CHAPTER_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"第\s*[0-9０-９零一二三四五六七八九十百千万两]+\s*[章节回卷篇部]|[Cc]hapter\s*\d+")
        .expect("chapter heading regex")
});

/// Distinctive reading-UI phrases counted for the contamination ratio.
static UI_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"上一[章页]|下一[章页]|返回目录|章节目录|加入书[签架]|投推荐票|章节报错|收藏本站|夜间模式|字体大小|笔趣阁|69书吧|手机版阅读|点击下载|繁體中文",
    )
    .expect("ui keyword regex")
});

/// Class/id substrings that mark navigation, chrome and ad containers.
static NAV_CONTAINER_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)nav|menu|footer|header|sidebar|breadcrumb|banner|advert|\bads?\b|recommend|share|comment|toolbar|pager")
        .expect("nav container regex")
});

/// A run of reader-control tokens at the very end of a text block.
static TRAILING_CONTROLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\s*(?:上一[章页]|下一[章页]|返回目录|回目录|章节目录|章节报错|加入书[签架]|投推荐票|目录))+\s*$")
        .expect("trailing controls regex")
});

/// Run the full ordered cleanup cascade, then normalize whitespace.
pub fn apply_cleanup(input: &str) -> String {
    let mut cleaned = input.to_string();
    for pattern in CLEANUP_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    text::normalize_whitespace(&cleaned)
}

/// Minimal cleanup: strip a trailing block of reader controls only.
pub fn strip_trailing_controls(input: &str) -> String {
    TRAILING_CONTROLS.replace(input, "").trim_end().to_string()
}

/// Names of every contamination detector that matches `input`.
pub fn contamination_flags(input: &str) -> Vec<&'static str> {
    CONTAMINATION_FLAGS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(input))
        .map(|(name, _)| *name)
        .collect()
}

pub fn has_chapter_heading(input: &str) -> bool {
    CHAPTER_HEADING.is_match(input)
}

/// Byte offset of the first chapter heading, if any.
pub fn first_chapter_heading(input: &str) -> Option<usize> {
    CHAPTER_HEADING.find(input).map(|m| m.start())
}

/// Split text into segments running from each chapter heading to the next
/// heading or end of text, in document order.
pub fn chapter_segments(input: &str) -> Vec<&str> {
    let starts: Vec<usize> = CHAPTER_HEADING.find_iter(input).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(input.len());
            &input[start..end]
        })
        .collect()
}

/// Fraction of characters belonging to reading-UI keyword matches.
pub fn ui_keyword_ratio(input: &str) -> f32 {
    let total = text::char_len(input);
    if total == 0 {
        return 0.0;
    }
    let matched: usize = UI_KEYWORDS
        .find_iter(input)
        .map(|m| text::char_len(m.as_str()))
        .sum();
    matched as f32 / total as f32
}

/// Whether a class/id attribute blob marks a navigation or ad container.
pub fn looks_like_nav_container(attr_blob: &str) -> bool {
    NAV_CONTAINER_CLASS.is_match(attr_blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_strips_reader_controls_and_branding() {
        let dirty = "上一章 目录 下一章\n正文第一段在这里延续。\n69书吧提供最快更新\n作者：某人";
        let cleaned = apply_cleanup(dirty);
        assert!(cleaned.contains("正文第一段在这里延续。"));
        assert!(!cleaned.contains("上一章"));
        assert!(!cleaned.contains("69书吧"));
        assert!(!cleaned.contains("作者"));
    }

    #[test]
    fn cleanup_is_idempotent_on_clean_text() {
        let clean = apply_cleanup("第一章 启程\n\n他背起行囊，推门而出。");
        assert_eq!(apply_cleanup(&clean), clean);
    }

    #[test]
    fn chapter_headings_match_numeric_and_cjk_forms() {
        assert!(has_chapter_heading("第1章 开端"));
        assert!(has_chapter_heading("第一百二十回 风起"));
        assert!(has_chapter_heading("Chapter 12"));
        assert!(!has_chapter_heading("这一段没有标题。"));
    }

    #[test]
    fn segments_run_from_heading_to_heading() {
        let body = "广告\n第一章 甲\n正文一\n第二章 乙\n正文二";
        let segments = chapter_segments(body);
        assert_eq!(segments.len(), 2);
        assert!(segments[0].starts_with("第一章"));
        assert!(segments[0].contains("正文一"));
        assert!(!segments[0].contains("第二章"));
        assert!(segments[1].starts_with("第二章"));
    }

    #[test]
    fn contamination_flags_are_named() {
        let flags = contamination_flags("加入书签后请收藏本站");
        assert!(flags.contains(&"bookmark-ui"));
        assert!(flags.contains(&"reader-ads"));
        assert!(contamination_flags("平静的叙述文字。").is_empty());
    }

    #[test]
    fn ui_ratio_grows_with_chrome_density() {
        let clean = "他沉默地望着远方的群山。";
        let dirty = "上一章 下一章 加入书签 投推荐票";
        assert_eq!(ui_keyword_ratio(clean), 0.0);
        assert!(ui_keyword_ratio(dirty) > 0.5);
    }

    #[test]
    fn trailing_controls_are_stripped_without_touching_body() {
        let input = "正文结束了。\n上一章 目录 下一章";
        assert_eq!(strip_trailing_controls(input), "正文结束了。");
    }
}
