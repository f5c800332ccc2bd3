use pretty_assertions::assert_eq;
use scrape_engine::{
    apply_cleanup, specialized_pack, validate_content, ContentExtractor, Limits,
    ValidationFailure,
};

const CHAPTER_URL: &str = "https://www.69shu.com/txt/44722/29474549.html";

fn narrative_en(sentences: usize) -> String {
    "The road north wound through pine forest, and he walked it alone until dusk. "
        .repeat(sentences)
}

/// A recognized host serving a `.txtnav` chapter page: the bespoke selector
/// wins, reader controls are stripped, and validation passes.
#[test]
fn specialized_page_extracts_clean_chapter() {
    let pack = specialized_pack(CHAPTER_URL).expect("known host");
    let chapter = format!("Chapter 1 The Long Road\n{}", narrative_en(12));
    let html = format!(
        r#"<html><head><title>Test</title></head><body>
        <div class="headnav">上一章 目录 下一章</div>
        <div class="txtnav">{chapter}
        上一章 下一章 加入书签 投推荐票</div>
        </body></html>"#
    );

    let page = ContentExtractor::new(Limits::default()).extract(&html, Some(pack));
    assert_eq!(page.title, "Test");
    assert_eq!(page.strategy, "site-selector");
    assert!(page.content.starts_with("Chapter 1 The Long Road"));
    assert!(page.content.contains("pine forest"));
    assert!(!page.content.contains("上一章"));
    assert!(!page.content.contains("加入书签"));

    let limits = Limits::default();
    assert!(validate_content(&page.title, &page.content, true, &limits).is_ok());
}

/// A specialized page whose narrative never announces a chapter: extraction
/// succeeds mechanically but validation refuses to pass it off as a chapter.
#[test]
fn specialized_page_without_heading_is_rejected() {
    let pack = specialized_pack(CHAPTER_URL).expect("known host");
    let body = "流水账一样的长段落，却始终没有标题。".repeat(40);
    let html = format!(r#"<html><body><div class="txtnav">{body}</div></body></html>"#);

    let page = ContentExtractor::new(Limits::default()).extract(&html, Some(pack));
    assert_eq!(page.strategy, "site-selector");

    let limits = Limits::default();
    let err = validate_content(&page.title, &page.content, true, &limits).unwrap_err();
    match err {
        ValidationFailure::Contaminated(diag) => {
            assert!(diag
                .matched_flags
                .contains(&"missing-chapter-heading".to_string()));
            assert!(diag.content_chars > 500);
        }
        other => panic!("expected contamination, got {other:?}"),
    }
}

/// Non-specialized layouts fall through the generic stages in declared order.
#[test]
fn generic_page_uses_container_stage() {
    let content = narrative_en(5);
    let html = format!("<html><head><title>A Plain Page</title></head><body><main>{content}</main></body></html>");
    let page = ContentExtractor::new(Limits::default()).extract(&html, None);
    assert_eq!(page.strategy, "generic-container");
    assert!(page.content.contains("pine forest"));
}

/// Re-running the cleanup cascade over its own output changes nothing.
#[test]
fn cleanup_cascade_is_idempotent() {
    let dirty = "第三章 雪夜\n上一章 目录 下一章\n他推开门，风雪灌了进来。\n请收藏本站：69书吧最快更新";
    let once = apply_cleanup(dirty);
    let twice = apply_cleanup(&once);
    assert_eq!(once, twice);
    assert!(once.contains("他推开门"));
    assert!(!once.contains("上一章"));
    assert!(!once.contains("69书吧"));
}
