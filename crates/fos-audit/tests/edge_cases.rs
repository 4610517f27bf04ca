//! Edge case tests for fos-audit
//!
//! Malformed input, failing handlers, media preloading and the small
//! corners of option handling.

use fos_audit::{
    AuditError, Config, ConfigureSpec, ContextSpec, Engine, Evaluation, MediaMetadata, MediaProvider, ResultType,
    RunOnly, RunOptions,
};
use fos_dom::Page;
use fos_html::parse_page;
use fos_layout::layout_page;
use fos_vdom::SerialNode;
use serde_json::{json, Value};
use smol::future::BoxedLocal;
use smol::Timer;
use std::rc::Rc;
use std::time::Duration;

fn page(html: &str) -> Page {
    let mut page = parse_page(html, "https://example.com/");
    layout_page(&mut page);
    page
}

fn engine() -> Engine {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Engine::new(Config::default()).unwrap()
}

fn nodes(report: &Value, category: &str, id: &str) -> usize {
    report[category]
        .as_array()
        .and_then(|rules| rules.iter().find(|r| r["id"] == json!(id)))
        .and_then(|r| r["nodes"].as_array())
        .map_or(0, Vec::len)
}

fn only(ids: &[&str]) -> RunOptions {
    RunOptions::default().with_run_only(RunOnly::rules(ids.iter().copied()))
}

/// Registers a check and a rule using it on every `<p>`
fn with_custom_check(engine: &mut Engine, evaluate: &str) {
    let spec = ConfigureSpec::from_json(&format!(
        r#"{{"checks": [{{"id": "custom-check", "evaluate": "{evaluate}",
                          "metadata": {{"messages": {{"pass": "ok", "fail": "not ok"}}}}}}],
            "rules": [{{"id": "custom-rule", "selector": "p", "any": ["custom-check"],
                        "metadata": {{"description": "Custom", "help": "Custom"}}}}]}}"#
    ))
    .unwrap();
    engine.configure(&spec).unwrap();
}

// ============================================================================
// MALFORMED INPUT
// ============================================================================

#[test]
fn test_options_json_with_wrong_types() {
    assert!(matches!(
        RunOptions::from_json(r#"{"iframes": "yes"}"#),
        Err(AuditError::InvalidArgument(_))
    ));
    assert!(matches!(
        Config::from_json(r#"{"frameWaitTime": -1}"#),
        Err(AuditError::InvalidArgument(_))
    ));
}

#[test]
fn test_context_json_shapes() {
    let context = ContextSpec::from_json(r##"{"include": [["#main"]], "exclude": [["#ads"]]}"##).unwrap();
    assert_eq!(context.include.len(), 1);
    assert_eq!(context.exclude.len(), 1);
    assert!(ContextSpec::from_json("42").is_err());
}

#[test]
fn test_invalid_context_selector() {
    let page = page("<p>Hi</p>");
    let result = engine().run_blocking(&page, &ContextSpec::selector("p[["), &RunOptions::default());
    assert!(matches!(result, Err(AuditError::InvalidArgument(_))));
}

#[test]
fn test_empty_run_only() {
    let page = page("<p>Hi</p>");
    let options = RunOptions::default().with_run_only(RunOnly::rules(Vec::<String>::new()));
    let result = engine().run_blocking(&page, &ContextSpec::document(), &options);
    assert!(matches!(result, Err(AuditError::InvalidArgument(_))));
}

#[test]
fn test_unknown_run_only_tag() {
    let page = page("<p>Hi</p>");
    let options = RunOptions::default().with_run_only(RunOnly::tags(["wcag99"]));
    let result = engine().run_blocking(&page, &ContextSpec::document(), &options);
    assert!(matches!(result, Err(AuditError::InvalidArgument(_))));
}

#[test]
fn test_unknown_rule_toggle() {
    let page = page("<p>Hi</p>");
    let options = RunOptions::default().with_rule("not-a-rule", false);
    let result = engine().run_blocking(&page, &ContextSpec::document(), &options);
    assert!(matches!(result, Err(AuditError::InvalidArgument(_))));
}

#[test]
fn test_unknown_preload_asset() {
    let page = page("<p>Hi</p>");
    let options = RunOptions::from_json(r#"{"preload": {"assets": ["fonts"]}}"#).unwrap();
    let result = engine().run_blocking(&page, &ContextSpec::document(), &options);
    assert!(matches!(result, Err(AuditError::InvalidArgument(_))));
}

#[test]
fn test_check_with_unregistered_handler() {
    let mut engine = engine();
    let spec = ConfigureSpec::from_json(r#"{"checks": [{"id": "x", "evaluate": "does-not-exist"}]}"#).unwrap();
    assert!(matches!(engine.configure(&spec), Err(AuditError::Configuration(_))));
}

#[test]
fn test_unknown_reporter_falls_back_to_default() {
    let page = page(r#"<img src="a.png">"#);
    let options = only(&["image-alt"]).with_reporter("nope");
    let report = engine().run_blocking(&page, &ContextSpec::document(), &options).unwrap();
    assert_eq!(nodes(&report, "violations", "image-alt"), 1);
}

// ============================================================================
// EMPTY AND MINIMAL PAGES
// ============================================================================

#[test]
fn test_empty_page() {
    let page = page("");
    let report = engine().run_blocking(&page, &ContextSpec::document(), &RunOptions::default()).unwrap();
    assert_eq!(nodes(&report, "violations", "image-alt"), 0);
    assert!(report["inapplicable"].as_array().is_some_and(|rules| !rules.is_empty()));
}

#[test]
fn test_virtual_rule_on_text_node() {
    let results = engine()
        .run_virtual_rule("image-alt", &SerialNode::text("just text"), &RunOptions::default())
        .unwrap();
    assert_eq!(results.inapplicable.len(), 1);
}

#[test]
fn test_hidden_image_is_skipped_on_pages() {
    let page = page(r#"<img src="a.png" style="display: none">"#);
    let report = engine().run_blocking(&page, &ContextSpec::document(), &only(&["image-alt"])).unwrap();
    assert_eq!(nodes(&report, "violations", "image-alt"), 0);
}

#[test]
fn test_presentational_image_passes() {
    let page = page(r#"<img src="spacer.gif" role="presentation">"#);
    let report = engine().run_blocking(&page, &ContextSpec::document(), &only(&["image-alt"])).unwrap();
    assert_eq!(nodes(&report, "passes", "image-alt"), 1);
}

#[test]
fn test_whitespace_alt_fails() {
    let page = page(r#"<img src="a.png" alt=" ">"#);
    let report = engine().run_blocking(&page, &ContextSpec::document(), &only(&["image-alt"])).unwrap();
    assert_eq!(nodes(&report, "violations", "image-alt"), 1);
}

// ============================================================================
// RESULT TYPES
// ============================================================================

#[test]
fn test_result_types_truncate_other_categories() {
    let page = page(r#"<img src="a.png" alt="A"><img src="b.png" alt="B"><img src="c.png">"#);
    let options = only(&["image-alt"]).with_result_types(&[ResultType::Violations]);
    let report = engine().run_blocking(&page, &ContextSpec::document(), &options).unwrap();
    assert_eq!(nodes(&report, "violations", "image-alt"), 1);
    assert_eq!(nodes(&report, "passes", "image-alt"), 1);
}

// ============================================================================
// CUSTOM HANDLERS
// ============================================================================

#[test]
fn test_failing_check_handler_is_cant_tell() {
    let mut engine = engine();
    engine.register_handlers(|registry| {
        registry.add_evaluate("broken", |_cx| Err(anyhow::anyhow!("boom")));
    });
    with_custom_check(&mut engine, "broken");
    let page = page("<p>Text</p>");
    let report = engine.run_blocking(&page, &ContextSpec::document(), &only(&["custom-rule"])).unwrap();
    assert_eq!(nodes(&report, "incomplete", "custom-rule"), 1);
    let check = &report["incomplete"][0]["nodes"][0]["any"][0];
    assert!(check["data"]["error"].as_str().unwrap().contains("boom"));
}

#[test]
fn test_handlers_survive_reset() {
    let mut engine = engine();
    engine.register_handlers(|registry| {
        registry.add_evaluate("always", |_cx| Ok(true.into()));
    });
    engine.reset().unwrap();
    with_custom_check(&mut engine, "always");
    let page = page("<p>Text</p>");
    let report = engine.run_blocking(&page, &ContextSpec::document(), &only(&["custom-rule"])).unwrap();
    assert_eq!(nodes(&report, "passes", "custom-rule"), 1);
}

#[test]
fn test_check_options_reach_the_handler() {
    let mut engine = engine();
    engine.register_handlers(|registry| {
        registry.add_evaluate("threshold", |cx| {
            Ok((cx.option::<u64>("limit").unwrap_or(0) > 5).into())
        });
    });
    with_custom_check(&mut engine, "threshold");
    let page = page("<p>Text</p>");

    let report = engine.run_blocking(&page, &ContextSpec::document(), &only(&["custom-rule"])).unwrap();
    assert_eq!(nodes(&report, "violations", "custom-rule"), 1);

    let options = only(&["custom-rule"]).with_check_options("custom-check", json!({ "limit": 10 }));
    let report = engine.run_blocking(&page, &ContextSpec::document(), &options).unwrap();
    assert_eq!(nodes(&report, "passes", "custom-rule"), 1);
}

#[test]
fn test_slow_deferred_check_times_out() {
    let mut engine = Engine::new(Config {
        check_timeout: 20,
        ..Config::default()
    })
    .unwrap();
    engine.register_handlers(|registry| {
        registry.add_evaluate("slow", |_cx| {
            Ok(Evaluation::deferred(async {
                Timer::after(Duration::from_secs(5)).await;
                Ok(Some(true))
            }))
        });
    });
    with_custom_check(&mut engine, "slow");
    let page = page("<p>Text</p>");
    let report = engine.run_blocking(&page, &ContextSpec::document(), &only(&["custom-rule"])).unwrap();
    assert_eq!(nodes(&report, "incomplete", "custom-rule"), 1);
}

// ============================================================================
// MEDIA
// ============================================================================

struct Clips;

impl MediaProvider for Clips {
    fn metadata(&self, src: &str) -> BoxedLocal<anyhow::Result<MediaMetadata>> {
        let duration = if src.contains("long") { 120.0 } else { 2.0 };
        Box::pin(async move { Ok(MediaMetadata { duration, start: 0.0 }) })
    }
}

#[test]
fn test_autoplay_without_media_provider_needs_review() {
    let page = page(r#"<audio src="long.mp3" autoplay></audio>"#);
    let report = engine()
        .run_blocking(&page, &ContextSpec::document(), &only(&["no-autoplay-audio"]))
        .unwrap();
    assert_eq!(nodes(&report, "incomplete", "no-autoplay-audio"), 1);
}

#[test]
fn test_autoplay_with_media_provider() {
    let mut engine = engine();
    engine.set_media_provider(Rc::new(Clips));
    let page = page(
        r#"<audio src="short.mp3" autoplay></audio>
           <audio src="long.mp3" autoplay controls></audio>
           <audio src="long.mp3" autoplay muted></audio>
           <audio src="long.mp3" autoplay></audio>"#,
    );
    let report = engine
        .run_blocking(&page, &ContextSpec::document(), &only(&["no-autoplay-audio"]))
        .unwrap();
    assert_eq!(nodes(&report, "passes", "no-autoplay-audio"), 2);
    // Failures go to review
    assert_eq!(nodes(&report, "violations", "no-autoplay-audio"), 0);
    assert_eq!(nodes(&report, "incomplete", "no-autoplay-audio"), 1);
}
