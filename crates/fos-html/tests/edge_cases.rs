//! Edge case and stress tests for fos-html
//!
//! Tests rare HTML scenarios, malformed content, and stress conditions.

use fos_dom::{Namespace, NodeData};
use fos_html::{Document, HtmlParser};

fn first_element(doc: &Document, name: &str) -> Option<fos_dom::NodeId> {
    let tree = doc.tree();
    tree.descendants(tree.root())
        .into_iter()
        .find(|&id| tree.element(id).is_some_and(|e| e.name == name))
}

// ============================================================================
// EMPTY AND MINIMAL INPUT
// ============================================================================

#[test]
fn test_parse_empty_still_has_body() {
    let doc = HtmlParser::new().parse("");
    assert!(doc.document_element().is_valid());
    assert!(doc.body().is_valid());
}

#[test]
fn test_parse_null_bytes() {
    let doc = HtmlParser::new().parse("Hello\0World");
    assert!(doc.tree().text_content(doc.body()).starts_with("Hello"));
}

#[test]
fn test_parse_only_whitespace_drops_text() {
    let doc = HtmlParser::new().parse("   \t\n\r\n   ");
    assert!(doc.tree().children(doc.body()).next().is_none());
}

#[test]
fn test_parse_only_doctype() {
    let doc = HtmlParser::new().parse("<!DOCTYPE html>");
    let tree = doc.tree();
    let first = tree.children(tree.root()).next().map(|(_, n)| &n.data);
    assert!(matches!(first, Some(NodeData::Doctype { name, .. }) if name == "html"));
}

// ============================================================================
// MALFORMED HTML
// ============================================================================

#[test]
fn test_parse_unclosed_tags() {
    let doc = HtmlParser::new().parse("<div><p>Unclosed paragraph<span>text");
    let span = first_element(&doc, "span").unwrap();
    assert_eq!(doc.tree().text_content(span), "text");
}

#[test]
fn test_parse_mismatched_tags() {
    let doc = HtmlParser::new().parse("<div><span></div></span>");
    assert!(first_element(&doc, "span").is_some());
}

#[test]
fn test_parse_orphan_closing_tag() {
    let doc = HtmlParser::new().parse("</div>text");
    assert_eq!(doc.tree().text_content(doc.body()), "text");
}

#[test]
fn test_parse_block_inside_inline() {
    let doc = HtmlParser::new().parse("<span><div>Block in inline</div></span>");
    let div = first_element(&doc, "div").unwrap();
    let parent = doc.tree().parent(div).unwrap();
    assert_eq!(doc.tree().element(parent).unwrap().name, "span");
}

// ============================================================================
// SPECIAL TAGS
// ============================================================================

#[test]
fn test_parse_textarea_content_is_text() {
    let doc = HtmlParser::new().parse("<textarea><div>This is not a div</div></textarea>");
    assert!(first_element(&doc, "div").is_none());
}

#[test]
fn test_parse_title_content() {
    let doc = HtmlParser::new().parse("<title>This <b>should</b> not be bold</title>");
    assert_eq!(doc.title(), "This <b>should</b> not be bold");
}

#[test]
fn test_parse_style_content_preserved() {
    let doc = HtmlParser::new().parse("<style>.a > .b { color: red }</style>");
    let style = first_element(&doc, "style").unwrap();
    assert!(doc.tree().text_content(style).contains(".a > .b"));
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

#[test]
fn test_parse_attribute_forms() {
    let doc = HtmlParser::new().parse(r#"<input disabled value="" type=text data-x='a"b'>"#);
    let input = doc.tree().element(first_element(&doc, "input").unwrap()).unwrap();
    assert_eq!(input.get_attr("disabled"), Some(""));
    assert_eq!(input.get_attr("value"), Some(""));
    assert_eq!(input.get_attr("type"), Some("text"));
    assert_eq!(input.get_attr("data-x"), Some("a\"b"));
}

#[test]
fn test_parse_attribute_names_lowercased() {
    let doc = HtmlParser::new().parse(r#"<div ARIA-LABEL="x" Role="button"></div>"#);
    let div = doc.tree().element(first_element(&doc, "div").unwrap()).unwrap();
    assert_eq!(div.get_attr("aria-label"), Some("x"));
    assert_eq!(div.get_attr("role"), Some("button"));
}

#[test]
fn test_parse_duplicate_attribute_keeps_first() {
    let doc = HtmlParser::new().parse(r#"<div id="a" id="b"></div>"#);
    assert!(doc.get_element_by_id("a").is_some());
    assert!(doc.get_element_by_id("b").is_none());
}

// ============================================================================
// ENTITIES AND UNICODE
// ============================================================================

#[test]
fn test_parse_entities() {
    let doc = HtmlParser::new().parse("<p>&lt;&amp;&#65;&#x42;&nbsp;</p>");
    assert_eq!(doc.tree().text_content(doc.body()), "<&AB\u{a0}");
}

#[test]
fn test_parse_rtl_text() {
    let doc = HtmlParser::new().parse(r#"<p dir="rtl">مرحبا</p>"#);
    assert_eq!(doc.tree().text_content(doc.body()), "مرحبا");
}

// ============================================================================
// FOREIGN CONTENT
// ============================================================================

#[test]
fn test_parse_svg_namespace() {
    let doc = HtmlParser::new().parse(r#"<svg role="img"><title>Chart</title><circle r="5"/></svg>"#);
    let svg = doc.tree().element(first_element(&doc, "svg").unwrap()).unwrap();
    assert_eq!(svg.namespace, Namespace::Svg);
    let circle = doc.tree().element(first_element(&doc, "circle").unwrap()).unwrap();
    assert_eq!(circle.namespace, Namespace::Svg);
}

#[test]
fn test_parse_math_namespace() {
    let doc = HtmlParser::new().parse("<math><mi>x</mi></math>");
    let math = doc.tree().element(first_element(&doc, "math").unwrap()).unwrap();
    assert_eq!(math.namespace, Namespace::MathMl);
}

// ============================================================================
// STRESS TESTS
// ============================================================================

#[test]
fn test_parse_deeply_nested() {
    let depth = 500;
    let html = format!("{}leaf{}", "<div>".repeat(depth), "</div>".repeat(depth));
    let doc = HtmlParser::new().parse(&html);
    assert_eq!(doc.tree().text_content(doc.body()), "leaf");
}

#[test]
fn test_parse_many_siblings() {
    let html: String = (0..2000).map(|i| format!("<span id=s{}>x</span>", i)).collect();
    let doc = HtmlParser::new().parse(&html);
    assert!(doc.get_element_by_id("s1999").is_some());
}

#[test]
fn test_srcdoc_nesting_is_bounded() {
    let mut html = String::from("<p>bottom</p>");
    for _ in 0..12 {
        html = format!("<iframe srcdoc=\"{}\"></iframe>", html.replace('&', "&amp;").replace('"', "&quot;"));
    }
    let page = HtmlParser::new().parse_page(&html, "https://example.com/");
    assert!(page.len() <= 9);
}
