//! Comprehensive tests for fos-css
//!
//! Tests selector matching against a real DOM, color parsing and style computation.

use fos_css::{
    escape_identifier, parse_selector_list, parse_stylesheet, Color, CssParser, Display, DomElement,
    Specificity, StyleResolver, Visibility,
};
use fos_dom::{Document, NodeId, ShadowRootMode};

fn element(doc: &mut Document, parent: NodeId, name: &str, attrs: &[(&str, &str)]) -> NodeId {
    let el = doc.tree.create_element(name);
    for (k, v) in attrs {
        doc.tree.set_attr(el, k, v).unwrap();
    }
    doc.tree.append_child(parent, el);
    el
}

fn matches(doc: &Document, id: NodeId, selector: &str) -> bool {
    let list = parse_selector_list(selector).unwrap();
    list.matches(&DomElement::new(&doc.tree, id).unwrap())
}

// ============================================================================
// Stylesheet parsing
// ============================================================================

#[test]
fn test_parse_empty() {
    let stylesheet = CssParser::new().parse("").unwrap();
    assert!(stylesheet.is_empty());
}

#[test]
fn test_parse_skips_at_rules() {
    let css = r#"
        .normal { color: black; }
        @media (max-width: 600px) {
            .normal { color: red; }
        }
        @keyframes spin { from { opacity: 0 } to { opacity: 1 } }
    "#;
    let stylesheet = parse_stylesheet(css).unwrap();
    assert_eq!(stylesheet.len(), 1);
}

#[test]
fn test_parse_important() {
    let stylesheet = parse_stylesheet(".force { color: red !important; }").unwrap();
    let rule = &stylesheet.rules[0];
    assert!(rule.declarations.iter().any(|d| d.important && d.property == "color"));
}

// ============================================================================
// Selector matching
// ============================================================================

#[test]
fn test_structural_selectors() {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body();
    let list = element(&mut doc, body, "ul", &[("id", "menu")]);
    let items: Vec<NodeId> = (0..4)
        .map(|i| element(&mut doc, list, "li", &[("class", if i % 2 == 0 { "even" } else { "odd" })]))
        .collect();

    assert!(matches(&doc, items[0], "li:first-child"));
    assert!(matches(&doc, items[3], "li:last-child"));
    assert!(matches(&doc, items[1], "#menu > li:nth-child(2n)"));
    assert!(!matches(&doc, items[1], "#menu > li:nth-child(odd)"));
    assert!(matches(&doc, items[2], "body li.even + li ~ li"));
    assert!(matches(&doc, items[3], "li:not(.even)"));
    assert!(matches(&doc, list, "ul:has(> li.odd)"));
    assert!(matches(&doc, doc.document_element(), ":root"));
}

#[test]
fn test_attribute_selectors() {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body();
    let input = element(
        &mut doc,
        body,
        "input",
        &[("type", "Checkbox"), ("aria-describedby", "a b"), ("lang", "en-US")],
    );

    assert!(matches(&doc, input, "input[type=checkbox i]"));
    assert!(!matches(&doc, input, "input[type=checkbox]"));
    assert!(matches(&doc, input, "[aria-describedby~=b]"));
    assert!(matches(&doc, input, "[lang|=en]"));
    assert!(matches(&doc, input, "[aria-describedby^='a ']"));
    assert!(matches(&doc, input, ":lang(en)"));
}

#[test]
fn test_form_state_pseudo_classes() {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body();
    let button = element(&mut doc, body, "button", &[("disabled", "")]);
    let checked = element(&mut doc, body, "input", &[("type", "radio"), ("checked", "")]);
    let link = element(&mut doc, body, "a", &[("href", "#")]);

    assert!(matches(&doc, button, "button:disabled"));
    assert!(matches(&doc, checked, ":checked"));
    assert!(matches(&doc, link, "a:link"));
}

#[test]
fn test_shadow_root_is_a_boundary() {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body();
    let host = element(&mut doc, body, "div", &[("id", "host")]);
    let root = doc.tree.attach_shadow(host, ShadowRootMode::Open).unwrap();
    let inner = element(&mut doc, root, "span", &[]);

    assert!(matches(&doc, inner, "span"));
    assert!(!matches(&doc, inner, "#host span"));
    assert!(!matches(&doc, inner, "body span"));
}

#[test]
fn test_specificity_ordering() {
    let id = parse_selector_list("#a").unwrap().max_specificity();
    let classes = parse_selector_list(".a.b.c.d").unwrap().max_specificity();
    let types = parse_selector_list("div p span").unwrap().max_specificity();
    assert!(id > classes);
    assert!(classes > types);
    assert_eq!(types, Specificity(0, 0, 3));
    assert_eq!(
        parse_selector_list(":where(#a) p").unwrap().max_specificity(),
        Specificity(0, 0, 1)
    );
}

#[test]
fn test_escaped_identifier_round_trips_through_parser() {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body();
    let odd = element(&mut doc, body, "div", &[("id", "1:weird.id")]);
    let selector = format!("#{}", escape_identifier("1:weird.id"));
    assert!(matches(&doc, odd, &selector));
}

// ============================================================================
// Colors
// ============================================================================

#[test]
fn test_color_forms() {
    assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);
    assert_eq!(Color::parse("rgb(0 0 0 / 50%)").unwrap(), Color::rgba(0.0, 0.0, 0.0, 0.5));
    assert_eq!(Color::parse("hsl(0, 100%, 50%)").unwrap(), Color::rgb(255.0, 0.0, 0.0));
    assert_eq!(Color::parse("rebeccapurple").unwrap(), Color::rgb(102.0, 51.0, 153.0));
    assert!(Color::parse("transparent").unwrap().is_transparent());
    assert!(Color::parse("not-a-color").is_err());
}

#[test]
fn test_blend_half_black_over_white() {
    let blended = Color::rgba(0.0, 0.0, 0.0, 0.5).blend_over(&Color::WHITE);
    assert!((blended.red - 127.5).abs() < 0.01);
    assert_eq!(blended.alpha, 1.0);
}

// ============================================================================
// Cascade
// ============================================================================

#[test]
fn test_cascade_inherits_color_and_visibility() {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body();
    let outer = element(&mut doc, body, "div", &[("style", "color: #00f; visibility: hidden")]);
    let inner = element(&mut doc, outer, "span", &[("style", "display: block")]);
    let style = StyleResolver::new().compute_chain(&doc.tree, inner);
    assert_eq!(style.color(), Color::rgb(0.0, 0.0, 255.0));
    assert_eq!(style.visibility(), Visibility::Hidden);
    assert_eq!(style.display(), Display::Block);
}

#[test]
fn test_important_beats_inline() {
    let mut doc = Document::new("https://example.com/");
    let head = doc.head();
    let body = doc.body();
    let p = element(&mut doc, body, "p", &[("style", "color: green")]);
    let sheet = element(&mut doc, head, "style", &[]);
    doc.tree.append_text(sheet, "p { color: red !important }");
    let style = StyleResolver::for_document(&doc).compute_chain(&doc.tree, p);
    assert_eq!(style.color(), Color::rgb(255.0, 0.0, 0.0));
}

#[test]
fn test_shadow_styles_are_scoped() {
    let mut doc = Document::new("https://example.com/");
    let body = doc.body();
    let host = element(&mut doc, body, "div", &[("style", "color: #0f0")]);
    let root = doc.tree.attach_shadow(host, ShadowRootMode::Open).unwrap();
    let sheet = element(&mut doc, root, "style", &[]);
    doc.tree.append_text(sheet, "b { font-size: 30px }");
    let inner = element(&mut doc, root, "b", &[]);
    let light = element(&mut doc, body, "b", &[]);

    let resolver = StyleResolver::for_document(&doc);
    let inner_style = resolver.compute_chain(&doc.tree, inner);
    assert_eq!(inner_style.font_size(), 30.0);
    assert_eq!(inner_style.color(), Color::rgb(0.0, 255.0, 0.0));
    assert_eq!(resolver.compute_chain(&doc.tree, light).font_size(), 16.0);
}
