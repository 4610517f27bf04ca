//! Comprehensive tests for fos-layout
//!
//! Lays out parsed pages and checks the geometry stored on elements.

use fos_dom::{DOMRect, Document, ElementGeometry};
use fos_html::{parse_page, HtmlParser};
use fos_layout::{layout_document, layout_page, BoxType};

fn geometry(doc: &Document, id: &str) -> ElementGeometry {
    let node = doc.get_element_by_id(id).unwrap();
    doc.tree().element(node).unwrap().geometry.unwrap()
}

// ============================================================================
// Box model
// ============================================================================

#[test]
fn test_padding_border_margin() {
    let mut doc = HtmlParser::new().parse(
        r#"<div id="a" style="margin: 10px; padding: 5px; border: 2px solid black; width: 100px; height: 20px"></div>"#,
    );
    layout_document(&mut doc);
    let a = geometry(&doc, "a");
    assert_eq!(a.border_box, DOMRect::from_xywh(10.0, 10.0, 114.0, 34.0));
    assert_eq!(a.client_width, 110.0);
    assert_eq!(a.client_height, 30.0);
}

#[test]
fn test_auto_margins_center() {
    let mut doc = HtmlParser::new().parse(r#"<div id="a" style="width: 280px; margin: 0 auto; height: 1px"></div>"#);
    layout_document(&mut doc);
    assert_eq!(geometry(&doc, "a").border_box.x, 500.0);
}

#[test]
fn test_text_sets_height() {
    let mut doc = HtmlParser::new().parse(r#"<p id="p" style="font-size: 20px">Hello there</p>"#);
    let tree = layout_document(&mut doc);
    assert_eq!(geometry(&doc, "p").border_box.height, 24.0);
    let p = doc.get_element_by_id("p").unwrap();
    assert_eq!(tree.get(p).unwrap().box_type, BoxType::Block);
}

#[test]
fn test_link_shrinks_to_text() {
    let mut doc = HtmlParser::new().parse(r#"<p><a id="a" href="/">four</a></p>"#);
    layout_document(&mut doc);
    let a = geometry(&doc, "a").border_box;
    assert_eq!(a.width, 32.0);
    assert!((a.height - 19.2).abs() < 1e-9);
}

// ============================================================================
// Flex rows and positioning
// ============================================================================

#[test]
fn test_flex_row_places_children_side_by_side() {
    let mut doc = HtmlParser::new().parse(
        r#"<div style="display: flex">
             <div id="a" style="width: 30px; height: 30px"></div>
             <div id="b" style="width: 30px; height: 30px"></div>
           </div>"#,
    );
    layout_document(&mut doc);
    assert_eq!(geometry(&doc, "a").border_box.x, 0.0);
    assert_eq!(geometry(&doc, "b").border_box.x, 30.0);
    assert_eq!(geometry(&doc, "b").border_box.y, 0.0);
}

#[test]
fn test_relative_offset_and_nested_absolute() {
    let mut doc = HtmlParser::new().parse(
        r#"<div id="outer" style="position: relative; top: 10px; left: 10px; width: 200px; height: 200px">
             <span id="inner" style="position: absolute; right: 0; bottom: 0; width: 20px; height: 20px"></span>
           </div>"#,
    );
    layout_document(&mut doc);
    assert_eq!(geometry(&doc, "outer").border_box, DOMRect::from_xywh(10.0, 10.0, 200.0, 200.0));
    assert_eq!(geometry(&doc, "inner").border_box, DOMRect::from_xywh(190.0, 190.0, 20.0, 20.0));
}

#[test]
fn test_fixed_uses_viewport() {
    let mut doc = HtmlParser::new().parse(
        r#"<div style="margin-top: 500px; position: relative">
             <div id="f" style="position: fixed; top: 0; left: 0; width: 5px; height: 5px"></div>
           </div>"#,
    );
    layout_document(&mut doc);
    assert_eq!(geometry(&doc, "f").border_box, DOMRect::from_xywh(0.0, 0.0, 5.0, 5.0));
}

// ============================================================================
// Scrolling
// ============================================================================

#[test]
fn test_overflowing_content_scroll_size() {
    let mut doc = HtmlParser::new().parse(
        r#"<div id="s" style="overflow: auto; height: 100px; width: 100px">
             <div style="height: 300px; width: 250px"></div>
           </div>"#,
    );
    layout_document(&mut doc);
    let s = geometry(&doc, "s");
    assert_eq!(s.scroll_height, 300.0);
    assert_eq!(s.scroll_width, 250.0);
    assert!(s.overflows_y());
    assert!(s.overflows_x());
}

// ============================================================================
// Shadow DOM and frames
// ============================================================================

#[test]
fn test_shadow_content_is_laid_out() {
    let mut doc = HtmlParser::new().parse(
        r#"<div id="host"><template shadowrootmode="open"><button id="inner" style="width: 44px; height: 44px"></button></template></div>"#,
    );
    layout_document(&mut doc);
    let host = doc.get_element_by_id("host").unwrap();
    let root = doc.tree().shadow_root(host).unwrap();
    let button = doc.tree().children(root).next().unwrap().0;
    let rect = doc.tree().element(button).unwrap().geometry.unwrap().border_box;
    assert_eq!(rect, DOMRect::from_xywh(0.0, 0.0, 44.0, 44.0));
    assert_eq!(geometry(&doc, "host").border_box.height, 44.0);
}

#[test]
fn test_frame_document_gets_frame_viewport() {
    let mut page = parse_page(
        r#"<iframe id="f" style="width: 400px; height: 200px; border: none" srcdoc="<div id='d' style='height: 10px'></div>"></iframe>"#,
        "https://example.com/",
    );
    layout_page(&mut page);
    let top = page.top();
    let frame = page.document(top).unwrap().get_element_by_id("f").unwrap();
    let child = page.frame_document(top, frame).unwrap();
    let child_doc = page.document(child).unwrap();
    assert_eq!(child_doc.viewport(), DOMRect::from_xywh(0.0, 0.0, 400.0, 200.0));
    assert_eq!(geometry(child_doc, "d").border_box.width, 400.0);
}
