//! Comprehensive tests for fos-vdom
//!
//! Builds composed trees from parsed and laid-out pages and from serialized
//! nodes, then queries them.

use fos_dom::{Document, Page};
use fos_html::parse_page;
use fos_layout::layout_page;
use fos_vdom::{
    get_ancestry, get_target, outer_html, query_selector_all_str, FrameLink, Scope, ScopeId, SerialNode, TargetPart,
    TreeBuilder, VNodeId, VirtualTree,
};
use std::collections::HashSet;

fn build(html: &str) -> VirtualTree {
    let mut page = parse_page(html, "https://example.com/");
    layout_page(&mut page);
    TreeBuilder::new(&page).build(page.top()).unwrap()
}

fn by_id(tree: &VirtualTree, id: &str) -> VNodeId {
    tree.nodes()
        .find(|n| n.attr("id") == Some(id))
        .map(|n| n.id())
        .unwrap()
}

const COMPOSED: &str = concat!(
    r#"<div id="host"><span id="light">L</span>"#,
    r#"<template shadowrootmode="open"><p id="shadow-p"><slot></slot></p></template></div>"#,
    r#"<iframe id="f" srcdoc="<b id='inner'>x</b>"></iframe>"#,
);

// ============================================================================
// Composition
// ============================================================================

#[test]
fn test_composed_node_count() {
    let tree = build(COMPOSED);
    // html head body div p span "L" iframe html head body b "x"
    assert_eq!(tree.len(), 13);
    assert!(tree.is_complete());
}

#[test]
fn test_parent_links_form_one_tree() {
    let tree = build(COMPOSED);
    let root = tree.root().unwrap();
    let mut seen = HashSet::new();
    for node in tree.nodes() {
        assert!(seen.insert(node.id()));
        if node.id() != root {
            let parent = node.parent().unwrap();
            assert!(parent < node.id());
            assert!(tree.children(parent).contains(&node.id()));
        }
    }
    assert_eq!(tree.descendants(root).count() + 1, tree.len());
}

#[test]
fn test_shadow_content_and_slotted_nodes() {
    let tree = build(COMPOSED);
    let host = by_id(&tree, "host");
    let p = by_id(&tree, "shadow-p");
    let light = by_id(&tree, "light");

    assert_eq!(tree.parent(p), Some(host));
    assert_eq!(tree.parent(light), Some(p));
    assert!(tree.in_shadow_tree(p));
    assert!(!tree.in_shadow_tree(light));
    assert_eq!(tree[light].scope(), ScopeId::ROOT);
    assert!(matches!(tree.scope(tree[p].scope()), Some(Scope::Shadow { .. })));
}

#[test]
fn test_same_origin_frame_is_spliced() {
    let tree = build(COMPOSED);
    let frame = by_id(&tree, "f");
    let inner = by_id(&tree, "inner");
    assert!(matches!(tree[frame].frame(), Some(FrameLink::Resolved { .. })));
    assert_eq!(tree.frame_path(inner), vec![frame]);
    assert_eq!(tree[tree.children(frame)[0]].node_name(), "html");
}

#[test]
fn test_cross_origin_frame_is_a_placeholder() {
    let mut top = Document::new("https://example.com/");
    let body = top.body();
    let frame = top.tree.create_element("iframe");
    top.tree.set_attr(frame, "src", "https://ads.example.net/").unwrap();
    top.tree.append_child(body, frame);
    let mut page = Page::new(top);
    let child = page.add_document(Document::new("https://ads.example.net/"));
    page.attach_frame(page.top(), frame, child).unwrap();

    let tree = TreeBuilder::new(&page).build(page.top()).unwrap();
    let vframe = tree.nodes().find(|n| n.node_name() == "iframe").unwrap();
    assert!(vframe.children().is_empty());
    match vframe.frame() {
        Some(FrameLink::Unresolved { src, .. }) => assert_eq!(src.as_deref(), Some("https://ads.example.net/")),
        other => panic!("unexpected frame link {other:?}"),
    }
}

#[test]
fn test_frames_can_be_skipped() {
    let page = parse_page(COMPOSED, "https://example.com/");
    let tree = TreeBuilder::new(&page).with_iframes(false).build(page.top()).unwrap();
    assert_eq!(tree.len(), 8);
}

#[test]
fn test_live_nodes_carry_style_and_geometry() {
    let tree = build(r#"<div id="box" style="width: 40px; height: 10px; color: red"></div>"#);
    let node = &tree[by_id(&tree, "box")];
    assert_eq!(node.bounding_client_rect().unwrap().width, 40.0);
    assert_eq!(node.computed_style().unwrap().color().red, 255.0);
}

#[test]
fn test_build_from_subtree_inherits_style() {
    let mut page = parse_page(
        r#"<section style="color: blue"><p id="start">text</p></section>"#,
        "https://example.com/",
    );
    layout_page(&mut page);
    let doc = page.document(page.top()).unwrap();
    let start = doc.get_element_by_id("start").unwrap();
    let tree = TreeBuilder::new(&page).build_from(page.top(), start).unwrap();
    assert_eq!(tree.len(), 2);
    let root = tree.root().unwrap();
    assert_eq!(tree[root].computed_style().unwrap().color().blue, 255.0);
}

// ============================================================================
// Queries and targets
// ============================================================================

#[test]
fn test_query_is_scoped_to_tree_scopes() {
    let tree = build(COMPOSED);
    let root = tree.root().unwrap();
    assert_eq!(query_selector_all_str(&tree, root, "p").unwrap().len(), 1);
    assert!(query_selector_all_str(&tree, root, "#host p").unwrap().is_empty());
    assert_eq!(query_selector_all_str(&tree, root, "#host > span").unwrap().len(), 1);
    assert!(query_selector_all_str(&tree, root, "iframe b").unwrap().is_empty());
}

#[test]
fn test_targets_cross_shadow_and_frames() {
    let tree = build(COMPOSED);
    let p = by_id(&tree, "shadow-p");
    assert_eq!(
        get_target(&tree, p),
        vec![TargetPart::Shadow(vec!["#host".into(), "#shadow-p".into()])]
    );
    let inner = by_id(&tree, "inner");
    assert_eq!(
        get_target(&tree, inner),
        vec![TargetPart::Selector("#f".into()), TargetPart::Selector("#inner".into())]
    );
    let json = serde_json::to_string(&get_target(&tree, p)).unwrap();
    assert_eq!(json, r##"[["#host","#shadow-p"]]"##);
}

#[test]
fn test_ancestry_paths() {
    let tree = build(COMPOSED);
    let inner = by_id(&tree, "inner");
    assert_eq!(
        get_ancestry(&tree, inner),
        vec![
            TargetPart::Selector("html > body:nth-child(2) > iframe:nth-child(2)".into()),
            TargetPart::Selector("html > body:nth-child(2) > b:nth-child(1)".into()),
        ]
    );
}

// ============================================================================
// Serialized trees
// ============================================================================

#[test]
fn test_serialized_tree_has_no_live_data() {
    let root = SerialNode::element("img").with_attr("src", "a.png");
    let tree = VirtualTree::from_serial(&root).unwrap();
    let img = &tree[tree.root().unwrap()];
    assert!(img.bounding_client_rect().is_none());
    assert!(img.computed_style().is_none());
    assert!(!tree.is_complete());
    assert_eq!(outer_html(&tree, img.id()), r#"<img src="a.png">"#);
}

#[test]
fn test_serialized_from_json_value() {
    let value = serde_json::json!({
        "nodeName": "label",
        "attributes": { "for": "x" },
        "childNodes": [{ "nodeName": "#text", "nodeValue": "Name" }]
    });
    let tree = VirtualTree::from_json(&value.to_string()).unwrap();
    assert_eq!(tree.text_content(tree.root().unwrap()), "Name");
}
