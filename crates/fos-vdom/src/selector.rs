//! Unique selectors, ancestry paths and HTML snippets
//!
//! A [`Target`] addresses a node from the top document: one part per frame
//! document on the way down, where a part is a plain selector or, when the
//! node sits in a shadow tree, the list of selectors from the outermost host
//! inwards.

use crate::{query, ScopeId, VNodeId, VRef, VirtualNode, VirtualTree};
use fos_css::{escape_identifier, escape_string, SelectorElement};
use serde::{Deserialize, Serialize};

/// Snippets longer than this are cut to their start tag
const MAX_HTML_LENGTH: usize = 300;

/// Attribute values longer than this never make a selector feature
const MAX_FEATURE_VALUE: usize = 50;

/// Attributes whose values change with state and make poor selector features
const UNSTABLE_ATTRIBUTES: &[&str] = &[
    "id",
    "class",
    "style",
    "selected",
    "checked",
    "disabled",
    "tabindex",
    "aria-checked",
    "aria-selected",
    "aria-invalid",
    "aria-activedescendant",
    "aria-busy",
    "aria-disabled",
    "aria-hidden",
    "aria-expanded",
    "aria-pressed",
    "aria-valuenow",
    "value",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// One document's worth of a target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetPart {
    Selector(String),
    /// Host selectors from the outermost shadow tree inwards, then the node
    Shadow(Vec<String>),
}

impl TargetPart {
    /// Last selector of the part
    pub fn leaf(&self) -> &str {
        match self {
            TargetPart::Selector(s) => s,
            TargetPart::Shadow(chain) => chain.last().map(String::as_str).unwrap_or(""),
        }
    }
}

/// Path of parts from the top document down to a node
pub type Target = Vec<TargetPart>;

fn elements_in_scope(tree: &VirtualTree, scope: ScopeId) -> impl Iterator<Item = &VirtualNode> {
    tree.nodes().filter(move |n| n.is_element() && n.scope == scope)
}

fn unique_id(tree: &VirtualTree, node: &VirtualNode) -> Option<String> {
    let id = node.attr("id").filter(|v| !v.trim().is_empty())?;
    (tree.elements_by_id(node.scope, id).len() == 1).then(|| format!("#{}", escape_identifier(id)))
}

/// Class shared by the fewest elements of the scope
fn rarest_class(tree: &VirtualTree, node: &VirtualNode) -> Option<String> {
    let classes: Vec<&str> = node.attr("class")?.split_ascii_whitespace().collect();
    classes
        .iter()
        .map(|class| {
            let count = elements_in_scope(tree, node.scope)
                .filter(|n| {
                    n.attr("class")
                        .is_some_and(|c| c.split_ascii_whitespace().any(|other| other == *class))
                })
                .count();
            (count, *class)
        })
        .min_by_key(|(count, _)| *count)
        .map(|(_, class)| format!(".{}", escape_identifier(class)))
}

fn attribute_feature(node: &VirtualNode) -> Option<String> {
    node.attributes()
        .iter()
        .find(|(name, value)| {
            !UNSTABLE_ATTRIBUTES.contains(&name.as_str())
                && !name.starts_with("on")
                && value.len() < MAX_FEATURE_VALUE
                && !value.is_empty()
        })
        .map(|(name, value)| format!("[{}={}]", escape_identifier(name), escape_string(value)))
}

/// Compound selector for one element, disambiguated among same-tag siblings
fn compound(tree: &VirtualTree, id: VNodeId) -> String {
    let node = &tree[id];
    if let Some(id_selector) = unique_id(tree, node) {
        return id_selector;
    }
    let mut selector = escape_identifier(node.node_name());
    if let Some(class) = rarest_class(tree, node) {
        selector.push_str(&class);
    }
    if let Some(attr) = attribute_feature(node) {
        selector.push_str(&attr);
    }
    if let Some(handle) = VRef::scoped(tree, id) {
        let (position, total) = type_position(&handle);
        if total > 1 {
            selector.push_str(&format!(":nth-of-type({})", position));
        }
    }
    selector
}

/// 1-based position among scoped siblings of the same tag, and their count
fn type_position(handle: &VRef<'_>) -> (usize, usize) {
    let name = handle.local_name().to_string();
    let mut before = 0;
    let mut cursor = handle.prev_sibling_element();
    while let Some(sibling) = cursor {
        if sibling.local_name() == name {
            before += 1;
        }
        cursor = sibling.prev_sibling_element();
    }
    let mut after = 0;
    let mut cursor = handle.next_sibling_element();
    while let Some(sibling) = cursor {
        if sibling.local_name() == name {
            after += 1;
        }
        cursor = sibling.next_sibling_element();
    }
    (before + 1, before + after + 1)
}

fn is_unique(tree: &VirtualTree, scope: ScopeId, selector: &str) -> bool {
    let Ok(list) = query::compile(tree, selector) else {
        return false;
    };
    elements_in_scope(tree, scope)
        .filter(|n| query::matches(tree, n.id, &list))
        .take(2)
        .count()
        == 1
}

/// Shortest selector that picks out `id` within its own tree scope
pub fn get_selector(tree: &VirtualTree, id: VNodeId) -> String {
    let Some(node) = tree.get(id) else {
        return String::new();
    };
    if let Some(Some(cached)) = node.cache().get::<String>("selector") {
        return (*cached).clone();
    }

    let scope = node.scope;
    let mut parts: Vec<String> = Vec::new();
    let mut current = id;
    let selector = loop {
        parts.insert(0, compound(tree, current));
        let candidate = parts.join(" > ");
        if is_unique(tree, scope, &candidate) {
            break candidate;
        }
        match VRef::scoped(tree, current).and_then(|r| r.parent_element()) {
            Some(parent) => current = parent.id,
            None => break candidate,
        }
    };
    // A failed write only costs a recomputation
    let _ = node.cache().set("selector", Some(selector.clone()));
    selector
}

/// `tag:nth-child(n)` path from the scope root down to `id`
pub fn get_ancestry_selector(tree: &VirtualTree, id: VNodeId) -> String {
    let mut parts = Vec::new();
    let mut cursor = VRef::scoped(tree, id);
    while let Some(handle) = cursor {
        let parent = handle.parent_element();
        let name = escape_identifier(handle.local_name());
        if parent.is_some() {
            let mut index = 1;
            let mut sibling = handle.prev_sibling_element();
            while let Some(s) = sibling {
                index += 1;
                sibling = s.prev_sibling_element();
            }
            parts.push(format!("{}:nth-child({})", name, index));
        } else {
            parts.push(name);
        }
        cursor = parent;
    }
    parts.reverse();
    parts.join(" > ")
}

fn scope_part(tree: &VirtualTree, id: VNodeId, select: fn(&VirtualTree, VNodeId) -> String) -> TargetPart {
    let mut chain = vec![select(tree, id)];
    let mut scope = tree.get(id).map(|n| n.scope);
    while let Some(host) = scope.and_then(|s| tree.scope_host(s)) {
        chain.push(select(tree, host));
        scope = tree.get(host).map(|n| n.scope);
    }
    chain.reverse();
    if chain.len() == 1 {
        TargetPart::Selector(chain.remove(0))
    } else {
        TargetPart::Shadow(chain)
    }
}

fn path_with(tree: &VirtualTree, id: VNodeId, select: fn(&VirtualTree, VNodeId) -> String) -> Target {
    tree.frame_path(id)
        .into_iter()
        .chain(std::iter::once(id))
        .map(|node| scope_part(tree, node, select))
        .collect()
}

/// Unique-selector target across frames and shadow trees
pub fn get_target(tree: &VirtualTree, id: VNodeId) -> Target {
    path_with(tree, id, get_selector)
}

/// Ancestry target across frames and shadow trees
pub fn get_ancestry(tree: &VirtualTree, id: VNodeId) -> Target {
    path_with(tree, id, get_ancestry_selector)
}

/// Document-order position of the node
pub fn node_index(id: VNodeId) -> usize {
    id.index()
}

fn escape_html(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

fn start_tag(node: &VirtualNode) -> String {
    let mut tag = format!("<{}", node.node_name());
    for (name, value) in node.attributes() {
        tag.push_str(&format!(" {}=\"{}\"", name, escape_html(value, true)));
    }
    tag.push('>');
    tag
}

fn write_html(tree: &VirtualTree, id: VNodeId, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    if node.is_text() {
        out.push_str(&escape_html(node.node_value().unwrap_or_default(), false));
        return;
    }
    out.push_str(&start_tag(node));
    if VOID_ELEMENTS.contains(&node.node_name()) {
        return;
    }
    for child in node.children() {
        if tree.get(*child).is_some_and(|c| c.scope == node.scope) {
            write_html(tree, *child, out);
        }
    }
    out.push_str(&format!("</{}>", node.node_name()));
}

/// Markup of the node's light subtree, cut to the start tag when long
pub fn outer_html(tree: &VirtualTree, id: VNodeId) -> String {
    let mut html = String::new();
    write_html(tree, id, &mut html);
    if html.chars().count() > MAX_HTML_LENGTH {
        return tree.get(id).map(start_tag).unwrap_or_default();
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SerialNode;

    fn tree() -> VirtualTree {
        let root = SerialNode::element("main")
            .with_child(SerialNode::element("p").with_attr("class", "note common"))
            .with_child(SerialNode::element("p").with_attr("class", "common"))
            .with_child(SerialNode::element("button").with_attr("id", "go").with_child(SerialNode::text("Go & <run>")))
            .with_child(SerialNode::element("img").with_attr("alt", "x").with_attr("src", "a.png"));
        VirtualTree::from_serial(&root).unwrap()
    }

    #[test]
    fn test_unique_id_selector() {
        let tree = tree();
        let button = tree.element_by_id(ScopeId::ROOT, "go").unwrap();
        assert_eq!(get_selector(&tree, button), "#go");
        assert_eq!(get_target(&tree, button), vec![TargetPart::Selector("#go".into())]);
    }

    #[test]
    fn test_rare_class_selector() {
        let tree = tree();
        let first_p = tree.children(tree.root().unwrap())[0];
        let selector = get_selector(&tree, first_p);
        assert!(selector.starts_with("p.note"), "{selector}");
        assert_eq!(query::query_selector_all_str(&tree, tree.root().unwrap(), &selector).unwrap(), vec![first_p]);
    }

    #[test]
    fn test_selector_is_stable() {
        let tree = tree();
        let second_p = tree.children(tree.root().unwrap())[1];
        assert_eq!(get_selector(&tree, second_p), get_selector(&tree, second_p));
        let matched = query::query_selector_all_str(&tree, tree.root().unwrap(), &get_selector(&tree, second_p)).unwrap();
        assert_eq!(matched, vec![second_p]);
    }

    #[test]
    fn test_ancestry() {
        let tree = tree();
        let img = tree.children(tree.root().unwrap())[3];
        assert_eq!(get_ancestry_selector(&tree, img), "main > img:nth-child(4)");
    }

    #[test]
    fn test_outer_html() {
        let tree = tree();
        let button = tree.element_by_id(ScopeId::ROOT, "go").unwrap();
        assert_eq!(outer_html(&tree, button), "<button id=\"go\">Go &amp; &lt;run&gt;</button>");
        let img = tree.children(tree.root().unwrap())[3];
        assert_eq!(outer_html(&tree, img), "<img alt=\"x\" src=\"a.png\">");
    }

    #[test]
    fn test_long_html_is_cut_to_start_tag() {
        let long = "word ".repeat(100);
        let root = SerialNode::element("div").with_attr("id", "d").with_child(SerialNode::text(&long));
        let tree = VirtualTree::from_serial(&root).unwrap();
        assert_eq!(outer_html(&tree, tree.root().unwrap()), "<div id=\"d\">");
    }
}
