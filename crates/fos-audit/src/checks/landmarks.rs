//! Landmarks
//!
//! A page's landmarks must be distinguishable: no two of the same role may
//! share a label, and banner, contentinfo and main must not be nested in
//! another landmark. All perceivable content should sit inside one.

use crate::check::{CheckContext, Evaluation};
use crate::matcher::MatchContext;
use crate::registry::Registry;
use crate::result::CheckResult;
use fos_a11y::{
    accessible_text, get_role, has_content_virtual, implicit_role, is_landmark, is_visible_to_screen_readers,
};
use fos_vdom::{VNodeId, VirtualTree};
use serde_json::{json, Value};

/// Sectioning content that scopes `header` and `footer` to itself
const NATIVE_SCOPE: &[&str] = &["article", "aside", "main", "nav", "section"];

/// Elements whose text is never page content
const NON_CONTENT: &[&str] = &["script", "style", "template", "noscript"];

pub(super) fn register(registry: &mut Registry) {
    registry
        .add_evaluate("landmark-is-unique", landmark_is_unique)
        .add_evaluate("landmark-is-top-level", landmark_is_top_level)
        .add_evaluate("region", region)
        .add_after("landmark-is-unique-after", landmark_is_unique_after)
        .add_matches("landmark-unique-matches", landmark_unique_matches)
        .add_matches("landmark-has-body-context-matches", landmark_has_body_context);
}

fn landmark_is_unique(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let role = get_role(cx.tree(), cx.node());
    let label = accessible_text(cx.tree(), cx.node()).unwrap_or_default().to_lowercase();
    cx.data(json!({ "role": role, "accessibleText": label }));
    cx.related_nodes([cx.node()]);
    Ok(true.into())
}

/// The first landmark of each role and label is kept; later ones fold
/// into it as related nodes and make it fail.
fn landmark_is_unique_after(results: Vec<CheckResult>, _options: &Value) -> Vec<CheckResult> {
    let mut unique: Vec<CheckResult> = Vec::new();
    for mut result in results {
        let key = |r: &CheckResult| (r.data.get("role").cloned(), r.data.get("accessibleText").cloned());
        match unique.iter_mut().find(|seen| key(seen) == key(&result)) {
            Some(first) => {
                first.result = Some(false);
                if let Some(related) = result.related_nodes.drain(..).next() {
                    first.related_nodes.push(related);
                }
            }
            None => {
                result.related_nodes.clear();
                unique.push(result);
            }
        }
    }
    unique
}

fn landmark_is_top_level(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let tree = cx.tree();
    let role = get_role(tree, cx.node());
    cx.data(json!({ "role": role }));
    for ancestor in tree.ancestors(cx.node()) {
        let Some(node) = tree.get(ancestor).filter(|n| n.is_element()) else {
            continue;
        };
        let parent_role = match node.attr("role") {
            Some(_) => get_role(tree, ancestor),
            None if node.node_name() == "form" => None,
            None => implicit_role(tree, ancestor),
        };
        let Some(parent_role) = parent_role.filter(|r| is_landmark(r)) else {
            continue;
        };
        if !(parent_role == "main" && role == Some("complementary")) {
            return Ok(false.into());
        }
    }
    Ok(true.into())
}

/// Fails with every piece of content found outside a landmark
fn region(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let tree = cx.tree();
    let mut regionless = Vec::new();
    if has_content_virtual(tree, cx.node(), true, true) {
        regionless.push(cx.node());
    }
    find_regionless(tree, cx.node(), &mut regionless);
    let passed = regionless.is_empty();
    cx.related_nodes(regionless);
    Ok(passed.into())
}

fn find_regionless(tree: &VirtualTree, id: VNodeId, found: &mut Vec<VNodeId>) {
    for child in tree.element_children(id) {
        let node = &tree[child];
        if NON_CONTENT.contains(&node.node_name()) || !is_visible_to_screen_readers(tree, child) {
            continue;
        }
        if is_counted_landmark(tree, child) || is_skip_link(tree, child) {
            continue;
        }
        if has_content_virtual(tree, child, true, false) {
            found.push(child);
        } else {
            find_regionless(tree, child, found);
        }
    }
}

/// `region` and `form` count only when named
fn is_counted_landmark(tree: &VirtualTree, id: VNodeId) -> bool {
    match get_role(tree, id) {
        Some("region" | "form") => accessible_text(tree, id).is_ok_and(|t| !t.is_empty()),
        Some(role) => is_landmark(role),
        None => false,
    }
}

fn is_skip_link(tree: &VirtualTree, id: VNodeId) -> bool {
    let node = &tree[id];
    node.node_name() == "a" && node.attr("href").is_some_and(|href| href.len() > 1 && href.starts_with('#'))
}

fn landmark_unique_matches(cx: &MatchContext<'_>) -> bool {
    let Some(role) = get_role(cx.tree, cx.node).filter(|r| is_landmark(r)) else {
        return false;
    };
    let node = &cx.tree[cx.node];
    if matches!(node.node_name(), "header" | "footer") && node.attr("role").is_none() {
        return landmark_has_body_context(cx);
    }
    if matches!(role, "region" | "form") && accessible_text(cx.tree, cx.node).is_ok_and(|t| t.is_empty()) {
        return false;
    }
    is_visible_to_screen_readers(cx.tree, cx.node)
}

/// `header` and `footer` are page landmarks only outside sectioning content
fn landmark_has_body_context(cx: &MatchContext<'_>) -> bool {
    if cx.tree[cx.node].has_attr("role") {
        return true;
    }
    !cx.tree
        .ancestors(cx.node)
        .filter_map(|a| cx.tree.get(a))
        .any(|a| NATIVE_SCOPE.contains(&a.node_name()))
}
