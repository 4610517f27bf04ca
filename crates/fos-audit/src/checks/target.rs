//! Pointer target size and spacing

use crate::check::{CheckContext, Evaluation};
use crate::matcher::MatchContext;
use crate::registry::Registry;
use fos_a11y::standards::RoleType;
use fos_a11y::{get_role, get_role_type, is_in_tab_order, target_offset, target_rects, target_size, MIN_TARGET_SIZE};
use fos_vdom::VirtualNode;
use serde_json::json;

pub(super) fn register(registry: &mut Registry) {
    registry
        .add_evaluate("target-size", target_size_check)
        .add_evaluate("target-offset", target_offset_check)
        .add_matches("widget-not-inline-matches", widget_not_inline);
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Options: `minSize` in CSS pixels
fn target_size_check(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let min_size = cx.option::<f64>("minSize").unwrap_or(MIN_TARGET_SIZE);
    if cx.vnode().bounding_client_rect().is_none() {
        return Ok(Evaluation::incomplete());
    }
    if target_rects(cx.tree(), cx.node()).is_empty() {
        cx.data(json!({ "messageKey": "obscured" }));
        return Ok(true.into());
    }
    let Some(rect) = target_size(cx.tree(), cx.node()) else {
        return Ok(Evaluation::incomplete());
    };
    let (width, height) = (round2(rect.width), round2(rect.height));
    let large_enough = width + 0.05 >= min_size && height + 0.05 >= min_size;
    cx.data(json!({ "minSize": min_size, "width": width, "height": height }));
    Ok(large_enough.into())
}

/// Options: `minOffset` in CSS pixels
fn target_offset_check(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let min_offset = cx.option::<f64>("minOffset").unwrap_or(MIN_TARGET_SIZE);
    let Some(offset) = target_offset(cx.tree(), cx.node()) else {
        return Ok(true.into());
    };
    let closest = round2(offset);
    cx.data(json!({ "minOffset": min_offset, "closestOffset": closest }));
    Ok((closest + 0.05 >= min_offset).into())
}

fn is_inline_display(node: &VirtualNode) -> bool {
    node.computed_style().is_some_and(|s| s.display().is_inline_level())
}

/// Focusable widgets, except links and controls flowing inside a line of text
fn widget_not_inline(cx: &MatchContext<'_>) -> bool {
    let tree = cx.tree;
    if !is_in_tab_order(tree, cx.node) {
        return false;
    }
    let is_widget = get_role(tree, cx.node)
        .and_then(get_role_type)
        .is_some_and(|kind| matches!(kind, RoleType::Widget | RoleType::Composite));
    if !is_widget {
        return false;
    }
    if !is_inline_display(&tree[cx.node]) {
        return true;
    }
    let in_text = tree.parent(cx.node).is_some_and(|parent| {
        tree.children(parent).iter().any(|sibling| {
            *sibling != cx.node
                && tree
                    .get(*sibling)
                    .is_some_and(|n| n.is_text() && n.node_value().is_some_and(|v| !v.trim().is_empty()))
        })
    });
    !in_text
}
