//! Keyboard access to scrollable regions

use crate::check::CheckContext;
use crate::matcher::MatchContext;
use crate::registry::Registry;
use fos_a11y::{get_scroll, has_content_virtual, is_combobox_popup, is_in_tab_order};

/// Overflow beyond this many pixels counts as scrollable
const SCROLL_BUFFER: f64 = 13.0;

pub(super) fn register(registry: &mut Registry) {
    registry
        .add_evaluate("focusable-content", |cx: &mut CheckContext<'_>| {
            let tree = cx.tree();
            Ok(tree.descendants(cx.node()).any(|d| is_in_tab_order(tree, d)).into())
        })
        .add_evaluate("focusable-element", |cx: &mut CheckContext<'_>| {
            Ok(is_in_tab_order(cx.tree(), cx.node()).into())
        })
        .add_matches("scrollable-region-focusable-matches", scrollable_region);
}

fn scrollable_region(cx: &MatchContext<'_>) -> bool {
    let tree = cx.tree;
    if get_scroll(tree, cx.node, SCROLL_BUFFER).is_none() || is_combobox_popup(tree, cx.node) {
        return false;
    }
    tree.descendants(cx.node).any(|d| {
        tree.get(d).is_some_and(|n| n.is_element()) && has_content_virtual(tree, d, true, true)
    })
}
