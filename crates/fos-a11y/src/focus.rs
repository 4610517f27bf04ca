//! Focus
//!
//! Focusability and sequential navigation order of virtual nodes.

use crate::memoized;
use crate::visibility::is_hidden_for_everyone;
use fos_vdom::{VNodeId, VirtualNode, VirtualTree};

/// Parsed `tabindex` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabIndex {
    /// Absent or not an integer
    Unset,
    /// Negative: focusable by script only
    Programmatic(i32),
    /// Zero or positive: part of sequential navigation
    Sequential(i32),
}

impl TabIndex {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().parse::<i32>()) {
            Some(Ok(n)) if n < 0 => Self::Programmatic(n),
            Some(Ok(n)) => Self::Sequential(n),
            _ => Self::Unset,
        }
    }

    pub fn of(node: &VirtualNode) -> Self {
        Self::parse(node.attr("tabindex"))
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, Self::Programmatic(_))
    }
}

const FORM_CONTROLS: &[&str] = &["button", "fieldset", "input", "optgroup", "option", "select", "textarea"];

/// Disabled form control, including controls inside a disabled fieldset
/// other than those in its first legend
pub fn is_disabled(tree: &VirtualTree, id: VNodeId) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    if !node.is_html() || !FORM_CONTROLS.contains(&node.node_name()) {
        return false;
    }
    if node.has_attr("disabled") {
        return true;
    }
    let mut child = id;
    for ancestor in tree.ancestors(id) {
        let Some(parent) = tree.get(ancestor) else { break };
        if parent.node_name() == "fieldset" && parent.has_attr("disabled") {
            let first_legend = tree
                .element_children(ancestor)
                .find(|c| tree.get(*c).is_some_and(|n| n.node_name() == "legend"));
            return first_legend != Some(child);
        }
        child = ancestor;
    }
    false
}

/// Focusable without a `tabindex`
pub fn is_natively_focusable(tree: &VirtualTree, id: VNodeId) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    if !node.is_html() || is_disabled(tree, id) {
        return false;
    }
    match node.node_name() {
        "a" | "area" => node.has_attr("href"),
        "button" | "select" | "textarea" => true,
        "input" => node.input_type().as_deref() != Some("hidden"),
        "summary" => tree
            .parent(id)
            .and_then(|p| tree.get(p))
            .is_some_and(|p| p.node_name() == "details"),
        "audio" | "video" => node.has_attr("controls"),
        _ => node
            .attr("contenteditable")
            .is_some_and(|v| v.is_empty() || v.eq_ignore_ascii_case("true")),
    }
}

/// Can receive focus at all
pub fn is_focusable(tree: &VirtualTree, id: VNodeId) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    if !node.is_element() {
        return false;
    }
    memoized(node.cache(), "isFocusable", || {
        if is_disabled(tree, id) || is_hidden_for_everyone(tree, id) {
            return false;
        }
        is_natively_focusable(tree, id) || TabIndex::of(node).is_set()
    })
}

/// Reachable with the Tab key
pub fn is_in_tab_order(tree: &VirtualTree, id: VNodeId) -> bool {
    tree.get(id).is_some_and(|node| is_focusable(tree, id) && !TabIndex::of(node).is_negative())
}

/// Whether `tabindex` made a non-native element focusable
pub fn inserted_into_focus_order(tree: &VirtualTree, id: VNodeId) -> bool {
    tree.get(id)
        .is_some_and(|node| matches!(TabIndex::of(node), TabIndex::Sequential(_)) && !is_natively_focusable(tree, id))
}

/// Sequential navigation order within a subtree: positive tabindex values
/// first in ascending order, then everything else in document order
pub fn tab_order(tree: &VirtualTree, root: VNodeId) -> Vec<VNodeId> {
    let mut order: Vec<(i32, VNodeId)> = tree
        .subtree(root)
        .filter(|id| is_in_tab_order(tree, *id))
        .map(|id| match tree.get(id).map(TabIndex::of) {
            Some(TabIndex::Sequential(n)) if n > 0 => (n, id),
            _ => (i32::MAX, id),
        })
        .collect();
    order.sort_by_key(|(index, id)| (*index, *id));
    order.into_iter().map(|(_, id)| id).collect()
}
