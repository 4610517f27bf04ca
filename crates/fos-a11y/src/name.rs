//! Accessible names
//!
//! Computes the text assistive technology announces for an element, in
//! precedence order: `aria-labelledby`, `aria-label`, native labelling
//! (labels, `alt`, captions, legends), content, then tooltips.

use crate::aria::{get_role, idrefs};
use crate::standards::role_spec;
use crate::text::sanitize;
use crate::visibility::is_visible_to_screen_readers;
use crate::Result;
use fos_vdom::{VNodeId, VirtualNode, VirtualTree};
use std::collections::HashSet;

/// Traversal state of one name computation
#[derive(Debug, Clone, Copy, Default)]
struct NameContext {
    /// Computing the text of an `aria-labelledby` target
    in_labelled_by: bool,
    /// Collecting text from descendants
    in_subtree: bool,
    /// Control embedded in the label of another control
    in_control_label: bool,
}

/// Trimmed, non-empty `aria-label`
pub fn aria_label(node: &VirtualNode) -> Option<String> {
    node.attr("aria-label").map(sanitize).filter(|label| !label.is_empty())
}

/// Sanitized `title` attribute
pub fn title_text(tree: &VirtualTree, id: VNodeId) -> String {
    tree.get(id).and_then(|n| n.attr("title")).map(sanitize).unwrap_or_default()
}

/// Joined text of the elements referenced by `aria-labelledby`
pub fn arialabelledby_text(tree: &VirtualTree, id: VNodeId) -> Result<String> {
    let cx = NameContext {
        in_labelled_by: true,
        ..NameContext::default()
    };
    let mut parts = Vec::new();
    for target in idrefs(tree, id, "aria-labelledby")?.into_iter().flatten() {
        let text = compute(tree, target, cx, &mut HashSet::new())?;
        if !text.is_empty() {
            parts.push(text);
        }
    }
    Ok(parts.join(" "))
}

/// Accessible name of an element. Fails when the name depends on id
/// references the tree cannot resolve.
pub fn accessible_text(tree: &VirtualTree, id: VNodeId) -> Result<String> {
    compute(tree, id, NameContext::default(), &mut HashSet::new())
}

/// Name contributed by the element's descendants alone
pub fn content_text(tree: &VirtualTree, id: VNodeId) -> Result<String> {
    let cx = NameContext {
        in_subtree: true,
        ..NameContext::default()
    };
    let mut visited = HashSet::from([id]);
    subtree_text(tree, id, cx, &mut visited)
}

fn compute(tree: &VirtualTree, id: VNodeId, cx: NameContext, visited: &mut HashSet<VNodeId>) -> Result<String> {
    let Some(node) = tree.get(id) else {
        return Ok(String::new());
    };
    if !visited.insert(id) {
        return Ok(String::new());
    }
    if node.is_text() {
        if !cx.in_labelled_by && !is_visible_to_screen_readers(tree, id) {
            return Ok(String::new());
        }
        let value = node.node_value().unwrap_or_default();
        return Ok(if cx.in_subtree { value.to_string() } else { sanitize(value) });
    }
    if !node.is_element() || (!cx.in_labelled_by && !is_visible_to_screen_readers(tree, id)) {
        return Ok(String::new());
    }

    if !cx.in_labelled_by && node.has_attr("aria-labelledby") {
        let text = arialabelledby_text(tree, id)?;
        if !text.is_empty() {
            return Ok(text);
        }
    }
    if cx.in_control_label || cx.in_subtree {
        if let Some(value) = embedded_control_value(tree, id, node) {
            return Ok(value);
        }
    }
    if let Some(label) = aria_label(node) {
        return Ok(label);
    }
    let native = native_text(tree, id, node, cx, visited)?;
    if !native.is_empty() {
        return Ok(native);
    }
    if cx.in_subtree || cx.in_labelled_by || named_from_content(tree, id) {
        let content = subtree_text(tree, id, cx, visited)?;
        if !content.is_empty() {
            return Ok(content);
        }
    }
    let title = title_text(tree, id);
    if !title.is_empty() {
        return Ok(title);
    }
    Ok(node.attr("placeholder").map(sanitize).unwrap_or_default())
}

fn named_from_content(tree: &VirtualTree, id: VNodeId) -> bool {
    get_role(tree, id)
        .and_then(role_spec)
        .is_some_and(|spec| spec.name_from_content)
}

/// Value a form control contributes to the name of something labelling it
fn embedded_control_value(tree: &VirtualTree, id: VNodeId, node: &VirtualNode) -> Option<String> {
    match get_role(tree, id)? {
        "textbox" | "searchbox" => Some(sanitize(node.value().unwrap_or_default())),
        "combobox" | "listbox" if node.node_name() == "select" => {
            let selected = tree
                .descendants(id)
                .filter(|d| tree.get(*d).is_some_and(|n| n.node_name() == "option"))
                .find(|d| tree.get(*d).is_some_and(|n| n.has_attr("selected") || n.prop("selected") == Some("true")))
                .or_else(|| tree.descendants(id).find(|d| tree.get(*d).is_some_and(|n| n.node_name() == "option")));
            selected.map(|option| sanitize(&tree.text_content(option)))
        }
        "slider" | "spinbutton" | "progressbar" | "scrollbar" => node
            .attr("aria-valuetext")
            .or_else(|| node.attr("aria-valuenow"))
            .or_else(|| node.value())
            .map(sanitize),
        _ => None,
    }
}

fn labelled_control(node: &VirtualNode) -> bool {
    match node.node_name() {
        "select" | "textarea" | "meter" | "output" | "progress" => true,
        "input" => !matches!(
            node.input_type().as_deref(),
            Some("button" | "submit" | "reset" | "image" | "hidden")
        ),
        _ => false,
    }
}

/// Text of the `<label>` elements attached to a control
fn label_text(tree: &VirtualTree, id: VNodeId, node: &VirtualNode, visited: &mut HashSet<VNodeId>) -> Result<String> {
    let cx = NameContext {
        in_subtree: true,
        in_control_label: true,
        ..NameContext::default()
    };
    let mut labels: Vec<VNodeId> = Vec::new();
    if let Some(own_id) = node.attr("id").filter(|v| !v.is_empty()) {
        labels.extend(
            tree.nodes()
                .filter(|n| n.scope() == node.scope() && n.node_name() == "label" && n.attr("for") == Some(own_id))
                .map(VirtualNode::id),
        );
    }
    if let Some(wrapping) = tree
        .ancestors(id)
        .take_while(|a| tree.get(*a).is_some_and(|n| n.scope() == node.scope()))
        .find(|a| tree.get(*a).is_some_and(|n| n.node_name() == "label"))
    {
        if !labels.contains(&wrapping) {
            labels.push(wrapping);
        }
    }
    let mut parts = Vec::new();
    for label in labels {
        let text = subtree_text(tree, label, cx, visited)?;
        if !text.is_empty() {
            parts.push(text);
        }
    }
    Ok(parts.join(" "))
}

fn first_child_named(tree: &VirtualTree, id: VNodeId, name: &str) -> Option<VNodeId> {
    tree.element_children(id)
        .find(|c| tree.get(*c).is_some_and(|n| n.node_name() == name))
}

fn native_text(
    tree: &VirtualTree,
    id: VNodeId,
    node: &VirtualNode,
    cx: NameContext,
    visited: &mut HashSet<VNodeId>,
) -> Result<String> {
    let content_cx = NameContext {
        in_subtree: true,
        ..cx
    };
    let text = match node.node_name() {
        "input" => match node.input_type().as_deref() {
            Some("button" | "submit" | "reset") => {
                let fallback = match node.input_type().as_deref() {
                    Some("submit") => "Submit",
                    Some("reset") => "Reset",
                    _ => "",
                };
                node.value().map(sanitize).filter(|v| !v.is_empty()).unwrap_or_else(|| fallback.to_string())
            }
            Some("image") => node
                .attr("alt")
                .or_else(|| node.value())
                .map(sanitize)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "Submit".to_string()),
            _ => label_text(tree, id, node, visited)?,
        },
        _ if labelled_control(node) => label_text(tree, id, node, visited)?,
        "img" | "area" => node.attr("alt").map(sanitize).unwrap_or_default(),
        "fieldset" => match first_child_named(tree, id, "legend") {
            Some(legend) => subtree_text(tree, legend, content_cx, visited)?,
            None => String::new(),
        },
        "table" => match first_child_named(tree, id, "caption") {
            Some(caption) => subtree_text(tree, caption, content_cx, visited)?,
            None => String::new(),
        },
        "figure" => match first_child_named(tree, id, "figcaption") {
            Some(caption) => subtree_text(tree, caption, content_cx, visited)?,
            None => String::new(),
        },
        "svg" => match first_child_named(tree, id, "title") {
            Some(title) => sanitize(&tree.text_content(title)),
            None => String::new(),
        },
        _ => String::new(),
    };
    Ok(text)
}

fn is_block(node: &VirtualNode) -> bool {
    node.computed_style().is_some_and(|s| !s.display().is_inline_level())
}

/// Concatenated names of the children, block boxes separated by spaces
fn subtree_text(tree: &VirtualTree, id: VNodeId, cx: NameContext, visited: &mut HashSet<VNodeId>) -> Result<String> {
    let child_cx = NameContext {
        in_subtree: true,
        ..cx
    };
    let mut text = String::new();
    for child in tree.children(id) {
        let Some(node) = tree.get(*child) else { continue };
        if node.is_html() && matches!(node.node_name(), "script" | "style" | "template") {
            continue;
        }
        let part = compute(tree, *child, child_cx, visited)?;
        if is_block(node) {
            text.push(' ');
            text.push_str(&part);
            text.push(' ');
        } else {
            text.push_str(&part);
        }
    }
    Ok(sanitize(&text))
}
