//! Visibility
//!
//! Three notions of "visible": rendered at all, exposed to assistive
//! technology, and actually painted inside the viewport. Live nodes are
//! judged by computed style and geometry; serialized nodes only by their
//! attributes and element names.

use crate::memoized;
use crate::name::aria_label;
use crate::text::sanitize;
use fos_css::{Display, Overflow, Visibility};
use fos_dom::DOMRect;
use fos_vdom::{VNodeId, VirtualNode, VirtualTree};

/// Elements that never render
const NON_RENDERED: &[&str] = &[
    "base", "head", "link", "meta", "noscript", "param", "script", "source", "style", "template", "title", "track",
];

/// Elements that count as content even without text
const VISUAL_CONTENT: &[&str] = &[
    "audio", "button", "canvas", "embed", "iframe", "img", "math", "meter", "object", "progress", "select", "svg",
    "textarea", "video",
];

/// Text nodes take their visibility from the parent element
fn element_of(tree: &VirtualTree, id: VNodeId) -> Option<VNodeId> {
    let node = tree.get(id)?;
    if node.is_text() { tree.parent(id) } else { Some(id) }
}

fn own_display_hidden(node: &VirtualNode) -> bool {
    if !node.is_element() {
        return false;
    }
    match node.computed_style() {
        Some(style) => style.display() == Display::None,
        None => {
            (node.is_html() && NON_RENDERED.contains(&node.node_name()))
                || node.has_attr("hidden")
                || node.input_type().as_deref() == Some("hidden")
        }
    }
}

/// `display: none` on the node or any composed ancestor, or an ancestor
/// with `content-visibility: hidden`
fn is_display_hidden(tree: &VirtualTree, id: VNodeId) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    memoized(node.cache(), "isDisplayHidden", || {
        if own_display_hidden(node) {
            return true;
        }
        let Some(parent) = tree.parent(id) else {
            return false;
        };
        let skips_contents = tree
            .get(parent)
            .and_then(VirtualNode::computed_style)
            .is_some_and(|s| s.get("content-visibility") == Some("hidden"));
        skips_contents || is_display_hidden(tree, parent)
    })
}

/// Not rendered for anyone: display none up the composed tree, or a
/// hidden/collapsed visibility on the node itself
pub fn is_hidden_for_everyone(tree: &VirtualTree, id: VNodeId) -> bool {
    let Some(element) = element_of(tree, id) else {
        return false;
    };
    if is_display_hidden(tree, element) {
        return true;
    }
    tree.get(element)
        .and_then(VirtualNode::computed_style)
        .is_some_and(|style| style.visibility() != Visibility::Visible)
}

fn has_hiding_attr(tree: &VirtualTree, id: VNodeId) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    memoized(node.cache(), "isAriaHidden", || {
        let own = node.attr("aria-hidden").is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
            || node.has_attr("inert");
        own || tree.parent(id).is_some_and(|parent| has_hiding_attr(tree, parent))
    })
}

/// Exposed in the accessibility tree
pub fn is_visible_to_screen_readers(tree: &VirtualTree, id: VNodeId) -> bool {
    let Some(element) = element_of(tree, id) else {
        return false;
    };
    !is_hidden_for_everyone(tree, element) && !has_hiding_attr(tree, element)
}

fn is_clipped(value: Option<&str>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let compact: String = value.chars().filter(|c| !c.is_whitespace() && *c != ',').collect::<String>().to_ascii_lowercase();
    matches!(
        compact.as_str(),
        "rect(0000)" | "rect(0px0px0px0px)" | "rect(1px1px1px1px)" | "inset(50%)" | "circle(0)" | "circle(0px)"
    )
}

/// Ancestors in the node's own document, nearest first
fn document_ancestors(tree: &VirtualTree, id: VNodeId) -> impl Iterator<Item = VNodeId> + '_ {
    let document = tree.get(id).map(|n| tree.document_scope(n.scope()));
    tree.ancestors(id)
        .take_while(move |a| tree.get(*a).map(|n| tree.document_scope(n.scope())) == document)
}

fn painted_rect(tree: &VirtualTree, id: VNodeId, node: &VirtualNode, rect: DOMRect) -> bool {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        let clips_overflow = node
            .computed_style()
            .is_some_and(|s| s.overflow_x() != Overflow::Visible || s.overflow_y() != Overflow::Visible);
        if clips_overflow || node.children().is_empty() {
            return false;
        }
    }
    if rect.right() <= 0.0 || rect.bottom() <= 0.0 {
        return false;
    }
    for ancestor in document_ancestors(tree, id) {
        let Some(parent) = tree.get(ancestor) else { break };
        let (Some(style), Some(parent_rect)) = (parent.computed_style(), parent.bounding_client_rect()) else {
            continue;
        };
        let clips = style.overflow_x() != Overflow::Visible || style.overflow_y() != Overflow::Visible;
        if clips && !parent_rect.is_empty() && !parent_rect.intersects(&rect) {
            return false;
        }
    }
    true
}

/// Painted somewhere a sighted user could see it
pub fn is_visible_on_screen(tree: &VirtualTree, id: VNodeId) -> bool {
    let Some(element) = element_of(tree, id) else {
        return false;
    };
    if is_hidden_for_everyone(tree, element) {
        return false;
    }
    let Some(node) = tree.get(element) else {
        return false;
    };
    memoized(node.cache(), "isVisibleOnScreen", || {
        let chain: Vec<VNodeId> = std::iter::once(element).chain(document_ancestors(tree, element)).collect();
        let opacity: f64 = chain
            .iter()
            .filter_map(|a| tree.get(*a).and_then(VirtualNode::computed_style))
            .map(|s| s.opacity())
            .product();
        if opacity <= 0.0 {
            return false;
        }
        let clipped = chain.iter().filter_map(|a| tree.get(*a).and_then(VirtualNode::computed_style)).any(|s| {
            is_clipped(s.get("clip")) || is_clipped(s.get("clip-path"))
        });
        if clipped {
            return false;
        }
        match node.bounding_client_rect() {
            Some(rect) => painted_rect(tree, element, node, rect),
            None => true,
        }
    })
}

/// Visible text of a subtree, whitespace-normalized
pub fn visible_virtual(tree: &VirtualTree, id: VNodeId, screen_reader: bool, no_recursing: bool) -> String {
    let visible = |n: VNodeId| {
        if screen_reader { is_visible_to_screen_readers(tree, n) } else { is_visible_on_screen(tree, n) }
    };
    let text: String = tree
        .children(id)
        .iter()
        .filter_map(|child| {
            let node = tree.get(*child)?;
            if node.is_text() {
                visible(*child).then(|| node.node_value().unwrap_or_default().to_string())
            } else if !no_recursing && node.is_element() {
                Some(visible_virtual(tree, *child, screen_reader, false))
            } else {
                None
            }
        })
        .collect();
    sanitize(&text)
}

fn has_child_text(tree: &VirtualTree, id: VNodeId) -> bool {
    tree.children(id).iter().any(|child| {
        tree.get(*child).is_some_and(|n| {
            n.is_text() && !sanitize(n.node_value().unwrap_or_default()).is_empty() && is_visible_to_screen_readers(tree, *child)
        })
    })
}

fn is_visual_content(node: &VirtualNode) -> bool {
    if node.node_name() == "input" {
        return node.input_type().as_deref() != Some("hidden");
    }
    VISUAL_CONTENT.contains(&node.node_name())
}

/// Whether an element has perceivable content: text, embedded media or
/// form controls, or an `aria-label`
pub fn has_content_virtual(tree: &VirtualTree, id: VNodeId, no_recursion: bool, ignore_aria: bool) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    has_child_text(tree, id)
        || (is_visual_content(node) && is_visible_to_screen_readers(tree, id))
        || (!ignore_aria && aria_label(node).is_some())
        || (!no_recursion
            && tree
                .element_children(id)
                .any(|child| has_content_virtual(tree, child, false, ignore_aria)))
}

/// Scroll position of a scrollable element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollInfo {
    pub element: VNodeId,
    pub top: f64,
    pub left: f64,
}

/// Scroll state if the element both overflows by more than `buffer` and
/// lets the user scroll in that direction
pub fn get_scroll(tree: &VirtualTree, id: VNodeId, buffer: f64) -> Option<ScrollInfo> {
    let node = tree.get(id)?;
    let geometry = node.geometry()?;
    let style = node.computed_style()?;
    let overflow_x = geometry.scroll_width > geometry.client_width + buffer;
    let overflow_y = geometry.scroll_height > geometry.client_height + buffer;
    let scrolls = (overflow_x && style.overflow_x().is_scrollable()) || (overflow_y && style.overflow_y().is_scrollable());
    scrolls.then_some(ScrollInfo {
        element: id,
        top: geometry.scroll_top,
        left: geometry.scroll_left,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_vdom::SerialNode;

    fn serial_tree(node: SerialNode) -> VirtualTree {
        VirtualTree::from_serial(&node).unwrap()
    }

    #[test]
    fn test_serialized_hidden_attribute() {
        let tree = serial_tree(
            SerialNode::element("div")
                .with_attr("hidden", "")
                .with_child(SerialNode::element("span").with_child(SerialNode::text("secret"))),
        );
        let span = tree.element_children(tree.root().unwrap()).next().unwrap();
        assert!(is_hidden_for_everyone(&tree, span));
        assert!(!is_visible_to_screen_readers(&tree, span));
    }

    #[test]
    fn test_aria_hidden_hides_from_screen_readers_only() {
        let tree = serial_tree(
            SerialNode::element("div")
                .with_attr("aria-hidden", "true")
                .with_child(SerialNode::element("span").with_child(SerialNode::text("x"))),
        );
        let span = tree.element_children(tree.root().unwrap()).next().unwrap();
        assert!(!is_hidden_for_everyone(&tree, span));
        assert!(!is_visible_to_screen_readers(&tree, span));
        assert!(is_visible_on_screen(&tree, span));
    }

    #[test]
    fn test_visible_virtual_skips_hidden_text() {
        let tree = serial_tree(
            SerialNode::element("p")
                .with_child(SerialNode::text("Hello "))
                .with_child(SerialNode::element("span").with_attr("aria-hidden", "true").with_child(SerialNode::text("icon")))
                .with_child(SerialNode::text(" "))
                .with_child(SerialNode::element("b").with_child(SerialNode::text("world"))),
        );
        let root = tree.root().unwrap();
        assert_eq!(visible_virtual(&tree, root, true, false), "Hello world");
        assert_eq!(visible_virtual(&tree, root, false, false), "Hello icon world");
        assert_eq!(visible_virtual(&tree, root, true, true), "Hello");
    }

    #[test]
    fn test_has_content() {
        let empty = serial_tree(SerialNode::element("div").with_child(SerialNode::element("span")));
        assert!(!has_content_virtual(&empty, empty.root().unwrap(), false, false));

        let image = serial_tree(SerialNode::element("div").with_child(SerialNode::element("img")));
        assert!(has_content_virtual(&image, image.root().unwrap(), false, false));
        assert!(!has_content_virtual(&image, image.root().unwrap(), true, false));

        let labelled = serial_tree(SerialNode::element("div").with_attr("aria-label", "Menu"));
        assert!(has_content_virtual(&labelled, labelled.root().unwrap(), true, false));
        assert!(!has_content_virtual(&labelled, labelled.root().unwrap(), true, true));
    }

    #[test]
    fn test_clip_patterns() {
        assert!(is_clipped(Some("rect(0, 0, 0, 0)")));
        assert!(is_clipped(Some("rect(1px 1px 1px 1px)")));
        assert!(is_clipped(Some("inset(50%)")));
        assert!(!is_clipped(Some("auto")));
        assert!(!is_clipped(None));
    }
}
