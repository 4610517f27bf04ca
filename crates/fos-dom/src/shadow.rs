//! Shadow DOM
//!
//! Shadow roots, slot assignment, and the flat ("composed") child list that
//! splices shadow content in at the host position.

use crate::{DomTree, ElementData, Namespace, NodeData, NodeId};

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

impl ShadowRootMode {
    /// Parse the `shadowrootmode` attribute value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Shadow root record stored on the shadow root node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowRoot {
    pub host: NodeId,
    pub mode: ShadowRootMode,
    pub delegates_focus: bool,
}

const SHADOW_HOSTS: &[&str] = &[
    "article", "aside", "blockquote", "body", "div", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "main", "nav", "p", "section", "span",
];

impl ShadowRoot {
    /// Create a new shadow root record
    pub fn new(host: NodeId, mode: ShadowRootMode) -> Self {
        Self {
            host,
            mode,
            delegates_focus: false,
        }
    }

    /// Whether the element may host a shadow root (valid custom element names included)
    pub fn can_host(element: &ElementData) -> bool {
        element.namespace == Namespace::Html
            && (SHADOW_HOSTS.contains(&element.name.as_str()) || element.name.contains('-'))
    }
}

impl DomTree {
    /// Host of the shadow tree containing `id`, if any
    pub fn shadow_host_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(self.tree_root(id))
            .and_then(|n| n.as_shadow_root())
            .map(|root| root.host)
    }

    fn is_shadow_slot(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.name == "slot") && self.shadow_host_of(id).is_some()
    }

    /// Light-DOM nodes assigned to a `<slot>` in a shadow tree
    pub fn assigned_nodes(&self, slot: NodeId) -> Vec<NodeId> {
        let Some(host) = self.shadow_host_of(slot) else {
            return Vec::new();
        };
        let name = self
            .element(slot)
            .and_then(|e| e.get_attr("name"))
            .unwrap_or("");
        self.children(host)
            .filter(|(_, node)| match &node.data {
                NodeData::Element(e) => e.get_attr("slot").unwrap_or("") == name,
                NodeData::Text(text) => name.is_empty() && !text.trim().is_empty(),
                _ => false,
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Flat-tree children: shadow content replaces the light children of a host,
    /// and slots are replaced by their assigned nodes or their fallback content.
    pub fn composed_children(&self, id: NodeId) -> Vec<NodeId> {
        let raw = match self.shadow_root(id) {
            Some(root) => self.child_ids(root),
            None => self.child_ids(id),
        };
        let mut out = Vec::with_capacity(raw.len());
        for child in raw {
            self.expand_slot(child, &mut out);
        }
        out
    }

    fn expand_slot(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if !self.is_shadow_slot(id) {
            out.push(id);
            return;
        }
        let assigned = self.assigned_nodes(id);
        let content = if assigned.is_empty() {
            self.child_ids(id)
        } else {
            assigned
        };
        for node in content {
            self.expand_slot(node, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with_shadow() -> (DomTree, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let host = tree.create_element("my-card");
        tree.append_child(tree.root(), host);
        let root = tree.attach_shadow(host, ShadowRootMode::Open).unwrap();
        (tree, host, root)
    }

    #[test]
    fn test_named_and_default_slots() {
        let (mut tree, host, root) = host_with_shadow();
        let title = tree.create_element("h2");
        tree.set_attr(title, "slot", "title").unwrap();
        let body = tree.create_element("p");
        tree.append_child(host, title);
        tree.append_child(host, body);

        let header = tree.create_element("header");
        let named = tree.create_element("slot");
        tree.set_attr(named, "name", "title").unwrap();
        let default = tree.create_element("slot");
        tree.append_child(root, header);
        tree.append_child(header, named);
        tree.append_child(root, default);

        assert_eq!(tree.assigned_nodes(named), vec![title]);
        assert_eq!(tree.assigned_nodes(default), vec![body]);
        assert_eq!(tree.composed_children(host), vec![header, body]);
        assert_eq!(tree.composed_children(header), vec![title]);
        assert_eq!(tree.shadow_host_of(header), Some(host));
    }

    #[test]
    fn test_slot_fallback_content() {
        let (mut tree, host, root) = host_with_shadow();
        let slot = tree.create_element("slot");
        let fallback = tree.create_element("span");
        tree.append_child(root, slot);
        tree.append_child(slot, fallback);
        assert_eq!(tree.composed_children(host), vec![fallback]);
    }

    #[test]
    fn test_slot_outside_shadow_is_kept() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let slot = tree.create_element("slot");
        tree.append_child(tree.root(), div);
        tree.append_child(div, slot);
        assert_eq!(tree.composed_children(div), vec![slot]);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(ShadowRootMode::parse("Open"), Some(ShadowRootMode::Open));
        assert_eq!(ShadowRootMode::parse("closed"), Some(ShadowRootMode::Closed));
        assert_eq!(ShadowRootMode::parse("other"), None);
    }
}
