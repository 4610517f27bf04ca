//! Virtual Node
//!
//! One element or text node of the composed tree. A node is backed either by
//! a live host element (with computed style and geometry) or by a serialized
//! description; live-only accessors return `None` for serialized nodes.

use crate::{Cache, ScopeId};
use fos_css::ComputedStyle;
use fos_dom::{DOMRect, DocumentId, ElementGeometry, Namespace, NodeId};
use std::collections::BTreeMap;

/// Index of a node in its [`crate::VirtualTree`]; equal to its document-order position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VNodeId(pub(crate) u32);

impl VNodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Element or text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VNodeKind {
    Element,
    Text,
}

/// Content of a frame element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameLink {
    /// Same-origin document spliced in below the frame element
    Resolved { document: DocumentId },
    /// Cross-origin, sandboxed or unloaded frame left as a leaf
    Unresolved { src: Option<String>, reason: String },
}

/// Host element behind a live node
#[derive(Debug, Clone)]
pub struct LiveBacking {
    pub document: DocumentId,
    pub node: NodeId,
    pub style: ComputedStyle,
    pub geometry: Option<ElementGeometry>,
}

/// A node of the composed tree
#[derive(Debug)]
pub struct VirtualNode {
    pub(crate) id: VNodeId,
    pub(crate) kind: VNodeKind,
    pub(crate) node_name: String,
    pub(crate) namespace: Namespace,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) properties: BTreeMap<String, String>,
    pub(crate) text: Option<String>,
    pub(crate) parent: Option<VNodeId>,
    pub(crate) children: Vec<VNodeId>,
    pub(crate) scope: ScopeId,
    pub(crate) frame: Option<FrameLink>,
    pub(crate) live: Option<LiveBacking>,
    cache: Cache,
}

impl VirtualNode {
    pub(crate) fn element(id: VNodeId, name: &str, namespace: Namespace, scope: ScopeId) -> Self {
        let node_name = if namespace == Namespace::Html {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        };
        Self {
            id,
            kind: VNodeKind::Element,
            node_name,
            namespace,
            attributes: Vec::new(),
            properties: BTreeMap::new(),
            text: None,
            parent: None,
            children: Vec::new(),
            scope,
            frame: None,
            live: None,
            cache: Cache::new(),
        }
    }

    pub(crate) fn text(id: VNodeId, content: &str, scope: ScopeId) -> Self {
        let mut node = Self::element(id, "#text", Namespace::Html, scope);
        node.kind = VNodeKind::Text;
        node.text = Some(content.to_string());
        node
    }

    /// Set an attribute, lowercasing the name; the first value wins on duplicates
    pub(crate) fn push_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if !self.attributes.iter().any(|(n, _)| *n == name) {
            self.attributes.push((name, value.to_string()));
        }
    }

    pub fn id(&self) -> VNodeId {
        self.id
    }

    pub fn kind(&self) -> VNodeKind {
        self.kind
    }

    pub fn is_element(&self) -> bool {
        self.kind == VNodeKind::Element
    }

    pub fn is_text(&self) -> bool {
        self.kind == VNodeKind::Text
    }

    /// DOM node type: 1 for elements, 3 for text
    pub fn node_type(&self) -> u8 {
        match self.kind {
            VNodeKind::Element => 1,
            VNodeKind::Text => 3,
        }
    }

    /// Lowercased tag name, `#text` for text nodes
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn is_html(&self) -> bool {
        self.namespace == Namespace::Html
    }

    /// Attribute value (names are case-insensitive)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Attributes in source order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Serialized property such as `value` or `checked`
    pub fn prop(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Input type, lowercased, defaulting to `text` for inputs
    pub fn input_type(&self) -> Option<String> {
        if self.node_name != "input" {
            return None;
        }
        let raw = self.prop("type").or_else(|| self.attr("type")).unwrap_or("text");
        Some(raw.trim().to_ascii_lowercase())
    }

    /// Form value: serialized property first, then the attribute
    pub fn value(&self) -> Option<&str> {
        self.prop("value").or_else(|| self.attr("value"))
    }

    /// Text of a text node
    pub fn node_value(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn parent(&self) -> Option<VNodeId> {
        self.parent
    }

    pub fn children(&self) -> &[VNodeId] {
        &self.children
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn frame(&self) -> Option<&FrameLink> {
        self.frame.as_ref()
    }

    /// Backing host element, `None` for serialized nodes
    pub fn live(&self) -> Option<&LiveBacking> {
        self.live.as_ref()
    }

    pub fn computed_style(&self) -> Option<&ComputedStyle> {
        self.live.as_ref().map(|l| &l.style)
    }

    pub fn geometry(&self) -> Option<&ElementGeometry> {
        self.live.as_ref().and_then(|l| l.geometry.as_ref())
    }

    /// Border box in the coordinates of the node's own document
    pub fn bounding_client_rect(&self) -> Option<DOMRect> {
        self.geometry().map(ElementGeometry::bounding_client_rect)
    }

    /// Per-node memo slot for derived properties
    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_normalization() {
        let mut node = VirtualNode::element(VNodeId(0), "IMG", Namespace::Html, ScopeId::ROOT);
        node.push_attr("ALT", "a");
        node.push_attr("alt", "b");
        assert_eq!(node.node_name(), "img");
        assert_eq!(node.attr("Alt"), Some("a"));
        assert_eq!(node.attributes().len(), 1);
        assert!(node.geometry().is_none());
    }

    #[test]
    fn test_input_type_defaults_to_text() {
        let mut node = VirtualNode::element(VNodeId(0), "input", Namespace::Html, ScopeId::ROOT);
        assert_eq!(node.input_type().as_deref(), Some("text"));
        node.push_attr("type", "CHECKBOX");
        assert_eq!(node.input_type().as_deref(), Some("checkbox"));
    }

    #[test]
    fn test_svg_names_keep_case() {
        let node = VirtualNode::element(VNodeId(0), "foreignObject", Namespace::Svg, ScopeId::ROOT);
        assert_eq!(node.node_name(), "foreignObject");
        assert_eq!(node.node_type(), 1);
    }
}
