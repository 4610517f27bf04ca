//! DOM Tree (arena-based allocation)

use crate::{
    DomError, ElementData, ElementGeometry, Namespace, Node, NodeData, NodeId, Result, ShadowRoot,
    ShadowRootMode,
};

/// Arena-based DOM tree. Index 0 is always the document node.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only its document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
        }
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node id in allocation order, attached or not
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached HTML element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(Node::element(name, Namespace::Html))
    }

    /// Create a detached element in a namespace
    pub fn create_element_ns(&mut self, name: &str, namespace: Namespace) -> NodeId {
        self.push(Node::element(name, namespace))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::comment(content))
    }

    /// Create a doctype node
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.push(Node::with_data(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }))
    }

    /// Append `child` as the last child of `parent`. Invalid ids are ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent.index() >= self.nodes.len() || child.index() >= self.nodes.len() || parent == child {
            tracing::warn!("append_child ignored for invalid nodes {:?} -> {:?}", parent, child);
            return;
        }
        let last = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = last;
            node.next_sibling = NodeId::NONE;
        }
        if last.is_valid() {
            self.nodes[last.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;
    }

    /// Append text, merging with a preceding text node like the HTML parser does
    pub fn append_text(&mut self, parent: NodeId, content: &str) {
        let last = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);
        if let Some(NodeData::Text(existing)) = self.get_mut(last).map(|n| &mut n.data) {
            existing.push_str(content);
            return;
        }
        let text = self.create_text(content);
        self.append_child(parent, text);
    }

    /// Iterate over children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Child ids as a vector
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).map(|(id, _)| id).collect()
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Element data for an element node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Mutable element data for an element node
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(Node::as_element_mut)
    }

    /// Set an attribute on an element
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(id)
            .ok_or(DomError::NotAnElement(id))?
            .set_attr(name, value);
        Ok(())
    }

    /// Store a layout result on an element
    pub fn set_geometry(&mut self, id: NodeId, geometry: ElementGeometry) -> Result<()> {
        self.element_mut(id).ok_or(DomError::NotAnElement(id))?.geometry = Some(geometry);
        Ok(())
    }

    /// Attach a shadow root to `host`, returning the shadow root node
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId> {
        let element = self.element(host).ok_or(DomError::NotAnElement(host))?;
        if element.shadow_root.is_some() {
            return Err(DomError::ShadowRootExists);
        }
        if !ShadowRoot::can_host(element) {
            return Err(DomError::NotShadowHost(element.name.clone()));
        }
        let root = self.push(Node::shadow_root(ShadowRoot::new(host, mode)));
        if let Some(element) = self.element_mut(host) {
            element.shadow_root = Some(root);
        }
        Ok(root)
    }

    /// Shadow root attached to an element
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.element(host).and_then(|e| e.shadow_root)
    }

    /// Walk up to the node without a parent: the document node or a shadow root
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Concatenated text of all light-DOM descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            out.push_str(text);
        }
        for desc in self.descendants(id) {
            if let Some(text) = self.get(desc).and_then(Node::as_text) {
                out.push_str(text);
            }
        }
        out
    }

    /// Light-DOM descendants in tree order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_ids(id).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.child_ids(current).into_iter().rev());
        }
        out
    }

    /// First element child with the given local name
    pub fn find_child_element(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .find(|(_, node)| node.as_element().is_some_and(|e| e.name == name))
            .map(|(id, _)| id)
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_iterate() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let a = tree.create_element("a");
        let b = tree.create_text("hello");
        tree.append_child(tree.root(), div);
        tree.append_child(div, a);
        tree.append_child(div, b);

        let children = tree.child_ids(div);
        assert_eq!(children, vec![a, b]);
        assert_eq!(tree.parent(a), Some(div));
        assert_eq!(tree.get(a).map(|n| n.next_sibling), Some(b));
        assert_eq!(tree.get(b).map(|n| n.prev_sibling), Some(a));
        assert_eq!(tree.text_content(div), "hello");
    }

    #[test]
    fn test_append_text_merges() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        tree.append_child(tree.root(), p);
        tree.append_text(p, "a");
        tree.append_text(p, "b");
        assert_eq!(tree.child_ids(p).len(), 1);
        assert_eq!(tree.text_content(p), "ab");
    }

    #[test]
    fn test_descendants_order() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        let d = tree.create_element("d");
        tree.append_child(tree.root(), a);
        tree.append_child(a, b);
        tree.append_child(b, c);
        tree.append_child(a, d);
        assert_eq!(tree.descendants(tree.root()), vec![a, b, c, d]);
        assert_eq!(tree.tree_root(c), tree.root());
    }

    #[test]
    fn test_attach_shadow_once() {
        let mut tree = DomTree::new();
        let host = tree.create_element("div");
        tree.append_child(tree.root(), host);
        let root = tree.attach_shadow(host, ShadowRootMode::Open);
        assert!(root.is_ok());
        assert!(matches!(
            tree.attach_shadow(host, ShadowRootMode::Open),
            Err(DomError::ShadowRootExists)
        ));

        let img = tree.create_element("img");
        assert!(matches!(
            tree.attach_shadow(img, ShadowRootMode::Open),
            Err(DomError::NotShadowHost(_))
        ));
    }
}
