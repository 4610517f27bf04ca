//! Selector matching over host DOM elements

use crate::selectors::SelectorElement;
use fos_dom::{DomTree, Namespace, NodeData, NodeId};

/// Light-DOM element handle; the tree root (document or shadow root) ends ancestry
#[derive(Debug, Clone, Copy)]
pub struct DomElement<'a> {
    pub tree: &'a DomTree,
    pub id: NodeId,
}

impl<'a> DomElement<'a> {
    /// Wrap an element node
    pub fn new(tree: &'a DomTree, id: NodeId) -> Option<Self> {
        tree.element(id).map(|_| Self { tree, id })
    }

    fn sibling(&self, forward: bool) -> Option<Self> {
        let mut current = self.tree.get(self.id)?;
        loop {
            let next = if forward {
                current.next_sibling
            } else {
                current.prev_sibling
            };
            let node = self.tree.get(next)?;
            if node.is_element() {
                return Some(Self {
                    tree: self.tree,
                    id: next,
                });
            }
            current = node;
        }
    }
}

impl SelectorElement for DomElement<'_> {
    fn local_name(&self) -> &str {
        self.tree.element(self.id).map(|e| e.name.as_str()).unwrap_or("")
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.tree.element(self.id)?.get_attr(name)
    }

    fn parent_element(&self) -> Option<Self> {
        let parent = self.tree.parent(self.id)?;
        Self::new(self.tree, parent)
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling(false)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling(true)
    }

    fn first_child_element(&self) -> Option<Self> {
        self.tree
            .children(self.id)
            .find(|(_, node)| node.is_element())
            .map(|(id, _)| Self { tree: self.tree, id })
    }

    fn is_empty(&self) -> bool {
        self.tree.children(self.id).all(|(_, node)| match &node.data {
            NodeData::Element(_) => false,
            NodeData::Text(text) => text.is_empty(),
            _ => true,
        })
    }

    fn is_html(&self) -> bool {
        self.tree
            .element(self.id)
            .is_some_and(|e| e.namespace == Namespace::Html)
    }
}
