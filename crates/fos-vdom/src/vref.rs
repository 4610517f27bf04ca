//! Selector matching over virtual nodes

use crate::{VNodeId, VirtualNode, VirtualTree};
use fos_css::SelectorElement;

/// Element handle used for selector matching
///
/// Ancestry follows the composed tree, so `div span` matches across a shadow
/// boundary, unless the handle is scoped, in which case it stops at the
/// node's own tree scope the way `querySelectorAll` does. A frame document's
/// root never has a parent.
#[derive(Debug, Clone, Copy)]
pub struct VRef<'a> {
    pub tree: &'a VirtualTree,
    pub id: VNodeId,
    pub scoped: bool,
}

impl<'a> VRef<'a> {
    /// Composed-tree handle; `None` for text nodes
    pub fn new(tree: &'a VirtualTree, id: VNodeId) -> Option<Self> {
        tree.get(id).filter(|n| n.is_element()).map(|_| Self { tree, id, scoped: false })
    }

    /// Handle whose ancestry ends at its tree scope
    pub fn scoped(tree: &'a VirtualTree, id: VNodeId) -> Option<Self> {
        Self::new(tree, id).map(|r| Self { scoped: true, ..r })
    }

    fn node(&self) -> Option<&'a VirtualNode> {
        self.tree.get(self.id)
    }

    fn with(&self, id: VNodeId) -> Self {
        Self { id, ..*self }
    }

    /// Element siblings sharing the parent and scope
    fn siblings(&self) -> Vec<VNodeId> {
        let Some(node) = self.node() else {
            return Vec::new();
        };
        let Some(parent) = node.parent else {
            return vec![self.id];
        };
        self.tree
            .element_children(parent)
            .filter(|c| self.tree.get(*c).is_some_and(|n| n.scope == node.scope))
            .collect()
    }

    fn sibling(&self, offset: isize) -> Option<Self> {
        let siblings = self.siblings();
        let index = siblings.iter().position(|s| *s == self.id)? as isize + offset;
        usize::try_from(index)
            .ok()
            .and_then(|i| siblings.get(i))
            .map(|id| self.with(*id))
    }
}

impl SelectorElement for VRef<'_> {
    fn local_name(&self) -> &str {
        self.node().map(VirtualNode::node_name).unwrap_or("")
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.node()?.attr(name)
    }

    fn parent_element(&self) -> Option<Self> {
        let node = self.node()?;
        let parent = node.parent?;
        let parent_node = self.tree.get(parent)?;
        if parent_node.scope == node.scope {
            return Some(self.with(parent));
        }
        if parent_node.frame.is_some() {
            return None;
        }
        if !self.scoped {
            return Some(self.with(parent));
        }
        // Slotted nodes find their light-tree parent above the slot
        self.tree
            .ancestors(self.id)
            .find(|a| self.tree.get(*a).is_some_and(|n| n.scope == node.scope))
            .map(|a| self.with(a))
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling(-1)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling(1)
    }

    fn first_child_element(&self) -> Option<Self> {
        let node = self.node()?;
        self.tree
            .element_children(self.id)
            .find(|c| !self.scoped || self.tree.get(*c).is_some_and(|n| n.scope == node.scope))
            .map(|c| self.with(c))
    }

    fn is_empty(&self) -> bool {
        self.tree.children(self.id).iter().all(|c| {
            self.tree
                .get(*c)
                .is_some_and(|n| n.is_text() && n.node_value().is_none_or(str::is_empty))
        })
    }

    fn is_html(&self) -> bool {
        self.node().is_some_and(VirtualNode::is_html)
    }
}
