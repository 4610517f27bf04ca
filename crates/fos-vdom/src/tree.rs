//! Virtual Tree
//!
//! Arena of [`VirtualNode`]s in composed document order. Nodes are pushed in
//! preorder, so a node's index is its document position and every subtree is
//! a contiguous index range. Scopes record where the tree crosses a shadow
//! root or a frame document.

use crate::{Cache, VNodeId, VirtualNode};
use fos_dom::{DocumentId, ShadowRootMode};
use std::collections::HashMap;
use std::ops::Index;

/// Tree scope: one document or one shadow tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) u32);

impl ScopeId {
    /// Scope of the tree's root
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a scope corresponds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// A document; `frame` is the embedding frame node for nested documents
    Document {
        document: Option<DocumentId>,
        frame: Option<VNodeId>,
        url: Option<String>,
    },
    /// A shadow tree attached to `host`
    Shadow { host: VNodeId, mode: ShadowRootMode },
}

/// Composed tree of virtual nodes
#[derive(Debug)]
pub struct VirtualTree {
    pub(crate) nodes: Vec<VirtualNode>,
    pub(crate) scopes: Vec<Scope>,
    ids: HashMap<(ScopeId, String), Vec<VNodeId>>,
    complete: bool,
    cache: Cache,
}

impl VirtualTree {
    pub(crate) fn new(root_scope: Scope, complete: bool) -> Self {
        Self {
            nodes: Vec::new(),
            scopes: vec![root_scope],
            ids: HashMap::new(),
            complete,
            cache: Cache::new(),
        }
    }

    pub(crate) fn add_scope(&mut self, scope: Scope) -> ScopeId {
        self.scopes.push(scope);
        ScopeId((self.scopes.len() - 1) as u32)
    }

    pub(crate) fn next_id(&self) -> VNodeId {
        VNodeId(self.nodes.len() as u32)
    }

    /// Append a node built with [`Self::next_id`] under `parent`
    pub(crate) fn push(&mut self, mut node: VirtualNode, parent: Option<VNodeId>) -> VNodeId {
        let id = self.next_id();
        node.id = id;
        node.parent = parent;
        if let Some(value) = node.attr("id").filter(|v| !v.is_empty()) {
            self.ids
                .entry((node.scope, value.to_string()))
                .or_default()
                .push(id);
        }
        self.nodes.push(node);
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p.index())) {
            parent.children.push(id);
        }
        id
    }

    /// Root node, `None` for an empty tree
    pub fn root(&self) -> Option<VNodeId> {
        (!self.nodes.is_empty()).then_some(VNodeId(0))
    }

    pub fn get(&self, id: VNodeId) -> Option<&VirtualNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// False for trees built from serialized nodes: references outside the
    /// serialized subtree cannot be resolved
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Run-scoped cache shared by every derived computation over this tree
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Empty the tree cache and every node's memo slot
    pub fn clear_cache(&self) {
        self.cache.clear();
        for node in &self.nodes {
            node.cache().clear();
        }
    }

    /// All nodes in document order
    pub fn nodes(&self) -> impl Iterator<Item = &VirtualNode> {
        self.nodes.iter()
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn parent(&self, id: VNodeId) -> Option<VNodeId> {
        self.get(id)?.parent
    }

    /// Parent within the same scope
    pub fn scoped_parent(&self, id: VNodeId) -> Option<VNodeId> {
        let node = self.get(id)?;
        let parent = node.parent?;
        (self.get(parent)?.scope == node.scope).then_some(parent)
    }

    pub fn children(&self, id: VNodeId) -> &[VNodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Element children in order
    pub fn element_children(&self, id: VNodeId) -> impl Iterator<Item = VNodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_some_and(VirtualNode::is_element))
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: VNodeId) -> impl Iterator<Item = VNodeId> + '_ {
        std::iter::successors(self.parent(id), |current| self.parent(*current))
    }

    /// Last node of the subtree rooted at `id`
    fn subtree_end(&self, id: VNodeId) -> VNodeId {
        let mut current = id;
        while let Some(last) = self.children(current).last() {
            current = *last;
        }
        current
    }

    /// Descendants in document order, excluding `id`
    pub fn descendants(&self, id: VNodeId) -> impl Iterator<Item = VNodeId> + '_ {
        let end = if self.get(id).is_some() { self.subtree_end(id).0 } else { id.0 };
        (id.0 + 1..=end).map(VNodeId)
    }

    /// `id` and its descendants in document order
    pub fn subtree(&self, id: VNodeId) -> impl Iterator<Item = VNodeId> + '_ {
        std::iter::once(id)
            .filter(|id| self.get(*id).is_some())
            .chain(self.descendants(id))
    }

    /// Whether `ancestor` contains `id` (inclusive)
    pub fn contains(&self, ancestor: VNodeId, id: VNodeId) -> bool {
        self.get(ancestor).is_some() && ancestor <= id && id <= self.subtree_end(ancestor)
    }

    /// Concatenated text of the composed subtree
    pub fn text_content(&self, id: VNodeId) -> String {
        self.subtree(id)
            .filter_map(|d| self.get(d).and_then(VirtualNode::node_value))
            .collect()
    }

    /// Elements with this id attribute in a scope, in document order
    pub fn elements_by_id(&self, scope: ScopeId, value: &str) -> &[VNodeId] {
        self.ids
            .get(&(scope, value.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First element with this id attribute in a scope
    pub fn element_by_id(&self, scope: ScopeId, value: &str) -> Option<VNodeId> {
        self.elements_by_id(scope, value).first().copied()
    }

    /// Shadow host of a shadow scope
    pub fn scope_host(&self, scope: ScopeId) -> Option<VNodeId> {
        match self.scope(scope)? {
            Scope::Shadow { host, .. } => Some(*host),
            Scope::Document { .. } => None,
        }
    }

    /// Document scope containing a (possibly shadow) scope
    pub fn document_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        while let Some(host) = self.scope_host(current) {
            match self.get(host) {
                Some(node) => current = node.scope,
                None => break,
            }
        }
        current
    }

    /// Frame node embedding the document of `scope`
    pub fn frame_of_scope(&self, scope: ScopeId) -> Option<VNodeId> {
        match self.scope(self.document_scope(scope))? {
            Scope::Document { frame, .. } => *frame,
            Scope::Shadow { .. } => None,
        }
    }

    /// Frame nodes enclosing `id`, outermost first
    pub fn frame_path(&self, id: VNodeId) -> Vec<VNodeId> {
        let mut path = Vec::new();
        let mut scope = self.get(id).map(|n| n.scope);
        while let Some(frame) = scope.and_then(|s| self.frame_of_scope(s)) {
            path.push(frame);
            scope = self.get(frame).map(|n| n.scope);
        }
        path.reverse();
        path
    }

    /// Whether the node lives in a shadow tree
    pub fn in_shadow_tree(&self, id: VNodeId) -> bool {
        self.get(id)
            .and_then(|n| self.scope(n.scope))
            .is_some_and(|s| matches!(s, Scope::Shadow { .. }))
    }
}

impl Index<VNodeId> for VirtualTree {
    type Output = VirtualNode;

    /// Panics if `id` was not produced by this tree
    fn index(&self, id: VNodeId) -> &VirtualNode {
        &self.nodes[id.index()]
    }
}
