//! Tree Builder
//!
//! Composes a [`VirtualTree`] from a live [`Page`]: shadow content is spliced
//! in at its host, slotted nodes at their slot, and same-origin frame
//! documents below their frame element. Frames the page refuses to expose
//! become leaf nodes carrying [`FrameLink::Unresolved`].

use crate::{FrameLink, LiveBacking, Scope, ScopeId, VNodeId, VdomError, VirtualNode, VirtualTree};
use fos_css::{ComputedStyle, StyleResolver};
use fos_dom::{Document, DocumentId, DomTree, ElementData, NodeData, NodeId, Page};
use std::collections::HashMap;

/// Builds composed trees from a page
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder<'p> {
    page: &'p Page,
    iframes: bool,
}

impl<'p> TreeBuilder<'p> {
    pub fn new(page: &'p Page) -> Self {
        Self { page, iframes: true }
    }

    /// Whether same-origin frame documents are spliced in (default true)
    pub fn with_iframes(mut self, iframes: bool) -> Self {
        self.iframes = iframes;
        self
    }

    /// Tree of a whole document, rooted at its document element
    pub fn build(&self, document: DocumentId) -> Result<VirtualTree, VdomError> {
        let doc = self
            .page
            .document(document)
            .ok_or(VdomError::UnknownDocument(document))?;
        self.build_from(document, doc.document_element())
    }

    /// Tree rooted at `node`. Ancestor styles are still inherited.
    pub fn build_from(&self, document: DocumentId, node: NodeId) -> Result<VirtualTree, VdomError> {
        let doc = self
            .page
            .document(document)
            .ok_or(VdomError::UnknownDocument(document))?;
        let dom = doc.tree();
        let start = if dom.get(node).is_some_and(|n| matches!(n.data, NodeData::Document)) {
            doc.document_element()
        } else {
            node
        };
        if dom.element(start).is_none() {
            return Err(VdomError::NotAnElement(start));
        }

        let mut state = BuildState {
            page: self.page,
            iframes: self.iframes,
            tree: VirtualTree::new(
                Scope::Document {
                    document: Some(document),
                    frame: None,
                    url: Some(doc.url().to_string()),
                },
                true,
            ),
            resolvers: HashMap::new(),
            tree_scopes: HashMap::new(),
        };
        state.tree_scopes.insert((document, dom.tree_root(start)), ScopeId::ROOT);
        state.tree_scopes.insert((document, dom.root()), ScopeId::ROOT);

        let inherited = state.inherited_style(document, doc, start);
        state.visit(document, start, None, inherited.as_ref(), ScopeId::ROOT);

        tracing::debug!(
            "Composed {} virtual nodes in {} scopes from {}",
            state.tree.len(),
            state.tree.scope_count(),
            doc.url()
        );
        Ok(state.tree)
    }
}

struct BuildState<'p> {
    page: &'p Page,
    iframes: bool,
    tree: VirtualTree,
    resolvers: HashMap<DocumentId, StyleResolver>,
    /// Scope of each DOM tree root (document node or shadow root)
    tree_scopes: HashMap<(DocumentId, NodeId), ScopeId>,
}

impl<'p> BuildState<'p> {
    fn resolver(&mut self, id: DocumentId, document: &Document) -> &StyleResolver {
        self.resolvers
            .entry(id)
            .or_insert_with(|| StyleResolver::for_document(document))
    }

    /// Style the start node inherits from its ancestors
    fn inherited_style(&mut self, id: DocumentId, document: &Document, start: NodeId) -> Option<ComputedStyle> {
        let dom = document.tree();
        let parent = dom.parent(start)?;
        let from = match &dom.get(parent)?.data {
            NodeData::Element(_) => parent,
            NodeData::ShadowRoot(root) => root.host,
            _ => return None,
        };
        Some(self.resolver(id, document).compute_chain(dom, from))
    }

    fn scope_for(&self, document: DocumentId, dom: &DomTree, node: NodeId, fallback: ScopeId) -> ScopeId {
        self.tree_scopes
            .get(&(document, dom.tree_root(node)))
            .copied()
            .unwrap_or(fallback)
    }

    fn visit(
        &mut self,
        document_id: DocumentId,
        node: NodeId,
        parent: Option<VNodeId>,
        parent_style: Option<&ComputedStyle>,
        scope: ScopeId,
    ) {
        let page = self.page;
        let Some(document) = page.document(document_id) else {
            return;
        };
        let dom = document.tree();
        let Some(dom_node) = dom.get(node) else {
            return;
        };

        match &dom_node.data {
            NodeData::Text(text) if parent.is_some() => {
                let vnode = VirtualNode::text(self.tree.next_id(), text, scope);
                self.tree.push(vnode, parent);
            }
            NodeData::Element(element) => {
                let style = self.resolver(document_id, document).compute_style(dom, node, parent_style);
                let mut vnode = VirtualNode::element(self.tree.next_id(), &element.name, element.namespace.clone(), scope);
                for attr in &element.attrs {
                    vnode.push_attr(&attr.name, &attr.value);
                }
                vnode.live = Some(LiveBacking {
                    document: document_id,
                    node,
                    style: style.clone(),
                    geometry: element.geometry,
                });
                let vid = self.tree.push(vnode, parent);

                if element.is_frame() {
                    self.visit_frame(document_id, node, vid, element);
                    return;
                }
                if let Some(root) = element.shadow_root {
                    let mode = dom
                        .get(root)
                        .and_then(|n| n.as_shadow_root())
                        .map(|r| r.mode)
                        .unwrap_or_default();
                    let shadow_scope = self.tree.add_scope(Scope::Shadow { host: vid, mode });
                    self.tree_scopes.insert((document_id, root), shadow_scope);
                }
                for child in dom.composed_children(node) {
                    let child_scope = self.scope_for(document_id, dom, child, scope);
                    self.visit(document_id, child, Some(vid), Some(&style), child_scope);
                }
            }
            _ => {}
        }
    }

    fn visit_frame(&mut self, document_id: DocumentId, frame: NodeId, vid: VNodeId, element: &ElementData) {
        if !self.iframes {
            return;
        }
        let page = self.page;
        let link = match page.frame_document(document_id, frame) {
            Ok(child) => match page.document(child) {
                Some(child_doc) => {
                    let scope = self.tree.add_scope(Scope::Document {
                        document: Some(child),
                        frame: Some(vid),
                        url: Some(child_doc.url().to_string()),
                    });
                    self.tree_scopes.insert((child, child_doc.tree().root()), scope);
                    let html = child_doc.document_element();
                    if child_doc.tree().element(html).is_some() {
                        self.visit(child, html, Some(vid), None, scope);
                    }
                    FrameLink::Resolved { document: child }
                }
                None => FrameLink::Unresolved {
                    src: element.get_attr("src").map(str::to_string),
                    reason: format!("unknown document {:?}", child),
                },
            },
            Err(e) => {
                tracing::debug!("Frame left unresolved: {}", e);
                FrameLink::Unresolved {
                    src: element.get_attr("src").map(str::to_string),
                    reason: e.to_string(),
                }
            }
        };
        if let Some(node) = self.tree.nodes.get_mut(vid.index()) {
            node.frame = Some(link);
        }
    }
}
