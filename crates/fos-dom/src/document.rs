//! Document - High-level document API

use crate::{DOMRect, DomTree, NodeId};

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Serialized origin ("null" for opaque origins)
    origin: String,
    /// Viewport the document is laid out in
    viewport: DOMRect,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

/// Serialized origin of a URL; unparseable and opaque URLs yield "null"
pub fn origin_of(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.origin().ascii_serialization(),
        Err(_) => "null".to_string(),
    }
}

impl Document {
    /// Create a new document with html/head/body
    pub fn new(url: &str) -> Self {
        let mut doc = Self::empty(url);
        let tree = &mut doc.tree;
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        tree.append_child(tree.root(), html);
        tree.append_child(html, head);
        tree.append_child(html, body);

        doc.html_element = html;
        doc.head_element = head;
        doc.body_element = body;
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            origin: origin_of(url),
            viewport: DOMRect::from_xywh(0.0, 0.0, 1280.0, 1024.0),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        }
    }

    /// Override the origin (`srcdoc` documents inherit their parent's)
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Locate html/head/body after the tree was built externally
    pub fn finalize(&mut self) {
        let root = self.tree.root();
        self.html_element = self
            .tree
            .find_child_element(root, "html")
            .unwrap_or(NodeId::NONE);
        if self.html_element.is_valid() {
            self.head_element = self
                .tree
                .find_child_element(self.html_element, "head")
                .unwrap_or(NodeId::NONE);
            self.body_element = self
                .tree
                .find_child_element(self.html_element, "body")
                .unwrap_or(NodeId::NONE);
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get document origin
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Viewport rectangle
    pub fn viewport(&self) -> DOMRect {
        self.viewport
    }

    /// Set viewport rectangle
    pub fn set_viewport(&mut self, viewport: DOMRect) {
        self.viewport = viewport;
    }

    /// Get document title
    pub fn title(&self) -> String {
        if !self.head_element.is_valid() {
            return String::new();
        }
        self.tree
            .find_child_element(self.head_element, "title")
            .map(|title| self.tree.text_content(title).trim().to_string())
            .unwrap_or_default()
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get element by ID (light DOM only, first match in tree order)
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|node| self.tree.element(*node).and_then(|e| e.id()) == Some(id))
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_structure() {
        let doc = Document::new("https://example.com/page");
        assert!(doc.document_element().is_valid());
        assert!(doc.body().is_valid());
        assert_eq!(doc.origin(), "https://example.com");
        assert_eq!(doc.title(), "");
    }

    #[test]
    fn test_title_and_lookup() {
        let mut doc = Document::new("https://example.com/");
        let head = doc.head();
        let body = doc.body();
        let tree = doc.tree_mut();
        let title = tree.create_element("title");
        tree.append_child(head, title);
        tree.append_text(title, "  Hello ");
        let div = tree.create_element("div");
        tree.set_attr(div, "id", "x").unwrap();
        tree.append_child(body, div);

        assert_eq!(doc.title(), "Hello");
        assert_eq!(doc.get_element_by_id("x"), Some(div));
        assert_eq!(doc.get_element_by_id("y"), None);
    }

    #[test]
    fn test_opaque_origin() {
        assert_eq!(origin_of("about:blank"), "null");
        assert_eq!(origin_of("not a url"), "null");
        assert_eq!(origin_of("http://a.test:8080/x"), "http://a.test:8080");
    }
}
