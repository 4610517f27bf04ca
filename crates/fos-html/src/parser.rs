//! HTML5 Parser implementation
//!
//! Uses html5ever's build-in RcDom and converts to our DOM format.
//! Declarative shadow roots (`<template shadowrootmode>`) become real shadow
//! trees and `srcdoc` frames become nested documents of a [`Page`].

use fos_dom::{Document, DocumentId, DomTree, Namespace, NodeId, Page, ShadowRootMode};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// Nesting limit for `srcdoc` documents
const MAX_FRAME_DEPTH: usize = 8;

/// URL given to `srcdoc` documents
const SRCDOC_URL: &str = "about:srcdoc";

/// A frame element waiting for its `srcdoc` document
struct PendingFrame {
    frame: NodeId,
    srcdoc: String,
    sandboxed: bool,
}

/// HTML5 parser
#[derive(Debug, Clone, Copy)]
pub struct HtmlParser {
    shadow_roots: bool,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self { shadow_roots: true }
    }

    /// Keep `<template shadowrootmode>` as an inert template instead of attaching it
    pub fn without_shadow_roots(mut self) -> Self {
        self.shadow_roots = false;
        self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL. Frame contents are not loaded.
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        self.build_document(html, url, &mut Vec::new())
    }

    /// Parse a top-level document and every `srcdoc` frame it embeds
    pub fn parse_page(&self, html: &str, url: &str) -> Page {
        let mut frames = Vec::new();
        let document = self.build_document(html, url, &mut frames);
        let mut page = Page::new(document);
        let top = page.top();
        self.load_frames(&mut page, top, frames, 1);
        page
    }

    fn load_frames(&self, page: &mut Page, parent: DocumentId, frames: Vec<PendingFrame>, depth: usize) {
        if frames.is_empty() {
            return;
        }
        if depth > MAX_FRAME_DEPTH {
            tracing::warn!("Not loading {} frames nested deeper than {}", frames.len(), MAX_FRAME_DEPTH);
            return;
        }
        let parent_origin = page
            .document(parent)
            .map(|d| d.origin().to_string())
            .unwrap_or_else(|| "null".to_string());

        for pending in frames {
            let mut nested = Vec::new();
            let origin = if pending.sandboxed { "null".to_string() } else { parent_origin.clone() };
            let document = self
                .build_document(&pending.srcdoc, SRCDOC_URL, &mut nested)
                .with_origin(origin);
            let child = page.add_document(document);
            if let Err(e) = page.attach_frame(parent, pending.frame, child) {
                tracing::warn!("Could not attach srcdoc frame: {}", e);
                continue;
            }
            self.load_frames(page, child, nested, depth + 1);
        }
    }

    fn build_document(&self, html: &str, url: &str, frames: &mut Vec<PendingFrame>) -> Document {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut document = Document::empty(url);
        let root = document.tree().root();
        self.convert_node(&dom.document, document.tree_mut(), root, frames);
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        document
    }

    /// Convert an RcDom node to our DOM format
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId, frames: &mut Vec<PendingFrame>) {
        match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent, frames);
                }
            }
            RcNodeData::Doctype { name, public_id, system_id } => {
                let id = tree.create_doctype(name, public_id, system_id);
                tree.append_child(parent, id);
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                if !text.trim().is_empty() {
                    tree.append_text(parent, &text);
                }
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(contents);
                tree.append_child(parent, id);
            }
            RcNodeData::Element { name, attrs, template_contents, .. } => {
                let namespace = Namespace::from_url(&name.ns);
                let local = &*name.local;

                if self.shadow_roots && namespace == Namespace::Html && local == "template" {
                    let mode = attrs
                        .borrow()
                        .iter()
                        .find(|a| &*a.name.local == "shadowrootmode")
                        .and_then(|a| ShadowRootMode::parse(&a.value));
                    let contents = template_contents.borrow();
                    if let (Some(mode), Some(contents)) = (mode, contents.as_ref()) {
                        if self.attach_declarative_shadow(contents, tree, parent, mode, frames) {
                            return;
                        }
                    }
                }

                let id = tree.create_element_ns(local, namespace);
                if let Some(element) = tree.element_mut(id) {
                    for attr in attrs.borrow().iter() {
                        element.set_attr(&attr.name.local, attr.value.to_string());
                    }
                    if element.is_frame() {
                        if let Some(srcdoc) = element.get_attr("srcdoc") {
                            let sandboxed = element
                                .get_attr("sandbox")
                                .is_some_and(|s| !s.split_whitespace().any(|t| t.eq_ignore_ascii_case("allow-same-origin")));
                            frames.push(PendingFrame {
                                frame: id,
                                srcdoc: srcdoc.to_string(),
                                sandboxed,
                            });
                        }
                    }
                }
                tree.append_child(parent, id);

                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, id, frames);
                }
                // Inert template content stays as children so its markup is not lost
                if let Some(contents) = template_contents.borrow().as_ref() {
                    for child in contents.children.borrow().iter() {
                        self.convert_node(child, tree, id, frames);
                    }
                }
            }
            RcNodeData::ProcessingInstruction { .. } => {
                // Ignore processing instructions for now
            }
        }
    }

    /// Attach a declarative shadow root to `host`. Returns false if the host cannot take one.
    fn attach_declarative_shadow(
        &self,
        contents: &Handle,
        tree: &mut DomTree,
        host: NodeId,
        mode: ShadowRootMode,
        frames: &mut Vec<PendingFrame>,
    ) -> bool {
        let root = match tree.attach_shadow(host, mode) {
            Ok(root) => root,
            Err(e) => {
                tracing::debug!("Declarative shadow root left as template: {}", e);
                return false;
            }
        };
        for child in contents.children.borrow().iter() {
            self.convert_node(child, tree, root, frames);
        }
        true
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
        let doc = HtmlParser::new().parse(html);

        assert!(doc.tree().len() > 1, "Expected more than 1 node, got {}", doc.tree().len());
        assert_eq!(doc.title(), "Test");
    }

    #[test]
    fn test_parse_fragment() {
        let html = "<div><span>Text</span></div>";
        let doc = HtmlParser::new().parse(html);

        // Even fragments get wrapped in html/head/body by html5ever
        assert!(doc.body().is_valid());
        assert_eq!(doc.tree().text_content(doc.body()), "Text");
    }

    #[test]
    fn test_declarative_shadow_root() {
        let html = r#"<div id="host"><template shadowrootmode="open"><b>inside</b></template><i>light</i></div>"#;
        let doc = HtmlParser::new().parse(html);
        let host = doc.get_element_by_id("host").unwrap();
        let root = doc.tree().shadow_root(host).expect("shadow root attached");
        assert_eq!(doc.tree().text_content(root), "inside");
        assert_eq!(doc.tree().text_content(host), "light");
    }

    #[test]
    fn test_shadow_roots_disabled() {
        let html = r#"<div id="host"><template shadowrootmode="open"><b>inside</b></template></div>"#;
        let doc = HtmlParser::new().without_shadow_roots().parse(html);
        let host = doc.get_element_by_id("host").unwrap();
        assert!(doc.tree().shadow_root(host).is_none());
    }
}
