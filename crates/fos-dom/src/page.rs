//! Page - browsing context tree
//!
//! Owns the top document and every nested frame document. Frame elements
//! point at their content document by [`DocumentId`]; reading that content
//! is subject to the same-origin rule.

use crate::{Document, DomError, FrameContent, NodeId, Result};

/// Document identifier within a [`Page`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub(crate) usize);

impl DocumentId {
    /// Index of the document inside its page
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct DocumentEntry {
    document: Document,
    /// Frame element embedding this document
    embedder: Option<(DocumentId, NodeId)>,
}

/// Browsing context tree
#[derive(Debug, Clone)]
pub struct Page {
    documents: Vec<DocumentEntry>,
}

impl Page {
    /// Create a page around its top-level document
    pub fn new(top: Document) -> Self {
        Self {
            documents: vec![DocumentEntry {
                document: top,
                embedder: None,
            }],
        }
    }

    /// Top-level document id
    pub fn top(&self) -> DocumentId {
        DocumentId(0)
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// A page always has its top document
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Get a document
    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.0).map(|e| &e.document)
    }

    /// Get a document mutably
    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(id.0).map(|e| &mut e.document)
    }

    /// All document ids, top first
    pub fn document_ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        (0..self.documents.len()).map(DocumentId)
    }

    /// Add a document that is not yet attached to a frame
    pub fn add_document(&mut self, document: Document) -> DocumentId {
        self.documents.push(DocumentEntry {
            document,
            embedder: None,
        });
        DocumentId(self.documents.len() - 1)
    }

    /// Load `child` into the frame element `frame` of document `parent`
    pub fn attach_frame(&mut self, parent: DocumentId, frame: NodeId, child: DocumentId) -> Result<()> {
        if child.0 >= self.documents.len() || child == parent {
            return Err(DomError::UnknownDocument(child));
        }
        let element = self
            .document_mut(parent)
            .ok_or(DomError::UnknownDocument(parent))?
            .tree
            .element_mut(frame)
            .ok_or(DomError::NotAnElement(frame))?;
        if !element.is_frame() {
            return Err(DomError::NotAnElement(frame));
        }
        element.frame = Some(FrameContent::Document(child));
        self.documents[child.0].embedder = Some((parent, frame));
        tracing::debug!("Attached document {:?} to frame {:?} in {:?}", child, frame, parent);
        Ok(())
    }

    /// Mark a frame's document as gone
    pub fn detach_frame(&mut self, parent: DocumentId, frame: NodeId) -> Result<()> {
        let element = self
            .document_mut(parent)
            .ok_or(DomError::UnknownDocument(parent))?
            .tree
            .element_mut(frame)
            .ok_or(DomError::NotAnElement(frame))?;
        if let Some(FrameContent::Document(child)) = element.frame.replace(FrameContent::Unloaded) {
            if let Some(entry) = self.documents.get_mut(child.0) {
                entry.embedder = None;
            }
        }
        Ok(())
    }

    /// Frame element embedding a document
    pub fn embedder(&self, id: DocumentId) -> Option<(DocumentId, NodeId)> {
        self.documents.get(id.0).and_then(|e| e.embedder)
    }

    /// Content document of a frame, if the embedding document may read it
    pub fn frame_document(&self, parent: DocumentId, frame: NodeId) -> Result<DocumentId> {
        let embedding = self.document(parent).ok_or(DomError::UnknownDocument(parent))?;
        let element = embedding.tree.element(frame).ok_or(DomError::NotAnElement(frame))?;
        let child = match element.frame {
            Some(FrameContent::Document(child)) => child,
            _ => return Err(DomError::Detached),
        };
        let content = self.document(child).ok_or(DomError::Detached)?;
        if content.origin() == "null" || content.origin() != embedding.origin() {
            return Err(DomError::CrossOrigin {
                origin: embedding.origin().to_string(),
                frame_origin: content.origin().to_string(),
            });
        }
        Ok(child)
    }

    /// Content document of a frame ignoring origin (what the frame itself sees)
    pub fn frame_content(&self, parent: DocumentId, frame: NodeId) -> Option<DocumentId> {
        match self.document(parent)?.tree.element(frame)?.frame {
            Some(FrameContent::Document(child)) => Some(child),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_frame(child_url: &str) -> (Page, NodeId, DocumentId) {
        let mut top = Document::new("https://a.test/");
        let body = top.body();
        let iframe = top.tree.create_element("iframe");
        top.tree.append_child(body, iframe);
        let mut page = Page::new(top);
        let child = page.add_document(Document::new(child_url));
        page.attach_frame(page.top(), iframe, child).unwrap();
        (page, iframe, child)
    }

    #[test]
    fn test_same_origin_frame() {
        let (page, iframe, child) = page_with_frame("https://a.test/inner");
        assert_eq!(page.frame_document(page.top(), iframe).unwrap(), child);
        assert_eq!(page.embedder(child), Some((page.top(), iframe)));
    }

    #[test]
    fn test_cross_origin_frame() {
        let (page, iframe, child) = page_with_frame("https://b.test/inner");
        assert!(matches!(
            page.frame_document(page.top(), iframe),
            Err(DomError::CrossOrigin { .. })
        ));
        assert_eq!(page.frame_content(page.top(), iframe), Some(child));
    }

    #[test]
    fn test_detached_frame() {
        let (mut page, iframe, _) = page_with_frame("https://a.test/inner");
        page.detach_frame(page.top(), iframe).unwrap();
        assert!(matches!(
            page.frame_document(page.top(), iframe),
            Err(DomError::Detached)
        ));
    }

    #[test]
    fn test_attach_to_non_frame_fails() {
        let top = Document::new("https://a.test/");
        let body = top.body();
        let mut page = Page::new(top);
        let child = page.add_document(Document::new("https://a.test/x"));
        assert!(page.attach_frame(page.top(), body, child).is_err());
    }
}
