//! fOS DOM - Document Object Model
//!
//! Arena-based host document model inspected by the accessibility auditor.
//! A [`Page`] owns every document of a browsing context tree; frames link
//! documents together and carry the origin checks that decide whether the
//! auditor may read their content in-process.

mod node;
mod tree;
mod document;
mod shadow;
mod geometry;
mod page;

pub use node::{Node, NodeData, ElementData, Attribute, Namespace, FrameContent};
pub use tree::{DomTree, Children};
pub use document::{Document, origin_of};
pub use shadow::{ShadowRoot, ShadowRootMode};
pub use geometry::{DOMRect, ElementGeometry};
pub use page::{Page, DocumentId};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID (the document node of every tree)
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Whether this id points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index of this node
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// DOM errors
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("Invalid node: {0:?}")]
    InvalidNode(NodeId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Element already hosts a shadow root")]
    ShadowRootExists,

    #[error("Element <{0}> cannot host a shadow root")]
    NotShadowHost(String),

    #[error("Cross-origin frame: {frame_origin} is not accessible from {origin}")]
    CrossOrigin { origin: String, frame_origin: String },

    #[error("Frame has no content document")]
    Detached,

    #[error("Unknown document: {0:?}")]
    UnknownDocument(DocumentId),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result alias for DOM operations
pub type Result<T> = std::result::Result<T, DomError>;
