//! fOS Virtual DOM
//!
//! Composed, read-only view of a page used by the accessibility engine.
//! Shadow trees and same-origin frame documents are spliced into one arena
//! of [`VirtualNode`]s in document order; cross-origin frames stay leaves.
//! Trees can also be built from serialized node descriptions, in which case
//! live-only data (style, geometry) is absent.

mod builder;
mod cache;
mod node;
mod query;
mod selector;
mod serial;
mod tree;
mod vref;

pub use builder::TreeBuilder;
pub use cache::{Cache, CacheError};
pub use node::{FrameLink, LiveBacking, VNodeId, VNodeKind, VirtualNode};
pub use query::{closest, compile, matches, matches_str, query_selector_all, query_selector_all_str};
pub use selector::{
    get_ancestry, get_ancestry_selector, get_selector, get_target, node_index, outer_html, Target,
    TargetPart,
};
pub use serial::SerialNode;
pub use tree::{Scope, ScopeId, VirtualTree};
pub use vref::VRef;

use fos_dom::{DocumentId, NodeId};

/// Virtual tree errors
#[derive(Debug, thiserror::Error)]
pub enum VdomError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Invalid selector: {0}")]
    Selector(#[from] fos_css::CssError),

    #[error("Invalid serialized node: {0}")]
    InvalidSerialNode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown document: {0:?}")]
    UnknownDocument(DocumentId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),
}

/// Result alias for virtual tree operations
pub type Result<T> = std::result::Result<T, VdomError>;
