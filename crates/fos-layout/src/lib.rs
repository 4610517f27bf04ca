//! fOS Layout Engine
//!
//! CSS box model and flow layout. Results are written onto DOM elements as
//! [`fos_dom::ElementGeometry`] so later stages only read geometry.

mod box_model;
mod engine;
mod inline;
mod layout_tree;

pub use box_model::{BoxDimensions, EdgeSizes};
pub use engine::{layout_document, layout_page, LayoutEngine};
pub use inline::{InlineFormattingContext, InlineFragment, LineBox};
pub use layout_tree::{BoxType, LayoutBox, LayoutTree};
