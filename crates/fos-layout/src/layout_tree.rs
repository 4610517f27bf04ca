//! Layout Tree
//!
//! Boxes produced by one layout pass, in document order. Applying the tree
//! writes each box's geometry back onto its DOM element.

use crate::BoxDimensions;
use fos_css::Display;
use fos_dom::{DomTree, ElementGeometry, NodeId};

/// Layout tree
#[derive(Debug, Default, Clone)]
pub struct LayoutTree {
    pub boxes: Vec<LayoutBox>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self { boxes: Vec::new() }
    }

    /// Box generated for an element
    pub fn get(&self, node: NodeId) -> Option<&LayoutBox> {
        self.boxes.iter().find(|b| b.node == node)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Store every box's geometry on its element
    pub fn apply(&self, tree: &mut DomTree) {
        for layout_box in &self.boxes {
            if let Err(e) = tree.set_geometry(layout_box.node, layout_box.geometry) {
                tracing::warn!("Dropping layout for {:?}: {}", layout_box.node, e);
            }
        }
    }
}

/// A box in the layout tree
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub node: NodeId,
    pub box_type: BoxType,
    pub dimensions: BoxDimensions,
    pub geometry: ElementGeometry,
}

impl LayoutBox {
    /// Move the box and its recorded geometry
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.dimensions.translate(dx, dy);
        self.geometry.border_box = self.geometry.border_box.offset(dx, dy);
    }
}

/// Type of layout box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxType {
    Block,
    Inline,
    InlineBlock,
    Flex,
    Grid,
    Table,
    /// Content sized by the element itself (images, form controls, frames)
    Replaced,
}

impl BoxType {
    pub fn for_display(display: Display, replaced: bool) -> Self {
        if replaced {
            return Self::Replaced;
        }
        match display {
            Display::Inline => Self::Inline,
            Display::InlineBlock => Self::InlineBlock,
            Display::Flex | Display::InlineFlex => Self::Flex,
            Display::Grid => Self::Grid,
            Display::Table | Display::TableRow | Display::TableCell => Self::Table,
            _ => Self::Block,
        }
    }
}
