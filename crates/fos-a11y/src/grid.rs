//! Spatial grid
//!
//! Buckets the border boxes of visible elements into fixed-size cells, one
//! grid per document, so point, overlap and proximity queries only look at
//! elements sharing a cell. Coordinates are those of the element's own
//! document; cells above or left of the document origin are dropped.

use crate::focus::is_focusable;
use crate::visibility::is_visible_on_screen;
use fos_css::Position;
use fos_dom::DOMRect;
use fos_vdom::{ScopeId, VNodeId, VirtualTree};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Cell edge length in CSS pixels
pub const GRID_SIZE: f64 = 200.0;

/// Minimum target edge for pointer inputs
pub const MIN_TARGET_SIZE: f64 = 24.0;

/// Inclusive cell span of a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub top: i64,
    pub bottom: i64,
    pub left: i64,
    pub right: i64,
}

impl CellRange {
    /// Cells touched by `rect`, clipped to the document's positive quadrant.
    /// `None` if nothing of the rectangle lies inside it.
    pub fn of(rect: &DOMRect) -> Option<Self> {
        let range = Self {
            top: cell_index(rect.top()).max(0),
            bottom: cell_index(rect.bottom() - 1.0),
            left: cell_index(rect.left()).max(0),
            right: cell_index(rect.right() - 1.0),
        };
        (range.bottom >= range.top && range.right >= range.left).then_some(range)
    }

    fn cells(self) -> impl Iterator<Item = (i64, i64)> {
        (self.top..=self.bottom).flat_map(move |row| (self.left..=self.right).map(move |col| (row, col)))
    }
}

fn cell_index(position: f64) -> i64 {
    (position / GRID_SIZE).floor() as i64
}

/// Elements of one document bucketed by cell
#[derive(Debug, Default)]
pub struct Grid {
    cells: BTreeMap<(i64, i64), Vec<VNodeId>>,
    members: HashMap<VNodeId, (DOMRect, CellRange)>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket every element of the document `scope` that is painted on screen
    pub fn build(tree: &VirtualTree, scope: ScopeId) -> Self {
        let mut grid = Self::new();
        let elements: Vec<VNodeId> = tree
            .nodes()
            .filter(|n| n.is_element() && tree.document_scope(n.scope()) == scope)
            .map(|n| n.id())
            .collect();
        for id in elements {
            let Some(rect) = tree.get(id).and_then(|n| n.bounding_client_rect()) else {
                continue;
            };
            if rect.width > 0.0 && rect.height > 0.0 && is_visible_on_screen(tree, id) {
                grid.add(id, rect);
            }
        }
        tracing::debug!("Built grid for scope {:?}: {} elements in {} cells", scope, grid.len(), grid.cells.len());
        grid
    }

    /// Add an element; returns false if it lies entirely off the document
    pub fn add(&mut self, id: VNodeId, rect: DOMRect) -> bool {
        let Some(range) = CellRange::of(&rect) else {
            return false;
        };
        for cell in range.cells() {
            self.cells.entry(cell).or_default().push(id);
        }
        self.members.insert(id, (rect, range));
        true
    }

    pub fn contains(&self, id: VNodeId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn rect_of(&self, id: VNodeId) -> Option<DOMRect> {
        self.members.get(&id).map(|(rect, _)| *rect)
    }

    pub fn range_of(&self, id: VNodeId) -> Option<CellRange> {
        self.members.get(&id).map(|(_, range)| *range)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Distinct elements in the given cells, in document order
    pub fn elements_in(&self, range: CellRange) -> Vec<VNodeId> {
        let mut found: Vec<VNodeId> = range
            .cells()
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
            .collect();
        found.sort();
        found.dedup();
        found
    }
}

/// Grid of the document containing `id`, built once per tree
pub fn get_grid(tree: &VirtualTree, id: VNodeId) -> Option<Rc<Grid>> {
    let node = tree.get(id)?;
    let scope = tree.document_scope(node.scope());
    let key = format!("grid:{}", scope.index());
    match tree.cache().get_or_insert_with(&key, || Some(Grid::build(tree, scope))) {
        Ok(grid) => grid,
        Err(err) => {
            tracing::warn!("Grid cache unavailable: {}", err);
            None
        }
    }
}

fn same_document_chain(tree: &VirtualTree, id: VNodeId) -> Vec<VNodeId> {
    let document = tree.get(id).map(|n| tree.document_scope(n.scope()));
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .take_while(|a| tree.get(*a).map(|n| tree.document_scope(n.scope())) == document)
        .collect()
}

/// Fixed to the viewport itself or through an ancestor
pub fn is_fixed_position(tree: &VirtualTree, id: VNodeId) -> bool {
    same_document_chain(tree, id).iter().any(|a| {
        tree.get(*a)
            .and_then(|n| n.computed_style())
            .is_some_and(|s| s.position() == Position::Fixed)
    })
}

/// Paint order key: stacking z-index, then positioned boxes over flow
/// boxes, then later boxes over earlier ones
fn paint_order(tree: &VirtualTree, id: VNodeId) -> (i32, bool, VNodeId) {
    let mut z_index = None;
    let mut positioned = false;
    for a in same_document_chain(tree, id) {
        let Some(style) = tree.get(a).and_then(|n| n.computed_style()) else { continue };
        if style.position() != Position::Static {
            positioned = true;
            if z_index.is_none() {
                z_index = style.z_index();
            }
        }
    }
    (z_index.unwrap_or(0), positioned, id)
}

/// Elements of `grid` under a point, topmost first
pub fn get_point_stack(tree: &VirtualTree, grid: &Grid, x: f64, y: f64) -> Vec<VNodeId> {
    let probe = DOMRect::from_xywh(x, y, 1.0, 1.0);
    let Some(range) = CellRange::of(&probe) else {
        return Vec::new();
    };
    let mut stack: Vec<VNodeId> = grid
        .elements_in(range)
        .into_iter()
        .filter(|id| grid.rect_of(*id).is_some_and(|r| r.contains_point(x, y)))
        .collect();
    stack.sort_by_key(|id| std::cmp::Reverse(paint_order(tree, *id)));
    stack
}

/// Elements stacked at the center of the node, topmost first
pub fn get_element_stack(tree: &VirtualTree, id: VNodeId) -> Vec<VNodeId> {
    let Some(grid) = get_grid(tree, id) else {
        return Vec::new();
    };
    let Some(rect) = grid.rect_of(id) else {
        return Vec::new();
    };
    let (x, y) = rect.center();
    get_point_stack(tree, &grid, x, y)
}

/// Elements whose cells are within `margin` pixels of the node's cells.
/// Fixed and scrolling content never count as each other's neighbors.
pub fn find_nearby_elms(tree: &VirtualTree, id: VNodeId, margin: f64) -> Vec<VNodeId> {
    let Some(grid) = get_grid(tree, id) else {
        return Vec::new();
    };
    let Some(rect) = grid.rect_of(id) else {
        return Vec::new();
    };
    let grown = DOMRect::from_xywh(
        rect.x - margin,
        rect.y - margin,
        rect.width + 2.0 * margin,
        rect.height + 2.0 * margin,
    );
    let Some(range) = CellRange::of(&grown) else {
        return Vec::new();
    };
    let fixed = is_fixed_position(tree, id);
    grid.elements_in(range)
        .into_iter()
        .filter(|other| *other != id && is_fixed_position(tree, *other) == fixed)
        .collect()
}

/// Parts of `rect` left after cutting out `cut`
fn subtract(rect: DOMRect, cut: &DOMRect) -> Vec<DOMRect> {
    let Some(overlap) = rect.intersection(cut) else {
        return vec![rect];
    };
    let mut pieces = Vec::new();
    if overlap.top() > rect.top() {
        pieces.push(DOMRect::from_xywh(rect.x, rect.y, rect.width, overlap.top() - rect.top()));
    }
    if overlap.bottom() < rect.bottom() {
        pieces.push(DOMRect::from_xywh(rect.x, overlap.bottom(), rect.width, rect.bottom() - overlap.bottom()));
    }
    if overlap.left() > rect.left() {
        pieces.push(DOMRect::from_xywh(rect.x, overlap.y, overlap.left() - rect.left(), overlap.height));
    }
    if overlap.right() < rect.right() {
        pieces.push(DOMRect::from_xywh(overlap.right(), overlap.y, rect.right() - overlap.right(), overlap.height));
    }
    pieces
}

/// Focusable neighbors painted over or next to the target
pub fn nearby_widgets(tree: &VirtualTree, id: VNodeId) -> Vec<VNodeId> {
    find_nearby_elms(tree, id, MIN_TARGET_SIZE)
        .into_iter()
        .filter(|other| !tree.contains(*other, id) && !tree.contains(id, *other))
        .filter(|other| is_focusable(tree, *other))
        .collect()
}

/// Clickable areas of a target: its box minus the parts covered by other
/// widgets painted on top of it
pub fn target_rects(tree: &VirtualTree, id: VNodeId) -> Vec<DOMRect> {
    let Some(grid) = get_grid(tree, id) else {
        return Vec::new();
    };
    let Some(rect) = grid.rect_of(id) else {
        return Vec::new();
    };
    let order = paint_order(tree, id);
    let mut rects = vec![rect];
    for other in nearby_widgets(tree, id) {
        if paint_order(tree, other) < order {
            continue;
        }
        let Some(cover) = grid.rect_of(other) else { continue };
        rects = rects.into_iter().flat_map(|r| subtract(r, &cover)).collect();
    }
    rects
}

/// Largest clickable area of a target
pub fn target_size(tree: &VirtualTree, id: VNodeId) -> Option<DOMRect> {
    target_rects(tree, id)
        .into_iter()
        .max_by(|a, b| (a.width.min(a.height)).total_cmp(&b.width.min(b.height)))
}

fn distance_to_rect(x: f64, y: f64, rect: &DOMRect) -> f64 {
    let dx = (rect.left() - x).max(0.0).max(x - rect.right());
    let dy = (rect.top() - y).max(0.0).max(y - rect.bottom());
    dx.hypot(dy)
}

/// Smallest spacing from the target's center to a neighboring widget:
/// center distance for undersized neighbors, distance to the box plus
/// half the minimum size otherwise. `None` without neighbors.
pub fn target_offset(tree: &VirtualTree, id: VNodeId) -> Option<f64> {
    let grid = get_grid(tree, id)?;
    let (x, y) = grid.rect_of(id)?.center();
    nearby_widgets(tree, id)
        .into_iter()
        .filter_map(|other| grid.rect_of(other))
        .map(|rect| {
            if rect.width < MIN_TARGET_SIZE || rect.height < MIN_TARGET_SIZE {
                let (ox, oy) = rect.center();
                (ox - x).hypot(oy - y)
            } else {
                distance_to_rect(x, y, &rect) + MIN_TARGET_SIZE / 2.0
            }
        })
        .min_by(f64::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_range_clips_negative_cells() {
        let range = CellRange::of(&DOMRect::from_xywh(0.0, -30.0, 100.0, 60.0)).unwrap();
        assert_eq!((range.top, range.bottom, range.left, range.right), (0, 0, 0, 0));
        assert!(CellRange::of(&DOMRect::from_xywh(0.0, -30.0, 100.0, 30.0)).is_none());
    }

    #[test]
    fn test_cell_range_spans_boundaries() {
        let range = CellRange::of(&DOMRect::from_xywh(150.0, 180.0, 100.0, 30.0)).unwrap();
        assert_eq!((range.top, range.bottom, range.left, range.right), (0, 1, 0, 1));
        let exact = CellRange::of(&DOMRect::from_xywh(0.0, 0.0, 200.0, 200.0)).unwrap();
        assert_eq!((exact.bottom, exact.right), (0, 0));
    }

    #[test]
    fn test_grid_lookup_is_deduplicated() {
        let mut grid = Grid::new();
        let tree = VirtualTree::from_serial(&fos_vdom::SerialNode::element("div")).unwrap();
        let a = tree.root().unwrap();
        assert!(grid.add(a, DOMRect::from_xywh(0.0, 0.0, 500.0, 500.0)));
        let all = CellRange { top: 0, bottom: 2, left: 0, right: 2 };
        assert_eq!(grid.elements_in(all), vec![a]);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_subtract_splits_into_strips() {
        let rect = DOMRect::from_xywh(0.0, 0.0, 30.0, 30.0);
        let pieces = subtract(rect, &DOMRect::from_xywh(10.0, 10.0, 10.0, 10.0));
        assert_eq!(pieces.len(), 4);
        let area: f64 = pieces.iter().map(|p| p.width * p.height).sum();
        assert_eq!(area, 800.0);
        assert_eq!(subtract(rect, &DOMRect::from_xywh(40.0, 0.0, 5.0, 5.0)), vec![rect]);
    }

    #[test]
    fn test_distance_to_rect() {
        let rect = DOMRect::from_xywh(10.0, 0.0, 10.0, 10.0);
        assert_eq!(distance_to_rect(0.0, 5.0, &rect), 10.0);
        assert_eq!(distance_to_rect(15.0, 5.0, &rect), 0.0);
    }
}
