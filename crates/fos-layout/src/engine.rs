//! Flow layout
//!
//! A small block/inline flow engine: enough geometry for hit testing,
//! overlap and scroll checks. Text is measured with fixed per-character
//! advances, floats are ignored and margins do not collapse.

use crate::{BoxDimensions, BoxType, EdgeSizes, InlineFormattingContext, LayoutBox, LayoutTree};
use fos_css::{ComputedStyle, Display, Position, StyleResolver};
use fos_dom::{DOMRect, Document, DomTree, ElementGeometry, NodeData, NodeId, Page};

/// Advance of one character, in em
const CHAR_WIDTH_EM: f64 = 0.5;
/// Line height, in em
const LINE_HEIGHT_EM: f64 = 1.2;

/// Layout input after `display: contents` and `display: none` are resolved
enum Item {
    /// Text run with the font size it is set in
    Text(String, f64),
    Element(NodeId, ComputedStyle),
}

/// Rightmost and bottommost placed content
#[derive(Debug, Clone, Copy)]
struct Extent {
    right: f64,
    bottom: f64,
}

impl Extent {
    fn new(origin: DOMRect) -> Self {
        Self {
            right: origin.x,
            bottom: origin.y,
        }
    }

    fn include(&mut self, rect: DOMRect) {
        self.right = self.right.max(rect.right());
        self.bottom = self.bottom.max(rect.bottom());
    }
}

/// Layout engine for one viewport
#[derive(Debug, Clone, Copy)]
pub struct LayoutEngine {
    viewport: DOMRect,
}

impl LayoutEngine {
    pub fn new(viewport: DOMRect) -> Self {
        Self { viewport }
    }

    /// Lay out a document and store the geometry on its elements
    pub fn layout_document(&self, document: &mut Document) -> LayoutTree {
        let resolver = StyleResolver::for_document(document);
        let layout = {
            let mut flow = FlowContext {
                tree: document.tree(),
                resolver: &resolver,
                viewport: self.viewport,
                boxes: Vec::new(),
            };
            flow.layout_root(document.document_element());
            LayoutTree { boxes: flow.boxes }
        };

        let tree = document.tree_mut();
        for id in tree.node_ids().collect::<Vec<_>>() {
            if let Some(element) = tree.element_mut(id) {
                element.geometry = None;
            }
        }
        layout.apply(tree);
        tracing::debug!("Laid out {} boxes for {}", layout.len(), document.url());
        layout
    }
}

/// Lay out one document in its own viewport
pub fn layout_document(document: &mut Document) -> LayoutTree {
    LayoutEngine::new(document.viewport()).layout_document(document)
}

/// Lay out every document of a page. Frame documents get the client box of
/// their frame element as viewport.
pub fn layout_page(page: &mut Page) {
    let ids: Vec<_> = page.document_ids().collect();
    for id in ids {
        let frame_viewport = page.embedder(id).and_then(|(parent, frame)| {
            let geometry = page.document(parent)?.tree().element(frame)?.geometry?;
            Some(DOMRect::from_xywh(0.0, 0.0, geometry.client_width, geometry.client_height))
        });
        if let Some(document) = page.document_mut(id) {
            if let Some(viewport) = frame_viewport {
                document.set_viewport(viewport);
            }
            layout_document(document);
        }
    }
}

struct FlowContext<'a> {
    tree: &'a DomTree,
    resolver: &'a StyleResolver,
    viewport: DOMRect,
    boxes: Vec<LayoutBox>,
}

impl FlowContext<'_> {
    fn layout_root(&mut self, html: NodeId) {
        if self.tree.element(html).is_none() {
            return;
        }
        let style = self.resolver.compute_style(self.tree, html, None);
        if style.display() == Display::None {
            return;
        }
        let viewport = self.viewport;
        self.layout_element(html, &style, (viewport.x, viewport.y), viewport.width, Some(viewport.height), viewport);
    }

    /// Children to lay out, with `display: contents` flattened and hidden boxes dropped
    fn collect_items(&self, id: NodeId, style: &ComputedStyle, out: &mut Vec<Item>) {
        for child in self.tree.composed_children(id) {
            match self.tree.get(child).map(|n| &n.data) {
                Some(NodeData::Text(text)) if !text.trim().is_empty() => {
                    out.push(Item::Text(text.clone(), style.font_size()));
                }
                Some(NodeData::Element(_)) => {
                    let child_style = self.resolver.compute_style(self.tree, child, Some(style));
                    match child_style.display() {
                        Display::None => {}
                        Display::Contents => self.collect_items(child, &child_style, out),
                        _ => out.push(Item::Element(child, child_style)),
                    }
                }
                _ => {}
            }
        }
    }

    fn items(&self, id: NodeId, style: &ComputedStyle) -> Vec<Item> {
        let mut items = Vec::new();
        self.collect_items(id, style, &mut items);
        items
    }

    /// Lay out an element with its margin box at `origin`. Returns the margin box.
    fn layout_element(
        &mut self,
        id: NodeId,
        style: &ComputedStyle,
        origin: (f64, f64),
        available_width: f64,
        containing_height: Option<f64>,
        positioned: DOMRect,
    ) -> DOMRect {
        let display = style.display();
        let position = style.position();
        let mut margin = EdgeSizes::from_style(style, "margin", available_width);
        let border = EdgeSizes::border(style);
        let padding = EdgeSizes::from_style(style, "padding", available_width);
        let frame = margin.horizontal() + border.horizontal() + padding.horizontal();

        let intrinsic = self.intrinsic_size(id, style);
        let out_of_flow = matches!(position, Position::Absolute | Position::Fixed);
        let shrink = out_of_flow || display.is_inline_level() || display == Display::TableCell;
        let explicit_width = style.length_px("width", available_width).or(intrinsic.map(|size| size.0));
        let width = match explicit_width {
            Some(width) => width,
            None if shrink => self.preferred_width(id, style).min((available_width - frame).max(0.0)),
            None => (available_width - frame).max(0.0),
        };
        if explicit_width.is_some()
            && !shrink
            && style.get("margin-left") == Some("auto")
            && style.get("margin-right") == Some("auto")
        {
            let free = (available_width - width - border.horizontal() - padding.horizontal()).max(0.0);
            margin.left = free / 2.0;
            margin.right = free / 2.0;
        }
        let explicit_height = resolve_height(style, containing_height).or(intrinsic.map(|size| size.1));

        let content_x = origin.0 + margin.left + border.left + padding.left;
        let content_y = origin.1 + margin.top + border.top + padding.top;
        let child_positioned = if position == Position::Static {
            positioned
        } else {
            DOMRect::from_xywh(
                content_x - padding.left,
                content_y - padding.top,
                width + padding.horizontal(),
                explicit_height.unwrap_or(0.0) + padding.vertical(),
            )
        };

        // Reserve the slot so boxes stay in document order
        let index = self.boxes.len();
        self.boxes.push(LayoutBox {
            node: id,
            box_type: BoxType::for_display(display, intrinsic.is_some()),
            dimensions: BoxDimensions::default(),
            geometry: ElementGeometry::default(),
        });

        let content = DOMRect::from_xywh(content_x, content_y, width, explicit_height.unwrap_or(0.0));
        let (content_height, extent) = if intrinsic.is_some() {
            (0.0, Extent::new(content))
        } else {
            self.layout_children(id, style, content, explicit_height, child_positioned)
        };

        let dimensions = BoxDimensions {
            content: DOMRect::from_xywh(content_x, content_y, width, explicit_height.unwrap_or(content_height)),
            padding,
            border,
            margin,
        };
        let padding_box = dimensions.padding_box();
        let geometry = ElementGeometry {
            border_box: dimensions.border_box(),
            client_width: padding_box.width,
            client_height: padding_box.height,
            scroll_top: 0.0,
            scroll_left: 0.0,
            scroll_width: padding_box.width.max(extent.right + padding.right - padding_box.x),
            scroll_height: padding_box.height.max(extent.bottom + padding.bottom - padding_box.y),
        };
        if let Some(slot) = self.boxes.get_mut(index) {
            slot.dimensions = dimensions;
            slot.geometry = geometry;
        }
        dimensions.margin_box()
    }

    /// Flow children inside `content`. Returns the used content height and extent.
    fn layout_children(
        &mut self,
        id: NodeId,
        style: &ComputedStyle,
        content: DOMRect,
        definite_height: Option<f64>,
        positioned: DOMRect,
    ) -> (f64, Extent) {
        let display = style.display();
        let row = display == Display::TableRow
            || (matches!(display, Display::Flex | Display::InlineFlex)
                && !style.get_or("flex-direction", "row").starts_with("column"));
        let wrap = style.get_or("flex-wrap", "nowrap") == "wrap";

        let mut extent = Extent::new(content);
        let mut cursor_y = content.y;
        let mut ifc: Option<InlineFormattingContext> = None;
        let new_ifc = |y: f64| {
            let ifc = InlineFormattingContext::new(content.width, content.x, y);
            if row && !wrap { ifc.without_wrapping() } else { ifc }
        };

        for item in self.items(id, style) {
            match item {
                Item::Text(text, font_size) => {
                    ifc.get_or_insert_with(|| new_ifc(cursor_y)).add_text(
                        &text,
                        font_size * CHAR_WIDTH_EM,
                        font_size * LINE_HEIGHT_EM,
                    );
                }
                Item::Element(child, child_style) => {
                    let mark = self.boxes.len();
                    match child_style.position() {
                        Position::Absolute | Position::Fixed => {
                            let static_y = ifc.as_ref().map(|i| i.cursor_y()).unwrap_or(cursor_y);
                            self.layout_positioned(child, &child_style, positioned, (content.x, static_y));
                            continue;
                        }
                        _ => {}
                    }
                    let margin_box = if row || child_style.display().is_inline_level() {
                        let laid = self.layout_element(child, &child_style, (0.0, 0.0), content.width, definite_height, positioned);
                        let (x, y) = ifc
                            .get_or_insert_with(|| new_ifc(cursor_y))
                            .add_inline_box(laid.width, laid.height);
                        self.translate_boxes(mark, x, y);
                        laid.offset(x, y)
                    } else {
                        if let Some(done) = ifc.take() {
                            cursor_y = finish_lines(done, cursor_y, &mut extent);
                        }
                        let laid = self.layout_element(child, &child_style, (content.x, cursor_y), content.width, definite_height, positioned);
                        cursor_y = laid.bottom();
                        laid
                    };
                    extent.include(margin_box);

                    if child_style.position() == Position::Relative {
                        let dx = child_style
                            .length_px("left", content.width)
                            .or_else(|| child_style.length_px("right", content.width).map(|r| -r))
                            .unwrap_or(0.0);
                        let dy = child_style
                            .length_px("top", definite_height.unwrap_or(0.0))
                            .or_else(|| child_style.length_px("bottom", definite_height.unwrap_or(0.0)).map(|b| -b))
                            .unwrap_or(0.0);
                        self.translate_boxes(mark, dx, dy);
                    }
                }
            }
        }
        if let Some(done) = ifc.take() {
            cursor_y = finish_lines(done, cursor_y, &mut extent);
        }
        (cursor_y - content.y, extent)
    }

    /// Absolutely positioned and fixed boxes; they take no space in the flow
    fn layout_positioned(&mut self, id: NodeId, style: &ComputedStyle, positioned: DOMRect, static_position: (f64, f64)) {
        let containing = if style.position() == Position::Fixed {
            self.viewport
        } else {
            positioned
        };
        let mark = self.boxes.len();
        let laid = self.layout_element(id, style, (0.0, 0.0), containing.width, Some(containing.height), containing);

        let left = style.length_px("left", containing.width);
        let right = style.length_px("right", containing.width);
        let top = style.length_px("top", containing.height);
        let bottom = style.length_px("bottom", containing.height);
        let x = match (left, right) {
            (Some(left), _) => containing.x + left,
            (None, Some(right)) => containing.right() - right - laid.width,
            _ => static_position.0,
        };
        let y = match (top, bottom) {
            (Some(top), _) => containing.y + top,
            (None, Some(bottom)) => containing.bottom() - bottom - laid.height,
            _ => static_position.1,
        };
        self.translate_boxes(mark, x, y);
    }

    fn translate_boxes(&mut self, from: usize, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        for layout_box in self.boxes.iter_mut().skip(from) {
            layout_box.translate(dx, dy);
        }
    }

    /// Content size of replaced elements
    fn intrinsic_size(&self, id: NodeId, style: &ComputedStyle) -> Option<(f64, f64)> {
        let element = self.tree.element(id)?;
        let attr_px = |name: &str| {
            element
                .get_attr(name)
                .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
        };
        let line = style.font_size() * LINE_HEIGHT_EM;
        let sized = |width: f64, height: f64| Some((attr_px("width").unwrap_or(width), attr_px("height").unwrap_or(height)));

        match element.name.as_str() {
            "img" => sized(0.0, 0.0),
            "input" => match element.get_attr("type").unwrap_or("text").to_ascii_lowercase().as_str() {
                "checkbox" | "radio" => Some((13.0, 13.0)),
                "range" => Some((129.0, 16.0)),
                "color" => Some((50.0, 27.0)),
                "image" => sized(0.0, 0.0),
                "submit" | "reset" | "button" => {
                    let label = element.get_attr("value").unwrap_or("Submit");
                    Some((text_width(label, style.font_size()) + 16.0, line + 4.0))
                }
                _ => Some((150.0, line + 4.0)),
            },
            "select" => Some((120.0, line + 4.0)),
            "textarea" => Some((180.0, line * 2.0 + 4.0)),
            "meter" | "progress" => Some((80.0, 16.0)),
            "iframe" | "frame" | "video" | "canvas" | "embed" | "object" | "svg" => sized(300.0, 150.0),
            _ => None,
        }
    }

    /// Max-content width of the content box
    fn preferred_width(&self, id: NodeId, style: &ComputedStyle) -> f64 {
        if let Some(width) = style.length_px("width", 0.0) {
            return width;
        }
        if let Some((width, _)) = self.intrinsic_size(id, style) {
            return width;
        }
        let display = style.display();
        let row = display == Display::TableRow || matches!(display, Display::Flex | Display::InlineFlex);

        let mut widest: f64 = 0.0;
        let mut run = 0.0;
        for item in self.items(id, style) {
            match item {
                Item::Text(text, font_size) => run += text_width(&text, font_size),
                Item::Element(child, child_style) => {
                    if matches!(child_style.position(), Position::Absolute | Position::Fixed) {
                        continue;
                    }
                    let outer = self.preferred_width(child, &child_style)
                        + EdgeSizes::from_style(&child_style, "margin", 0.0).horizontal()
                        + EdgeSizes::border(&child_style).horizontal()
                        + EdgeSizes::from_style(&child_style, "padding", 0.0).horizontal();
                    if row || child_style.display().is_inline_level() {
                        run += outer;
                    } else {
                        widest = widest.max(run).max(outer);
                        run = 0.0;
                    }
                }
            }
        }
        widest.max(run)
    }
}

/// Close an inline formatting context, returning the y below its last line
fn finish_lines(ifc: InlineFormattingContext, cursor_y: f64, extent: &mut Extent) -> f64 {
    let lines = ifc.finish();
    for line in &lines {
        extent.include(DOMRect::from_xywh(line.x, line.y, line.width, line.height));
    }
    lines.last().map(|l| l.y + l.height).unwrap_or(cursor_y)
}

/// Width of a single-line text run
fn text_width(text: &str, font_size: f64) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    let chars: usize = words.iter().map(|w| w.chars().count()).sum();
    let spaces = words.len().saturating_sub(1);
    (chars + spaces) as f64 * font_size * CHAR_WIDTH_EM
}

fn resolve_height(style: &ComputedStyle, containing_height: Option<f64>) -> Option<f64> {
    let raw = style.get("height")?;
    if raw.trim().ends_with('%') {
        let base = containing_height?;
        return style.length_px("height", base);
    }
    style.length_px("height", 0.0)
}
