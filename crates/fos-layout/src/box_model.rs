//! CSS Box Model

use fos_css::ComputedStyle;
use fos_dom::DOMRect;

/// Box dimensions
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxDimensions {
    pub content: DOMRect,
    pub padding: EdgeSizes,
    pub border: EdgeSizes,
    pub margin: EdgeSizes,
}

/// Edge sizes (top, right, bottom, left)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeSizes {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl EdgeSizes {
    /// Read `{prefix}-{side}` lengths; `auto` and unparseable values are zero
    pub fn from_style(style: &ComputedStyle, prefix: &str, percent_base: f64) -> Self {
        let side = |name: &str| {
            style
                .length_px(&format!("{}-{}", prefix, name), percent_base)
                .unwrap_or(0.0)
        };
        Self {
            top: side("top"),
            right: side("right"),
            bottom: side("bottom"),
            left: side("left"),
        }
    }

    /// Border widths; sides whose style is `none` or `hidden` have no width
    pub fn border(style: &ComputedStyle) -> Self {
        let side = |name: &str| {
            let border_style = style.get_or(&format!("border-{}-style", name), "none");
            if matches!(border_style, "none" | "hidden") {
                return 0.0;
            }
            style
                .length_px(&format!("border-{}-width", name), 0.0)
                .unwrap_or(3.0)
        };
        Self {
            top: side("top"),
            right: side("right"),
            bottom: side("bottom"),
            left: side("left"),
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

impl BoxDimensions {
    /// Get the area covered by content + padding
    pub fn padding_box(&self) -> DOMRect {
        DOMRect::from_xywh(
            self.content.x - self.padding.left,
            self.content.y - self.padding.top,
            self.content.width + self.padding.horizontal(),
            self.content.height + self.padding.vertical(),
        )
    }

    /// Get the area covered by content + padding + border
    pub fn border_box(&self) -> DOMRect {
        let padding = self.padding_box();
        DOMRect::from_xywh(
            padding.x - self.border.left,
            padding.y - self.border.top,
            padding.width + self.border.horizontal(),
            padding.height + self.border.vertical(),
        )
    }

    /// Get the area covered by content + padding + border + margin
    pub fn margin_box(&self) -> DOMRect {
        let border = self.border_box();
        DOMRect::from_xywh(
            border.x - self.margin.left,
            border.y - self.margin.top,
            border.width + self.margin.horizontal(),
            border.height + self.margin.vertical(),
        )
    }

    /// Move the whole box
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.content = self.content.offset(dx, dy);
    }
}
