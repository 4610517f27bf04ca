//! Geometry APIs
//!
//! DOMRect and the scroll/client box sizes recorded on laid-out elements.

/// DOMRect - rectangle geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DOMRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DOMRect {
    /// Create empty rect
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with dimensions
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Top edge (same as y)
    pub fn top(&self) -> f64 {
        self.y
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Left edge (same as x)
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Center point
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Rect with no area
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if point is inside (edges included)
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Check if `other` lies fully inside this rect
    pub fn contains_rect(&self, other: &DOMRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check if rects intersect (touching edges count)
    pub fn intersects(&self, other: &DOMRect) -> bool {
        !(self.right() < other.x
            || self.x > other.right()
            || self.bottom() < other.y
            || self.y > other.bottom())
    }

    /// Get intersection rect
    pub fn intersection(&self, other: &DOMRect) -> Option<DOMRect> {
        if !self.intersects(other) {
            return None;
        }

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Some(DOMRect::from_xywh(x, y, right - x, bottom - y))
    }

    /// Translate by an offset
    pub fn offset(&self, dx: f64, dy: f64) -> DOMRect {
        DOMRect::from_xywh(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Element geometry state produced by layout
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementGeometry {
    /// Border box in document coordinates
    pub border_box: DOMRect,

    // Client properties (content + padding, no scrollbar)
    pub client_width: f64,
    pub client_height: f64,

    // Scroll properties
    pub scroll_top: f64,
    pub scroll_left: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,
}

impl ElementGeometry {
    /// Geometry of a box whose content fits exactly
    pub fn from_border_box(rect: DOMRect) -> Self {
        Self {
            border_box: rect,
            client_width: rect.width,
            client_height: rect.height,
            scroll_width: rect.width,
            scroll_height: rect.height,
            ..Self::default()
        }
    }

    /// Get bounding client rect
    pub fn bounding_client_rect(&self) -> DOMRect {
        self.border_box
    }

    /// Scroll to position
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll_left = x.max(0.0).min((self.scroll_width - self.client_width).max(0.0));
        self.scroll_top = y.max(0.0).min((self.scroll_height - self.client_height).max(0.0));
    }

    /// Content wider than the client box
    pub fn overflows_x(&self) -> bool {
        self.scroll_width > self.client_width
    }

    /// Content taller than the client box
    pub fn overflows_y(&self) -> bool {
        self.scroll_height > self.client_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dom_rect() {
        let rect = DOMRect::from_xywh(10.0, 20.0, 100.0, 50.0);

        assert_eq!(rect.top(), 20.0);
        assert_eq!(rect.right(), 110.0);
        assert_eq!(rect.bottom(), 70.0);
        assert_eq!(rect.left(), 10.0);
        assert_eq!(rect.center(), (60.0, 45.0));
    }

    #[test]
    fn test_contains_point() {
        let rect = DOMRect::from_xywh(0.0, 0.0, 100.0, 100.0);

        assert!(rect.contains_point(50.0, 50.0));
        assert!(!rect.contains_point(150.0, 50.0));
    }

    #[test]
    fn test_intersects() {
        let rect1 = DOMRect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let rect2 = DOMRect::from_xywh(50.0, 50.0, 100.0, 100.0);
        let rect3 = DOMRect::from_xywh(200.0, 200.0, 50.0, 50.0);

        assert!(rect1.intersects(&rect2));
        assert!(!rect1.intersects(&rect3));
        assert_eq!(
            rect1.intersection(&rect2),
            Some(DOMRect::from_xywh(50.0, 50.0, 50.0, 50.0))
        );
    }

    #[test]
    fn test_scroll_clamped() {
        let mut geometry = ElementGeometry::from_border_box(DOMRect::from_xywh(0.0, 0.0, 100.0, 100.0));
        geometry.scroll_height = 300.0;
        geometry.scroll_to(10.0, 500.0);
        assert_eq!(geometry.scroll_left, 0.0);
        assert_eq!(geometry.scroll_top, 200.0);
        assert!(geometry.overflows_y());
        assert!(!geometry.overflows_x());
    }
}
