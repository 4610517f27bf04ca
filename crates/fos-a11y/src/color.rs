//! Color contrast
//!
//! Effective text and background colors of an element, blended through
//! opacity and stacked backgrounds, and the WCAG contrast thresholds.
//! When a color cannot be determined reliably the query returns `None`
//! and records why in the tree cache.

use crate::grid::get_element_stack;
use fos_css::Color;
use fos_css::LengthContext;
use fos_vdom::{VNodeId, VirtualNode, VirtualTree};
use std::fmt;

/// Why a color could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteReason {
    /// A background image sits behind the text
    BgImage,
    /// A gradient sits behind the text
    BgGradient,
    /// Another element partially covers the text's background
    BgOverlap,
    /// Foreground and background are the same color
    EqualRatio,
}

impl IncompleteReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BgImage => "bgImage",
            Self::BgGradient => "bgGradient",
            Self::BgOverlap => "bgOverlap",
            Self::EqualRatio => "equalRatio",
        }
    }
}

impl fmt::Display for IncompleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which color an incomplete reason applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorKind {
    Foreground,
    Background,
}

impl ColorKind {
    fn cache_key(self) -> &'static str {
        match self {
            Self::Foreground => "incompleteData:fgColor",
            Self::Background => "incompleteData:bgColor",
        }
    }
}

pub fn set_incomplete_reason(tree: &VirtualTree, kind: ColorKind, reason: Option<IncompleteReason>) {
    if let Err(err) = tree.cache().set(kind.cache_key(), reason) {
        tracing::warn!("Failed to record incomplete color data: {}", err);
    }
}

/// Last recorded reason for an undeterminable color
pub fn incomplete_reason(tree: &VirtualTree, kind: ColorKind) -> Option<IncompleteReason> {
    tree.cache()
        .get::<IncompleteReason>(kind.cache_key())
        .flatten()
        .map(|reason| *reason)
}

pub fn clear_incomplete_data(tree: &VirtualTree) {
    set_incomplete_reason(tree, ColorKind::Foreground, None);
    set_incomplete_reason(tree, ColorKind::Background, None);
}

/// WCAG luminance and contrast math
#[derive(Debug)]
pub struct ContrastChecker;

impl ContrastChecker {
    /// Relative luminance
    pub fn luminance(color: &Color) -> f64 {
        fn channel(c: f64) -> f64 {
            let c = c / 255.0;
            if c <= 0.03928 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
        }
        0.2126 * channel(color.red) + 0.7152 * channel(color.green) + 0.0722 * channel(color.blue)
    }

    /// Contrast ratio between two luminances
    pub fn contrast_ratio(l1: f64, l2: f64) -> f64 {
        let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Contrast of a (possibly translucent) foreground over a background
    pub fn contrast(fg: &Color, bg: &Color) -> f64 {
        let fg = if fg.is_opaque() { *fg } else { fg.blend_over(bg) };
        Self::contrast_ratio(Self::luminance(&fg), Self::luminance(bg))
    }

    /// WCAG AA: 4.5:1, or 3:1 for large text
    pub fn meets_aa(ratio: f64, large_text: bool) -> bool {
        if large_text { ratio >= 3.0 } else { ratio >= 4.5 }
    }

    /// WCAG AAA: 7:1, or 4.5:1 for large text
    pub fn meets_aaa(ratio: f64, large_text: bool) -> bool {
        if large_text { ratio >= 4.5 } else { ratio >= 7.0 }
    }
}

/// Outcome of a contrast comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastResult {
    pub is_valid: bool,
    pub contrast_ratio: f64,
    pub expected_contrast_ratio: f64,
}

/// Text at least 18pt, or 14pt when bold, is large
pub fn is_large_text(font_size_px: f64, is_bold: bool) -> bool {
    let points = font_size_px * 72.0 / 96.0;
    points >= 18.0 || (is_bold && points >= 14.0)
}

pub fn has_valid_contrast_ratio(bg: &Color, fg: &Color, font_size_px: f64, is_bold: bool) -> ContrastResult {
    let contrast_ratio = ContrastChecker::contrast(fg, bg);
    let large = is_large_text(font_size_px, is_bold);
    let expected_contrast_ratio = if large { 3.0 } else { 4.5 };
    let truncated = (contrast_ratio * 100.0).floor() / 100.0;
    ContrastResult {
        is_valid: truncated >= expected_contrast_ratio,
        contrast_ratio,
        expected_contrast_ratio,
    }
}

/// Product of the opacities of the element and its ancestors in the same
/// document
pub fn get_opacity(tree: &VirtualTree, id: VNodeId) -> f64 {
    chain(tree, id)
        .iter()
        .filter_map(|a| tree.get(*a).and_then(VirtualNode::computed_style))
        .map(|s| s.opacity())
        .product()
}

fn chain(tree: &VirtualTree, id: VNodeId) -> Vec<VNodeId> {
    let document = tree.get(id).map(|n| tree.document_scope(n.scope()));
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .take_while(|a| tree.get(*a).map(|n| tree.document_scope(n.scope())) == document)
        .filter(|a| tree.get(*a).is_some_and(VirtualNode::is_element))
        .collect()
}

/// Background painted by one element, faded by its own opacity
fn own_background(node: &VirtualNode) -> Option<Color> {
    let style = node.computed_style()?;
    let color = style.background_color();
    Some(color.with_alpha(color.alpha * style.opacity()))
}

/// Elements painted behind the node, the node first. Uses the element
/// stack when layout is available, the ancestor chain otherwise.
fn background_stack(tree: &VirtualTree, id: VNodeId) -> Vec<VNodeId> {
    let stack = get_element_stack(tree, id);
    match stack.iter().position(|e| *e == id) {
        Some(start) => stack[start..].to_vec(),
        None => chain(tree, id),
    }
}

/// Opaque color behind the element's text, or `None` (with the reason
/// recorded) when an image or a partial overlap makes it unknowable
pub fn get_background_color(tree: &VirtualTree, id: VNodeId) -> Option<Color> {
    let rect = tree.get(id).and_then(VirtualNode::bounding_client_rect);
    let mut layers = Vec::new();
    for element in background_stack(tree, id) {
        let Some(node) = tree.get(element) else { continue };
        let Some(style) = node.computed_style() else { continue };
        if let Some(image) = style.background_image() {
            let reason = if image.contains("gradient(") {
                IncompleteReason::BgGradient
            } else {
                IncompleteReason::BgImage
            };
            set_incomplete_reason(tree, ColorKind::Background, Some(reason));
            return None;
        }
        let Some(color) = own_background(node) else { continue };
        if color.is_transparent() {
            continue;
        }
        let covers = tree.contains(element, id)
            || match (node.bounding_client_rect(), rect) {
                (Some(own), Some(target)) => own.contains_rect(&target),
                _ => true,
            };
        if !covers {
            set_incomplete_reason(tree, ColorKind::Background, Some(IncompleteReason::BgOverlap));
            return None;
        }
        layers.push(color);
        if color.is_opaque() {
            break;
        }
    }
    let color = layers
        .iter()
        .rev()
        .fold(Color::WHITE, |backdrop, layer| layer.blend_over(&backdrop));
    Some(color)
}

/// Opaque text color, blended over `bg_color` (or the computed background)
/// when the text is translucent
pub fn get_foreground_color(tree: &VirtualTree, id: VNodeId, bg_color: Option<Color>) -> Option<Color> {
    let node = tree.get(id)?;
    let style = node.computed_style()?;
    let color = style.color();
    let fg = color.with_alpha(color.alpha * get_opacity(tree, id));
    if fg.is_opaque() {
        return Some(fg);
    }
    let bg = match bg_color.or_else(|| get_background_color(tree, id)) {
        Some(bg) => bg,
        None => {
            set_incomplete_reason(tree, ColorKind::Foreground, incomplete_reason(tree, ColorKind::Background));
            return None;
        }
    };
    Some(fg.blend_over(&bg))
}

/// Colors of the element's text shadows, with alpha estimated from how far
/// the blur spreads relative to the font size. Shadows offset further
/// than their blur do not sit behind the glyphs and come back transparent.
pub fn get_text_shadow_colors(tree: &VirtualTree, id: VNodeId) -> Vec<Color> {
    let Some(style) = tree.get(id).and_then(VirtualNode::computed_style) else {
        return Vec::new();
    };
    let font_size = style.font_size();
    let cx = LengthContext {
        font_size,
        ..LengthContext::default()
    };
    let current = style.color();
    style
        .text_shadows()
        .unwrap_or_default()
        .into_iter()
        .map(|shadow| {
            let color = shadow.color.unwrap_or(current);
            let blur = shadow.blur.to_px(&cx);
            let offset_x = shadow.offset_x.to_px(&cx).abs();
            let offset_y = shadow.offset_y.to_px(&cx).abs();
            if offset_x > blur || offset_y > blur {
                return color.with_alpha(0.0);
            }
            color.with_alpha(blur_alpha(blur, font_size) * color.alpha)
        })
        .collect()
}

/// Estimated coverage of a shadow blurred by `blur` pixels. A sharp
/// shadow covers fully.
fn blur_alpha(blur: f64, font_size: f64) -> f64 {
    if blur == 0.0 {
        return 1.0;
    }
    0.185 / (blur / font_size + 0.4)
}
