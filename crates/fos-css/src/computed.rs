//! Computed style
//!
//! Property values after cascade and inheritance, stored as normalized
//! strings with typed accessors for the properties the auditor reads.

use crate::properties::{parse_text_shadows, TextShadow};
use crate::{Color, Display, Length, LengthContext, Overflow, Position, Visibility};
use std::collections::HashMap;

/// Properties inherited from the parent element
pub const INHERITED_PROPERTIES: &[&str] = &[
    "color",
    "cursor",
    "direction",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "letter-spacing",
    "line-height",
    "text-align",
    "text-indent",
    "text-shadow",
    "text-transform",
    "visibility",
    "white-space",
    "word-spacing",
    "pointer-events",
];

/// Initial values of the properties we track
pub const INITIAL_VALUES: &[(&str, &str)] = &[
    ("display", "inline"),
    ("position", "static"),
    ("visibility", "visible"),
    ("opacity", "1"),
    ("overflow-x", "visible"),
    ("overflow-y", "visible"),
    ("color", "#000000"),
    ("background-color", "transparent"),
    ("background-image", "none"),
    ("font-size", "16px"),
    ("font-weight", "400"),
    ("font-style", "normal"),
    ("text-shadow", "none"),
    ("line-height", "normal"),
    ("z-index", "auto"),
    ("pointer-events", "auto"),
    ("mix-blend-mode", "normal"),
];

/// Computed style for one element
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    props: HashMap<String, String>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self::initial()
    }
}

impl ComputedStyle {
    /// Style holding only initial values
    pub fn initial() -> Self {
        Self {
            props: INITIAL_VALUES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Initial values plus the inherited properties of `parent`
    pub fn inherit_from(parent: &ComputedStyle) -> Self {
        let mut style = Self::initial();
        for name in INHERITED_PROPERTIES {
            if let Some(value) = parent.get(name) {
                style.set(name, value);
            }
        }
        style
    }

    /// Raw property value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(String::as_str)
    }

    /// Raw property value with a fallback
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Set a property value
    pub fn set(&mut self, name: &str, value: &str) {
        self.props.insert(name.to_string(), value.trim().to_string());
    }

    pub fn display(&self) -> Display {
        Display::parse(self.get_or("display", "inline"))
    }

    pub fn position(&self) -> Position {
        Position::parse(self.get_or("position", "static"))
    }

    pub fn visibility(&self) -> Visibility {
        Visibility::parse(self.get_or("visibility", "visible"))
    }

    pub fn overflow_x(&self) -> Overflow {
        Overflow::parse(self.get_or("overflow-x", "visible"))
    }

    pub fn overflow_y(&self) -> Overflow {
        Overflow::parse(self.get_or("overflow-y", "visible"))
    }

    /// Own opacity (not cumulative)
    pub fn opacity(&self) -> f64 {
        let raw = self.get_or("opacity", "1");
        let value = match raw.strip_suffix('%') {
            Some(percent) => percent.parse::<f64>().map(|p| p / 100.0),
            None => raw.parse::<f64>(),
        };
        value.unwrap_or(1.0).clamp(0.0, 1.0)
    }

    /// Text color
    pub fn color(&self) -> Color {
        Color::parse(self.get_or("color", "#000000")).unwrap_or(Color::BLACK)
    }

    /// Background color; unparseable values are treated as transparent
    pub fn background_color(&self) -> Color {
        Color::parse(self.get_or("background-color", "transparent")).unwrap_or(Color::TRANSPARENT)
    }

    /// Background image value, `None` when absent
    pub fn background_image(&self) -> Option<&str> {
        self.get("background-image")
            .filter(|v| !v.is_empty() && *v != "none")
    }

    /// Font size in pixels
    pub fn font_size(&self) -> f64 {
        Length::parse(self.get_or("font-size", "16px"))
            .map(|l| l.to_px(&LengthContext::default()))
            .unwrap_or(16.0)
    }

    /// Numeric font weight
    pub fn font_weight(&self) -> u32 {
        parse_font_weight(self.get_or("font-weight", "400"), 400)
    }

    pub fn is_italic(&self) -> bool {
        matches!(self.get_or("font-style", "normal"), "italic" | "oblique")
    }

    /// Parsed text shadows; `None` if the value is malformed
    pub fn text_shadows(&self) -> Option<Vec<TextShadow>> {
        parse_text_shadows(self.get_or("text-shadow", "none"))
    }

    /// Stacking order, `None` for `auto`
    pub fn z_index(&self) -> Option<i32> {
        self.get("z-index").and_then(|v| v.parse().ok())
    }

    /// Resolve a length-valued property to pixels
    pub fn length_px(&self, name: &str, percent_base: f64) -> Option<f64> {
        let cx = LengthContext {
            font_size: self.font_size(),
            percent_base,
            ..LengthContext::default()
        };
        self.get(name)
            .and_then(Length::parse)
            .map(|length| length.to_px(&cx))
    }

    /// Number of stored properties
    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

/// Parse a font-weight keyword or number relative to the parent's weight
pub fn parse_font_weight(value: &str, parent: u32) -> u32 {
    match value.trim() {
        "normal" => 400,
        "bold" => 700,
        "bolder" => {
            if parent < 400 {
                400
            } else if parent < 600 {
                700
            } else {
                900
            }
        }
        "lighter" => {
            if parent < 600 {
                100
            } else if parent < 800 {
                400
            } else {
                700
            }
        }
        other => other.parse().unwrap_or(400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_values() {
        let style = ComputedStyle::initial();
        assert_eq!(style.display(), Display::Inline);
        assert_eq!(style.font_size(), 16.0);
        assert_eq!(style.font_weight(), 400);
        assert_eq!(style.opacity(), 1.0);
        assert_eq!(style.color(), Color::BLACK);
        assert!(style.background_color().is_transparent());
        assert!(style.background_image().is_none());
    }

    #[test]
    fn test_inheritance_is_selective() {
        let mut parent = ComputedStyle::initial();
        parent.set("color", "#ff0000");
        parent.set("opacity", "0.5");
        parent.set("font-size", "20px");
        let child = ComputedStyle::inherit_from(&parent);
        assert_eq!(child.color(), Color::rgb(255.0, 0.0, 0.0));
        assert_eq!(child.font_size(), 20.0);
        assert_eq!(child.opacity(), 1.0);
    }

    #[test]
    fn test_font_weight_keywords() {
        assert_eq!(parse_font_weight("bold", 400), 700);
        assert_eq!(parse_font_weight("bolder", 700), 900);
        assert_eq!(parse_font_weight("lighter", 400), 100);
        assert_eq!(parse_font_weight("600", 400), 600);
    }

    #[test]
    fn test_length_px() {
        let mut style = ComputedStyle::initial();
        style.set("width", "50%");
        style.set("height", "2em");
        assert_eq!(style.length_px("width", 300.0), Some(150.0));
        assert_eq!(style.length_px("height", 0.0), Some(32.0));
        assert_eq!(style.length_px("margin-top", 0.0), None);
    }
}
