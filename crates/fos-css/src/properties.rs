//! CSS Property Values
//!
//! Typed views over the computed property strings: lengths, the keyword
//! properties layout and visibility depend on, and shadow lists.

use crate::Color;

/// Length unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Em,
    Rem,
    Percent,
    Pt,
    Vw,
    Vh,
}

/// CSS length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

/// Context needed to resolve relative lengths
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthContext {
    pub font_size: f64,
    pub root_font_size: f64,
    pub percent_base: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for LengthContext {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            root_font_size: 16.0,
            percent_base: 0.0,
            viewport_width: 1280.0,
            viewport_height: 1024.0,
        }
    }
}

impl Length {
    /// Pixel length
    pub fn px(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::Px,
        }
    }

    /// Parse `12px`, `1.5em`, `50%`, `0`
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim().to_ascii_lowercase();
        let (number, unit) = if let Some(n) = s.strip_suffix("rem") {
            (n, LengthUnit::Rem)
        } else if let Some(n) = s.strip_suffix("em") {
            (n, LengthUnit::Em)
        } else if let Some(n) = s.strip_suffix("px") {
            (n, LengthUnit::Px)
        } else if let Some(n) = s.strip_suffix("pt") {
            (n, LengthUnit::Pt)
        } else if let Some(n) = s.strip_suffix("vw") {
            (n, LengthUnit::Vw)
        } else if let Some(n) = s.strip_suffix("vh") {
            (n, LengthUnit::Vh)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, LengthUnit::Percent)
        } else {
            // Unitless lengths are only valid for zero
            let value: f64 = s.parse().ok()?;
            return (value == 0.0).then(|| Self::px(0.0));
        };
        let value = number.trim().parse().ok()?;
        Some(Self { value, unit })
    }

    /// Resolve to pixels
    pub fn to_px(&self, cx: &LengthContext) -> f64 {
        match self.unit {
            LengthUnit::Px => self.value,
            LengthUnit::Em => self.value * cx.font_size,
            LengthUnit::Rem => self.value * cx.root_font_size,
            LengthUnit::Percent => self.value / 100.0 * cx.percent_base,
            LengthUnit::Pt => self.value * 4.0 / 3.0,
            LengthUnit::Vw => self.value / 100.0 * cx.viewport_width,
            LengthUnit::Vh => self.value / 100.0 * cx.viewport_height,
        }
    }
}

/// Display keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    None,
    #[default]
    Inline,
    Block,
    InlineBlock,
    Flex,
    InlineFlex,
    Grid,
    Contents,
    ListItem,
    Table,
    TableRow,
    TableCell,
}

impl Display {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "none" => Self::None,
            "block" | "flow-root" => Self::Block,
            "inline-block" => Self::InlineBlock,
            "flex" => Self::Flex,
            "inline-flex" => Self::InlineFlex,
            "grid" => Self::Grid,
            "contents" => Self::Contents,
            "list-item" => Self::ListItem,
            "table" => Self::Table,
            "table-row" => Self::TableRow,
            "table-cell" => Self::TableCell,
            _ => Self::Inline,
        }
    }

    /// Participates in inline layout
    pub fn is_inline_level(self) -> bool {
        matches!(self, Self::Inline | Self::InlineBlock | Self::InlineFlex)
    }
}

/// Position keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "relative" => Self::Relative,
            "absolute" => Self::Absolute,
            "fixed" => Self::Fixed,
            "sticky" => Self::Sticky,
            _ => Self::Static,
        }
    }
}

/// Overflow keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Clip,
    Scroll,
    Auto,
}

impl Overflow {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "hidden" => Self::Hidden,
            "clip" => Self::Clip,
            "scroll" => Self::Scroll,
            "auto" | "overlay" => Self::Auto,
            _ => Self::Visible,
        }
    }

    /// User can scroll this axis
    pub fn is_scrollable(self) -> bool {
        matches!(self, Self::Scroll | Self::Auto)
    }
}

/// Visibility keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

impl Visibility {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "hidden" => Self::Hidden,
            "collapse" => Self::Collapse,
            _ => Self::Visible,
        }
    }
}

/// One entry of a `text-shadow` list
#[derive(Debug, Clone, PartialEq)]
pub struct TextShadow {
    pub offset_x: Length,
    pub offset_y: Length,
    pub blur: Length,
    /// `None` means currentcolor
    pub color: Option<Color>,
}

/// Split on top-level commas (commas inside functions are kept)
pub fn split_top_level(value: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut current = String::new();
    for c in value.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if c == separator && depth == 0 {
            parts.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Tokens separated by top-level whitespace
pub fn split_tokens(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut depth = 0;
    let mut current = String::new();
    for c in value.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse a `text-shadow` value. Returns `None` on malformed input.
pub fn parse_text_shadows(value: &str) -> Option<Vec<TextShadow>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Some(Vec::new());
    }
    split_top_level(value, ',')
        .iter()
        .map(|entry| {
            let mut lengths = Vec::new();
            let mut color = None;
            for token in split_tokens(entry) {
                if let Some(length) = Length::parse(&token) {
                    lengths.push(length);
                } else if token.eq_ignore_ascii_case("currentcolor") {
                    color = None;
                } else {
                    color = Some(Color::parse(&token).ok()?);
                }
            }
            if !(2..=3).contains(&lengths.len()) {
                return None;
            }
            Some(TextShadow {
                offset_x: lengths[0],
                offset_y: lengths[1],
                blur: lengths.get(2).copied().unwrap_or(Length::px(0.0)),
                color,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_parse() {
        assert_eq!(Length::parse("12px"), Some(Length::px(12.0)));
        assert_eq!(
            Length::parse(".2em"),
            Some(Length {
                value: 0.2,
                unit: LengthUnit::Em
            })
        );
        assert_eq!(Length::parse("0"), Some(Length::px(0.0)));
        assert_eq!(Length::parse("12"), None);
        assert_eq!(Length::parse("auto"), None);
    }

    #[test]
    fn test_length_to_px() {
        let cx = LengthContext {
            font_size: 20.0,
            percent_base: 200.0,
            ..LengthContext::default()
        };
        assert_eq!(Length::parse("2em").unwrap().to_px(&cx), 40.0);
        assert_eq!(Length::parse("1rem").unwrap().to_px(&cx), 16.0);
        assert_eq!(Length::parse("50%").unwrap().to_px(&cx), 100.0);
        assert_eq!(Length::parse("12pt").unwrap().to_px(&cx), 16.0);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(Display::parse("none"), Display::None);
        assert!(Display::parse("inline-block").is_inline_level());
        assert_eq!(Position::parse("fixed"), Position::Fixed);
        assert!(Overflow::parse("auto").is_scrollable());
        assert!(!Overflow::parse("hidden").is_scrollable());
        assert_eq!(Visibility::parse("collapse"), Visibility::Collapse);
    }

    #[test]
    fn test_text_shadow_list() {
        let shadows = parse_text_shadows("1px 1px 2px red, blue 0 0 1em, 0 0 0.2em green").unwrap();
        assert_eq!(shadows.len(), 3);
        assert_eq!(shadows[0].color, Some(Color::rgb(255.0, 0.0, 0.0)));
        assert_eq!(shadows[1].color, Some(Color::rgb(0.0, 0.0, 255.0)));
        assert_eq!(shadows[1].blur.unit, LengthUnit::Em);
        assert_eq!(shadows[2].color, Some(Color::rgb(0.0, 128.0, 0.0)));
        assert_eq!(parse_text_shadows("none"), Some(Vec::new()));
        assert_eq!(parse_text_shadows("1px red"), None);
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("rgb(1, 2, 3) 1px, red 2px", ','),
            vec!["rgb(1, 2, 3) 1px".to_string(), "red 2px".to_string()]
        );
        assert_eq!(split_tokens("rgb(1, 2, 3) 1px"), vec!["rgb(1, 2, 3)", "1px"]);
    }
}
