//! fOS CSS Parser & Style System
//!
//! Selector parsing and matching, color and length values, and the cascade
//! that produces computed styles for host DOM elements.

mod parser;
mod cascade;
mod color;
mod computed;
mod dom_element;
mod selector_parser;
pub mod properties;
pub mod selectors;

pub use parser::CssParser;
pub use cascade::StyleResolver;
pub use color::{is_color_token, Color};
pub use computed::ComputedStyle;
pub use dom_element::DomElement;
pub use properties::{Display, Length, LengthContext, LengthUnit, Overflow, Position, TextShadow, Visibility};
pub use selector_parser::{escape_identifier, escape_string, parse_selector_list};
pub use selectors::{SelectorElement, SelectorList};

/// Parse a CSS stylesheet
pub fn parse_stylesheet(css: &str) -> Result<Stylesheet, CssError> {
    CssParser::new().parse(css)
}

/// Parsed stylesheet
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Number of style rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// CSS rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub selectors: SelectorList,
    pub declarations: Vec<Declaration>,
}

/// Selector specificity (a, b, c)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl std::ops::Add for Specificity {
    type Output = Specificity;

    fn add(self, rhs: Self) -> Self::Output {
        Specificity(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

/// CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// CSS parsing error
#[derive(Debug, Clone, thiserror::Error)]
pub enum CssError {
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: u32, message: String },

    #[error("Invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid color: {0}")]
    InvalidColor(String),
}
