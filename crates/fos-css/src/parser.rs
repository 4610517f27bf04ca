//! CSS Parser using lightningcss
//!
//! Parses `<style>` sheets and `style` attributes. lightningcss does the
//! tokenizing and value normalization; declarations are kept as
//! property-name/value strings and selectors are re-parsed into our own AST
//! so the same matcher runs everywhere.

use crate::{parse_selector_list, CssError, Declaration, Rule, Stylesheet};
use lightningcss::declaration::DeclarationBlock;
use lightningcss::properties::Property;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleAttribute, StyleSheet};
use lightningcss::traits::ToCss;

/// CSS Parser
#[derive(Debug, Clone, Copy)]
pub struct CssParser;

impl CssParser {
    pub fn new() -> Self {
        Self
    }

    fn options<'i>() -> ParserOptions<'i> {
        ParserOptions {
            error_recovery: true,
            ..ParserOptions::default()
        }
    }

    /// Parse a CSS stylesheet. Rules whose selectors we cannot match are skipped.
    pub fn parse(&self, css: &str) -> Result<Stylesheet, CssError> {
        use lightningcss::rules::CssRule;

        let stylesheet = StyleSheet::parse(css, Self::options()).map_err(|e| CssError::ParseError {
            line: e.loc.as_ref().map(|l| l.line).unwrap_or(0),
            message: e.kind.to_string(),
        })?;

        let mut result = Stylesheet::default();
        for rule in stylesheet.rules.0.iter() {
            // Skip other rule types (media queries, keyframes, etc.)
            let CssRule::Style(style_rule) = rule else {
                continue;
            };
            let selector_text = match style_rule.selectors.to_css_string(PrinterOptions::default()) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("Skipping unprintable selector: {}", e);
                    continue;
                }
            };
            match parse_selector_list(&selector_text) {
                Ok(selectors) => result.rules.push(Rule {
                    selectors,
                    declarations: self.convert_declarations(&style_rule.declarations),
                }),
                Err(e) => tracing::debug!("Skipping unsupported selector {}: {}", selector_text, e),
            }
        }
        Ok(result)
    }

    /// Parse the contents of a `style` attribute. Malformed input yields no declarations.
    pub fn parse_declarations(&self, style: &str) -> Vec<Declaration> {
        if style.trim().is_empty() {
            return Vec::new();
        }
        match StyleAttribute::parse(style, Self::options()) {
            Ok(attribute) => self.convert_declarations(&attribute.declarations),
            Err(e) => {
                tracing::warn!("Ignoring unparseable style attribute {:?}: {}", style, e.kind);
                Vec::new()
            }
        }
    }

    fn convert_declarations(&self, declarations: &DeclarationBlock) -> Vec<Declaration> {
        let mut result = Vec::new();

        for decl in declarations.declarations.iter() {
            result.extend(self.convert_declaration(decl, false));
        }
        for decl in declarations.important_declarations.iter() {
            result.extend(self.convert_declaration(decl, true));
        }

        result
    }

    fn convert_declaration(&self, decl: &Property, important: bool) -> Option<Declaration> {
        let property = decl.property_id().name().to_ascii_lowercase();
        match decl.value_to_css_string(PrinterOptions::default()) {
            Ok(value) => Some(Declaration {
                property,
                value,
                important,
            }),
            Err(e) => {
                tracing::debug!("Dropping declaration {}: {}", property, e);
                None
            }
        }
    }
}

impl Default for CssParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let css = r#"
            .foo { display: block; }
            #bar { color: red; }
        "#;

        let result = CssParser::new().parse(css);
        assert!(result.is_ok(), "Parse error: {:?}", result.err());

        let stylesheet = result.unwrap();
        assert_eq!(stylesheet.len(), 2);
    }

    #[test]
    fn test_parse_declarations() {
        let decls = CssParser::new().parse_declarations("height: 30px; margin-bottom: 30px !important");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "height");
        assert_eq!(decls[0].value, "30px");
        assert!(decls[1].important);
    }

    #[test]
    fn test_parse_declarations_empty() {
        assert!(CssParser::new().parse_declarations("   ").is_empty());
    }
}
