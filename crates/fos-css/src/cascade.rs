//! Style Cascade & Resolver
//!
//! Computes the final styles for DOM elements by:
//! 1. Matching selectors against elements
//! 2. Sorting by importance, origin, specificity and source order
//! 3. Applying declarations, expanding shorthands and resolving relative values

use crate::computed::{parse_font_weight, INHERITED_PROPERTIES, INITIAL_VALUES};
use crate::properties::split_tokens;
use crate::{
    is_color_token, ComputedStyle, CssParser, Declaration, DomElement, Length, LengthContext,
    Specificity, Stylesheet,
};
use fos_dom::{Document, DomTree, NodeData, NodeId};
use std::collections::HashMap;

const UA_STYLESHEET: &str = r#"
html, body, div, p, h1, h2, h3, h4, h5, h6, ul, ol, dl, dt, dd, form, fieldset,
header, footer, section, article, nav, aside, main, figure, figcaption, blockquote,
pre, address, details, summary, hr, caption, legend, menu, search, hgroup, dialog { display: block }
li { display: list-item }
table { display: table }
tr { display: table-row }
td, th { display: table-cell }
img, input, button, select, textarea, video, iframe, canvas, object, embed, meter, progress { display: inline-block }
head, script, style, template, title, meta, link, noscript, base, datalist, param, area { display: none }
[hidden], input[type=hidden], dialog:not([open]) { display: none }
h1 { font-size: 2em; font-weight: bold }
h2 { font-size: 1.5em; font-weight: bold }
h3 { font-size: 1.17em; font-weight: bold }
h4 { font-weight: bold }
h5 { font-size: 0.83em; font-weight: bold }
h6 { font-size: 0.67em; font-weight: bold }
b, strong, th { font-weight: bold }
button, input, select, textarea { font-size: 13.333px }
a:link { color: #0000ee }
"#;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    UserAgent,
    Author,
    Inline,
}

/// (important, origin, specificity, source order, declaration)
type CascadeEntry<'a> = (bool, Origin, Specificity, usize, &'a Declaration);

fn collect_matches<'a>(
    element: &DomElement<'_>,
    sheet: &'a Stylesheet,
    origin: Origin,
    order: &mut usize,
    matches: &mut Vec<CascadeEntry<'a>>,
) {
    for rule in &sheet.rules {
        if let Some(specificity) = rule.selectors.matching_specificity(element) {
            for decl in &rule.declarations {
                *order += 1;
                matches.push((decl.important, origin, specificity, *order, decl));
            }
        }
    }
}

/// Style resolver - computes styles for DOM elements
#[derive(Debug, Clone)]
pub struct StyleResolver {
    /// User agent stylesheet (browser defaults)
    ua_styles: Stylesheet,
    /// Author stylesheets keyed by the tree root (document or shadow root) they apply to
    author_styles: HashMap<NodeId, Vec<Stylesheet>>,
    parser: CssParser,
}

impl StyleResolver {
    pub fn new() -> Self {
        let parser = CssParser::new();
        let ua_styles = parser.parse(UA_STYLESHEET).unwrap_or_else(|e| {
            tracing::error!("User agent stylesheet failed to parse: {}", e);
            Stylesheet::default()
        });
        Self {
            ua_styles,
            author_styles: HashMap::new(),
            parser,
        }
    }

    /// Resolver with every `<style>` element of the document, scoped to its tree
    pub fn for_document(document: &Document) -> Self {
        let mut resolver = Self::new();
        let tree = document.tree();
        for id in tree.node_ids() {
            if tree.element(id).is_none_or(|e| e.name != "style") {
                continue;
            }
            let scope = tree.tree_root(id);
            if !matches!(
                tree.get(scope).map(|n| &n.data),
                Some(NodeData::Document | NodeData::ShadowRoot(_))
            ) {
                continue;
            }
            match resolver.parser.parse(&tree.text_content(id)) {
                Ok(sheet) => resolver.add_stylesheet(scope, sheet),
                Err(e) => tracing::warn!("Ignoring stylesheet in {}: {}", document.url(), e),
            }
        }
        resolver
    }

    /// Add an author stylesheet for one tree scope
    pub fn add_stylesheet(&mut self, scope: NodeId, stylesheet: Stylesheet) {
        self.author_styles.entry(scope).or_default().push(stylesheet);
    }

    /// Compute styles for an element given its parent's computed style
    pub fn compute_style(&self, tree: &DomTree, node_id: NodeId, parent: Option<&ComputedStyle>) -> ComputedStyle {
        let mut style = match parent {
            Some(parent) => ComputedStyle::inherit_from(parent),
            None => ComputedStyle::initial(),
        };
        let Some(element) = DomElement::new(tree, node_id) else {
            return style;
        };

        // Collect all matching declarations with their cascade keys
        let mut matches: Vec<CascadeEntry<'_>> = Vec::new();
        let mut order = 0;
        collect_matches(&element, &self.ua_styles, Origin::UserAgent, &mut order, &mut matches);
        if let Some(sheets) = self.author_styles.get(&tree.tree_root(node_id)) {
            for sheet in sheets {
                collect_matches(&element, sheet, Origin::Author, &mut order, &mut matches);
            }
        }
        let inline = tree
            .element(node_id)
            .and_then(|e| e.get_attr("style"))
            .map(|s| self.parser.parse_declarations(s))
            .unwrap_or_default();
        for decl in &inline {
            order += 1;
            matches.push((decl.important, Origin::Inline, Specificity::default(), order, decl));
        }

        matches.sort_by_key(|(important, origin, specificity, order, _)| {
            (*important, *origin, *specificity, *order)
        });

        for (_, _, _, _, decl) in matches {
            self.apply_declaration(&mut style, parent, decl);
        }

        // currentcolor resolves against the final color
        let color = style.get_or("color", "#000000").to_string();
        for (name, value) in [
            ("background-color", style.get("background-color").map(str::to_string)),
            ("border-color", style.get("border-color").map(str::to_string)),
        ] {
            if value.is_some_and(|v| v.eq_ignore_ascii_case("currentcolor")) {
                style.set(name, &color);
            }
        }
        style
    }

    /// Compute the style of `node_id` by cascading from the top of its tree.
    /// Shadow-tree nodes inherit through their host.
    pub fn compute_chain(&self, tree: &DomTree, node_id: NodeId) -> ComputedStyle {
        let mut chain = Vec::new();
        let mut current = Some(node_id);
        while let Some(id) = current {
            match tree.get(id).map(|n| &n.data) {
                Some(NodeData::Element(_)) => {
                    chain.push(id);
                    current = tree.parent(id);
                }
                Some(NodeData::ShadowRoot(root)) => current = Some(root.host),
                _ => current = None,
            }
        }
        let mut style: Option<ComputedStyle> = None;
        for id in chain.into_iter().rev() {
            style = Some(self.compute_style(tree, id, style.as_ref()));
        }
        style.unwrap_or_default()
    }

    fn apply_declaration(&self, style: &mut ComputedStyle, parent: Option<&ComputedStyle>, decl: &Declaration) {
        let property = decl.property.as_str();
        let value = decl.value.trim();

        match value.to_ascii_lowercase().as_str() {
            "inherit" => return Self::inherit(style, parent, property),
            "initial" => return Self::reset(style, property),
            "unset" => {
                if INHERITED_PROPERTIES.contains(&property) {
                    Self::inherit(style, parent, property);
                } else {
                    Self::reset(style, property);
                }
                return;
            }
            _ => {}
        }

        let parent_font_size = parent.map(ComputedStyle::font_size).unwrap_or(16.0);
        match property {
            "margin" | "padding" => {
                for (side, v) in expand_sides(value) {
                    style.set(&format!("{}-{}", property, side), &v);
                }
            }
            "border-width" => {
                for (side, v) in expand_sides(value) {
                    style.set(&format!("border-{}-width", side), &border_width(&v));
                }
            }
            "border-style" => {
                for (side, v) in expand_sides(value) {
                    style.set(&format!("border-{}-style", side), &v);
                }
            }
            "border" => {
                for side in ["top", "right", "bottom", "left"] {
                    apply_border_side(style, side, value);
                }
            }
            "border-top" | "border-right" | "border-bottom" | "border-left" => {
                apply_border_side(style, &property["border-".len()..], value);
            }
            "overflow" => {
                let tokens = split_tokens(value);
                let x = tokens.first().cloned().unwrap_or_else(|| "visible".into());
                let y = tokens.get(1).cloned().unwrap_or_else(|| x.clone());
                style.set("overflow-x", &x);
                style.set("overflow-y", &y);
            }
            "background" => {
                style.set("background-color", "transparent");
                style.set("background-image", "none");
                for token in split_tokens(value) {
                    let lower = token.to_ascii_lowercase();
                    if lower.starts_with("url(") || lower.contains("gradient(") {
                        style.set("background-image", &token);
                    } else if is_color_token(&token) {
                        style.set("background-color", &token);
                    }
                }
            }
            "font-size" => style.set("font-size", &format!("{}px", resolve_font_size(value, parent_font_size))),
            "font-weight" => {
                let parent_weight = parent.map(ComputedStyle::font_weight).unwrap_or(400);
                style.set("font-weight", &parse_font_weight(value, parent_weight).to_string());
            }
            "color" if value.eq_ignore_ascii_case("currentcolor") => {
                Self::inherit(style, parent, "color");
            }
            _ => style.set(property, value),
        }
    }

    fn inherit(style: &mut ComputedStyle, parent: Option<&ComputedStyle>, property: &str) {
        match parent.and_then(|p| p.get(property)) {
            Some(value) => {
                let value = value.to_string();
                style.set(property, &value);
            }
            None => Self::reset(style, property),
        }
    }

    fn reset(style: &mut ComputedStyle, property: &str) {
        if let Some((_, initial)) = INITIAL_VALUES.iter().find(|(name, _)| *name == property) {
            style.set(property, initial);
        }
    }
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand a 1-4 value box shorthand into (side, value) pairs
fn expand_sides(value: &str) -> Vec<(&'static str, String)> {
    let tokens = split_tokens(value);
    let get = |i: usize| tokens.get(i).cloned().unwrap_or_else(|| "0".into());
    let (top, right, bottom, left) = match tokens.len() {
        0 => return Vec::new(),
        1 => (get(0), get(0), get(0), get(0)),
        2 => (get(0), get(1), get(0), get(1)),
        3 => (get(0), get(1), get(2), get(1)),
        _ => (get(0), get(1), get(2), get(3)),
    };
    vec![("top", top), ("right", right), ("bottom", bottom), ("left", left)]
}

fn border_width(value: &str) -> String {
    match value {
        "thin" => "1px".into(),
        "medium" => "3px".into(),
        "thick" => "5px".into(),
        other => other.to_string(),
    }
}

fn apply_border_side(style: &mut ComputedStyle, side: &str, value: &str) {
    let mut width = "3px".to_string();
    let mut border_style = "none".to_string();
    for token in split_tokens(value) {
        if Length::parse(&token).is_some() || matches!(token.as_str(), "thin" | "medium" | "thick") {
            width = border_width(&token);
        } else if is_color_token(&token) {
            style.set("border-color", &token);
        } else {
            border_style = token;
        }
    }
    style.set(&format!("border-{}-width", side), &width);
    style.set(&format!("border-{}-style", side), &border_style);
}

/// Resolve a font-size value to pixels
fn resolve_font_size(value: &str, parent: f64) -> f64 {
    match value {
        "xx-small" => 9.0,
        "x-small" => 10.0,
        "small" => 13.0,
        "medium" => 16.0,
        "large" => 18.0,
        "x-large" => 24.0,
        "xx-large" => 32.0,
        "xxx-large" => 48.0,
        "smaller" => parent / 1.2,
        "larger" => parent * 1.2,
        other => Length::parse(other)
            .map(|length| {
                length.to_px(&LengthContext {
                    font_size: parent,
                    percent_base: parent,
                    ..LengthContext::default()
                })
            })
            .unwrap_or(parent),
    }
}
