//! CSS Selectors Module
//!
//! Selector AST and right-to-left matching against any element type that
//! implements [`SelectorElement`]. The same matcher serves the cascade (over
//! host DOM elements) and the auditor (over virtual nodes).

use crate::Specificity;

/// Element interface needed for selector matching
pub trait SelectorElement: Sized {
    /// Local name (lowercase for HTML elements)
    fn local_name(&self) -> &str;

    /// Attribute value by name
    fn attr(&self, name: &str) -> Option<&str>;

    /// Parent element, `None` at the matching root
    fn parent_element(&self) -> Option<Self>;

    /// Previous sibling element
    fn prev_sibling_element(&self) -> Option<Self>;

    /// Next sibling element
    fn next_sibling_element(&self) -> Option<Self>;

    /// First child element
    fn first_child_element(&self) -> Option<Self>;

    /// Whether the element has no element or text children
    fn is_empty(&self) -> bool;

    /// HTML elements match type and attribute names case-insensitively
    fn is_html(&self) -> bool {
        true
    }

    /// ID attribute
    fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Class membership
    fn has_class(&self, name: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|class| class == name))
    }

    /// Whether this is the root element of its tree
    fn is_root(&self) -> bool {
        self.parent_element().is_none()
    }
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

/// Compound selectors joined by combinators
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    /// Compounds left to right
    pub compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    pub combinators: Vec<Combinator>,
}

/// Sequence of simple selectors that all apply to one element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound(pub Vec<SelectorComponent>);

/// Selector combinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    NextSibling,
    /// `a ~ b`
    SubsequentSibling,
}

/// A component of a selector
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Universal selector *
    Universal,
    /// Type selector (tag name)
    Type(String),
    /// ID selector #id
    Id(String),
    /// Class selector .class
    Class(String),
    /// Attribute selector [attr], [attr=value], etc.
    Attribute(AttributeSelector),
    /// Pseudo-class :first-child, :not(), etc.
    PseudoClass(PseudoClass),
}

/// Pseudo-class type
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    // Link and input pseudo-classes, answered from attributes
    Link,
    Enabled,
    Disabled,
    Checked,
    Required,
    Optional,
    ReadOnly,
    ReadWrite,

    // Tree-structural pseudo-classes
    Root,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    NthChild(NthExpression),
    NthLastChild(NthExpression),
    NthOfType(NthExpression),
    NthLastOfType(NthExpression),

    // Logical pseudo-classes
    Not(SelectorList),
    Is(SelectorList),
    Where(SelectorList),
    Has(SelectorList),

    // Other
    Lang(String),
    Dir(Direction),
}

/// Direction for :dir() pseudo-class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

/// An+B expression for :nth-* selectors
#[derive(Debug, Clone, PartialEq)]
pub struct NthExpression {
    /// Coefficient (A in An+B)
    pub a: i32,
    /// Offset (B in An+B)
    pub b: i32,
}

impl NthExpression {
    /// Create "odd" expression (2n+1)
    pub fn odd() -> Self {
        Self { a: 2, b: 1 }
    }

    /// Create "even" expression (2n)
    pub fn even() -> Self {
        Self { a: 2, b: 0 }
    }

    /// Create a simple index (0n+b)
    pub fn index(n: i32) -> Self {
        Self { a: 0, b: n }
    }

    /// Create An+B expression
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Parse from string like "2n+1", "odd", "even", "3"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();

        match s.as_str() {
            "odd" => return Some(Self::odd()),
            "even" => return Some(Self::even()),
            _ => {}
        }

        // Try to parse as simple number
        if let Ok(n) = s.parse::<i32>() {
            return Some(Self::index(n));
        }

        // Parse An+B format
        let s = s.replace(' ', "");

        if let Some(n_pos) = s.find('n') {
            let a_str = &s[..n_pos];
            let a = if a_str.is_empty() || a_str == "+" {
                1
            } else if a_str == "-" {
                -1
            } else {
                a_str.parse().ok()?
            };

            let rest = &s[n_pos + 1..];
            let b = if rest.is_empty() {
                0
            } else {
                rest.trim_start_matches('+').parse().ok()?
            };

            return Some(Self::new(a, b));
        }

        None
    }

    /// Check if index n (1-based) matches this expression
    pub fn matches(&self, n: i32) -> bool {
        if self.a == 0 {
            return n == self.b;
        }

        let diff = n - self.b;
        if self.a > 0 {
            diff >= 0 && diff % self.a == 0
        } else {
            diff <= 0 && diff % self.a == 0
        }
    }
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Contains(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (&self.matcher, value) {
            (None, Some(_)) => true, // [attr] - just check existence
            (None, None) => false,
            (Some(_), None) => false,
            (Some(matcher), Some(val)) => {
                let fold = |s: &str| {
                    if self.case_insensitive {
                        s.to_lowercase()
                    } else {
                        s.to_string()
                    }
                };
                let val = fold(val);

                match matcher {
                    AttributeMatcher::Exact(expected) => val == fold(expected),
                    AttributeMatcher::Contains(expected) => {
                        let expected = fold(expected);
                        val.split_whitespace().any(|w| w == expected)
                    }
                    AttributeMatcher::DashMatch(expected) => {
                        let expected = fold(expected);
                        val == expected || val.starts_with(&format!("{}-", expected))
                    }
                    // Empty operands never match for the substring family
                    AttributeMatcher::Prefix(expected) => {
                        !expected.is_empty() && val.starts_with(&fold(expected))
                    }
                    AttributeMatcher::Suffix(expected) => {
                        !expected.is_empty() && val.ends_with(&fold(expected))
                    }
                    AttributeMatcher::Substring(expected) => {
                        !expected.is_empty() && val.contains(&fold(expected))
                    }
                }
            }
        }
    }
}

impl SelectorList {
    /// Whether any selector in the list matches
    pub fn matches<E: SelectorElement>(&self, element: &E) -> bool {
        self.0.iter().any(|complex| complex.matches(element))
    }

    /// Highest specificity among the selectors that match
    pub fn matching_specificity<E: SelectorElement>(&self, element: &E) -> Option<Specificity> {
        self.0
            .iter()
            .filter(|complex| complex.matches(element))
            .map(ComplexSelector::specificity)
            .max()
    }

    /// Highest specificity in the list
    pub fn max_specificity(&self) -> Specificity {
        self.0
            .iter()
            .map(ComplexSelector::specificity)
            .max()
            .unwrap_or_default()
    }
}

impl ComplexSelector {
    /// Match right-to-left, backtracking over descendant and sibling combinators
    pub fn matches<E: SelectorElement>(&self, element: &E) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.match_from(n - 1, element),
        }
    }

    fn match_from<E: SelectorElement>(&self, index: usize, element: &E) -> bool {
        if !self.compounds[index].matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => element
                .parent_element()
                .is_some_and(|parent| self.match_from(index - 1, &parent)),
            Combinator::Descendant => {
                let mut current = element.parent_element();
                while let Some(ancestor) = current {
                    if self.match_from(index - 1, &ancestor) {
                        return true;
                    }
                    current = ancestor.parent_element();
                }
                false
            }
            Combinator::NextSibling => element
                .prev_sibling_element()
                .is_some_and(|sibling| self.match_from(index - 1, &sibling)),
            Combinator::SubsequentSibling => {
                let mut current = element.prev_sibling_element();
                while let Some(sibling) = current {
                    if self.match_from(index - 1, &sibling) {
                        return true;
                    }
                    current = sibling.prev_sibling_element();
                }
                false
            }
        }
    }

    /// Selector specificity (ids, classes, types)
    pub fn specificity(&self) -> Specificity {
        self.compounds
            .iter()
            .fold(Specificity::default(), |acc, compound| acc + compound.specificity())
    }
}

impl Compound {
    /// All components match
    pub fn matches<E: SelectorElement>(&self, element: &E) -> bool {
        self.0.iter().all(|component| match_component(component, element))
    }

    fn specificity(&self) -> Specificity {
        self.0.iter().fold(Specificity::default(), |acc, component| {
            acc + match component {
                SelectorComponent::Universal => Specificity::default(),
                SelectorComponent::Type(_) => Specificity(0, 0, 1),
                SelectorComponent::Id(_) => Specificity(1, 0, 0),
                SelectorComponent::Class(_) | SelectorComponent::Attribute(_) => Specificity(0, 1, 0),
                SelectorComponent::PseudoClass(PseudoClass::Where(_)) => Specificity::default(),
                SelectorComponent::PseudoClass(
                    PseudoClass::Not(list) | PseudoClass::Is(list) | PseudoClass::Has(list),
                ) => list.max_specificity(),
                SelectorComponent::PseudoClass(_) => Specificity(0, 1, 0),
            }
        })
    }
}

/// Match a selector component against an element
pub fn match_component<E: SelectorElement>(component: &SelectorComponent, element: &E) -> bool {
    match component {
        SelectorComponent::Universal => true,
        SelectorComponent::Type(tag) => {
            if element.is_html() {
                element.local_name().eq_ignore_ascii_case(tag)
            } else {
                element.local_name() == tag
            }
        }
        SelectorComponent::Id(id) => element.id() == Some(id.as_str()),
        SelectorComponent::Class(class) => element.has_class(class),
        SelectorComponent::Attribute(attr) => attr.matches(element.attr(&attr.name)),
        SelectorComponent::PseudoClass(pseudo) => match_pseudo_class(pseudo, element),
    }
}

/// 1-based position among siblings, and sibling count, optionally limited to one type
fn sibling_position<E: SelectorElement>(element: &E, same_type: bool) -> (usize, usize) {
    let name = element.local_name().to_string();
    let counts = |el: &E| !same_type || el.local_name() == name;
    let mut before = 0;
    let mut current = element.prev_sibling_element();
    while let Some(sibling) = current {
        if counts(&sibling) {
            before += 1;
        }
        current = sibling.prev_sibling_element();
    }
    let mut after = 0;
    let mut current = element.next_sibling_element();
    while let Some(sibling) = current {
        if counts(&sibling) {
            after += 1;
        }
        current = sibling.next_sibling_element();
    }
    (before + 1, before + after + 1)
}

fn has_descendant<E: SelectorElement>(element: &E, list: &SelectorList) -> bool {
    let mut child = element.first_child_element();
    while let Some(current) = child {
        if list.matches(&current) || has_descendant(&current, list) {
            return true;
        }
        child = current.next_sibling_element();
    }
    false
}

fn inherited_lang<E: SelectorElement>(element: &E) -> Option<String> {
    if let Some(lang) = element.attr("lang") {
        return Some(lang.to_string());
    }
    let mut parent = element.parent_element();
    while let Some(current) = parent {
        if let Some(lang) = current.attr("lang") {
            return Some(lang.to_string());
        }
        parent = current.parent_element();
    }
    None
}

const FORM_CONTROLS: &[&str] = &["button", "input", "select", "textarea", "optgroup", "option", "fieldset"];

/// Match a pseudo-class against an element
pub fn match_pseudo_class<E: SelectorElement>(pseudo: &PseudoClass, element: &E) -> bool {
    let name = element.local_name();
    match pseudo {
        PseudoClass::Link => {
            matches!(name, "a" | "area") && element.attr("href").is_some()
        }
        PseudoClass::Enabled => FORM_CONTROLS.contains(&name) && element.attr("disabled").is_none(),
        PseudoClass::Disabled => FORM_CONTROLS.contains(&name) && element.attr("disabled").is_some(),
        PseudoClass::Checked => match name {
            "input" => element.attr("checked").is_some(),
            "option" => element.attr("selected").is_some(),
            _ => false,
        },
        PseudoClass::Required => element.attr("required").is_some(),
        PseudoClass::Optional => {
            matches!(name, "input" | "select" | "textarea") && element.attr("required").is_none()
        }
        PseudoClass::ReadOnly => !match_pseudo_class(&PseudoClass::ReadWrite, element),
        PseudoClass::ReadWrite => {
            (matches!(name, "input" | "textarea") && element.attr("readonly").is_none())
                || element.attr("contenteditable").is_some_and(|v| v != "false")
        }

        PseudoClass::Root => element.is_root(),
        PseudoClass::Empty => element.is_empty(),
        PseudoClass::FirstChild => element.prev_sibling_element().is_none(),
        PseudoClass::LastChild => element.next_sibling_element().is_none(),
        PseudoClass::OnlyChild => {
            element.prev_sibling_element().is_none() && element.next_sibling_element().is_none()
        }
        PseudoClass::FirstOfType => sibling_position(element, true).0 == 1,
        PseudoClass::LastOfType => {
            let (index, count) = sibling_position(element, true);
            index == count
        }
        PseudoClass::OnlyOfType => sibling_position(element, true).1 == 1,
        PseudoClass::NthChild(expr) => expr.matches(sibling_position(element, false).0 as i32),
        PseudoClass::NthLastChild(expr) => {
            let (index, count) = sibling_position(element, false);
            expr.matches((count - index + 1) as i32)
        }
        PseudoClass::NthOfType(expr) => expr.matches(sibling_position(element, true).0 as i32),
        PseudoClass::NthLastOfType(expr) => {
            let (index, count) = sibling_position(element, true);
            expr.matches((count - index + 1) as i32)
        }

        PseudoClass::Not(list) => !list.matches(element),
        PseudoClass::Is(list) | PseudoClass::Where(list) => list.matches(element),
        PseudoClass::Has(list) => has_descendant(element, list),

        PseudoClass::Lang(lang) => {
            let value = inherited_lang(element).unwrap_or_default().to_lowercase();
            let lang = lang.to_lowercase();
            value == lang || value.starts_with(&format!("{}-", lang))
        }
        PseudoClass::Dir(dir) => {
            let attr_dir = element.attr("dir");
            match dir {
                Direction::Ltr => attr_dir.map(|d| d.eq_ignore_ascii_case("ltr")).unwrap_or(true),
                Direction::Rtl => attr_dir.map(|d| d.eq_ignore_ascii_case("rtl")).unwrap_or(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_expression_odd() {
        let expr = NthExpression::odd();
        assert!(expr.matches(1));
        assert!(!expr.matches(2));
        assert!(expr.matches(3));
        assert!(!expr.matches(4));
        assert!(expr.matches(5));
    }

    #[test]
    fn test_nth_expression_even() {
        let expr = NthExpression::even();
        assert!(!expr.matches(1));
        assert!(expr.matches(2));
        assert!(!expr.matches(3));
        assert!(expr.matches(4));
    }

    #[test]
    fn test_nth_expression_parse() {
        assert_eq!(NthExpression::parse("odd"), Some(NthExpression::odd()));
        assert_eq!(NthExpression::parse("even"), Some(NthExpression::even()));
        assert_eq!(NthExpression::parse("3"), Some(NthExpression::index(3)));
        assert_eq!(NthExpression::parse("2n"), Some(NthExpression::new(2, 0)));
        assert_eq!(NthExpression::parse("2n+1"), Some(NthExpression::new(2, 1)));
        assert_eq!(NthExpression::parse("-n+3"), Some(NthExpression::new(-1, 3)));
        assert_eq!(NthExpression::parse("n-1"), Some(NthExpression::new(1, -1)));
        assert_eq!(NthExpression::parse("x"), None);
    }

    #[test]
    fn test_attribute_selector_exact() {
        let sel = AttributeSelector {
            name: "type".to_string(),
            matcher: Some(AttributeMatcher::Exact("text".to_string())),
            case_insensitive: false,
        };

        assert!(sel.matches(Some("text")));
        assert!(!sel.matches(Some("TEXT")));
        assert!(!sel.matches(Some("password")));
        assert!(!sel.matches(None));
    }

    #[test]
    fn test_attribute_selector_case_insensitive() {
        let sel = AttributeSelector {
            name: "type".to_string(),
            matcher: Some(AttributeMatcher::Exact("text".to_string())),
            case_insensitive: true,
        };
        assert!(sel.matches(Some("TEXT")));
    }

    #[test]
    fn test_attribute_selector_operators() {
        let make = |matcher| AttributeSelector {
            name: "class".to_string(),
            matcher: Some(matcher),
            case_insensitive: false,
        };
        assert!(make(AttributeMatcher::Contains("b".into())).matches(Some("a b c")));
        assert!(make(AttributeMatcher::DashMatch("en".into())).matches(Some("en-US")));
        assert!(make(AttributeMatcher::Prefix("ab".into())).matches(Some("abc")));
        assert!(make(AttributeMatcher::Suffix("bc".into())).matches(Some("abc")));
        assert!(make(AttributeMatcher::Substring("b".into())).matches(Some("abc")));
        assert!(!make(AttributeMatcher::Substring(String::new())).matches(Some("abc")));
    }
}
