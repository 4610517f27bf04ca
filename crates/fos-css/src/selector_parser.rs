//! Selector parser
//!
//! Parses selector strings (as written in rule packs, stylesheets and
//! generated unique selectors) into the [`SelectorList`] AST, and escapes
//! identifiers and strings for the reverse direction.

use crate::selectors::{
    AttributeMatcher, AttributeSelector, Combinator, ComplexSelector, Compound, Direction,
    NthExpression, PseudoClass, SelectorComponent, SelectorList,
};
use crate::CssError;

/// Parse a comma-separated selector list
pub fn parse_selector_list(input: &str) -> Result<SelectorList, CssError> {
    let mut parser = SelectorParser::new(input);
    let list = parser.parse_list(false)?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(list)
}

struct SelectorParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> SelectorParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> CssError {
        CssError::InvalidSelector {
            selector: self.source.to_string(),
            message: format!("{} at offset {}", message, self.pos),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self, nested: bool) -> Result<SelectorList, CssError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            if self.at_end() || (nested && self.peek() == Some(')')) {
                break;
            }
            return Err(self.error("expected ',' or end of selector"));
        }
        Ok(SelectorList(selectors))
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, CssError> {
        // A leading combinator is allowed inside :has()
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(',') | Some(')') | None => break,
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return Err(self.error("unexpected character")),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, CssError> {
        let mut components = Vec::new();
        if self.eat('*') {
            components.push(SelectorComponent::Universal);
        } else if self.starts_identifier() {
            components.push(SelectorComponent::Type(self.parse_identifier()?));
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    components.push(SelectorComponent::Id(self.parse_name()?));
                }
                Some('.') => {
                    self.pos += 1;
                    components.push(SelectorComponent::Class(self.parse_identifier()?));
                }
                Some('[') => {
                    self.pos += 1;
                    components.push(SelectorComponent::Attribute(self.parse_attribute()?));
                }
                Some(':') => {
                    self.pos += 1;
                    if self.peek() == Some(':') {
                        return Err(self.error("pseudo-elements are not supported"));
                    }
                    components.push(SelectorComponent::PseudoClass(self.parse_pseudo()?));
                }
                _ => break,
            }
        }
        if components.is_empty() {
            return Err(self.error("expected selector"));
        }
        Ok(Compound(components))
    }

    fn starts_identifier(&self) -> bool {
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' || c == '\\' || !c.is_ascii() => true,
            Some('-') => self
                .peek_at(1)
                .is_some_and(|c| c.is_alphabetic() || c == '-' || c == '_' || c == '\\' || !c.is_ascii()),
            _ => false,
        }
    }

    fn is_name_char(c: char) -> bool {
        c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
    }

    fn parse_identifier(&mut self) -> Result<String, CssError> {
        if !self.starts_identifier() {
            return Err(self.error("expected identifier"));
        }
        self.parse_name()
    }

    /// Name characters and escapes; ids may start with escaped digits
    fn parse_name(&mut self) -> Result<String, CssError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                out.push(self.parse_escape()?);
            } else if Self::is_name_char(c) {
                self.pos += 1;
                out.push(c);
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.error("expected name"));
        }
        Ok(out)
    }

    fn parse_escape(&mut self) -> Result<char, CssError> {
        let mut hex = String::new();
        while hex.len() < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            hex.extend(self.bump());
        }
        if hex.is_empty() {
            return self.bump().ok_or_else(|| self.error("unterminated escape"));
        }
        // One whitespace character terminates a hex escape
        if self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        let code = u32::from_str_radix(&hex, 16).map_err(|_| self.error("invalid escape"))?;
        Ok(match char::from_u32(code) {
            Some(c) if code != 0 => c,
            _ => '\u{FFFD}',
        })
    }

    fn parse_string(&mut self, quote: char) -> Result<String, CssError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.peek() {
                    Some('\n') => {
                        self.pos += 1;
                    }
                    Some(_) => out.push(self.parse_escape()?),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector, CssError> {
        self.skip_whitespace();
        let name = self.parse_name()?;
        self.skip_whitespace();
        let operator = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttributeSelector {
                    name,
                    matcher: None,
                    case_insensitive: false,
                });
            }
            Some('=') => {
                self.pos += 1;
                '='
            }
            Some(op @ ('~' | '|' | '^' | '$' | '*')) if self.peek_at(1) == Some('=') => {
                self.pos += 2;
                op
            }
            _ => return Err(self.error("invalid attribute operator")),
        };
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                self.parse_string(quote)?
            }
            _ => self.parse_name()?,
        };
        self.skip_whitespace();
        let mut case_insensitive = false;
        if let Some(flag @ ('i' | 'I' | 's' | 'S')) = self.peek() {
            self.pos += 1;
            case_insensitive = flag.eq_ignore_ascii_case(&'i');
            self.skip_whitespace();
        }
        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }
        let matcher = match operator {
            '=' => AttributeMatcher::Exact(value),
            '~' => AttributeMatcher::Contains(value),
            '|' => AttributeMatcher::DashMatch(value),
            '^' => AttributeMatcher::Prefix(value),
            '$' => AttributeMatcher::Suffix(value),
            _ => AttributeMatcher::Substring(value),
        };
        Ok(AttributeSelector {
            name,
            matcher: Some(matcher),
            case_insensitive,
        })
    }

    /// Raw text up to the matching close paren
    fn parse_raw_argument(&mut self) -> Result<String, CssError> {
        let mut depth = 0;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated argument")),
                Some('(') => {
                    depth += 1;
                    out.push('(');
                }
                Some(')') if depth == 0 => return Ok(out),
                Some(')') => {
                    depth -= 1;
                    out.push(')');
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_nested_list(&mut self) -> Result<SelectorList, CssError> {
        let list = self.parse_list(true)?;
        self.skip_whitespace();
        if !self.eat(')') {
            return Err(self.error("expected ')'"));
        }
        Ok(list)
    }

    fn parse_nth(&mut self) -> Result<NthExpression, CssError> {
        let raw = self.parse_raw_argument()?;
        NthExpression::parse(&raw).ok_or_else(|| self.error("invalid nth expression"))
    }

    fn parse_pseudo(&mut self) -> Result<PseudoClass, CssError> {
        let name = self.parse_identifier()?.to_ascii_lowercase();
        if self.eat('(') {
            self.skip_whitespace();
            return match name.as_str() {
                "not" => Ok(PseudoClass::Not(self.parse_nested_list()?)),
                "is" | "matches" => Ok(PseudoClass::Is(self.parse_nested_list()?)),
                "where" => Ok(PseudoClass::Where(self.parse_nested_list()?)),
                "has" => {
                    // Relative selectors: a leading '>' is read as plain descent
                    self.eat('>');
                    Ok(PseudoClass::Has(self.parse_nested_list()?))
                }
                "nth-child" => Ok(PseudoClass::NthChild(self.parse_nth()?)),
                "nth-last-child" => Ok(PseudoClass::NthLastChild(self.parse_nth()?)),
                "nth-of-type" => Ok(PseudoClass::NthOfType(self.parse_nth()?)),
                "nth-last-of-type" => Ok(PseudoClass::NthLastOfType(self.parse_nth()?)),
                "lang" => Ok(PseudoClass::Lang(self.parse_raw_argument()?.trim().to_string())),
                "dir" => match self.parse_raw_argument()?.trim() {
                    "ltr" => Ok(PseudoClass::Dir(Direction::Ltr)),
                    "rtl" => Ok(PseudoClass::Dir(Direction::Rtl)),
                    _ => Err(self.error("invalid :dir() argument")),
                },
                _ => Err(self.error("unknown functional pseudo-class")),
            };
        }
        match name.as_str() {
            "link" | "any-link" => Ok(PseudoClass::Link),
            "enabled" => Ok(PseudoClass::Enabled),
            "disabled" => Ok(PseudoClass::Disabled),
            "checked" => Ok(PseudoClass::Checked),
            "required" => Ok(PseudoClass::Required),
            "optional" => Ok(PseudoClass::Optional),
            "read-only" => Ok(PseudoClass::ReadOnly),
            "read-write" => Ok(PseudoClass::ReadWrite),
            "root" => Ok(PseudoClass::Root),
            "empty" => Ok(PseudoClass::Empty),
            "first-child" => Ok(PseudoClass::FirstChild),
            "last-child" => Ok(PseudoClass::LastChild),
            "only-child" => Ok(PseudoClass::OnlyChild),
            "first-of-type" => Ok(PseudoClass::FirstOfType),
            "last-of-type" => Ok(PseudoClass::LastOfType),
            "only-of-type" => Ok(PseudoClass::OnlyOfType),
            _ => Err(self.error("unknown pseudo-class")),
        }
    }
}

/// Escape an identifier following the CSSOM `CSS.escape()` algorithm
pub fn escape_identifier(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    for (index, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if code == 0 {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1f).contains(&code)
            || code == 0x7f
            || (index == 0 && c.is_ascii_digit())
            || (index == 1 && c.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if index == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Quote a string for use as an attribute selector value
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push('\u{FFFD}'),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\{:x} ", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> SelectorList {
        parse_selector_list(input).unwrap()
    }

    #[test]
    fn test_parse_compound() {
        let list = parse("div#main.a.b[role=\"menuitem\"]");
        let compound = &list.0[0].compounds[0];
        assert_eq!(compound.0.len(), 5);
        assert_eq!(compound.0[0], SelectorComponent::Type("div".into()));
        assert_eq!(compound.0[1], SelectorComponent::Id("main".into()));
    }

    #[test]
    fn test_parse_combinators() {
        let list = parse("ul > li a + b ~ c");
        let complex = &list.0[0];
        assert_eq!(
            complex.combinators,
            vec![
                Combinator::Child,
                Combinator::Descendant,
                Combinator::NextSibling,
                Combinator::SubsequentSibling
            ]
        );
    }

    #[test]
    fn test_parse_list_and_pseudos() {
        let list = parse("a:not([href]), input:nth-of-type(2n+1), :is(h1, h2)");
        assert_eq!(list.0.len(), 3);
        assert!(matches!(
            list.0[1].compounds[0].0[1],
            SelectorComponent::PseudoClass(PseudoClass::NthOfType(_))
        ));
    }

    #[test]
    fn test_parse_escapes() {
        let list = parse("#\\31 23 .a\\.b hx\\:include");
        assert_eq!(list.0[0].compounds[0].0[0], SelectorComponent::Id("123".into()));
        assert_eq!(list.0[0].compounds[1].0[0], SelectorComponent::Class("a.b".into()));
        assert_eq!(list.0[0].compounds[2].0[0], SelectorComponent::Type("hx:include".into()));
    }

    #[test]
    fn test_parse_quoted_attribute() {
        let list = parse("[href=\"//deque.com/\\\"x\\\"\" i]");
        match &list.0[0].compounds[0].0[0] {
            SelectorComponent::Attribute(attr) => {
                assert_eq!(attr.matcher, Some(AttributeMatcher::Exact("//deque.com/\"x\"".into())));
                assert!(attr.case_insensitive);
            }
            other => panic!("unexpected component {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_selector_list("").is_err());
        assert!(parse_selector_list("div >").is_err());
        assert!(parse_selector_list("[foo").is_err());
        assert!(parse_selector_list("p::before").is_err());
        assert!(parse_selector_list("a:unknown").is_err());
        assert!(parse_selector_list("a,").is_err());
    }

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("monkeys"), "monkeys");
        assert_eq!(escape_identifier("123"), "\\31 23");
        assert_eq!(escape_identifier("-"), "\\-");
        assert_eq!(escape_identifier("-1a"), "-\\31 a");
        assert_eq!(escape_identifier("a.b:c"), "a\\.b\\:c");
        assert_eq!(escape_identifier("caf\u{e9}"), "caf\u{e9}");
    }

    #[test]
    fn test_escape_round_trip() {
        for raw in ["a.b", "1st", "x y", "-2", "über"] {
            let selector = format!("#{}", escape_identifier(raw));
            let list = parse(&selector);
            assert_eq!(list.0[0].compounds[0].0[0], SelectorComponent::Id(raw.into()));
        }
        let attr = format!("[title={}]", escape_string("say \"hi\"\\"));
        match &parse(&attr).0[0].compounds[0].0[0] {
            SelectorComponent::Attribute(a) => {
                assert_eq!(a.matcher, Some(AttributeMatcher::Exact("say \"hi\"\\".into())))
            }
            other => panic!("unexpected component {:?}", other),
        }
    }
}
