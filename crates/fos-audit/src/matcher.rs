//! Inline match expressions
//!
//! A rule's `matches` may be an object instead of a handler id:
//!
//! ```json
//! { "nodeName": ["audio", "video"], "attributes": { "muted": false, "src": "/\\.mp3$/" }, "condition": "media-has-source" }
//! ```
//!
//! Values are `true` (present), `false` (absent), a string (exact value or
//! `/regex/`) or a list of strings (any of). `condition` names a registered
//! match handler that must also accept the node.

use crate::{AuditError, Registry, Result};
use fos_vdom::{VNodeId, VirtualTree};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a match handler sees
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub tree: &'a VirtualTree,
    pub node: VNodeId,
    /// Running in the top-level document rather than inside a frame request
    pub initiator: bool,
}

/// Expected value of a node name, attribute or property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueMatcher {
    Present(bool),
    Exact(String),
    AnyOf(Vec<String>),
}

/// Declarative node filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchExpression {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<ValueMatcher>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, ValueMatcher>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ValueMatcher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug)]
enum CompiledValue {
    Present(bool),
    Exact(String),
    Pattern(Regex),
    AnyOf(Vec<String>),
}

impl CompiledValue {
    fn compile(matcher: &ValueMatcher) -> Result<Self> {
        Ok(match matcher {
            ValueMatcher::Present(present) => CompiledValue::Present(*present),
            ValueMatcher::AnyOf(values) => CompiledValue::AnyOf(values.clone()),
            ValueMatcher::Exact(value) => match value.strip_prefix('/').and_then(|v| v.strip_suffix('/')) {
                Some(pattern) if value.len() > 1 => CompiledValue::Pattern(
                    Regex::new(pattern).map_err(|e| AuditError::Configuration(format!("bad pattern {value}: {e}")))?,
                ),
                _ => CompiledValue::Exact(value.clone()),
            },
        })
    }

    fn accepts(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (CompiledValue::Present(present), value) => value.is_some() == *present,
            (_, None) => false,
            (CompiledValue::Exact(expected), Some(value)) => value == expected,
            (CompiledValue::Pattern(re), Some(value)) => re.is_match(value),
            (CompiledValue::AnyOf(values), Some(value)) => values.iter().any(|v| v == value),
        }
    }
}

/// A match expression with its patterns compiled
#[derive(Debug)]
pub struct CompiledExpression {
    node_name: Option<CompiledValue>,
    attributes: Vec<(String, CompiledValue)>,
    properties: Vec<(String, CompiledValue)>,
    condition: Option<String>,
}

impl CompiledExpression {
    pub fn compile(expression: &MatchExpression) -> Result<Self> {
        let pairs = |map: &BTreeMap<String, ValueMatcher>| -> Result<Vec<(String, CompiledValue)>> {
            map.iter()
                .map(|(name, matcher)| Ok((name.to_ascii_lowercase(), CompiledValue::compile(matcher)?)))
                .collect()
        };
        Ok(Self {
            node_name: expression.node_name.as_ref().map(CompiledValue::compile).transpose()?,
            attributes: pairs(&expression.attributes)?,
            properties: pairs(&expression.properties)?,
            condition: expression.condition.clone(),
        })
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    pub fn matches(&self, registry: &Registry, cx: &MatchContext<'_>) -> bool {
        let Some(node) = cx.tree.get(cx.node) else {
            return false;
        };
        if let Some(name) = &self.node_name {
            if !name.accepts(Some(node.node_name())) {
                return false;
            }
        }
        if !self.attributes.iter().all(|(attr, value)| value.accepts(node.attr(attr))) {
            return false;
        }
        if !self.properties.iter().all(|(prop, value)| value.accepts(node.prop(prop))) {
            return false;
        }
        match &self.condition {
            Some(handler) => registry.run_matches(handler, cx),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_vdom::SerialNode;
    use serde_json::json;

    fn expression(value: serde_json::Value) -> CompiledExpression {
        CompiledExpression::compile(&serde_json::from_value(value).unwrap()).unwrap()
    }

    fn check(expr: &CompiledExpression, node: SerialNode) -> bool {
        let tree = VirtualTree::from_serial(&node).unwrap();
        let cx = MatchContext {
            tree: &tree,
            node: tree.root().unwrap(),
            initiator: true,
        };
        expr.matches(&Registry::new(), &cx)
    }

    #[test]
    fn test_node_name_list() {
        let expr = expression(json!({ "nodeName": ["audio", "video"] }));
        assert!(check(&expr, SerialNode::element("video")));
        assert!(!check(&expr, SerialNode::element("img")));
    }

    #[test]
    fn test_attribute_presence_and_absence() {
        let expr = expression(json!({ "attributes": { "autoplay": true, "muted": false } }));
        assert!(check(&expr, SerialNode::element("audio").with_attr("autoplay", "")));
        assert!(!check(&expr, SerialNode::element("audio").with_attr("autoplay", "").with_attr("muted", "")));
        assert!(!check(&expr, SerialNode::element("audio")));
    }

    #[test]
    fn test_attribute_patterns() {
        let expr = expression(json!({ "attributes": { "role": "/^(none|presentation)$/" } }));
        assert!(check(&expr, SerialNode::element("img").with_attr("role", "none")));
        assert!(!check(&expr, SerialNode::element("img").with_attr("role", "button")));
        let exact = expression(json!({ "attributes": { "type": "submit" } }));
        assert!(check(&exact, SerialNode::element("input").with_attr("type", "submit")));
    }

    #[test]
    fn test_properties() {
        let expr = expression(json!({ "properties": { "checked": "true" } }));
        assert!(check(&expr, SerialNode::element("input").with_prop("checked", true)));
        assert!(!check(&expr, SerialNode::element("input")));
    }

    #[test]
    fn test_bad_pattern_is_a_configuration_error() {
        let parsed: MatchExpression = serde_json::from_value(json!({ "attributes": { "id": "/(/" } })).unwrap();
        assert!(matches!(CompiledExpression::compile(&parsed), Err(AuditError::Configuration(_))));
    }
}
