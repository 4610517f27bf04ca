//! Rule and check packs
//!
//! Declarative definitions as they appear in the JSON packs shipped with
//! the crate or passed to [`crate::Engine::configure`]. Handler names in
//! `evaluate`, `after` and `matches` are resolved against the
//! [`crate::Registry`] when the definition is registered.

use crate::matcher::MatchExpression;
use crate::{AuditError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const RULE_PACKS: &[(&str, &str)] = &[
    ("text-alternatives", include_str!("../rules/text-alternatives.json")),
    ("aria", include_str!("../rules/aria.json")),
    ("landmarks", include_str!("../rules/landmarks.json")),
    ("keyboard", include_str!("../rules/keyboard.json")),
    ("parsing", include_str!("../rules/parsing.json")),
    ("color", include_str!("../rules/color.json")),
    ("target", include_str!("../rules/target.json")),
    ("document", include_str!("../rules/document.json")),
    ("media", include_str!("../rules/media.json")),
];

const CHECK_PACKS: &[(&str, &str)] = &[
    ("shared", include_str!("../checks/shared.json")),
    ("aria", include_str!("../checks/aria.json")),
    ("landmarks", include_str!("../checks/landmarks.json")),
    ("keyboard", include_str!("../checks/keyboard.json")),
    ("parsing", include_str!("../checks/parsing.json")),
    ("color", include_str!("../checks/color.json")),
    ("target", include_str!("../checks/target.json")),
    ("document", include_str!("../checks/document.json")),
    ("media", include_str!("../checks/media.json")),
];

/// Severity of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

/// Message template, or templates keyed by `data.messageKey`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    Keyed(BTreeMap<String, String>),
}

impl Message {
    /// Template for a result whose data carries `message_key`
    pub fn template(&self, message_key: Option<&str>) -> Option<&str> {
        match self {
            Message::Text(text) => Some(text),
            Message::Keyed(map) => message_key
                .and_then(|key| map.get(key))
                .or_else(|| map.get("default"))
                .map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckMessages {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete: Option<Message>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    pub messages: CheckMessages,
}

/// A check: one evaluation against one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSpec {
    pub id: String,
    /// Evaluator handler id
    pub evaluate: String,
    /// Handler run once over all of a rule's results for this check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default)]
    pub options: Value,
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub metadata: CheckMetadata,
}

/// Reference from a rule to a check, optionally with rule-specific options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckRef {
    Id(String),
    WithOptions { id: String, options: Value },
}

impl CheckRef {
    pub fn id(&self) -> &str {
        match self {
            CheckRef::Id(id) | CheckRef::WithOptions { id, .. } => id,
        }
    }

    pub fn options(&self) -> Option<&Value> {
        match self {
            CheckRef::Id(_) => None,
            CheckRef::WithOptions { options, .. } => Some(options),
        }
    }
}

/// Extra filter on selector hits: a handler id or an inline expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchSpec {
    Handler(String),
    Expression(MatchExpression),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleMetadata {
    pub description: String,
    pub help: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_url: Option<String>,
}

/// A rule: which nodes to test and which checks decide the outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    pub id: String,
    #[serde(default = "any_element")]
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<MatchSpec>,
    #[serde(default = "enabled")]
    pub exclude_hidden: bool,
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// One passing node passes the whole page
    #[serde(default)]
    pub page_level: bool,
    /// Failures are reported as needing review
    #[serde(default)]
    pub review_on_fail: bool,
    /// Media metadata must be loaded before evaluation
    #[serde(default)]
    pub preload: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Overrides the impact of the rule's checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub any: Vec<CheckRef>,
    #[serde(default)]
    pub all: Vec<CheckRef>,
    #[serde(default)]
    pub none: Vec<CheckRef>,
    #[serde(default)]
    pub metadata: RuleMetadata,
}

impl RuleSpec {
    /// Every check reference of the rule
    pub fn check_refs(&self) -> impl Iterator<Item = &CheckRef> {
        self.any.iter().chain(&self.all).chain(&self.none)
    }
}

fn enabled() -> bool {
    true
}

fn any_element() -> String {
    "*".to_string()
}

fn parse_pack<T: for<'de> Deserialize<'de>>(kind: &str, name: &str, json: &str) -> Result<Vec<T>> {
    serde_json::from_str(json).map_err(|e| AuditError::Configuration(format!("{kind} pack {name}: {e}")))
}

/// Rules shipped with the engine, in pack order
pub fn builtin_rules() -> Result<Vec<RuleSpec>> {
    let mut rules = Vec::new();
    for (name, json) in RULE_PACKS {
        rules.extend(parse_pack::<RuleSpec>("rule", name, json)?);
    }
    Ok(rules)
}

/// Checks shipped with the engine
pub fn builtin_checks() -> Result<Vec<CheckSpec>> {
    let mut checks = Vec::new();
    for (name, json) in CHECK_PACKS {
        checks.extend(parse_pack::<CheckSpec>("check", name, json)?);
    }
    Ok(checks)
}

/// Overlay the top-level keys of `patch` onto a definition
pub fn merge_definition<T>(base: &T, patch: &Value) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let Value::Object(changes) = patch else {
        return Err(AuditError::Configuration(format!("definition must be an object, got {patch}")));
    };
    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(fields) = &mut merged {
        for (key, value) in changes {
            fields.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(merged).map_err(|e| AuditError::Configuration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_packs_parse() {
        let rules = builtin_rules().unwrap();
        assert_eq!(rules.len(), 16);
        assert!(rules.iter().any(|r| r.id == "image-alt"));
        let checks = builtin_checks().unwrap();
        assert!(checks.iter().any(|c| c.id == "has-alt"));
    }

    #[test]
    fn test_rule_defaults() {
        let rule: RuleSpec = serde_json::from_value(json!({ "id": "custom", "any": ["has-alt"] })).unwrap();
        assert_eq!(rule.selector, "*");
        assert!(rule.enabled);
        assert!(rule.exclude_hidden);
        assert!(!rule.page_level);
        assert_eq!(rule.check_refs().count(), 1);
    }

    #[test]
    fn test_missing_id_is_an_error() {
        assert!(serde_json::from_value::<RuleSpec>(json!({ "selector": "img" })).is_err());
    }

    #[test]
    fn test_check_ref_with_options() {
        let rule: RuleSpec = serde_json::from_value(json!({
            "id": "r",
            "all": [{ "id": "c", "options": { "min": 2 } }]
        }))
        .unwrap();
        assert_eq!(rule.all[0].id(), "c");
        assert_eq!(rule.all[0].options(), Some(&json!({ "min": 2 })));
    }

    #[test]
    fn test_merge_definition() {
        let rule: RuleSpec = serde_json::from_value(json!({ "id": "r", "selector": "img" })).unwrap();
        let merged = merge_definition(&rule, &json!({ "enabled": false, "tags": ["best-practice"] })).unwrap();
        assert_eq!(merged.selector, "img");
        assert!(!merged.enabled);
        assert_eq!(merged.tags, vec!["best-practice"]);
        assert!(merge_definition(&rule, &json!("nope")).is_err());
    }

    #[test]
    fn test_keyed_messages() {
        let message: Message = serde_json::from_value(json!({ "default": "d", "bgImage": "image" })).unwrap();
        assert_eq!(message.template(Some("bgImage")), Some("image"));
        assert_eq!(message.template(Some("other")), Some("d"));
        assert_eq!(message.template(None), Some("d"));
    }

    #[test]
    fn test_impact_order() {
        assert!(Impact::Critical > Impact::Serious);
        assert!(Impact::Minor < Impact::Moderate);
    }
}
