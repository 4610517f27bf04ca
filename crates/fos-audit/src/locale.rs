//! Locale documents
//!
//! Replacement strings for rule help, check messages and failure
//! summaries. Entries for ids the engine does not know are ignored with a
//! warning when the locale is applied.

use crate::pack::Message;
use crate::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Message shown when an incomplete check has no incomplete template
pub const INCOMPLETE_FALLBACK: &str = "The engine could not determine the result of this check";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleLocale {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckLocale {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete: Option<Message>,
}

/// Heading of a node's failure summary for one check group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureSummary {
    pub failure_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Locale {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub rules: BTreeMap<String, RuleLocale>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub checks: BTreeMap<String, CheckLocale>,
    /// Keyed by check group: `any` or `none` (which also covers `all`)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failure_summaries: BTreeMap<String, FailureSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete_fallback_message: Option<String>,
}

impl Locale {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AuditError::InvalidArgument(format!("locale: {e}")))
    }
}

/// Summaries used until a locale replaces them
pub fn default_failure_summaries() -> BTreeMap<String, FailureSummary> {
    [
        ("any", "Fix any of the following:"),
        ("none", "Fix all of the following:"),
    ]
    .into_iter()
    .map(|(group, message)| {
        (
            group.to_string(),
            FailureSummary {
                failure_message: message.to_string(),
            },
        )
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale() {
        let locale = Locale::from_json(
            r#"{
                "lang": "de",
                "rules": { "image-alt": { "help": "Bilder brauchen Alternativtext" } },
                "checks": { "has-alt": { "fail": "Kein alt-Attribut" } },
                "failureSummaries": { "any": { "failureMessage": "Beheben Sie eines der folgenden:" } }
            }"#,
        )
        .unwrap();
        assert_eq!(locale.lang.as_deref(), Some("de"));
        assert_eq!(locale.rules["image-alt"].description, None);
        assert_eq!(
            locale.checks["has-alt"].fail,
            Some(Message::Text("Kein alt-Attribut".to_string()))
        );
        assert_eq!(
            locale.failure_summaries["any"].failure_message,
            "Beheben Sie eines der folgenden:"
        );
    }

    #[test]
    fn test_empty_locale_is_valid() {
        assert_eq!(Locale::from_json("{}").unwrap(), Locale::default());
    }

    #[test]
    fn test_malformed_locale() {
        assert!(matches!(
            Locale::from_json(r#"{"rules": []}"#),
            Err(AuditError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_default_failure_summaries() {
        let summaries = default_failure_summaries();
        assert_eq!(summaries["any"].failure_message, "Fix any of the following:");
        assert_eq!(summaries["none"].failure_message, "Fix all of the following:");
    }
}
