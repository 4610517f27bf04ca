//! Engine and run configuration
//!
//! [`Config`] holds session-wide defaults, [`RunOptions`] tunes one run and
//! [`ConfigureSpec`] carries declarative additions for [`crate::Engine::configure`].
//! All three read the camelCase JSON shape callers already use.

use crate::locale::Locale;
use crate::{AuditError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Product naming used in help links and report metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Branding {
    pub brand: String,
    pub application: String,
    /// Base of rule help links
    pub docs_url: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            brand: "fos".to_string(),
            application: crate::ENGINE_NAME.to_string(),
            docs_url: "https://fos.dev/audit/rules".to_string(),
        }
    }
}

impl Branding {
    /// Help link of a rule without one of its own
    pub fn help_url(&self, rule_id: &str) -> String {
        let version = crate::VERSION.rsplit_once('.').map_or(crate::VERSION, |(minor, _)| minor);
        format!(
            "{}/{}/{}/{}?application={}",
            self.docs_url.trim_end_matches('/'),
            self.brand,
            version,
            rule_id,
            self.application
        )
    }
}

/// Window size reported in the test environment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 800.0,
        }
    }
}

/// Session-wide defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Reporter used when a run does not name one
    pub reporter: String,
    /// How long to wait for each frame's partial result (ms)
    pub frame_wait_time: u64,
    /// Upper bound on media preloading (ms)
    pub preload_timeout: u64,
    /// Upper bound on one deferred check evaluation (ms)
    pub check_timeout: u64,
    pub branding: Branding,
    pub viewport: Viewport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,
    pub runner_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reporter: "v2".to_string(),
            frame_wait_time: 60_000,
            preload_timeout: 10_000,
            check_timeout: 10_000,
            branding: Branding::default(),
            viewport: Viewport::default(),
            locale: None,
            runner_name: crate::ENGINE_NAME.to_string(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AuditError::InvalidArgument(format!("config: {e}")))
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout)
    }

    pub fn preload_timeout(&self) -> Duration {
        Duration::from_millis(self.preload_timeout)
    }
}

/// What a `runOnly` list names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOnlyKind {
    #[serde(alias = "rules")]
    Rule,
    #[serde(alias = "tags")]
    Tag,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Values {
    One(String),
    Many(Vec<String>),
}

impl From<Values> for Vec<String> {
    fn from(values: Values) -> Self {
        match values {
            Values::One(value) => vec![value],
            Values::Many(values) => values,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RunOnlyRepr {
    Bare(Values),
    Typed {
        #[serde(rename = "type")]
        kind: RunOnlyKind,
        values: Values,
    },
}

/// Restriction of a run to some rules or tags.
///
/// A bare list without a `type` names rules when every entry is a known
/// rule id and tags otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RunOnlyRepr")]
pub struct RunOnly {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RunOnlyKind>,
    pub values: Vec<String>,
}

impl From<RunOnlyRepr> for RunOnly {
    fn from(repr: RunOnlyRepr) -> Self {
        match repr {
            RunOnlyRepr::Typed { kind, values } => RunOnly {
                kind: Some(kind),
                values: values.into(),
            },
            RunOnlyRepr::Bare(values) => RunOnly {
                kind: None,
                values: values.into(),
            },
        }
    }
}

impl RunOnly {
    pub fn rules<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: Some(RunOnlyKind::Rule),
            values: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: Some(RunOnlyKind::Tag),
            values: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-rule run override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleToggle {
    pub enabled: bool,
}

/// Per-check run override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckToggle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

/// Report category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Passes,
    Violations,
    Incomplete,
    Inapplicable,
}

/// Asset preloading before checks that need it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Preload {
    Enabled(bool),
    Assets {
        #[serde(default)]
        assets: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout: Option<u64>,
    },
}

impl Default for Preload {
    fn default() -> Self {
        Preload::Enabled(true)
    }
}

impl Preload {
    const ASSETS: &'static [&'static str] = &["media"];

    /// Whether media metadata should be loaded
    pub fn media(&self) -> bool {
        match self {
            Preload::Enabled(enabled) => *enabled,
            Preload::Assets { assets, .. } => assets.is_empty() || assets.iter().any(|a| a == "media"),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Preload::Assets { timeout: Some(ms), .. } => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Preload::Assets { assets, .. } = self {
            if let Some(unknown) = assets.iter().find(|a| !Self::ASSETS.contains(&a.as_str())) {
                return Err(AuditError::InvalidArgument(format!(
                    "unknown preload asset {unknown:?}, expected one of {:?}",
                    Self::ASSETS
                )));
            }
        }
        Ok(())
    }
}

/// Options of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_only: Option<RunOnly>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub rules: BTreeMap<String, RuleToggle>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub checks: BTreeMap<String, CheckToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_types: Option<Vec<ResultType>>,
    pub preload: Preload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_wait_time: Option<u64>,
    /// Descend into frames
    pub iframes: bool,
    /// Keep node ids on results for callers that hold the tree
    pub element_ref: bool,
    /// Generate unique selectors for nodes
    pub selectors: bool,
    /// Also report the full ancestry path of nodes
    pub ancestry: bool,
    /// Accepted for compatibility, never produced
    pub xpath: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            run_only: None,
            rules: BTreeMap::new(),
            checks: BTreeMap::new(),
            result_types: None,
            preload: Preload::default(),
            reporter: None,
            frame_wait_time: None,
            iframes: true,
            element_ref: false,
            selectors: true,
            ancestry: false,
            xpath: false,
        }
    }
}

impl RunOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AuditError::InvalidArgument(format!("run options: {e}")))
    }

    pub fn with_run_only(mut self, run_only: RunOnly) -> Self {
        self.run_only = Some(run_only);
        self
    }

    pub fn with_reporter(mut self, reporter: &str) -> Self {
        self.reporter = Some(reporter.to_string());
        self
    }

    pub fn with_rule(mut self, id: &str, enabled: bool) -> Self {
        self.rules.insert(id.to_string(), RuleToggle { enabled });
        self
    }

    pub fn with_check_options(mut self, id: &str, options: Value) -> Self {
        self.checks.entry(id.to_string()).or_default().options = Some(options);
        self
    }

    pub fn with_result_types(mut self, types: &[ResultType]) -> Self {
        self.result_types = Some(types.to_vec());
        self
    }

    /// Frame wait with the session default as fallback
    pub fn frame_wait(&self, config: &Config) -> Duration {
        Duration::from_millis(self.frame_wait_time.unwrap_or(config.frame_wait_time))
    }

    pub fn check_enabled(&self, id: &str, default: bool) -> bool {
        self.checks.get(id).and_then(|c| c.enabled).unwrap_or(default)
    }

    pub fn check_options(&self, id: &str) -> Option<&Value> {
        self.checks.get(id).and_then(|c| c.options.as_ref())
    }
}

/// Declarative changes applied by [`crate::Engine::configure`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigureSpec {
    /// New rules, or patches of existing rules by id
    pub rules: Vec<Value>,
    /// New checks, or patches of existing checks by id
    pub checks: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branding: Option<Branding>,
    /// Disable every rule not listed in `rules`
    pub disable_other_rules: bool,
}

impl ConfigureSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AuditError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.reporter, "v2");
        assert_eq!(config.frame_wait_time, 60_000);
        assert_eq!(config.check_timeout(), Duration::from_secs(10));
        let parsed = Config::from_json(r#"{"frameWaitTime": 500}"#).unwrap();
        assert_eq!(parsed.frame_wait_time, 500);
        assert_eq!(parsed.preload_timeout, 10_000);
    }

    #[test]
    fn test_run_only_shapes() {
        let bare: RunOnly = serde_json::from_value(json!(["image-alt"])).unwrap();
        assert_eq!(bare.kind, None);
        assert_eq!(bare.values, vec!["image-alt"]);

        let single: RunOnly = serde_json::from_value(json!("wcag2a")).unwrap();
        assert_eq!(single.values, vec!["wcag2a"]);

        let typed: RunOnly = serde_json::from_value(json!({ "type": "tags", "values": ["wcag2aa"] })).unwrap();
        assert_eq!(typed.kind, Some(RunOnlyKind::Tag));

        let rule: RunOnly = serde_json::from_value(json!({ "type": "rule", "values": "image-alt" })).unwrap();
        assert_eq!(rule, RunOnly::rules(["image-alt"]));
    }

    #[test]
    fn test_run_options_defaults() {
        let options = RunOptions::from_json("{}").unwrap();
        assert!(options.iframes);
        assert!(options.selectors);
        assert!(!options.ancestry);
        assert!(options.preload.media());
    }

    #[test]
    fn test_run_options_overrides() {
        let options = RunOptions::from_json(
            r#"{"rules": {"image-alt": {"enabled": false}}, "checks": {"has-alt": {"enabled": false}}, "resultTypes": ["violations"]}"#,
        )
        .unwrap();
        assert!(!options.rules["image-alt"].enabled);
        assert!(!options.check_enabled("has-alt", true));
        assert!(options.check_enabled("aria-label", true));
        assert_eq!(options.result_types, Some(vec![ResultType::Violations]));
    }

    #[test]
    fn test_preload_shapes() {
        let off: Preload = serde_json::from_value(json!(false)).unwrap();
        assert!(!off.media());
        let assets: Preload = serde_json::from_value(json!({ "assets": ["media"], "timeout": 50 })).unwrap();
        assert!(assets.media());
        assert_eq!(assets.timeout(), Some(Duration::from_millis(50)));
        let unknown: Preload = serde_json::from_value(json!({ "assets": ["fonts"] })).unwrap();
        assert!(matches!(unknown.validate(), Err(AuditError::InvalidArgument(_))));
    }

    #[test]
    fn test_help_url() {
        let url = Branding::default().help_url("image-alt");
        assert!(url.starts_with("https://fos.dev/audit/rules/fos/"));
        assert!(url.ends_with("/image-alt?application=fos-audit"));
    }
}
