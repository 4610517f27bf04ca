//! Reporters
//!
//! A reporter turns finalized rule results into the value handed back to
//! the caller. The built-in shapes are `raw`, `rawEnv`, `v1`, `v2` (the
//! default), `no-passes` and the deprecated `na`.

use crate::aggregate::aggregate_result;
use crate::audit::Audit;
use crate::config::{ResultType, RunOptions, Viewport};
use crate::pack::Impact;
use crate::result::{CheckResult, NodeRef, NodeResult, RuleResult};
use fos_vdom::Target;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Custom reporter
pub type ReporterFn = Rc<dyn Fn(&[RuleResult], &ReportContext<'_>) -> anyhow::Result<Value>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEngine {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunner {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEnvironment {
    pub user_agent: String,
    pub window_width: f64,
    pub window_height: f64,
}

/// Where and with what a run happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub test_engine: TestEngine,
    pub test_runner: TestRunner,
    pub test_environment: TestEnvironment,
    /// RFC 3339
    pub timestamp: String,
    pub url: String,
}

impl Environment {
    pub fn capture(url: &str, runner: &str, viewport: Viewport) -> Self {
        Self {
            test_engine: TestEngine {
                name: crate::ENGINE_NAME.to_string(),
                version: crate::VERSION.to_string(),
            },
            test_runner: TestRunner { name: runner.to_string() },
            test_environment: TestEnvironment {
                user_agent: format!("fOS/{} ({})", crate::VERSION, std::env::consts::OS),
                window_width: viewport.width,
                window_height: viewport.height,
            },
            timestamp: chrono::Utc::now().to_rfc3339(),
            url: url.to_string(),
        }
    }
}

/// What a reporter may consult besides the results
pub struct ReportContext<'a> {
    pub audit: &'a Audit,
    pub environment: &'a Environment,
    pub options: &'a RunOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedNode {
    pub html: String,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestry: Option<Target>,
}

impl From<&NodeRef> for RelatedNode {
    fn from(node: &NodeRef) -> Self {
        Self {
            html: node.html.clone(),
            target: node.target.clone(),
            ancestry: node.ancestry.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCheck {
    pub id: String,
    pub data: Value,
    pub related_nodes: Vec<RelatedNode>,
    pub impact: Option<Impact>,
    pub message: String,
}

impl From<&CheckResult> for ReportCheck {
    fn from(check: &CheckResult) -> Self {
        Self {
            id: check.id.clone(),
            data: check.data.clone(),
            related_nodes: check.related_nodes.iter().map(RelatedNode::from).collect(),
            impact: check.impact,
            message: check.message.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportNode {
    pub html: String,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestry: Option<Target>,
    pub impact: Option<Impact>,
    pub any: Vec<ReportCheck>,
    pub all: Vec<ReportCheck>,
    pub none: Vec<ReportCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_summary: Option<String>,
}

impl ReportNode {
    fn new(node: &NodeResult) -> Self {
        Self {
            html: node.node.html.clone(),
            target: node.node.target.clone(),
            ancestry: node.node.ancestry.clone(),
            impact: node.impact,
            any: node.any.iter().map(ReportCheck::from).collect(),
            all: node.all.iter().map(ReportCheck::from).collect(),
            none: node.none.iter().map(ReportCheck::from).collect(),
            failure_summary: None,
        }
    }

    /// Failure summary: `none` and `all` messages first, then `any`
    fn summarize(&self, audit: &Audit) -> String {
        let mut parts = Vec::new();
        let groups = [
            ("none", self.none.iter().chain(&self.all).collect::<Vec<_>>()),
            ("any", self.any.iter().collect()),
        ];
        for (group, checks) in groups {
            if checks.is_empty() {
                continue;
            }
            let Some(heading) = audit.failure_summary(group) else {
                continue;
            };
            let messages: Vec<&str> = checks.iter().map(|c| c.message.as_str()).collect();
            parts.push(format!("{heading}\n  {}", messages.join("\n  ")));
        }
        parts.join("\n\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRule {
    pub id: String,
    pub impact: Option<Impact>,
    pub tags: Vec<String>,
    pub description: String,
    pub help: String,
    pub help_url: String,
    pub nodes: Vec<ReportNode>,
}

/// The `v1`/`v2` report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(flatten)]
    pub environment: Environment,
    pub tool_options: RunOptions,
    pub passes: Vec<ReportRule>,
    pub violations: Vec<ReportRule>,
    pub incomplete: Vec<ReportRule>,
    pub inapplicable: Vec<ReportRule>,
}

impl Report {
    pub fn build(results: &[RuleResult], cx: &ReportContext<'_>, failure_summary: bool) -> Self {
        let aggregated = aggregate_result(results);
        let category = |rules: Vec<RuleResult>, kind: ResultType| -> Vec<ReportRule> {
            let truncate = cx.options.result_types.as_ref().is_some_and(|types| !types.contains(&kind));
            let summarize = failure_summary && matches!(kind, ResultType::Violations | ResultType::Incomplete);
            rules
                .iter()
                .map(|rule| {
                    let info = cx.audit.rule_info(&rule.id);
                    let nodes = if truncate { &rule.nodes[..rule.nodes.len().min(1)] } else { &rule.nodes[..] };
                    ReportRule {
                        id: rule.id.clone(),
                        impact: rule.impact,
                        tags: rule.tags.clone(),
                        description: info.as_ref().map(|i| i.description.clone()).unwrap_or_default(),
                        help: info.as_ref().map(|i| i.help.clone()).unwrap_or_default(),
                        help_url: info
                            .map(|i| i.help_url)
                            .unwrap_or_else(|| cx.audit.branding().help_url(&rule.id)),
                        nodes: nodes
                            .iter()
                            .map(|node| {
                                let mut report = ReportNode::new(node);
                                if summarize {
                                    report.failure_summary = Some(report.summarize(cx.audit));
                                }
                                report
                            })
                            .collect(),
                    }
                })
                .collect()
        };
        Self {
            environment: cx.environment.clone(),
            tool_options: cx.options.clone(),
            passes: category(aggregated.passes, ResultType::Passes),
            violations: category(aggregated.violations, ResultType::Violations),
            incomplete: category(aggregated.incomplete, ResultType::Incomplete),
            inapplicable: category(aggregated.inapplicable, ResultType::Inapplicable),
        }
    }
}

fn raw(results: &[RuleResult], _cx: &ReportContext<'_>) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(results)?)
}

fn raw_env(results: &[RuleResult], cx: &ReportContext<'_>) -> anyhow::Result<Value> {
    Ok(json!({ "raw": results, "env": cx.environment }))
}

fn v1(results: &[RuleResult], cx: &ReportContext<'_>) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(Report::build(results, cx, true))?)
}

fn v2(results: &[RuleResult], cx: &ReportContext<'_>) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(Report::build(results, cx, false))?)
}

fn no_passes(results: &[RuleResult], cx: &ReportContext<'_>) -> anyhow::Result<Value> {
    let options = RunOptions {
        result_types: Some(vec![ResultType::Violations]),
        ..cx.options.clone()
    };
    let cx = ReportContext {
        audit: cx.audit,
        environment: cx.environment,
        options: &options,
    };
    let mut report = serde_json::to_value(Report::build(results, &cx, false))?;
    if let Value::Object(map) = &mut report {
        map.remove("passes");
        map.remove("incomplete");
        map.remove("inapplicable");
    }
    Ok(report)
}

fn na(results: &[RuleResult], cx: &ReportContext<'_>) -> anyhow::Result<Value> {
    tracing::warn!("The \"na\" reporter is deprecated, use \"v2\"");
    v2(results, cx)
}

/// Reporters by name
#[derive(Clone)]
pub struct Reporters {
    reporters: HashMap<String, ReporterFn>,
    default: String,
}

impl Default for Reporters {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Reporters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.reporters.keys().collect();
        names.sort();
        f.debug_struct("Reporters")
            .field("names", &names)
            .field("default", &self.default)
            .finish()
    }
}

impl Reporters {
    /// The built-in reporters, `v2` by default
    pub fn new() -> Self {
        let mut reporters = Self {
            reporters: HashMap::new(),
            default: "v2".to_string(),
        };
        reporters.add("raw", Rc::new(raw), false);
        reporters.add("rawEnv", Rc::new(raw_env), false);
        reporters.add("v1", Rc::new(v1), false);
        reporters.add("v2", Rc::new(v2), true);
        reporters.add("no-passes", Rc::new(no_passes), false);
        reporters.add("na", Rc::new(na), false);
        reporters
    }

    pub fn add(&mut self, name: &str, reporter: ReporterFn, is_default: bool) {
        self.reporters.insert(name.to_string(), reporter);
        if is_default {
            self.default = name.to_string();
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.reporters.contains_key(name)
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Make an existing reporter the default
    pub fn set_default(&mut self, name: &str) -> bool {
        if self.has(name) {
            self.default = name.to_string();
            true
        } else {
            tracing::warn!("Unknown reporter {}, keeping {}", name, self.default);
            false
        }
    }

    /// Reporter by name; unknown names fall back to the default
    pub fn get(&self, name: Option<&str>) -> Option<ReporterFn> {
        let name = match name {
            Some(name) if self.has(name) => name,
            Some(name) => {
                tracing::warn!("Unknown reporter {}, using {}", name, self.default);
                self.default.as_str()
            }
            None => self.default.as_str(),
        };
        self.reporters.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Branding;
    use crate::registry::Registry;
    use crate::result::TestResult;
    use fos_vdom::TargetPart;

    fn audit() -> Audit {
        Audit::new(Registry::builtin(), Branding::default()).unwrap()
    }

    fn env() -> Environment {
        Environment::capture("https://example.test/", "tests", Viewport::default())
    }

    fn node(result: TestResult, message: &str) -> NodeResult {
        let mut check = CheckResult::new("has-alt", Some(result == TestResult::Passed));
        check.message = Some(message.to_string());
        check.impact = Some(Impact::Critical);
        NodeResult {
            any: vec![check],
            result,
            impact: (result == TestResult::Failed).then_some(Impact::Critical),
            ..NodeResult::new(NodeRef {
                html: "<img>".to_string(),
                target: vec![TargetPart::Selector("img".to_string())],
                ancestry: None,
                node_indexes: vec![1],
                element: None,
            })
        }
    }

    fn results() -> Vec<RuleResult> {
        let mut rule = RuleResult::new("image-alt");
        rule.result = TestResult::Failed;
        rule.impact = Some(Impact::Critical);
        rule.nodes = vec![
            node(TestResult::Failed, "Element does not have an alt attribute"),
            node(TestResult::Failed, "Element does not have an alt attribute"),
            node(TestResult::Passed, "Element has an alt attribute"),
        ];
        vec![rule]
    }

    #[test]
    fn test_v2_report() {
        let audit = audit();
        let environment = env();
        let options = RunOptions::default();
        let cx = ReportContext {
            audit: &audit,
            environment: &environment,
            options: &options,
        };
        let report = Reporters::new().get(None).unwrap()(&results(), &cx).unwrap();
        assert_eq!(report["testEngine"]["name"], json!("fos-audit"));
        assert_eq!(report["violations"][0]["id"], json!("image-alt"));
        assert_eq!(report["violations"][0]["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(report["passes"][0]["nodes"].as_array().unwrap().len(), 1);
        assert!(report["violations"][0]["helpUrl"].as_str().unwrap().contains("image-alt"));
        assert!(report["violations"][0]["nodes"][0].get("failureSummary").is_none());
    }

    #[test]
    fn test_v1_failure_summary() {
        let audit = audit();
        let environment = env();
        let options = RunOptions::default();
        let cx = ReportContext {
            audit: &audit,
            environment: &environment,
            options: &options,
        };
        let report = Reporters::new().get(Some("v1")).unwrap()(&results(), &cx).unwrap();
        assert_eq!(
            report["violations"][0]["nodes"][0]["failureSummary"],
            json!("Fix any of the following:\n  Element does not have an alt attribute")
        );
    }

    #[test]
    fn test_result_types_truncate() {
        let audit = audit();
        let environment = env();
        let options = RunOptions::default().with_result_types(&[ResultType::Passes]);
        let cx = ReportContext {
            audit: &audit,
            environment: &environment,
            options: &options,
        };
        let report = Report::build(&results(), &cx, false);
        assert_eq!(report.violations[0].nodes.len(), 1);
        assert_eq!(report.passes[0].nodes.len(), 1);
    }

    #[test]
    fn test_no_passes_and_raw() {
        let audit = audit();
        let environment = env();
        let options = RunOptions::default();
        let cx = ReportContext {
            audit: &audit,
            environment: &environment,
            options: &options,
        };
        let reporters = Reporters::new();
        let report = reporters.get(Some("no-passes")).unwrap()(&results(), &cx).unwrap();
        assert!(report.get("passes").is_none());
        assert_eq!(report["violations"][0]["nodes"].as_array().unwrap().len(), 2);

        let raw = reporters.get(Some("raw")).unwrap()(&results(), &cx).unwrap();
        assert_eq!(raw[0]["nodes"].as_array().unwrap().len(), 3);
        let raw_env = reporters.get(Some("rawEnv")).unwrap()(&results(), &cx).unwrap();
        assert_eq!(raw_env["env"]["url"], json!("https://example.test/"));
    }

    #[test]
    fn test_custom_and_unknown_reporters() {
        let mut reporters = Reporters::new();
        let count: ReporterFn =
            Rc::new(|results: &[RuleResult], _cx: &ReportContext<'_>| Ok::<_, anyhow::Error>(json!(results.len())));
        reporters.add("count", count, true);
        assert_eq!(reporters.default_name(), "count");
        assert!(reporters.get(Some("missing")).is_some());
        assert!(!reporters.set_default("missing"));
    }
}
