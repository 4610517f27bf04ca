//! The registered rule and check set
//!
//! An [`Audit`] owns every rule and check definition bound to its handlers,
//! plus the message strings a locale may replace. Rules keep registration
//! order, which is also report order.

use crate::aggregate::{apply_after, finalize_rule};
use crate::check::Check;
use crate::config::{Branding, RunOnlyKind, RunOptions};
use crate::context::Context;
use crate::locale::{default_failure_summaries, CheckLocale, FailureSummary, Locale, RuleLocale, INCOMPLETE_FALLBACK};
use crate::pack::{builtin_checks, builtin_rules, merge_definition, CheckSpec, RuleSpec};
use crate::registry::Registry;
use crate::result::{CheckResult, RuleResult};
use crate::rule::{Rule, RunScope};
use crate::template::render_message;
use crate::{AuditError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Tags whose rules only run when asked for by tag
const OPT_IN_TAGS: &[&str] = &["experimental", "deprecated"];

/// Public description of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInfo {
    pub rule_id: String,
    pub description: String,
    pub help: String,
    pub help_url: String,
    pub tags: Vec<String>,
}

#[derive(Debug)]
pub struct Audit {
    registry: Registry,
    rules: Vec<Rule>,
    checks: HashMap<String, Check>,
    failure_summaries: BTreeMap<String, FailureSummary>,
    incomplete_fallback: String,
    branding: Branding,
}

impl Audit {
    /// Audit holding the built-in packs
    pub fn new(registry: Registry, branding: Branding) -> Result<Self> {
        let mut audit = Self::empty(registry, branding);
        for check in builtin_checks()? {
            audit.insert_check(check)?;
        }
        for rule in builtin_rules()? {
            audit.insert_rule(rule)?;
        }
        tracing::debug!("Audit loaded {} rules and {} checks", audit.rules.len(), audit.checks.len());
        Ok(audit)
    }

    /// Audit without any rule or check
    pub fn empty(registry: Registry, branding: Branding) -> Self {
        Self {
            registry,
            rules: Vec::new(),
            checks: HashMap::new(),
            failure_summaries: default_failure_summaries(),
            incomplete_fallback: INCOMPLETE_FALLBACK.to_string(),
            branding,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handlers added here bind to definitions registered afterwards
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    pub fn set_branding(&mut self, branding: Branding) {
        self.branding = branding;
    }

    fn insert_check(&mut self, spec: CheckSpec) -> Result<()> {
        let check = Check::compile(spec, &self.registry)?;
        self.checks.insert(check.spec.id.clone(), check);
        Ok(())
    }

    fn insert_rule(&mut self, spec: RuleSpec) -> Result<()> {
        let rule = Rule::compile(spec, &self.registry, &self.checks)?;
        match self.rules.iter_mut().find(|r| r.spec.id == rule.spec.id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        Ok(())
    }

    fn definition_id(definition: &Value) -> Result<&str> {
        definition
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AuditError::Configuration(format!("definition without an id: {definition}")))
    }

    /// Add a check, or patch the existing check with the same id
    pub fn add_check(&mut self, definition: &Value) -> Result<()> {
        let id = Self::definition_id(definition)?;
        let spec = match self.checks.get(id) {
            Some(existing) => merge_definition(&existing.spec, definition)?,
            None => serde_json::from_value(definition.clone())
                .map_err(|e| AuditError::Configuration(format!("check {id}: {e}")))?,
        };
        self.insert_check(spec)
    }

    /// Add a rule, or patch the existing rule with the same id
    pub fn add_rule(&mut self, definition: &Value) -> Result<()> {
        let id = Self::definition_id(definition)?;
        let spec = match self.rules.iter().find(|r| r.spec.id == id) {
            Some(existing) => merge_definition(&existing.spec, definition)?,
            None => serde_json::from_value(definition.clone())
                .map_err(|e| AuditError::Configuration(format!("rule {id}: {e}")))?,
        };
        self.insert_rule(spec)
    }

    /// Disable every rule whose id is not in `keep`
    pub fn disable_other_rules(&mut self, keep: &BTreeSet<String>) {
        for rule in &mut self.rules {
            if !keep.contains(&rule.spec.id) {
                rule.spec.enabled = false;
            }
        }
    }

    pub fn rule_spec(&self, id: &str) -> Option<&RuleSpec> {
        self.rule(id).map(|r| &r.spec)
    }

    pub fn check_spec(&self, id: &str) -> Option<&CheckSpec> {
        self.checks.get(id).map(|c| &c.spec)
    }

    pub(crate) fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.spec.id == id)
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.spec.id.as_str())
    }

    pub fn failure_summary(&self, group: &str) -> Option<&str> {
        self.failure_summaries.get(group).map(|s| s.failure_message.as_str())
    }

    /// Replace message strings. Entries for unknown rules or checks are skipped.
    pub fn apply_locale(&mut self, locale: &Locale) {
        for (id, strings) in &locale.rules {
            let Some(rule) = self.rules.iter_mut().find(|r| &r.spec.id == id) else {
                tracing::warn!("Locale names unknown rule {}", id);
                continue;
            };
            if let Some(description) = &strings.description {
                rule.spec.metadata.description = description.clone();
            }
            if let Some(help) = &strings.help {
                rule.spec.metadata.help = help.clone();
            }
        }
        for (id, strings) in &locale.checks {
            let Some(check) = self.checks.get_mut(id) else {
                tracing::warn!("Locale names unknown check {}", id);
                continue;
            };
            let messages = &mut check.spec.metadata.messages;
            if strings.pass.is_some() {
                messages.pass = strings.pass.clone();
            }
            if strings.fail.is_some() {
                messages.fail = strings.fail.clone();
            }
            if strings.incomplete.is_some() {
                messages.incomplete = strings.incomplete.clone();
            }
        }
        for (group, summary) in &locale.failure_summaries {
            self.failure_summaries.insert(group.clone(), summary.clone());
        }
        if let Some(message) = &locale.incomplete_fallback_message {
            self.incomplete_fallback = message.clone();
        }
    }

    /// Current message strings as a locale document
    pub fn locale(&self) -> Locale {
        Locale {
            lang: None,
            rules: self
                .rules
                .iter()
                .map(|r| {
                    let strings = RuleLocale {
                        description: Some(r.spec.metadata.description.clone()),
                        help: Some(r.spec.metadata.help.clone()),
                    };
                    (r.spec.id.clone(), strings)
                })
                .collect(),
            checks: self
                .checks
                .values()
                .map(|c| {
                    let messages = &c.spec.metadata.messages;
                    let strings = CheckLocale {
                        pass: messages.pass.clone(),
                        fail: messages.fail.clone(),
                        incomplete: messages.incomplete.clone(),
                    };
                    (c.spec.id.clone(), strings)
                })
                .collect(),
            failure_summaries: self.failure_summaries.clone(),
            incomplete_fallback_message: Some(self.incomplete_fallback.clone()),
        }
    }

    fn info(&self, rule: &Rule) -> RuleInfo {
        let metadata = &rule.spec.metadata;
        RuleInfo {
            rule_id: rule.spec.id.clone(),
            description: metadata.description.clone(),
            help: metadata.help.clone(),
            help_url: metadata
                .help_url
                .clone()
                .unwrap_or_else(|| self.branding.help_url(&rule.spec.id)),
            tags: rule.spec.tags.clone(),
        }
    }

    pub fn rule_info(&self, id: &str) -> Option<RuleInfo> {
        self.rule(id).map(|r| self.info(r))
    }

    /// Rules carrying any of `tags`, or every rule when `tags` is empty
    pub fn get_rules(&self, tags: &[&str]) -> Vec<RuleInfo> {
        self.rules
            .iter()
            .filter(|r| tags.is_empty() || r.spec.tags.iter().any(|t| tags.contains(&t.as_str())))
            .map(|r| self.info(r))
            .collect()
    }

    /// How a `runOnly` list without a type is read
    fn run_only_kind(&self, values: &[String], kind: Option<RunOnlyKind>) -> RunOnlyKind {
        kind.unwrap_or_else(|| {
            if !values.is_empty() && values.iter().all(|v| self.rule(v).is_some()) {
                RunOnlyKind::Rule
            } else {
                RunOnlyKind::Tag
            }
        })
    }

    /// Reject run options naming rules or tags the audit does not know
    pub fn validate_options(&self, options: &RunOptions) -> Result<()> {
        options.preload.validate()?;
        if let Some(run_only) = &options.run_only {
            if run_only.values.is_empty() {
                return Err(AuditError::InvalidArgument("runOnly needs at least one value".to_string()));
            }
            match self.run_only_kind(&run_only.values, run_only.kind) {
                RunOnlyKind::Rule => {
                    if let Some(unknown) = run_only.values.iter().find(|v| self.rule(v).is_none()) {
                        return Err(AuditError::InvalidArgument(format!("unknown rule {unknown:?} in runOnly")));
                    }
                }
                RunOnlyKind::Tag => {
                    let known: BTreeSet<&str> =
                        self.rules.iter().flat_map(|r| r.spec.tags.iter().map(String::as_str)).collect();
                    if let Some(unknown) = run_only.values.iter().find(|v| !known.contains(v.as_str())) {
                        return Err(AuditError::InvalidArgument(format!("unknown tag {unknown:?} in runOnly")));
                    }
                }
            }
        }
        if let Some(unknown) = options.rules.keys().find(|id| self.rule(id).is_none()) {
            return Err(AuditError::InvalidArgument(format!("unknown rule {unknown:?} in rules")));
        }
        Ok(())
    }

    fn matches_tags(spec: &RuleSpec, include: &[String]) -> bool {
        let matching = include.is_empty() || spec.tags.iter().any(|t| include.contains(t));
        matching
            && !spec
                .tags
                .iter()
                .any(|t| OPT_IN_TAGS.contains(&t.as_str()) && !include.contains(t))
    }

    fn should_run(&self, rule: &Rule, context: &Context, options: &RunOptions) -> bool {
        let spec = &rule.spec;
        if spec.page_level && !context.page {
            return false;
        }
        let run_only = options
            .run_only
            .as_ref()
            .map(|r| (self.run_only_kind(&r.values, r.kind), &r.values));
        if let Some((RunOnlyKind::Rule, values)) = run_only {
            return values.contains(&spec.id);
        }
        if let Some(toggle) = options.rules.get(&spec.id) {
            return toggle.enabled;
        }
        match run_only {
            Some((RunOnlyKind::Tag, values)) => Self::matches_tags(spec, values),
            _ => spec.enabled && Self::matches_tags(spec, &[]),
        }
    }

    pub(crate) fn select_rules(&self, context: &Context, options: &RunOptions) -> Vec<&Rule> {
        self.rules.iter().filter(|r| self.should_run(r, context, options)).collect()
    }

    /// Whether any selected rule needs media metadata
    pub(crate) fn needs_preload(&self, context: &Context, options: &RunOptions) -> bool {
        self.select_rules(context, options).iter().any(|r| r.spec.preload)
    }

    /// Evaluate every selected rule, in registration order
    pub(crate) async fn run(&self, scope: &RunScope<'_>) -> Vec<RuleResult> {
        let rules = self.select_rules(scope.context, scope.options);
        tracing::debug!("Running {} rules", rules.len());
        let mut results = Vec::with_capacity(rules.len());
        for rule in rules {
            results.push(rule.run(scope, &self.checks, &self.registry).await);
        }
        results
    }

    /// Evaluate one rule regardless of run options, hidden nodes included
    pub(crate) async fn run_virtual_rule(&self, id: &str, scope: &RunScope<'_>) -> Result<RuleResult> {
        let rule = self
            .rule(id)
            .ok_or_else(|| AuditError::InvalidArgument(format!("unknown rule {id:?}")))?;
        Ok(rule.run_virtual(scope, &self.checks, &self.registry).await)
    }

    /// Message of one check result, chosen before verdicts drop the raw outcome
    fn message(&self, check: &CheckResult, should_be_true: bool, review_on_fail: bool) -> String {
        let Some(spec) = self.checks.get(&check.id) else {
            return String::new();
        };
        let messages = &spec.spec.metadata.messages;
        let key = check.message_key();
        let template = match check.result {
            None if !review_on_fail => messages
                .incomplete
                .as_ref()
                .and_then(|m| m.template(key))
                .unwrap_or(self.incomplete_fallback.as_str()),
            outcome => {
                let message = if outcome == Some(should_be_true) {
                    &messages.pass
                } else {
                    &messages.fail
                };
                message.as_ref().and_then(|m| m.template(key)).unwrap_or_default()
            }
        };
        render_message(template, &check.data)
    }

    /// Cross-node and cross-frame pass over merged results: `after` handlers,
    /// messages, then verdicts.
    pub fn after(&self, results: Vec<RuleResult>, options: &RunOptions) -> Result<Vec<RuleResult>> {
        results
            .into_iter()
            .map(|mut result| {
                let rule = self
                    .rule(&result.id)
                    .ok_or_else(|| AuditError::InvalidArgument(format!("result for unknown rule {}", result.id)))?;
                if result.error.is_none() {
                    apply_after(&mut result, &rule.spec, &self.checks, options);
                }
                let review = rule.spec.review_on_fail;
                for node in &mut result.nodes {
                    for check in &mut node.any {
                        check.message = Some(self.message(check, true, review));
                    }
                    for check in &mut node.all {
                        check.message = Some(self.message(check, true, review));
                    }
                    for check in &mut node.none {
                        check.message = Some(self.message(check, false, review));
                    }
                }
                finalize_rule(&mut result, &rule.spec);
                Ok(result)
            })
            .collect()
    }
}
