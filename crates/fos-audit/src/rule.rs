//! Rules
//!
//! A rule gathers the nodes it applies to (selector, run scope, hidden-node
//! exclusion, then its `matches` filter) and runs its checks on each of
//! them in document order. Turning check results into verdicts happens
//! later, once results from every frame are in; see [`crate::aggregate`].

use crate::check::Check;
use crate::config::RunOptions;
use crate::context::Context;
use crate::matcher::{CompiledExpression, MatchContext};
use crate::pack::{CheckRef, MatchSpec, RuleSpec};
use crate::registry::{Matches, Registry};
use crate::result::{NodeRef, NodeResult, RuleResult, TestResult};
use crate::{AuditError, Result};
use fos_a11y::is_visible_to_screen_readers;
use fos_vdom::{compile, query_selector_all, VNodeId, VirtualTree};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Shared inputs of one run over one tree
pub(crate) struct RunScope<'a> {
    pub tree: &'a VirtualTree,
    pub context: &'a Context,
    pub options: &'a RunOptions,
    pub initiator: bool,
    pub check_timeout: Duration,
}

enum RuleMatcher {
    Always,
    Handler(Rc<dyn Matches>),
    Expression(CompiledExpression),
}

/// A rule definition bound to its handlers
pub(crate) struct Rule {
    pub spec: RuleSpec,
    matcher: RuleMatcher,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.spec.id)
            .field("selector", &self.spec.selector)
            .finish()
    }
}

impl Rule {
    /// Validate a definition and bind it. Every referenced check must exist.
    pub fn compile(spec: RuleSpec, registry: &Registry, checks: &HashMap<String, Check>) -> Result<Self> {
        if spec.id.is_empty() {
            return Err(AuditError::Configuration("rule without an id".to_string()));
        }
        fos_css::parse_selector_list(&spec.selector)
            .map_err(|e| AuditError::Configuration(format!("rule {} has an invalid selector: {e}", spec.id)))?;

        let matcher = match &spec.matches {
            None => RuleMatcher::Always,
            Some(MatchSpec::Handler(id)) => RuleMatcher::Handler(registry.matcher(id).ok_or_else(|| {
                AuditError::Configuration(format!("rule {} uses unknown matcher {}", spec.id, id))
            })?),
            Some(MatchSpec::Expression(expression)) => {
                let compiled = CompiledExpression::compile(expression)?;
                if let Some(condition) = compiled.condition() {
                    if registry.matcher(condition).is_none() {
                        return Err(AuditError::Configuration(format!(
                            "rule {} uses unknown matcher {}",
                            spec.id, condition
                        )));
                    }
                }
                RuleMatcher::Expression(compiled)
            }
        };

        if let Some(missing) = spec.check_refs().find(|r| !checks.contains_key(r.id())) {
            return Err(AuditError::Configuration(format!(
                "rule {} references unknown check {}",
                spec.id,
                missing.id()
            )));
        }
        Ok(Self { spec, matcher })
    }

    fn is_match(&self, registry: &Registry, cx: &MatchContext<'_>) -> bool {
        match &self.matcher {
            RuleMatcher::Always => true,
            RuleMatcher::Handler(handler) => handler.matches(cx),
            RuleMatcher::Expression(expression) => expression.matches(registry, cx),
        }
    }

    /// Nodes the rule applies to, in document order
    #[cfg(test)]
    pub fn gather(&self, scope: &RunScope<'_>, registry: &Registry) -> Result<Vec<VNodeId>> {
        self.gather_nodes(scope, registry, self.spec.exclude_hidden)
    }

    fn gather_nodes(&self, scope: &RunScope<'_>, registry: &Registry, exclude_hidden: bool) -> Result<Vec<VNodeId>> {
        let tree = scope.tree;
        let selector = compile(tree, &self.spec.selector)?;
        let mut nodes = BTreeSet::new();
        for root in &scope.context.include {
            nodes.extend(
                query_selector_all(tree, *root, &selector)
                    .into_iter()
                    .filter(|id| scope.context.contains(*id)),
            );
        }
        Ok(nodes
            .into_iter()
            .filter(|id| !exclude_hidden || is_visible_to_screen_readers(tree, *id))
            .filter(|id| {
                let cx = MatchContext {
                    tree,
                    node: *id,
                    initiator: scope.initiator,
                };
                self.is_match(registry, &cx)
            })
            .collect())
    }

    async fn run_group(
        &self,
        scope: &RunScope<'_>,
        checks: &HashMap<String, Check>,
        refs: &[CheckRef],
        node: VNodeId,
        slot: usize,
    ) -> Vec<crate::result::CheckResult> {
        let mut results = Vec::with_capacity(refs.len());
        for check_ref in refs {
            let Some(check) = checks.get(check_ref.id()) else {
                continue;
            };
            if !scope.options.check_enabled(check_ref.id(), check.spec.enabled) {
                continue;
            }
            let options = check.options(check_ref.options(), scope.options.check_options(check_ref.id()));
            let mut result = check.run(scope, node, &options).await;
            if let Some(impact) = self.spec.impact {
                result.impact = Some(impact);
            }
            result.slot = slot;
            results.push(result);
        }
        results
    }

    /// Gather and evaluate. A rule that cannot gather its nodes reports the
    /// error instead of failing the run.
    pub async fn run(&self, scope: &RunScope<'_>, checks: &HashMap<String, Check>, registry: &Registry) -> RuleResult {
        self.evaluate(scope, checks, registry, self.spec.exclude_hidden).await
    }

    /// Run on a serialized tree, where hidden nodes are tested too
    pub async fn run_virtual(
        &self,
        scope: &RunScope<'_>,
        checks: &HashMap<String, Check>,
        registry: &Registry,
    ) -> RuleResult {
        self.evaluate(scope, checks, registry, false).await
    }

    async fn evaluate(
        &self,
        scope: &RunScope<'_>,
        checks: &HashMap<String, Check>,
        registry: &Registry,
        exclude_hidden: bool,
    ) -> RuleResult {
        let mut result = RuleResult::new(&self.spec.id);
        result.page_level = self.spec.page_level;
        result.impact = self.spec.impact;
        result.tags = self.spec.tags.clone();

        let nodes = match self.gather_nodes(scope, registry, exclude_hidden) {
            Ok(nodes) => nodes,
            Err(err) => {
                tracing::warn!("Rule {} could not run: {}", self.spec.id, err);
                result.error = Some(err.to_string());
                result.result = TestResult::CantTell;
                return result;
            }
        };
        tracing::debug!("Rule {} applies to {} nodes", self.spec.id, nodes.len());

        for (slot, node) in nodes.into_iter().enumerate() {
            let mut node_result = NodeResult::new(NodeRef::describe(
                scope.tree,
                node,
                scope.options.selectors,
                scope.options.ancestry,
            ));
            if !scope.options.element_ref {
                node_result.node.element = None;
            }
            node_result.any = self.run_group(scope, checks, &self.spec.any, node, slot).await;
            node_result.all = self.run_group(scope, checks, &self.spec.all, node, slot).await;
            node_result.none = self.run_group(scope, checks, &self.spec.none, node, slot).await;
            result.nodes.push(node_result);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::CheckSpec;
    use crate::check::Evaluation;
    use fos_vdom::SerialNode;
    use serde_json::json;

    fn setup() -> (Registry, HashMap<String, Check>) {
        let mut registry = Registry::new();
        registry
            .add_evaluate("has-src", |cx| Ok(Evaluation::from(cx.vnode().has_attr("src"))))
            .add_matches("not-decorative", |cx| cx.tree[cx.node].attr("role") != Some("none"));
        let spec: CheckSpec = serde_json::from_value(json!({ "id": "has-src", "evaluate": "has-src" })).unwrap();
        let mut checks = HashMap::new();
        checks.insert("has-src".to_string(), Check::compile(spec, &registry).unwrap());
        (registry, checks)
    }

    fn rule(value: serde_json::Value, registry: &Registry, checks: &HashMap<String, Check>) -> Result<Rule> {
        Rule::compile(serde_json::from_value(value).unwrap(), registry, checks)
    }

    fn tree() -> VirtualTree {
        let root = SerialNode::element("div")
            .with_child(SerialNode::element("img").with_attr("src", "a.png"))
            .with_child(SerialNode::element("img").with_attr("role", "none"))
            .with_child(SerialNode::element("img"));
        VirtualTree::from_serial(&root).unwrap()
    }

    #[test]
    fn test_compile_validation() {
        let (registry, checks) = setup();
        assert!(rule(json!({ "id": "r", "selector": "img", "all": ["has-src"] }), &registry, &checks).is_ok());
        assert!(matches!(
            rule(json!({ "id": "r", "all": ["missing"] }), &registry, &checks),
            Err(AuditError::Configuration(_))
        ));
        assert!(matches!(
            rule(json!({ "id": "r", "selector": "img[" }), &registry, &checks),
            Err(AuditError::Configuration(_))
        ));
        assert!(matches!(
            rule(json!({ "id": "r", "matches": "nope" }), &registry, &checks),
            Err(AuditError::Configuration(_))
        ));
    }

    #[test]
    fn test_gather_and_run() {
        let (registry, checks) = setup();
        let rule = rule(
            json!({ "id": "img-src", "selector": "img", "matches": "not-decorative", "all": ["has-src"] }),
            &registry,
            &checks,
        )
        .unwrap();
        let tree = tree();
        let context = Context::whole(&tree);
        let options = RunOptions::default();
        let scope = RunScope {
            tree: &tree,
            context: &context,
            options: &options,
            initiator: true,
            check_timeout: Duration::from_secs(1),
        };
        assert_eq!(rule.gather(&scope, &registry).unwrap().len(), 2);

        let result = smol::block_on(rule.run(&scope, &checks, &registry));
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.nodes[0].all[0].result, Some(true));
        assert_eq!(result.nodes[1].all[0].result, Some(false));
        assert_eq!(result.nodes[1].all[0].slot, 1);
        assert!(result.nodes[0].node.element.is_none());
    }

    #[test]
    fn test_disabled_check_is_skipped() {
        let (registry, checks) = setup();
        let rule = rule(json!({ "id": "r", "selector": "img", "all": ["has-src"] }), &registry, &checks).unwrap();
        let tree = tree();
        let context = Context::whole(&tree);
        let options: RunOptions = serde_json::from_value(json!({ "checks": { "has-src": { "enabled": false } } })).unwrap();
        let scope = RunScope {
            tree: &tree,
            context: &context,
            options: &options,
            initiator: true,
            check_timeout: Duration::from_secs(1),
        };
        let result = smol::block_on(rule.run(&scope, &checks, &registry));
        assert!(result.nodes.iter().all(|n| n.all.is_empty()));
    }
}
