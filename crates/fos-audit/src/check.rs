//! Checks
//!
//! A check evaluates one node and answers pass (`Some(true)`), fail
//! (`Some(false)`) or cannot tell (`None`), optionally with diagnostic data
//! and related nodes. Evaluators either answer at once or hand back a
//! future; deferred answers are bounded by the session's check timeout.

use crate::pack::CheckSpec;
use crate::registry::{After, Evaluate, Registry};
use crate::result::{CheckResult, NodeRef};
use crate::rule::RunScope;
use crate::{AuditError, Result};
use fos_vdom::{VNodeId, VirtualNode, VirtualTree};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use smol::future::{self, BoxedLocal};
use smol::Timer;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Check answer; `None` is "cannot tell"
pub type Outcome = Option<bool>;

/// What an evaluator returns
pub enum Evaluation {
    Done(Outcome),
    Deferred(BoxedLocal<anyhow::Result<Outcome>>),
}

impl Evaluation {
    pub fn incomplete() -> Self {
        Evaluation::Done(None)
    }

    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<Outcome>> + 'static,
    {
        Evaluation::Deferred(Box::pin(future))
    }
}

impl From<bool> for Evaluation {
    fn from(value: bool) -> Self {
        Evaluation::Done(Some(value))
    }
}

impl From<Outcome> for Evaluation {
    fn from(value: Outcome) -> Self {
        Evaluation::Done(value)
    }
}

impl fmt::Debug for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Done(outcome) => f.debug_tuple("Done").field(outcome).finish(),
            Evaluation::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// Everything an evaluator may read or report
pub struct CheckContext<'a> {
    tree: &'a VirtualTree,
    node: VNodeId,
    options: &'a Value,
    initiator: bool,
    data: Value,
    related: Vec<VNodeId>,
}

impl<'a> CheckContext<'a> {
    pub fn new(tree: &'a VirtualTree, node: VNodeId, options: &'a Value) -> Self {
        Self {
            tree,
            node,
            options,
            initiator: true,
            data: Value::Null,
            related: Vec::new(),
        }
    }

    pub fn with_initiator(mut self, initiator: bool) -> Self {
        self.initiator = initiator;
        self
    }

    pub fn tree(&self) -> &'a VirtualTree {
        self.tree
    }

    pub fn node(&self) -> VNodeId {
        self.node
    }

    pub fn vnode(&self) -> &'a VirtualNode {
        &self.tree[self.node]
    }

    pub fn options(&self) -> &'a Value {
        self.options
    }

    /// Typed option, `None` when absent or of another shape
    pub fn option<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.options
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Whether the run started in this document
    pub fn initiator(&self) -> bool {
        self.initiator
    }

    pub fn data(&mut self, data: Value) {
        self.data = data;
    }

    pub fn related_nodes<I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = VNodeId>,
    {
        self.related.extend(nodes);
    }

    pub fn current_data(&self) -> &Value {
        &self.data
    }

    pub fn current_related(&self) -> &[VNodeId] {
        &self.related
    }
}

/// Overlay `patch` onto `base`: objects merge key by key, anything else replaces
pub(crate) fn merge_options(base: &Value, patch: Option<&Value>) -> Value {
    match (base, patch) {
        (_, None) | (_, Some(Value::Null)) => base.clone(),
        (Value::Object(base), Some(Value::Object(patch))) => {
            let mut merged: Map<String, Value> = base.clone();
            for (key, value) in patch {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (_, Some(patch)) => patch.clone(),
    }
}

/// A check definition bound to its handlers
#[derive(Clone)]
pub(crate) struct Check {
    pub spec: CheckSpec,
    evaluate: Rc<dyn Evaluate>,
    after: Option<Rc<dyn After>>,
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.spec.id)
            .field("evaluate", &self.spec.evaluate)
            .field("after", &self.spec.after)
            .finish()
    }
}

impl Check {
    pub fn compile(spec: CheckSpec, registry: &Registry) -> Result<Self> {
        if spec.id.is_empty() {
            return Err(AuditError::Configuration("check without an id".to_string()));
        }
        let evaluate = registry.evaluator(&spec.evaluate).ok_or_else(|| {
            AuditError::Configuration(format!("check {} uses unknown evaluator {}", spec.id, spec.evaluate))
        })?;
        let after = match &spec.after {
            Some(id) => Some(registry.after(id).ok_or_else(|| {
                AuditError::Configuration(format!("check {} uses unknown after handler {}", spec.id, id))
            })?),
            None => None,
        };
        Ok(Self { spec, evaluate, after })
    }

    pub fn after(&self) -> Option<&Rc<dyn After>> {
        self.after.as_ref()
    }

    /// Options for one evaluation: check defaults, then the rule's, then the run's
    pub fn options(&self, rule: Option<&Value>, run: Option<&Value>) -> Value {
        merge_options(&merge_options(&self.spec.options, rule), run)
    }

    /// Evaluate the check on one node. Errors and timeouts become "cannot tell".
    pub async fn run(&self, scope: &RunScope<'_>, node: VNodeId, options: &Value) -> CheckResult {
        let mut cx = CheckContext::new(scope.tree, node, options).with_initiator(scope.initiator);
        let evaluation = self.evaluate.evaluate(&mut cx);

        let outcome = match evaluation {
            Ok(Evaluation::Done(outcome)) => Ok(outcome),
            Ok(Evaluation::Deferred(pending)) => {
                let limit = scope.check_timeout;
                let id = self.spec.id.clone();
                let deadline = async move {
                    Timer::after(limit).await;
                    Err(anyhow::Error::new(AuditError::Timeout {
                        what: format!("check {id}"),
                        after_ms: limit.as_millis() as u64,
                    }))
                };
                future::or(pending, deadline).await
            }
            Err(err) => Err(err),
        };

        let CheckContext { data, related, .. } = cx;
        let mut result = CheckResult::new(&self.spec.id, None);
        result.impact = self.spec.metadata.impact;
        result.related_nodes = related
            .into_iter()
            .filter(|id| scope.tree.get(*id).is_some())
            .map(|id| NodeRef::describe(scope.tree, id, scope.options.selectors, scope.options.ancestry))
            .collect();

        match outcome {
            Ok(outcome) => {
                result.result = outcome;
                result.data = data;
            }
            Err(err) => {
                let failure = AuditError::CheckEvaluation {
                    check: self.spec.id.clone(),
                    message: err.to_string(),
                };
                tracing::warn!("{}", failure);
                result.data = match data {
                    Value::Object(mut map) => {
                        map.insert("error".to_string(), Value::String(err.to_string()));
                        Value::Object(map)
                    }
                    _ => serde_json::json!({ "error": err.to_string() }),
                };
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunOptions;
    use crate::context::Context;
    use fos_vdom::SerialNode;
    use serde_json::json;
    use std::time::Duration;

    fn spec(evaluate: &str, options: Value) -> CheckSpec {
        serde_json::from_value(json!({ "id": "sample", "evaluate": evaluate, "options": options })).unwrap()
    }

    fn run_on(check: &Check, tree: &VirtualTree, timeout: Duration) -> CheckResult {
        let context = Context::whole(tree);
        let options = RunOptions::default();
        let scope = RunScope {
            tree,
            context: &context,
            options: &options,
            initiator: true,
            check_timeout: timeout,
        };
        let opts = check.options(None, None);
        smol::block_on(check.run(&scope, tree.root().unwrap(), &opts))
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .add_evaluate("echo-min", |cx| {
                let min: u64 = cx.option("min").unwrap_or(0);
                cx.data(json!({ "min": min }));
                Ok(Evaluation::from(min > 1))
            })
            .add_evaluate("broken", |cx| {
                cx.data(json!({ "partial": true }));
                Err(anyhow::anyhow!("no such property"))
            })
            .add_evaluate("slow", |_cx| {
                Ok(Evaluation::deferred(async {
                    Timer::after(Duration::from_secs(5)).await;
                    Ok(Some(true))
                }))
            })
            .add_evaluate("later", |cx| {
                cx.related_nodes([cx.node()]);
                Ok(Evaluation::deferred(async { Ok(Some(false)) }))
            });
        registry
    }

    fn tree() -> VirtualTree {
        VirtualTree::from_serial(&SerialNode::element("div").with_attr("id", "d")).unwrap()
    }

    #[test]
    fn test_merge_options() {
        let base = json!({ "a": 1, "b": 2 });
        assert_eq!(merge_options(&base, Some(&json!({ "b": 3 }))), json!({ "a": 1, "b": 3 }));
        assert_eq!(merge_options(&base, None), base);
        assert_eq!(merge_options(&base, Some(&json!(["x"]))), json!(["x"]));
    }

    #[test]
    fn test_options_layering() {
        let check = Check::compile(spec("echo-min", json!({ "min": 1, "keep": true })), &registry()).unwrap();
        let merged = check.options(Some(&json!({ "min": 2 })), Some(&json!({ "min": 3 })));
        assert_eq!(merged, json!({ "min": 3, "keep": true }));
    }

    #[test]
    fn test_sync_evaluation() {
        let check = Check::compile(spec("echo-min", json!({ "min": 2 })), &registry()).unwrap();
        let result = run_on(&check, &tree(), Duration::from_secs(1));
        assert_eq!(result.result, Some(true));
        assert_eq!(result.data, json!({ "min": 2 }));
    }

    #[test]
    fn test_error_becomes_incomplete() {
        let check = Check::compile(spec("broken", Value::Null), &registry()).unwrap();
        let result = run_on(&check, &tree(), Duration::from_secs(1));
        assert_eq!(result.result, None);
        assert_eq!(result.data["error"], json!("no such property"));
        assert_eq!(result.data["partial"], json!(true));
    }

    #[test]
    fn test_deferred_evaluation() {
        let check = Check::compile(spec("later", Value::Null), &registry()).unwrap();
        let result = run_on(&check, &tree(), Duration::from_secs(1));
        assert_eq!(result.result, Some(false));
        assert_eq!(result.related_nodes.len(), 1);
        assert_eq!(result.related_nodes[0].html, r#"<div id="d"></div>"#);
    }

    #[test]
    fn test_deferred_timeout() {
        let check = Check::compile(spec("slow", Value::Null), &registry()).unwrap();
        let result = run_on(&check, &tree(), Duration::from_millis(20));
        assert_eq!(result.result, None);
        assert!(result.data["error"].as_str().unwrap().contains("timed out"));
    }

    #[test]
    fn test_unknown_evaluator() {
        assert!(matches!(
            Check::compile(spec("nope", Value::Null), &registry()),
            Err(AuditError::Configuration(_))
        ));
    }
}
