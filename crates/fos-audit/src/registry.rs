//! Handler registry
//!
//! Rule and check packs name their native code by id. The registry maps
//! those ids to handlers; definitions are bound to them once, when they are
//! added to an [`crate::Audit`], so a run never looks a handler up by name.

use crate::check::{CheckContext, Evaluation};
use crate::matcher::MatchContext;
use crate::result::CheckResult;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Check evaluator
pub trait Evaluate {
    fn evaluate(&self, cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation>;
}

impl<F> Evaluate for F
where
    F: Fn(&mut CheckContext<'_>) -> anyhow::Result<Evaluation>,
{
    fn evaluate(&self, cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
        self(cx)
    }
}

/// Rule node filter
pub trait Matches {
    fn matches(&self, cx: &MatchContext<'_>) -> bool;
}

impl<F> Matches for F
where
    F: Fn(&MatchContext<'_>) -> bool,
{
    fn matches(&self, cx: &MatchContext<'_>) -> bool {
        self(cx)
    }
}

/// Pass over every result of one check within one rule
pub trait After {
    fn after(&self, results: Vec<CheckResult>, options: &Value) -> Vec<CheckResult>;
}

impl<F> After for F
where
    F: Fn(Vec<CheckResult>, &Value) -> Vec<CheckResult>,
{
    fn after(&self, results: Vec<CheckResult>, options: &Value) -> Vec<CheckResult> {
        self(results, options)
    }
}

/// Handlers by id
#[derive(Clone, Default)]
pub struct Registry {
    evaluators: HashMap<String, Rc<dyn Evaluate>>,
    matchers: HashMap<String, Rc<dyn Matches>>,
    afters: HashMap<String, Rc<dyn After>>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in handler
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::checks::register(&mut registry);
        registry
    }

    pub fn add_evaluate<F>(&mut self, id: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut CheckContext<'_>) -> anyhow::Result<Evaluation> + 'static,
    {
        self.insert_evaluate(id, Rc::new(handler))
    }

    pub fn add_matches<F>(&mut self, id: &str, handler: F) -> &mut Self
    where
        F: Fn(&MatchContext<'_>) -> bool + 'static,
    {
        self.insert_matches(id, Rc::new(handler))
    }

    pub fn add_after<F>(&mut self, id: &str, handler: F) -> &mut Self
    where
        F: Fn(Vec<CheckResult>, &Value) -> Vec<CheckResult> + 'static,
    {
        self.insert_after(id, Rc::new(handler))
    }

    pub fn insert_evaluate(&mut self, id: &str, handler: Rc<dyn Evaluate>) -> &mut Self {
        if self.evaluators.insert(id.to_string(), handler).is_some() {
            tracing::debug!("Replaced evaluator {}", id);
        }
        self
    }

    pub fn insert_matches(&mut self, id: &str, handler: Rc<dyn Matches>) -> &mut Self {
        if self.matchers.insert(id.to_string(), handler).is_some() {
            tracing::debug!("Replaced matcher {}", id);
        }
        self
    }

    pub fn insert_after(&mut self, id: &str, handler: Rc<dyn After>) -> &mut Self {
        if self.afters.insert(id.to_string(), handler).is_some() {
            tracing::debug!("Replaced after handler {}", id);
        }
        self
    }

    pub fn evaluator(&self, id: &str) -> Option<Rc<dyn Evaluate>> {
        self.evaluators.get(id).cloned()
    }

    pub fn matcher(&self, id: &str) -> Option<Rc<dyn Matches>> {
        self.matchers.get(id).cloned()
    }

    pub fn after(&self, id: &str) -> Option<Rc<dyn After>> {
        self.afters.get(id).cloned()
    }

    /// Run a match handler; an unknown id matches nothing
    pub fn run_matches(&self, id: &str, cx: &MatchContext<'_>) -> bool {
        match self.matchers.get(id) {
            Some(handler) => handler.matches(cx),
            None => {
                tracing::warn!("Unknown match handler {}", id);
                false
            }
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut evaluators: Vec<&String> = self.evaluators.keys().collect();
        evaluators.sort();
        f.debug_struct("Registry")
            .field("evaluators", &evaluators)
            .field("matchers", &self.matchers.len())
            .field("afters", &self.afters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_vdom::{SerialNode, VirtualTree};

    #[test]
    fn test_builtin_handlers() {
        let registry = Registry::builtin();
        for id in ["has-alt", "aria-label", "color-contrast", "no-autoplay-audio"] {
            assert!(registry.evaluator(id).is_some(), "missing evaluator {id}");
        }
        assert!(registry.matcher("no-explicit-name-required-matches").is_some());
        assert!(registry.after("landmark-is-unique-after").is_some());
    }

    #[test]
    fn test_custom_handlers() {
        let mut registry = Registry::new();
        registry
            .add_evaluate("always", |_cx| Ok(Evaluation::from(true)))
            .add_matches("images", |cx| cx.tree[cx.node].node_name() == "img");

        let tree = VirtualTree::from_serial(&SerialNode::element("img")).unwrap();
        let cx = MatchContext {
            tree: &tree,
            node: tree.root().unwrap(),
            initiator: true,
        };
        assert!(registry.run_matches("images", &cx));
        assert!(!registry.run_matches("unknown", &cx));
        assert!(registry.evaluator("always").is_some());
    }
}
