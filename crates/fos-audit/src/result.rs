//! Check, node and rule results

use crate::check::Outcome;
use crate::pack::Impact;
use fos_vdom::{get_ancestry, get_target, node_index, outer_html, Target, VNodeId, VirtualTree};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node as it appears in results: markup, selectors and document position.
///
/// Selectors are generated when the reference is created, not when the
/// report is assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRef {
    pub html: String,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestry: Option<Target>,
    /// Document-order positions, one per frame level
    #[serde(default)]
    pub node_indexes: Vec<usize>,
    /// Node in the tree the result was computed on; lost when crossing frames
    #[serde(skip)]
    pub element: Option<VNodeId>,
}

impl NodeRef {
    pub fn of(tree: &VirtualTree, id: VNodeId) -> Self {
        Self::describe(tree, id, true, false)
    }

    pub fn describe(tree: &VirtualTree, id: VNodeId, selectors: bool, ancestry: bool) -> Self {
        Self {
            html: outer_html(tree, id),
            target: if selectors { get_target(tree, id) } else { Vec::new() },
            ancestry: ancestry.then(|| get_ancestry(tree, id)),
            node_indexes: vec![node_index(id)],
            element: Some(id),
        }
    }

    /// Re-root a reference computed inside a frame onto the frame element
    pub fn prefix(&mut self, frame: &NodeRef) {
        let mut target = frame.target.clone();
        target.append(&mut self.target);
        self.target = target;
        self.ancestry = match (&frame.ancestry, self.ancestry.take()) {
            (Some(outer), Some(mut inner)) => {
                let mut ancestry = outer.clone();
                ancestry.append(&mut inner);
                Some(ancestry)
            }
            _ => None,
        };
        let mut indexes = frame.node_indexes.clone();
        indexes.append(&mut self.node_indexes);
        self.node_indexes = indexes;
        self.element = None;
    }
}

/// Outcome of one check on one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub id: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub related_nodes: Vec<NodeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    /// `None` when the check could not decide
    pub result: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Index of the owning node among the rule's node results
    #[serde(skip)]
    pub(crate) slot: usize,
}

impl CheckResult {
    pub fn new(id: &str, result: Outcome) -> Self {
        Self {
            id: id.to_string(),
            data: Value::Null,
            related_nodes: Vec::new(),
            impact: None,
            result,
            message: None,
            slot: 0,
        }
    }

    /// String form of `data.messageKey`
    pub fn message_key(&self) -> Option<&str> {
        self.data.get("messageKey").and_then(Value::as_str)
    }
}

/// Rule verdict for a node or a whole rule, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestResult {
    Inapplicable,
    Passed,
    CantTell,
    Failed,
}

/// Check results of one rule on one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    pub node: NodeRef,
    pub any: Vec<CheckResult>,
    pub all: Vec<CheckResult>,
    pub none: Vec<CheckResult>,
    pub result: TestResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
}

impl NodeResult {
    pub fn new(node: NodeRef) -> Self {
        Self {
            node,
            any: Vec::new(),
            all: Vec::new(),
            none: Vec::new(),
            result: TestResult::Inapplicable,
            impact: None,
        }
    }

    pub fn checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.any.iter().chain(&self.all).chain(&self.none)
    }

    pub(crate) fn checks_mut(&mut self) -> impl Iterator<Item = &mut CheckResult> {
        self.any.iter_mut().chain(self.all.iter_mut()).chain(self.none.iter_mut())
    }
}

/// One rule's results for a run or a partial run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub id: String,
    pub result: TestResult,
    #[serde(default)]
    pub page_level: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub nodes: Vec<NodeResult>,
    /// Set when the rule itself could not run; the rule is then incomplete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RuleResult {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            result: TestResult::Inapplicable,
            page_level: false,
            impact: None,
            tags: Vec::new(),
            nodes: Vec::new(),
            error: None,
        }
    }
}
