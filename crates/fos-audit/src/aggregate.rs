//! Turning check results into node and rule verdicts
//!
//! Each check result gets a priority: 1 for a pass, 2 for "cannot tell",
//! 3 for a failure (`none` checks are inverted). A node takes the worst of
//! its `all` and `none` checks and the best of its `any` checks; only the
//! checks that decided the verdict are kept on the node.

use crate::check::Check;
use crate::config::RunOptions;
use crate::pack::{Impact, RuleSpec};
use crate::result::{CheckResult, NodeResult, RuleResult, TestResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const PASS: u8 = 1;
const CANT_TELL: u8 = 2;
const FAIL: u8 = 3;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Group {
    Any,
    All,
    None,
}

fn priority(check: &CheckResult, group: Group) -> u8 {
    match (check.result, group) {
        (None, _) => CANT_TELL,
        (Some(true), Group::None) | (Some(false), Group::Any | Group::All) => FAIL,
        (Some(false), Group::None) | (Some(true), Group::Any | Group::All) => PASS,
    }
}

fn to_result(priority: u8) -> TestResult {
    match priority {
        PASS => TestResult::Passed,
        CANT_TELL => TestResult::CantTell,
        FAIL => TestResult::Failed,
        _ => TestResult::Inapplicable,
    }
}

/// Run the rule's `after` handlers over its results, in node order.
///
/// A handler sees every result of its check across all nodes (and frames)
/// and returns the ones to keep. Nodes left without checks are dropped.
pub(crate) fn apply_after(result: &mut RuleResult, spec: &RuleSpec, checks: &HashMap<String, Check>, options: &RunOptions) {
    for (slot, node) in result.nodes.iter_mut().enumerate() {
        for check in node.checks_mut() {
            check.slot = slot;
        }
    }

    for check_ref in spec.check_refs() {
        let Some(check) = checks.get(check_ref.id()) else {
            continue;
        };
        let Some(after) = check.after() else {
            continue;
        };
        let id = check_ref.id();
        let before: Vec<CheckResult> = result
            .nodes
            .iter()
            .flat_map(|node| node.checks())
            .filter(|c| c.id == id)
            .cloned()
            .collect();
        if before.is_empty() {
            continue;
        }
        let options = check.options(check_ref.options(), options.check_options(id));
        let kept = after.after(before, &options);

        let mut by_slot: HashMap<usize, Vec<CheckResult>> = HashMap::new();
        for check in kept {
            by_slot.entry(check.slot).or_default().push(check);
        }
        for (slot, node) in result.nodes.iter_mut().enumerate() {
            let mut replacement = by_slot.remove(&slot).unwrap_or_default();
            for group in [&mut node.any, &mut node.all, &mut node.none] {
                if let Some(position) = group.iter().position(|c| c.id == id) {
                    group.retain(|c| c.id != id);
                    let tail = group.split_off(position.min(group.len()));
                    group.append(&mut replacement);
                    group.extend(tail);
                }
            }
        }
    }

    let before = result.nodes.len();
    result.nodes.retain(|node| node.checks().next().is_some());
    if result.nodes.len() != before {
        tracing::debug!("Rule {}: after handlers removed {} nodes", result.id, before - result.nodes.len());
    }
}

fn finalize_node(node: &mut NodeResult, review_on_fail: bool) {
    let groups = [Group::Any, Group::All, Group::None];
    if review_on_fail {
        for group in groups {
            for check in group_mut(node, group) {
                if priority(check, group) == FAIL {
                    check.result = None;
                }
            }
        }
    }

    let all = node.all.iter().map(|c| priority(c, Group::All)).max().unwrap_or(0);
    let none = node.none.iter().map(|c| priority(c, Group::None)).max().unwrap_or(0);
    let any = node.any.iter().map(|c| priority(c, Group::Any)).min().unwrap_or(0);
    let node_priority = all.max(none).max(any);

    let mut impacts = Vec::new();
    for (group, group_priority) in [(Group::Any, any), (Group::All, all), (Group::None, none)] {
        let checks = group_mut(node, group);
        checks.retain(|c| {
            let p = priority(c, group);
            p == node_priority && p == group_priority
        });
        impacts.extend(checks.iter().filter_map(|c| c.impact));
    }

    node.result = to_result(node_priority);
    node.impact = match node.result {
        TestResult::CantTell | TestResult::Failed => impacts.into_iter().max(),
        _ => None,
    };
}

fn group_mut(node: &mut NodeResult, group: Group) -> &mut Vec<CheckResult> {
    match group {
        Group::Any => &mut node.any,
        Group::All => &mut node.all,
        Group::None => &mut node.none,
    }
}

/// Compute node verdicts, impacts and the rule verdict
pub fn finalize_rule(result: &mut RuleResult, spec: &RuleSpec) {
    if let Some(impact) = spec.impact {
        for node in &mut result.nodes {
            for check in node.checks_mut() {
                check.impact = Some(impact);
            }
        }
    }
    for node in &mut result.nodes {
        finalize_node(node, spec.review_on_fail);
    }

    if spec.page_level && result.nodes.iter().any(|n| n.result == TestResult::Passed) {
        result.nodes.retain(|n| n.result != TestResult::Failed);
    }

    result.result = if result.error.is_some() {
        TestResult::CantTell
    } else {
        result
            .nodes
            .iter()
            .map(|n| n.result)
            .max()
            .unwrap_or(TestResult::Inapplicable)
    };

    let impact_of = |wanted: TestResult| -> Option<Impact> {
        result.nodes.iter().filter(|n| n.result == wanted).filter_map(|n| n.impact).max()
    };
    let impact = if result.nodes.iter().any(|n| n.result == TestResult::Failed) {
        impact_of(TestResult::Failed)
    } else {
        impact_of(TestResult::CantTell)
    };
    result.impact = impact;
}

/// Rules split by outcome; a rule appears in every category one of its nodes landed in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResults {
    pub passes: Vec<RuleResult>,
    pub violations: Vec<RuleResult>,
    pub incomplete: Vec<RuleResult>,
    pub inapplicable: Vec<RuleResult>,
}

fn with_nodes(rule: &RuleResult, wanted: TestResult) -> Option<RuleResult> {
    let nodes: Vec<NodeResult> = rule.nodes.iter().filter(|n| n.result == wanted).cloned().collect();
    if nodes.is_empty() {
        return None;
    }
    Some(RuleResult {
        nodes,
        ..rule.clone()
    })
}

/// Split finalized rule results into report categories
pub fn aggregate_result(results: &[RuleResult]) -> AggregatedResults {
    let mut aggregated = AggregatedResults::default();
    for rule in results {
        if rule.error.is_some() {
            aggregated.incomplete.push(rule.clone());
            continue;
        }
        if rule.result == TestResult::Inapplicable {
            aggregated.inapplicable.push(RuleResult {
                nodes: Vec::new(),
                ..rule.clone()
            });
            continue;
        }
        if let Some(passes) = with_nodes(rule, TestResult::Passed) {
            aggregated.passes.push(passes);
        }
        if let Some(violations) = with_nodes(rule, TestResult::Failed) {
            aggregated.violations.push(violations);
        }
        if let Some(incomplete) = with_nodes(rule, TestResult::CantTell) {
            aggregated.incomplete.push(incomplete);
        }
    }
    aggregated
}
