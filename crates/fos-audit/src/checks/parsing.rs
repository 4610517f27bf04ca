//! Duplicate ids on focusable elements

use crate::check::{CheckContext, Evaluation};
use crate::matcher::MatchContext;
use crate::registry::Registry;
use crate::result::CheckResult;
use fos_a11y::{is_accessible_ref, is_focusable};
use serde_json::{json, Value};

pub(super) fn register(registry: &mut Registry) {
    registry
        .add_evaluate("duplicate-id-active", duplicate_id)
        .add_after("duplicate-id-after", duplicate_id_after)
        .add_matches("duplicate-id-active-matches", |cx: &MatchContext<'_>| {
            let has_id = cx.tree[cx.node].attr("id").is_some_and(|id| !id.trim().is_empty());
            has_id && is_focusable(cx.tree, cx.node) && !is_accessible_ref(cx.tree, cx.node)
        });
}

fn duplicate_id(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let node = cx.vnode();
    let Some(id) = node.attr("id").map(str::trim).filter(|id| !id.is_empty()) else {
        return Ok(true.into());
    };
    let others: Vec<_> = cx
        .tree()
        .elements_by_id(node.scope(), id)
        .iter()
        .copied()
        .filter(|other| *other != cx.node())
        .collect();
    cx.data(json!(id));
    let unique = others.is_empty();
    cx.related_nodes(others);
    Ok(unique.into())
}

/// One result per id value
fn duplicate_id_after(results: Vec<CheckResult>, _options: &Value) -> Vec<CheckResult> {
    let mut seen: Vec<Value> = Vec::new();
    results
        .into_iter()
        .filter(|result| {
            if seen.contains(&result.data) {
                return false;
            }
            seen.push(result.data.clone());
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_util::{evaluate, matches};
    use fos_vdom::{SerialNode, VirtualTree};

    fn tree() -> VirtualTree {
        let root = SerialNode::element("div")
            .with_child(SerialNode::element("button").with_attr("id", "save"))
            .with_child(SerialNode::element("a").with_attr("href", "#").with_attr("id", "save"))
            .with_child(SerialNode::element("span").with_attr("id", "note"));
        VirtualTree::from_serial(&root).unwrap()
    }

    #[test]
    fn test_duplicate_id() {
        let tree = tree();
        let children: Vec<_> = tree.element_children(tree.root().unwrap()).collect();
        let (result, data) = evaluate("duplicate-id-active", &tree, children[0], &Value::Null);
        assert_eq!(result, Some(false));
        assert_eq!(data, json!("save"));
        assert_eq!(evaluate("duplicate-id-active", &tree, children[2], &Value::Null).0, Some(true));

        assert!(matches("duplicate-id-active-matches", &tree, children[0]));
        assert!(!matches("duplicate-id-active-matches", &tree, children[2]));
    }

    #[test]
    fn test_after_keeps_first_per_id() {
        let mut a = CheckResult::new("duplicate-id-active", Some(false));
        a.data = json!("save");
        let b = a.clone();
        let mut c = CheckResult::new("duplicate-id-active", Some(false));
        c.data = json!("other");
        let kept = duplicate_id_after(vec![a, b, c], &Value::Null);
        assert_eq!(kept.len(), 2);
    }
}
