//! Document language and title

use crate::check::{CheckContext, Evaluation};
use crate::matcher::MatchContext;
use crate::registry::Registry;
use fos_a11y::sanitize;
use serde_json::json;

pub(super) fn register(registry: &mut Registry) {
    registry
        .add_evaluate("has-lang", has_lang)
        .add_evaluate("doc-has-title", doc_has_title)
        .add_matches("is-initiator-matches", |cx: &MatchContext<'_>| cx.initiator);
}

fn has_lang(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let node = cx.vnode();
    let non_empty = |attr: &str| node.attr(attr).is_some_and(|v| !v.trim().is_empty());
    if non_empty("lang") {
        return Ok(true.into());
    }
    if non_empty("xml:lang") {
        cx.data(json!({ "messageKey": "noXHTML" }));
        return Ok(true.into());
    }
    cx.data(json!({ "messageKey": "noLang" }));
    Ok(false.into())
}

/// A non-empty `<title>` in the node's document
fn doc_has_title(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let tree = cx.tree();
    let document = tree.document_scope(cx.vnode().scope());
    let title = tree
        .nodes()
        .filter(|n| n.node_name() == "title" && tree.document_scope(n.scope()) == document)
        .map(|n| sanitize(&tree.text_content(n.id())))
        .next();
    Ok(title.is_some_and(|t| !t.is_empty()).into())
}

#[cfg(test)]
mod tests {
    use crate::checks::test_util::{evaluate, matches};
    use fos_vdom::{SerialNode, VirtualTree};
    use serde_json::{json, Value};

    fn html(lang: Option<&str>, title: Option<&str>) -> VirtualTree {
        let mut head = SerialNode::element("head");
        if let Some(title) = title {
            head = head.with_child(SerialNode::element("title").with_child(SerialNode::text(title)));
        }
        let mut root = SerialNode::element("html").with_child(head).with_child(SerialNode::element("body"));
        if let Some(lang) = lang {
            root = root.with_attr("lang", lang);
        }
        VirtualTree::from_serial(&root).unwrap()
    }

    #[test]
    fn test_has_lang() {
        let tree = html(Some("en"), None);
        assert_eq!(evaluate("has-lang", &tree, tree.root().unwrap(), &Value::Null).0, Some(true));
        let tree = html(Some(" "), None);
        let (result, data) = evaluate("has-lang", &tree, tree.root().unwrap(), &Value::Null);
        assert_eq!(result, Some(false));
        assert_eq!(data["messageKey"], json!("noLang"));
    }

    #[test]
    fn test_doc_has_title() {
        let tree = html(None, Some("Home"));
        assert_eq!(evaluate("doc-has-title", &tree, tree.root().unwrap(), &Value::Null).0, Some(true));
        let tree = html(None, Some("   "));
        assert_eq!(evaluate("doc-has-title", &tree, tree.root().unwrap(), &Value::Null).0, Some(false));
        let tree = html(None, None);
        assert_eq!(evaluate("doc-has-title", &tree, tree.root().unwrap(), &Value::Null).0, Some(false));
        assert!(matches("is-initiator-matches", &tree, tree.root().unwrap()));
    }
}
