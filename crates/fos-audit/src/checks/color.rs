//! Text color contrast
//!
//! Compares the effective text color with the opaque color behind it.
//! When either cannot be determined the check answers "cannot tell" and
//! reports why through `data.messageKey`.

use crate::check::{CheckContext, Evaluation};
use crate::matcher::MatchContext;
use crate::registry::Registry;
use fos_a11y::{
    clear_incomplete_data, get_background_color, get_foreground_color, has_valid_contrast_ratio, incomplete_reason,
    is_disabled, is_visible_on_screen, visible_virtual, ColorKind, IncompleteReason,
};
use fos_vdom::{VNodeId, VirtualTree};
use serde_json::{json, Map, Value};

const DEFAULT_BOLD_WEIGHT: u32 = 700;

pub(super) fn register(registry: &mut Registry) {
    registry
        .add_evaluate("color-contrast", color_contrast)
        .add_matches("color-contrast-matches", color_contrast_matches);
}

/// Options: `boldValue`, the weight from which text counts as bold
fn color_contrast(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let tree = cx.tree();
    let id = cx.node();
    let Some(style) = cx.vnode().computed_style() else {
        return Ok(Evaluation::incomplete());
    };
    let bold_value = cx.option::<u32>("boldValue").unwrap_or(DEFAULT_BOLD_WEIGHT);
    let font_size = style.font_size();
    let bold = style.font_weight() >= bold_value;

    clear_incomplete_data(tree);
    let bg = get_background_color(tree, id);
    let fg = get_foreground_color(tree, id, bg);

    let mut data = Map::new();
    data.insert(
        "fontSize".into(),
        json!(format!("{:.1}pt ({}px)", font_size * 72.0 / 96.0, font_size)),
    );
    data.insert("fontWeight".into(), json!(if bold { "bold" } else { "normal" }));

    let (Some(bg), Some(fg)) = (bg, fg) else {
        let reason = incomplete_reason(tree, ColorKind::Background)
            .or_else(|| incomplete_reason(tree, ColorKind::Foreground));
        if let Some(reason) = reason {
            data.insert("messageKey".into(), json!(reason.as_str()));
        }
        cx.data(Value::Object(data));
        return Ok(Evaluation::incomplete());
    };

    let contrast = has_valid_contrast_ratio(&bg, &fg, font_size, bold);
    let truncated = (contrast.contrast_ratio * 100.0).floor() / 100.0;
    data.insert("fgColor".into(), json!(fg.to_hex_string()));
    data.insert("bgColor".into(), json!(bg.to_hex_string()));
    data.insert("contrastRatio".into(), json!(truncated));
    data.insert(
        "expectedContrastRatio".into(),
        json!(format!("{}:1", contrast.expected_contrast_ratio)),
    );

    // Same color for text and background usually means the text is
    // hidden some other way
    if truncated <= 1.0 {
        data.insert("messageKey".into(), json!(IncompleteReason::EqualRatio.as_str()));
        cx.data(Value::Object(data));
        return Ok(Evaluation::incomplete());
    }
    cx.data(Value::Object(data));
    Ok(contrast.is_valid.into())
}

fn has_own_text(tree: &VirtualTree, id: VNodeId) -> bool {
    !visible_virtual(tree, id, false, true).is_empty()
}

/// Visible elements with their own text that are not disabled controls
fn color_contrast_matches(cx: &MatchContext<'_>) -> bool {
    let tree = cx.tree;
    let node = &tree[cx.node];
    if !node.is_element() || matches!(node.node_name(), "html" | "head" | "title" | "script" | "style" | "option") {
        return false;
    }
    if is_disabled(tree, cx.node) || tree.ancestors(cx.node).any(|a| is_disabled(tree, a)) {
        return false;
    }
    if tree
        .ancestors(cx.node)
        .filter_map(|a| tree.get(a))
        .any(|a| a.attr("aria-disabled").is_some_and(|v| v.trim().eq_ignore_ascii_case("true")))
    {
        return false;
    }
    has_own_text(tree, cx.node) && is_visible_on_screen(tree, cx.node)
}

#[cfg(test)]
mod tests {
    use crate::checks::test_util::{evaluate, matches};
    use fos_vdom::{SerialNode, VirtualTree};
    use serde_json::Value;

    #[test]
    fn test_serial_tree_is_incomplete() {
        let tree = VirtualTree::from_serial(&SerialNode::element("p").with_child(SerialNode::text("Hi"))).unwrap();
        assert_eq!(evaluate("color-contrast", &tree, tree.root().unwrap(), &Value::Null).0, None);
    }

    #[test]
    fn test_matcher_skips_disabled_controls() {
        let root = SerialNode::element("div")
            .with_child(SerialNode::element("button").with_attr("disabled", "").with_child(SerialNode::text("Go")))
            .with_child(SerialNode::element("p").with_child(SerialNode::text("Read me")))
            .with_child(SerialNode::element("p"));
        let tree = VirtualTree::from_serial(&root).unwrap();
        let children: Vec<_> = tree.element_children(tree.root().unwrap()).collect();
        assert!(!matches("color-contrast-matches", &tree, children[0]));
        assert!(matches("color-contrast-matches", &tree, children[1]));
        assert!(!matches("color-contrast-matches", &tree, children[2]));
    }
}
