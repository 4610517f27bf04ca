//! Text alternatives: images and buttons

use crate::check::{CheckContext, Evaluation};
use crate::matcher::MatchContext;
use crate::registry::Registry;
use fos_a11y::standards::RoleType;
use fos_a11y::{aria_label, arialabelledby_text, content_text, get_explicit_role, get_role, get_role_type, A11yError};
use serde_json::json;

const PRESENTATIONAL: &[&str] = &["none", "presentation"];

pub(super) fn register(registry: &mut Registry) {
    registry
        .add_evaluate("has-alt", has_alt)
        .add_evaluate("aria-label", |cx| Ok(aria_label(cx.vnode()).is_some().into()))
        .add_evaluate("aria-labelledby", aria_labelledby)
        .add_evaluate("non-empty-title", non_empty_title)
        .add_evaluate("presentational-role", presentational_role)
        .add_evaluate("alt-space-value", alt_space_value)
        .add_evaluate("button-has-visible-text", button_has_visible_text)
        .add_matches("no-explicit-name-required-matches", no_explicit_name_required);
}

fn has_alt(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    Ok(cx.vnode().has_attr("alt").into())
}

/// Labelled by other elements. Unresolvable references cannot be judged.
fn aria_labelledby(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    match arialabelledby_text(cx.tree(), cx.node()) {
        Ok(text) => Ok((!text.is_empty()).into()),
        Err(A11yError::NonDomNode { .. }) => Ok(Evaluation::incomplete()),
        Err(e) => Err(e.into()),
    }
}

fn non_empty_title(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    match cx.vnode().attr("title").map(str::trim) {
        None => {
            cx.data(json!({ "messageKey": "noAttr" }));
            Ok(false.into())
        }
        Some("") => {
            cx.data(json!({ "messageKey": "emptyAttr" }));
            Ok(false.into())
        }
        Some(_) => Ok(true.into()),
    }
}

/// Declared `none` or `presentation` and nothing overrides it
fn presentational_role(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let Some(explicit) = get_explicit_role(cx.tree(), cx.node()).filter(|r| PRESENTATIONAL.contains(r)) else {
        return Ok(false.into());
    };
    let resolved = get_role(cx.tree(), cx.node());
    cx.data(json!({ "role": explicit }));
    Ok((resolved == Some(explicit)).into())
}

/// `alt` made of whitespace only reads as a name to some screen readers
fn alt_space_value(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let alt = cx.vnode().attr("alt");
    Ok(alt.is_some_and(|v| !v.is_empty() && v.trim().is_empty()).into())
}

fn button_has_visible_text(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    match content_text(cx.tree(), cx.node()) {
        Ok(text) => {
            if !text.is_empty() {
                cx.data(json!(text));
            }
            Ok((!text.is_empty()).into())
        }
        Err(A11yError::NonDomNode { .. }) => Ok(Evaluation::incomplete()),
        Err(e) => Err(e.into()),
    }
}

/// Widget roles carry their own naming rules
fn no_explicit_name_required(cx: &MatchContext<'_>) -> bool {
    match get_explicit_role(cx.tree, cx.node) {
        None => true,
        Some(role) => !matches!(get_role_type(role), Some(RoleType::Widget | RoleType::Composite)),
    }
}
