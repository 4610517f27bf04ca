//! ARIA roles and attributes

use crate::check::{CheckContext, Evaluation};
use crate::matcher::MatchContext;
use crate::registry::Registry;
use fos_a11y::{get_element_unallowed_roles, is_visible_to_screen_readers, missing_required_attrs};
use serde_json::json;

pub(super) fn register(registry: &mut Registry) {
    registry
        .add_evaluate("aria-required-attr", aria_required_attr)
        .add_evaluate("aria-allowed-role", aria_allowed_role)
        .add_matches("aria-allowed-role-matches", |cx: &MatchContext<'_>| {
            cx.tree[cx.node].attr("role").is_some_and(|role| !role.trim().is_empty())
        });
}

fn aria_required_attr(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let missing = missing_required_attrs(cx.tree(), cx.node());
    if missing.is_empty() {
        return Ok(true.into());
    }
    cx.data(json!(missing));
    Ok(false.into())
}

/// Options: `allowImplicit` (default true) accepts a role that restates
/// the implicit one
fn aria_allowed_role(cx: &mut CheckContext<'_>) -> anyhow::Result<Evaluation> {
    let allow_implicit = cx.option::<bool>("allowImplicit").unwrap_or(true);
    let unallowed = get_element_unallowed_roles(cx.tree(), cx.node(), allow_implicit);
    if unallowed.is_empty() {
        return Ok(true.into());
    }
    cx.data(json!(unallowed));
    if !is_visible_to_screen_readers(cx.tree(), cx.node()) {
        cx.data(json!({ "messageKey": "noAriaHidden", "roles": unallowed }));
        return Ok(Evaluation::incomplete());
    }
    Ok(false.into())
}
