//! ARIA roles and attributes
//!
//! Explicit and implicit role resolution, allowed-role validation and
//! id reference lookups.

use crate::focus::is_focusable;
use crate::standards::{element_spec, global_attrs, is_html_element, role_spec, AllowedRoles, RoleType};
use crate::text::token_list;
use crate::{A11yError, Result};
use fos_vdom::{VNodeId, VirtualNode, VirtualTree};

const PRESENTATIONAL: &[&str] = &["presentation", "none"];

/// DPUB roles refining a role that some native elements carry implicitly
const DPUB_ROLES: &[&str] = &[
    "doc-backlink",
    "doc-biblioentry",
    "doc-biblioref",
    "doc-cover",
    "doc-endnote",
    "doc-glossref",
    "doc-noteref",
];

/// Sectioning content that demotes `header` and `footer` landmarks
const SECTIONING: &[&str] = &["article", "aside", "main", "nav", "section"];

/// Roles a combobox popup may take
const POPUP_ROLES: &[&str] = &["menu", "listbox", "tree", "grid", "dialog"];

/// Role resolution switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleOptions {
    /// Only report explicit roles
    pub no_implicit: bool,
    /// Report `presentation` and `none` as no role
    pub no_presentational: bool,
}

pub fn is_valid_role(role: &str, allow_abstract: bool) -> bool {
    role_spec(&role.to_ascii_lowercase()).is_some_and(|spec| allow_abstract || !spec.is_abstract())
}

pub fn get_role_type(role: &str) -> Option<RoleType> {
    role_spec(role).map(|spec| spec.kind)
}

pub fn is_landmark(role: &str) -> bool {
    get_role_type(role) == Some(RoleType::Landmark)
}

/// Roles an element must carry as attributes
pub fn required_attrs(role: &str) -> &'static [&'static str] {
    role_spec(role).map(|spec| spec.required_attrs).unwrap_or(&[])
}

/// Whether any global ARIA attribute is present
pub fn has_global_aria_attribute(node: &VirtualNode) -> bool {
    global_attrs().any(|attr| node.has_attr(attr))
}

/// First valid, non-abstract token of the `role` attribute
pub fn get_explicit_role(tree: &VirtualTree, id: VNodeId) -> Option<&'static str> {
    let node = tree.get(id).filter(|n| n.is_element())?;
    let value = node.attr("role")?.to_ascii_lowercase();
    token_list(&value)
        .iter()
        .find_map(|token| role_spec(token).filter(|spec| !spec.is_abstract()))
        .map(|spec| spec.name)
}

/// Ancestors inside the node's own document (shadow trees included)
fn document_ancestors(tree: &VirtualTree, id: VNodeId) -> impl Iterator<Item = VNodeId> + '_ {
    let document = tree.get(id).map(|n| tree.document_scope(n.scope()));
    tree.ancestors(id)
        .take_while(move |a| tree.get(*a).map(|n| tree.document_scope(n.scope())) == document)
}

fn closest_named<'a>(tree: &'a VirtualTree, id: VNodeId, names: &'a [&str]) -> Option<VNodeId> {
    document_ancestors(tree, id).find(|a| tree.get(*a).is_some_and(|n| n.is_html() && names.contains(&n.node_name())))
}

fn element_parent(tree: &VirtualTree, id: VNodeId) -> Option<VNodeId> {
    let parent = tree.parent(id)?;
    tree.get(parent).filter(|n| n.is_element())?;
    let same_document = |n: VNodeId| tree.get(n).map(|n| tree.document_scope(n.scope()));
    (same_document(parent) == same_document(id)).then_some(parent)
}

fn has_label_attr(node: &VirtualNode) -> bool {
    ["aria-label", "aria-labelledby", "title"]
        .iter()
        .any(|attr| node.attr(attr).is_some_and(|v| !v.trim().is_empty()))
}

fn input_role(node: &VirtualNode) -> Option<&'static str> {
    let has_list = node.has_attr("list");
    let role = match node.input_type()?.as_str() {
        "button" | "image" | "reset" | "submit" => "button",
        "checkbox" => "checkbox",
        "radio" => "radio",
        "range" => "slider",
        "number" => "spinbutton",
        "search" if has_list => "combobox",
        "search" => "searchbox",
        "color" | "date" | "datetime-local" | "file" | "hidden" | "month" | "password" | "time" | "week" => {
            return None;
        }
        _ if has_list => "combobox",
        _ => "textbox",
    };
    Some(role)
}

fn header_cell_role(tree: &VirtualTree, id: VNodeId, node: &VirtualNode) -> &'static str {
    match node.attr("scope").map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("row" | "rowgroup") => return "rowheader",
        Some("col" | "colgroup") => return "columnheader",
        _ => {}
    }
    let Some(row) = element_parent(tree, id) else {
        return "columnheader";
    };
    if tree.parent(row).and_then(|p| tree.get(p)).is_some_and(|p| p.node_name() == "thead") {
        return "columnheader";
    }
    let cells: Vec<VNodeId> = tree.element_children(row).collect();
    let all_headers = cells.iter().all(|c| tree.get(*c).is_some_and(|n| n.node_name() == "th"));
    if !all_headers && cells.first() == Some(&id) {
        "rowheader"
    } else {
        "columnheader"
    }
}

/// Role an HTML element has without a `role` attribute
pub fn implicit_role(tree: &VirtualTree, id: VNodeId) -> Option<&'static str> {
    let node = tree.get(id)?;
    if !is_html_element(node) {
        return None;
    }
    let role = match node.node_name() {
        "a" | "area" if node.has_attr("href") => "link",
        "address" | "details" | "fieldset" | "hgroup" | "optgroup" => "group",
        "article" => "article",
        "aside" => "complementary",
        "blockquote" => "blockquote",
        "button" => "button",
        "code" => "code",
        "datalist" => "listbox",
        "dd" => "definition",
        "del" => "deletion",
        "dfn" | "dt" => "term",
        "dialog" => "dialog",
        "em" => "emphasis",
        "figure" => "figure",
        "footer" | "header" if closest_named(tree, id, SECTIONING).is_some() => return None,
        "footer" => "contentinfo",
        "form" => "form",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "header" => "banner",
        "hr" => "separator",
        "img" if node.attr("alt") == Some("") && !has_global_aria_attribute(node) && !is_focusable(tree, id) => {
            "presentation"
        }
        "img" => "img",
        "input" => return input_role(node),
        "ins" => "insertion",
        "li" => "listitem",
        "main" => "main",
        "math" => "math",
        "menu" | "ol" | "ul" => "list",
        "meter" => "meter",
        "nav" => "navigation",
        "option" => "option",
        "output" => "status",
        "p" => "paragraph",
        "progress" => "progressbar",
        "search" => "search",
        "section" if has_label_attr(node) => "region",
        "select" if node.has_attr("multiple") || node.attr("size").and_then(|s| s.parse::<u32>().ok()).is_some_and(|s| s > 1) => {
            "listbox"
        }
        "select" => "combobox",
        "strong" => "strong",
        "sub" => "subscript",
        "sup" => "superscript",
        "table" => "table",
        "tbody" | "tfoot" | "thead" => "rowgroup",
        "td" => {
            let in_grid = closest_named(tree, id, &["table"])
                .and_then(|table| get_explicit_role(tree, table))
                .is_some_and(|role| matches!(role, "grid" | "treegrid"));
            if in_grid { "gridcell" } else { "cell" }
        }
        "textarea" => "textbox",
        "th" => header_cell_role(tree, id, node),
        "time" => "time",
        "tr" => "row",
        _ => return None,
    };
    role_spec(role).map(|spec| spec.name)
}

/// Presentational roles are ignored on focusable elements and on
/// elements with global ARIA attributes
fn has_presentation_conflict(tree: &VirtualTree, id: VNodeId) -> bool {
    tree.get(id).is_some_and(has_global_aria_attribute) || is_focusable(tree, id)
}

/// Presentation inherited from a presentational required-context parent
/// (`li` in `ul role=none`, cells of a presentational table)
fn inherited_role(tree: &VirtualTree, id: VNodeId) -> Option<&'static str> {
    let implicit = implicit_role(tree, id)?;
    let context = role_spec(implicit)?.required_context;
    if context.is_empty() {
        return None;
    }
    let parent = element_parent(tree, id)?;
    let parent_role = get_role(tree, parent).filter(|role| PRESENTATIONAL.contains(role))?;
    let parent_implicit = implicit_role(tree, parent)?;
    context.contains(&parent_implicit).then_some(parent_role)
}

pub fn get_role(tree: &VirtualTree, id: VNodeId) -> Option<&'static str> {
    get_role_with(tree, id, RoleOptions::default())
}

/// Resolved role of an element
pub fn get_role_with(tree: &VirtualTree, id: VNodeId, options: RoleOptions) -> Option<&'static str> {
    tree.get(id).filter(|n| n.is_element())?;
    let role = match get_explicit_role(tree, id) {
        Some(role) if PRESENTATIONAL.contains(&role) && has_presentation_conflict(tree, id) => {
            if options.no_implicit { None } else { implicit_role(tree, id) }
        }
        Some(role) => Some(role),
        None if options.no_implicit => None,
        None => inherited_role(tree, id).or_else(|| implicit_role(tree, id)),
    };
    if options.no_presentational && role.is_some_and(|r| PRESENTATIONAL.contains(&r)) {
        return None;
    }
    role
}

/// Whether `role` may be declared on this element
pub fn is_aria_role_allowed_on_element(tree: &VirtualTree, id: VNodeId, role: &str) -> bool {
    let spec = element_spec(tree, id);
    if let AllowedRoles::Only(roles) = spec.allowed_roles {
        return roles.contains(&role);
    }
    if implicit_role(tree, id) == Some(role) {
        return false;
    }
    spec.allowed_roles == AllowedRoles::Any
}

/// Declared roles the element may not carry. Custom elements are never
/// checked; with `allow_implicit` restating the implicit role is fine.
pub fn get_element_unallowed_roles(tree: &VirtualTree, id: VNodeId, allow_implicit: bool) -> Vec<String> {
    let Some(node) = tree.get(id) else {
        return Vec::new();
    };
    if !is_html_element(node) {
        return Vec::new();
    }
    let Some(value) = node.attr("role") else {
        return Vec::new();
    };
    let tag = node.node_name();
    let implicit = implicit_role(tree, id);
    let landmark = match tag {
        "header" => Some("banner"),
        "footer" => Some("contentinfo"),
        _ => None,
    };

    token_list(&value.to_ascii_lowercase())
        .into_iter()
        .filter(|role| is_valid_role(role, false))
        .filter(|role| {
            let is_implicit = implicit == Some(role.as_str()) || landmark == Some(role.as_str());
            if allow_implicit && is_implicit {
                return false;
            }
            if implicit == Some(role.as_str()) && tag == "tr" && role == "row" {
                return !allow_implicit;
            }
            if DPUB_ROLES.contains(&role.as_str()) {
                let fallback = role_spec(role).map(|spec| spec.superclass).unwrap_or(&[]);
                if !implicit.is_some_and(|implicit| fallback.contains(&implicit)) {
                    return true;
                }
            }
            !is_aria_role_allowed_on_element(tree, id, role)
        })
        .collect()
}

/// Required attributes the element's explicit role is missing. Attributes
/// the element provides natively count as present; a collapsed or owning
/// combobox does not need `aria-controls`.
pub fn missing_required_attrs(tree: &VirtualTree, id: VNodeId) -> Vec<&'static str> {
    let Some(node) = tree.get(id) else {
        return Vec::new();
    };
    let Some(role) = get_explicit_role(tree, id) else {
        return Vec::new();
    };
    let spec = element_spec(tree, id);
    required_attrs(role)
        .iter()
        .copied()
        .filter(|attr| !spec.implies(attr))
        .filter(|attr| {
            let expanded = node.attr("aria-expanded").map(|v| v.trim().eq_ignore_ascii_case("true"));
            !(role == "combobox"
                && *attr == "aria-controls"
                && (node.has_attr("aria-owns") || expanded != Some(true)))
        })
        .filter(|attr| node.attr(attr).is_none_or(|v| v.trim().is_empty()))
        .collect()
}

/// Resolve an id-reference attribute in the node's own tree scope. Missing
/// references resolve to `None`; serialized trees cannot be searched.
pub fn idrefs(tree: &VirtualTree, id: VNodeId, attr: &str) -> Result<Vec<Option<VNodeId>>> {
    let node = tree.get(id).ok_or(A11yError::UnknownNode(id))?;
    let Some(value) = node.attr(attr) else {
        return Ok(Vec::new());
    };
    if !tree.is_complete() {
        return Err(A11yError::NonDomNode { attr: attr.to_string() });
    }
    Ok(token_list(value)
        .iter()
        .map(|token| tree.element_by_id(node.scope(), token))
        .collect())
}

/// Whether another element in the same scope points at this one through
/// an ARIA id reference or `label[for]`
pub fn is_accessible_ref(tree: &VirtualTree, id: VNodeId) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    let Some(own_id) = node.attr("id").filter(|v| !v.is_empty()) else {
        return false;
    };
    let attrs: Vec<&str> = crate::standards::idref_attrs().collect();
    tree.nodes().filter(|other| other.scope() == node.scope()).any(|other| {
        let referenced = |attr: &str| other.attr(attr).is_some_and(|v| token_list(v).iter().any(|t| t == own_id));
        attrs.iter().any(|attr| referenced(attr)) || (other.node_name() == "label" && referenced("for"))
    })
}

/// Whether the element is the popup of a combobox: either its nearest
/// role-bearing ancestor is a combobox or a combobox owns or controls it
pub fn is_combobox_popup(tree: &VirtualTree, id: VNodeId) -> bool {
    let Some(node) = tree.get(id) else {
        return false;
    };
    if !get_role(tree, id).is_some_and(|role| POPUP_ROLES.contains(&role)) {
        return false;
    }
    let nearest = tree.ancestors(id).find_map(|a| get_role(tree, a));
    if nearest == Some("combobox") {
        return true;
    }
    let Some(own_id) = node.attr("id").filter(|v| !v.is_empty()) else {
        return false;
    };
    tree.nodes()
        .filter(|other| other.scope() == node.scope() && other.node_name() != "select")
        .filter(|other| {
            ["aria-owns", "aria-controls"]
                .iter()
                .any(|attr| other.attr(attr).is_some_and(|v| token_list(v).iter().any(|t| t == own_id)))
        })
        .any(|other| get_role(tree, other.id()) == Some("combobox"))
}
