//! fOS Accessibility
//!
//! Accessibility semantics computed over virtual trees: ARIA roles and
//! attributes, accessible names, visibility, focus, page geometry and
//! color contrast. Every query takes the tree and a node id and memoizes
//! through the tree's caches where recomputation would be expensive.

pub mod aria;
pub mod color;
pub mod focus;
pub mod grid;
pub mod name;
pub mod standards;
pub mod text;
pub mod visibility;

pub use aria::{
    get_element_unallowed_roles, get_explicit_role, get_role, get_role_type, get_role_with, has_global_aria_attribute,
    idrefs, implicit_role, is_accessible_ref, is_aria_role_allowed_on_element, is_combobox_popup, is_landmark,
    is_valid_role, missing_required_attrs, required_attrs, RoleOptions,
};
pub use color::{
    clear_incomplete_data, get_background_color, get_foreground_color, get_opacity, get_text_shadow_colors,
    has_valid_contrast_ratio, incomplete_reason, is_large_text, set_incomplete_reason, ColorKind, ContrastChecker,
    ContrastResult, IncompleteReason,
};
pub use focus::{
    inserted_into_focus_order, is_disabled, is_focusable, is_in_tab_order, is_natively_focusable, tab_order, TabIndex,
};
pub use grid::{
    find_nearby_elms, get_element_stack, get_grid, get_point_stack, is_fixed_position, nearby_widgets, target_offset,
    target_rects, target_size, CellRange, Grid, GRID_SIZE, MIN_TARGET_SIZE,
};
pub use name::{accessible_text, aria_label, arialabelledby_text, content_text, title_text};
pub use text::{is_human_interpretable, remove_punctuation, remove_unicode, sanitize, token_list, UnicodeFilter};
pub use visibility::{
    get_scroll, has_content_virtual, is_hidden_for_everyone, is_visible_on_screen, is_visible_to_screen_readers,
    visible_virtual, ScrollInfo,
};

use fos_vdom::{VNodeId, VdomError};
use thiserror::Error;

/// Accessibility query errors
#[derive(Debug, Error)]
pub enum A11yError {
    /// The query needs the live document (id lookups on serialized trees)
    #[error("{attr} cannot be resolved on a tree without live documents")]
    NonDomNode { attr: String },

    #[error("Unknown virtual node {0:?}")]
    UnknownNode(VNodeId),

    #[error(transparent)]
    Vdom(#[from] VdomError),
}

pub type Result<T> = std::result::Result<T, A11yError>;

/// Read a derived value from a cache, computing and storing it on a miss
pub(crate) fn memoized<T, F>(cache: &fos_vdom::Cache, key: &str, compute: F) -> T
where
    T: Clone + 'static,
    F: FnOnce() -> T,
{
    if let Some(Some(value)) = cache.get::<T>(key) {
        return (*value).clone();
    }
    let value = compute();
    if let Err(err) = cache.set(key, Some(value.clone())) {
        tracing::warn!("Failed to cache {}: {}", key, err);
    }
    value
}
