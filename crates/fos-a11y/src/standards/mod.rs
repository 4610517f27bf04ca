//! Standards tables
//!
//! Static data the role, attribute and element queries are driven by.

mod attrs;
mod elements;
mod roles;

pub use attrs::{attr_spec, global_attrs, idref_attrs, AttrSpec, AttrType, ATTRS};
pub use elements::{element_spec, is_html_element, AllowedRoles, ElementSpec};
pub use roles::{role_spec, RoleSpec, RoleType, ROLES};
