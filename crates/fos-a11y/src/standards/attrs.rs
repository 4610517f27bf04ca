//! WAI-ARIA state and property table

/// Value syntax of an ARIA attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Boolean,
    /// `true`, `false` or `mixed`
    Tristate,
    /// One token from the allowed values
    Nmtoken,
    /// Space-separated tokens from the allowed values
    Nmtokens,
    Idref,
    Idrefs,
    Int,
    Decimal,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSpec {
    pub name: &'static str,
    pub kind: AttrType,
    pub values: &'static [&'static str],
    /// Allowed on every role
    pub global: bool,
}

const fn attr(name: &'static str, kind: AttrType) -> AttrSpec {
    AttrSpec {
        name,
        kind,
        values: &[],
        global: false,
    }
}

impl AttrSpec {
    const fn values(self, values: &'static [&'static str]) -> Self {
        Self { values, ..self }
    }

    const fn global(self) -> Self {
        Self { global: true, ..self }
    }

    /// Whether `value` is syntactically valid for this attribute
    pub fn is_valid_value(&self, value: &str) -> bool {
        let value = value.trim();
        match self.kind {
            AttrType::Boolean => matches!(value, "true" | "false"),
            AttrType::Tristate => matches!(value, "true" | "false" | "mixed"),
            AttrType::Nmtoken => self.values.contains(&value.to_ascii_lowercase().as_str()),
            AttrType::Nmtokens => {
                let lower = value.to_ascii_lowercase();
                let mut tokens = lower.split_ascii_whitespace().peekable();
                tokens.peek().is_some() && tokens.all(|t| self.values.contains(&t))
            }
            AttrType::Idref => !value.is_empty() && !value.contains(char::is_whitespace),
            AttrType::Idrefs => !value.is_empty(),
            AttrType::Int => value.parse::<i64>().is_ok(),
            AttrType::Decimal => value.parse::<f64>().is_ok_and(f64::is_finite),
            AttrType::String => true,
        }
    }
}

use AttrType::*;

pub static ATTRS: &[AttrSpec] = &[
    attr("aria-activedescendant", Idref),
    attr("aria-atomic", Boolean).global(),
    attr("aria-autocomplete", Nmtoken).values(&["inline", "list", "both", "none"]),
    attr("aria-braillelabel", String).global(),
    attr("aria-brailleroledescription", String).global(),
    attr("aria-busy", Boolean).global(),
    attr("aria-checked", Nmtoken).values(&["false", "mixed", "true", "undefined"]),
    attr("aria-colcount", Int),
    attr("aria-colindex", Int),
    attr("aria-colspan", Int),
    attr("aria-controls", Idrefs).global(),
    attr("aria-current", Nmtoken)
        .values(&["page", "step", "location", "date", "time", "true", "false"])
        .global(),
    attr("aria-describedby", Idrefs).global(),
    attr("aria-description", String).global(),
    attr("aria-details", Idref).global(),
    attr("aria-disabled", Boolean).global(),
    attr("aria-dropeffect", Nmtokens)
        .values(&["copy", "execute", "link", "move", "none", "popup"])
        .global(),
    attr("aria-errormessage", Idref).global(),
    attr("aria-expanded", Nmtoken).values(&["true", "false", "undefined"]),
    attr("aria-flowto", Idrefs).global(),
    attr("aria-grabbed", Nmtoken).values(&["true", "false", "undefined"]).global(),
    attr("aria-haspopup", Nmtoken)
        .values(&["true", "false", "menu", "listbox", "tree", "grid", "dialog"])
        .global(),
    attr("aria-hidden", Nmtoken).values(&["true", "false", "undefined"]).global(),
    attr("aria-invalid", Nmtoken)
        .values(&["grammar", "false", "spelling", "true"])
        .global(),
    attr("aria-keyshortcuts", String).global(),
    attr("aria-label", String).global(),
    attr("aria-labelledby", Idrefs).global(),
    attr("aria-level", Int),
    attr("aria-live", Nmtoken).values(&["assertive", "off", "polite"]).global(),
    attr("aria-modal", Boolean),
    attr("aria-multiline", Boolean),
    attr("aria-multiselectable", Boolean),
    attr("aria-orientation", Nmtoken).values(&["horizontal", "undefined", "vertical"]),
    attr("aria-owns", Idrefs).global(),
    attr("aria-placeholder", String),
    attr("aria-posinset", Int),
    attr("aria-pressed", Nmtoken).values(&["false", "mixed", "true", "undefined"]),
    attr("aria-readonly", Boolean),
    attr("aria-relevant", Nmtokens)
        .values(&["additions", "all", "removals", "text"])
        .global(),
    attr("aria-required", Boolean),
    attr("aria-roledescription", String).global(),
    attr("aria-rowcount", Int),
    attr("aria-rowindex", Int),
    attr("aria-rowspan", Int),
    attr("aria-selected", Nmtoken).values(&["false", "true", "undefined"]),
    attr("aria-setsize", Int),
    attr("aria-sort", Nmtoken).values(&["ascending", "descending", "none", "other"]),
    attr("aria-valuemax", Decimal),
    attr("aria-valuemin", Decimal),
    attr("aria-valuenow", Decimal),
    attr("aria-valuetext", String),
];

pub fn attr_spec(name: &str) -> Option<&'static AttrSpec> {
    ATTRS.iter().find(|spec| spec.name == name)
}

/// Global ARIA attributes
pub fn global_attrs() -> impl Iterator<Item = &'static str> {
    ATTRS.iter().filter(|spec| spec.global).map(|spec| spec.name)
}

/// Attributes whose values reference element ids
pub fn idref_attrs() -> impl Iterator<Item = &'static str> {
    ATTRS
        .iter()
        .filter(|spec| matches!(spec.kind, Idref | Idrefs))
        .map(|spec| spec.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_validation() {
        let checked = attr_spec("aria-checked").unwrap();
        assert!(checked.is_valid_value("mixed"));
        assert!(!checked.is_valid_value("yes"));
        let relevant = attr_spec("aria-relevant").unwrap();
        assert!(relevant.is_valid_value("additions text"));
        assert!(!relevant.is_valid_value(""));
        assert!(attr_spec("aria-level").unwrap().is_valid_value("2"));
        assert!(!attr_spec("aria-valuenow").unwrap().is_valid_value("NaN"));
    }

    #[test]
    fn test_idref_attrs() {
        let idrefs: Vec<_> = idref_attrs().collect();
        assert!(idrefs.contains(&"aria-labelledby"));
        assert!(idrefs.contains(&"aria-activedescendant"));
        assert!(!idrefs.contains(&"aria-label"));
    }
}
