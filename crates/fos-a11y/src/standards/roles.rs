//! WAI-ARIA role table (ARIA 1.2, DPUB-ARIA and graphics roles)

/// Role category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleType {
    Abstract,
    Composite,
    Landmark,
    Range,
    Structure,
    Widget,
    Window,
}

impl RoleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Composite => "composite",
            Self::Landmark => "landmark",
            Self::Range => "range",
            Self::Structure => "structure",
            Self::Widget => "widget",
            Self::Window => "window",
        }
    }
}

/// One role definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: &'static str,
    pub kind: RoleType,
    /// Concrete roles this role refines (used for DPUB fallbacks)
    pub superclass: &'static [&'static str],
    pub required_attrs: &'static [&'static str],
    /// Role-specific attributes on top of the global ones
    pub allowed_attrs: &'static [&'static str],
    pub name_from_content: bool,
    pub required_context: &'static [&'static str],
    pub required_owned: &'static [&'static str],
}

const fn role(name: &'static str, kind: RoleType) -> RoleSpec {
    RoleSpec {
        name,
        kind,
        superclass: &[],
        required_attrs: &[],
        allowed_attrs: &[],
        name_from_content: false,
        required_context: &[],
        required_owned: &[],
    }
}

impl RoleSpec {
    const fn superclass(self, superclass: &'static [&'static str]) -> Self {
        Self { superclass, ..self }
    }

    const fn required(self, required_attrs: &'static [&'static str]) -> Self {
        Self { required_attrs, ..self }
    }

    const fn allowed(self, allowed_attrs: &'static [&'static str]) -> Self {
        Self { allowed_attrs, ..self }
    }

    const fn from_content(self) -> Self {
        Self { name_from_content: true, ..self }
    }

    const fn context(self, required_context: &'static [&'static str]) -> Self {
        Self { required_context, ..self }
    }

    const fn owned(self, required_owned: &'static [&'static str]) -> Self {
        Self { required_owned, ..self }
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == RoleType::Abstract
    }
}

use RoleType::*;

const VALUE_ATTRS: &[&str] = &["aria-valuemax", "aria-valuemin", "aria-valuenow", "aria-valuetext"];

pub static ROLES: &[RoleSpec] = &[
    // Abstract
    role("command", Abstract),
    role("composite", Abstract),
    role("input", Abstract),
    role("landmark", Abstract),
    role("range", Abstract),
    role("roletype", Abstract),
    role("section", Abstract),
    role("sectionhead", Abstract),
    role("select", Abstract),
    role("structure", Abstract),
    role("widget", Abstract),
    role("window", Abstract),
    // Widgets
    role("button", Widget).allowed(&["aria-expanded", "aria-pressed"]).from_content(),
    role("checkbox", Widget)
        .required(&["aria-checked"])
        .allowed(&["aria-readonly", "aria-required"])
        .from_content(),
    role("combobox", Widget)
        .required(&["aria-expanded", "aria-controls"])
        .allowed(&["aria-owns", "aria-autocomplete", "aria-readonly", "aria-required", "aria-activedescendant", "aria-orientation"]),
    role("gridcell", Widget)
        .allowed(&["aria-readonly", "aria-required", "aria-selected", "aria-colindex", "aria-colspan", "aria-expanded", "aria-rowindex", "aria-rowspan"])
        .from_content()
        .context(&["row"]),
    role("link", Widget).allowed(&["aria-expanded"]).from_content(),
    role("menuitem", Widget)
        .allowed(&["aria-posinset", "aria-setsize", "aria-expanded"])
        .from_content()
        .context(&["menu", "menubar", "group"]),
    role("menuitemcheckbox", Widget)
        .required(&["aria-checked"])
        .allowed(&["aria-posinset", "aria-readonly", "aria-setsize"])
        .from_content()
        .context(&["menu", "menubar", "group"]),
    role("menuitemradio", Widget)
        .required(&["aria-checked"])
        .allowed(&["aria-posinset", "aria-readonly", "aria-setsize"])
        .from_content()
        .context(&["menu", "menubar", "group"]),
    role("option", Widget)
        .allowed(&["aria-selected", "aria-checked", "aria-posinset", "aria-setsize"])
        .from_content()
        .context(&["group", "listbox"]),
    role("progressbar", Widget).allowed(VALUE_ATTRS),
    role("radio", Widget)
        .required(&["aria-checked"])
        .allowed(&["aria-posinset", "aria-setsize", "aria-required"])
        .from_content(),
    role("scrollbar", Widget)
        .required(&["aria-valuenow"])
        .allowed(&["aria-controls", "aria-orientation", "aria-valuemax", "aria-valuemin", "aria-valuetext"]),
    role("searchbox", Widget).allowed(&[
        "aria-activedescendant",
        "aria-autocomplete",
        "aria-multiline",
        "aria-placeholder",
        "aria-readonly",
        "aria-required",
    ]),
    role("separator", Structure).allowed(&["aria-orientation", "aria-valuenow", "aria-valuemax", "aria-valuemin", "aria-valuetext"]),
    role("slider", Widget)
        .required(&["aria-valuenow"])
        .allowed(&["aria-valuemax", "aria-valuemin", "aria-valuetext", "aria-orientation", "aria-readonly"]),
    role("spinbutton", Widget).allowed(&[
        "aria-valuemax",
        "aria-valuemin",
        "aria-valuenow",
        "aria-valuetext",
        "aria-readonly",
        "aria-required",
        "aria-activedescendant",
    ]),
    role("switch", Widget).required(&["aria-checked"]).allowed(&["aria-readonly", "aria-required"]).from_content(),
    role("tab", Widget)
        .allowed(&["aria-posinset", "aria-selected", "aria-setsize", "aria-expanded"])
        .from_content()
        .context(&["tablist"]),
    role("tabpanel", Widget),
    role("textbox", Widget).allowed(&[
        "aria-activedescendant",
        "aria-autocomplete",
        "aria-multiline",
        "aria-placeholder",
        "aria-readonly",
        "aria-required",
    ]),
    role("treeitem", Widget)
        .allowed(&["aria-checked", "aria-expanded", "aria-level", "aria-posinset", "aria-selected", "aria-setsize"])
        .from_content()
        .context(&["group", "tree"]),
    // Composite widgets
    role("grid", Composite)
        .allowed(&["aria-level", "aria-multiselectable", "aria-readonly", "aria-activedescendant", "aria-colcount", "aria-rowcount"])
        .owned(&["rowgroup", "row"]),
    role("listbox", Composite)
        .allowed(&["aria-multiselectable", "aria-readonly", "aria-required", "aria-activedescendant", "aria-expanded", "aria-orientation"])
        .owned(&["group", "option"]),
    role("menu", Composite)
        .allowed(&["aria-activedescendant", "aria-expanded", "aria-orientation"])
        .owned(&["group", "menuitemradio", "menuitem", "menuitemcheckbox", "menu", "separator"]),
    role("menubar", Composite)
        .allowed(&["aria-activedescendant", "aria-expanded", "aria-orientation"])
        .owned(&["group", "menuitemradio", "menuitem", "menuitemcheckbox", "menu", "separator"]),
    role("radiogroup", Composite).allowed(&["aria-readonly", "aria-required", "aria-activedescendant", "aria-expanded", "aria-orientation"]),
    role("tablist", Composite)
        .allowed(&["aria-level", "aria-multiselectable", "aria-orientation", "aria-activedescendant"])
        .owned(&["tab"]),
    role("tree", Composite)
        .allowed(&["aria-multiselectable", "aria-required", "aria-activedescendant", "aria-expanded", "aria-orientation"])
        .owned(&["group", "treeitem"]),
    role("treegrid", Composite)
        .allowed(&["aria-activedescendant", "aria-colcount", "aria-expanded", "aria-level", "aria-multiselectable", "aria-orientation", "aria-readonly", "aria-required", "aria-rowcount"])
        .owned(&["rowgroup", "row"]),
    // Document structure
    role("application", Structure).allowed(&["aria-activedescendant", "aria-expanded"]),
    role("article", Structure).allowed(&["aria-posinset", "aria-setsize", "aria-expanded"]),
    role("blockquote", Structure),
    role("caption", Structure).context(&["figure", "table", "grid", "treegrid"]),
    role("cell", Structure)
        .allowed(&["aria-colindex", "aria-colspan", "aria-rowindex", "aria-rowspan", "aria-expanded"])
        .from_content()
        .context(&["row"]),
    role("code", Structure),
    role("columnheader", Structure)
        .allowed(&["aria-sort", "aria-colindex", "aria-colspan", "aria-expanded", "aria-readonly", "aria-required", "aria-rowindex", "aria-rowspan", "aria-selected"])
        .from_content()
        .context(&["row"]),
    role("definition", Structure),
    role("deletion", Structure),
    role("directory", Structure).allowed(&["aria-expanded"]),
    role("document", Structure).allowed(&["aria-expanded"]),
    role("emphasis", Structure),
    role("feed", Structure).allowed(&["aria-expanded"]).owned(&["article"]),
    role("figure", Structure).allowed(&["aria-expanded"]),
    role("generic", Structure),
    role("group", Structure).allowed(&["aria-activedescendant", "aria-expanded"]),
    role("heading", Structure).required(&["aria-level"]).from_content(),
    role("img", Structure).allowed(&["aria-expanded"]),
    role("insertion", Structure),
    role("list", Structure).allowed(&["aria-expanded"]).owned(&["listitem"]),
    role("listitem", Structure)
        .allowed(&["aria-level", "aria-posinset", "aria-setsize", "aria-expanded"])
        .context(&["list", "group"]),
    role("math", Structure).allowed(&["aria-expanded"]),
    role("meter", Structure).required(&["aria-valuenow"]).allowed(&["aria-valuemax", "aria-valuemin", "aria-valuetext"]),
    role("none", Structure),
    role("note", Structure).allowed(&["aria-expanded"]),
    role("paragraph", Structure),
    role("presentation", Structure),
    role("row", Structure)
        .allowed(&["aria-colindex", "aria-expanded", "aria-level", "aria-selected", "aria-rowindex", "aria-activedescendant", "aria-posinset", "aria-setsize"])
        .from_content()
        .context(&["grid", "rowgroup", "table", "treegrid"])
        .owned(&["cell", "columnheader", "gridcell", "rowheader"]),
    role("rowgroup", Structure)
        .from_content()
        .context(&["grid", "table", "treegrid"])
        .owned(&["row"]),
    role("rowheader", Structure)
        .allowed(&["aria-sort", "aria-colindex", "aria-colspan", "aria-expanded", "aria-readonly", "aria-required", "aria-rowindex", "aria-rowspan", "aria-selected"])
        .from_content()
        .context(&["row"]),
    role("strong", Structure),
    role("subscript", Structure),
    role("superscript", Structure),
    role("table", Structure)
        .allowed(&["aria-colcount", "aria-rowcount", "aria-expanded"])
        .owned(&["rowgroup", "row"]),
    role("term", Structure).from_content(),
    role("time", Structure),
    role("toolbar", Structure).allowed(&["aria-orientation", "aria-activedescendant", "aria-expanded"]),
    role("tooltip", Structure).from_content(),
    // Live regions
    role("alert", Structure).allowed(&["aria-expanded"]),
    role("log", Structure).allowed(&["aria-expanded"]),
    role("marquee", Structure).allowed(&["aria-expanded"]),
    role("status", Structure).allowed(&["aria-expanded"]),
    role("timer", Structure).allowed(&["aria-expanded"]),
    // Windows
    role("alertdialog", Window).allowed(&["aria-expanded", "aria-modal"]),
    role("dialog", Window).allowed(&["aria-expanded", "aria-modal"]),
    // Landmarks
    role("banner", Landmark),
    role("complementary", Landmark),
    role("contentinfo", Landmark),
    role("form", Landmark),
    role("main", Landmark),
    role("navigation", Landmark),
    role("region", Landmark),
    role("search", Landmark),
    // DPUB-ARIA
    role("doc-abstract", Structure).superclass(&["section"]),
    role("doc-acknowledgments", Landmark),
    role("doc-afterword", Landmark),
    role("doc-appendix", Landmark),
    role("doc-backlink", Widget).superclass(&["link"]).from_content(),
    role("doc-biblioentry", Structure)
        .superclass(&["listitem"])
        .context(&["doc-bibliography"]),
    role("doc-bibliography", Landmark).owned(&["doc-biblioentry"]),
    role("doc-biblioref", Widget).superclass(&["link"]).from_content(),
    role("doc-chapter", Landmark),
    role("doc-colophon", Structure),
    role("doc-conclusion", Landmark),
    role("doc-cover", Structure).superclass(&["img"]),
    role("doc-credit", Structure),
    role("doc-credits", Landmark),
    role("doc-dedication", Structure),
    role("doc-endnote", Structure)
        .superclass(&["listitem"])
        .context(&["doc-endnotes"]),
    role("doc-endnotes", Landmark).owned(&["doc-endnote"]),
    role("doc-epigraph", Structure),
    role("doc-epilogue", Landmark),
    role("doc-errata", Landmark),
    role("doc-example", Structure),
    role("doc-footnote", Structure),
    role("doc-foreword", Landmark),
    role("doc-glossary", Landmark),
    role("doc-glossref", Widget).superclass(&["link"]).from_content(),
    role("doc-index", Landmark),
    role("doc-introduction", Landmark),
    role("doc-noteref", Widget).superclass(&["link"]).from_content(),
    role("doc-notice", Structure),
    role("doc-pagebreak", Structure).superclass(&["separator"]),
    role("doc-pagelist", Landmark),
    role("doc-part", Landmark),
    role("doc-preface", Landmark),
    role("doc-prologue", Landmark),
    role("doc-pullquote", Structure),
    role("doc-qna", Structure),
    role("doc-subtitle", Structure).superclass(&["sectionhead"]),
    role("doc-tip", Structure),
    role("doc-toc", Landmark),
    // Graphics
    role("graphics-document", Structure),
    role("graphics-object", Structure),
    role("graphics-symbol", Structure),
];

/// Look up a role by its lowercase name
pub fn role_spec(name: &str) -> Option<&'static RoleSpec> {
    ROLES.iter().find(|spec| spec.name == name)
}
