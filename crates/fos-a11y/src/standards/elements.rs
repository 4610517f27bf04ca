//! HTML element table: which ARIA roles an element may take and which ARIA
//! attributes it implies

use fos_vdom::{VNodeId, VirtualNode, VirtualTree};

/// Roles an element may declare explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedRoles {
    Any,
    None,
    Only(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpec {
    pub allowed_roles: AllowedRoles,
    /// ARIA attributes with a native equivalent (`aria-checked` on checkboxes)
    pub implicit_attrs: &'static [(&'static str, &'static str)],
    /// Element must not carry any ARIA attribute
    pub no_aria_attrs: bool,
}

impl ElementSpec {
    const fn new(allowed_roles: AllowedRoles) -> Self {
        Self {
            allowed_roles,
            implicit_attrs: &[],
            no_aria_attrs: false,
        }
    }

    const fn implicit(self, implicit_attrs: &'static [(&'static str, &'static str)]) -> Self {
        Self { implicit_attrs, ..self }
    }

    const fn no_aria(self) -> Self {
        Self { no_aria_attrs: true, ..self }
    }

    pub fn implies(&self, attr: &str) -> bool {
        self.implicit_attrs.iter().any(|(name, _)| *name == attr)
    }
}

const ANY: ElementSpec = ElementSpec::new(AllowedRoles::Any);
const NONE: ElementSpec = ElementSpec::new(AllowedRoles::None);

const LINK_ROLES: &[&str] = &[
    "button",
    "checkbox",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "radio",
    "switch",
    "tab",
    "treeitem",
    "doc-backlink",
    "doc-biblioref",
    "doc-glossref",
    "doc-noteref",
];

const BUTTON_ROLES: &[&str] = &[
    "checkbox",
    "combobox",
    "link",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "radio",
    "switch",
    "tab",
];

const IMG_ROLES: &[&str] = &[
    "button",
    "checkbox",
    "link",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "progressbar",
    "scrollbar",
    "separator",
    "slider",
    "switch",
    "tab",
    "treeitem",
    "doc-cover",
];

const LIST_ROLES: &[&str] = &[
    "directory",
    "group",
    "listbox",
    "menu",
    "menubar",
    "none",
    "presentation",
    "radiogroup",
    "tablist",
    "toolbar",
    "tree",
];

const SECTION_ROLES: &[&str] = &[
    "alert",
    "alertdialog",
    "application",
    "banner",
    "complementary",
    "contentinfo",
    "dialog",
    "document",
    "feed",
    "log",
    "main",
    "marquee",
    "navigation",
    "none",
    "note",
    "presentation",
    "search",
    "status",
    "tabpanel",
    "doc-abstract",
    "doc-acknowledgments",
    "doc-afterword",
    "doc-appendix",
    "doc-bibliography",
    "doc-chapter",
    "doc-colophon",
    "doc-conclusion",
    "doc-credit",
    "doc-credits",
    "doc-dedication",
    "doc-endnotes",
    "doc-epigraph",
    "doc-epilogue",
    "doc-errata",
    "doc-example",
    "doc-foreword",
    "doc-glossary",
    "doc-index",
    "doc-introduction",
    "doc-notice",
    "doc-pagelist",
    "doc-part",
    "doc-preface",
    "doc-prologue",
    "doc-pullquote",
    "doc-qna",
    "doc-toc",
];

/// Every element name defined by HTML; anything else (custom elements) bypasses role checks
const HTML_ELEMENTS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col", "colgroup",
    "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt", "em", "embed",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "hgroup", "hr", "html", "i", "iframe", "img", "input", "ins", "kbd", "label",
    "legend", "li", "link", "main", "map", "mark", "math", "menu", "meta", "meter", "nav",
    "noscript", "object", "ol", "optgroup", "option", "output", "p", "param", "picture", "pre",
    "progress", "q", "rp", "rt", "ruby", "s", "samp", "script", "search", "section", "select",
    "slot", "small", "source", "span", "strong", "style", "sub", "summary", "sup", "svg", "table",
    "tbody", "td", "template", "textarea", "tfoot", "th", "thead", "time", "title", "tr", "track",
    "u", "ul", "var", "video", "wbr",
];

pub fn is_html_element(node: &VirtualNode) -> bool {
    node.is_html() && HTML_ELEMENTS.contains(&node.node_name())
}

fn input_spec(node: &VirtualNode) -> ElementSpec {
    let has_list = node.has_attr("list");
    match node.input_type().as_deref().unwrap_or("text") {
        "button" | "reset" | "submit" => ElementSpec::new(AllowedRoles::Only(BUTTON_ROLES)),
        "checkbox" => ElementSpec::new(AllowedRoles::Only(&["button", "menuitemcheckbox", "option", "switch"]))
            .implicit(&[("aria-checked", "false")]),
        "image" => ElementSpec::new(AllowedRoles::Only(&[
            "link",
            "menuitem",
            "menuitemcheckbox",
            "menuitemradio",
            "radio",
            "switch",
        ])),
        "radio" => ElementSpec::new(AllowedRoles::Only(&["menuitemradio"])).implicit(&[("aria-checked", "false")]),
        "range" => NONE.implicit(&[
            ("aria-valuemin", "0"),
            ("aria-valuemax", "100"),
            ("aria-valuenow", "50"),
        ]),
        "number" => NONE.implicit(&[("aria-valuenow", "")]),
        "hidden" => NONE.no_aria(),
        "text" | "search" | "tel" | "url" | "email" if has_list => {
            NONE.implicit(&[("aria-expanded", "false"), ("aria-controls", "")])
        }
        "text" | "search" | "tel" | "url" | "email" => {
            ElementSpec::new(AllowedRoles::Only(&["combobox", "searchbox", "spinbutton"]))
        }
        _ => NONE,
    }
}

/// Element spec of a node, resolved against its attributes
pub fn element_spec(tree: &VirtualTree, id: VNodeId) -> ElementSpec {
    let Some(node) = tree.get(id) else {
        return ANY;
    };
    if !is_html_element(node) {
        return ANY;
    }
    match node.node_name() {
        "a" if node.has_attr("href") => ElementSpec::new(AllowedRoles::Only(LINK_ROLES)),
        "area" if node.has_attr("href") => NONE,
        "article" => ElementSpec::new(AllowedRoles::Only(&[
            "feed",
            "presentation",
            "none",
            "document",
            "application",
            "main",
            "region",
        ])),
        "aside" => ElementSpec::new(AllowedRoles::Only(&[
            "feed",
            "note",
            "presentation",
            "none",
            "region",
            "search",
            "doc-dedication",
            "doc-example",
            "doc-footnote",
            "doc-glossary",
            "doc-pullquote",
            "doc-tip",
        ])),
        "audio" | "video" => ElementSpec::new(AllowedRoles::Only(&["application"])),
        "base" | "col" | "colgroup" | "head" | "html" | "link" | "map" | "meta" | "noscript" | "param"
        | "picture" | "script" | "slot" | "source" | "style" | "template" | "title" | "track" => NONE.no_aria(),
        "body" | "caption" | "datalist" | "dd" | "details" | "dt" | "figcaption" | "label" | "legend"
        | "main" | "meter" | "optgroup" | "option" | "progress" | "summary" | "textarea" => NONE,
        "br" | "wbr" => ElementSpec::new(AllowedRoles::Only(&["presentation", "none"])),
        "button" => ElementSpec::new(AllowedRoles::Only(BUTTON_ROLES)),
        "dialog" => ElementSpec::new(AllowedRoles::Only(&["alertdialog"])),
        "embed" | "iframe" => ElementSpec::new(AllowedRoles::Only(&[
            "application",
            "document",
            "img",
            "none",
            "presentation",
        ])),
        "fieldset" => ElementSpec::new(AllowedRoles::Only(&["none", "presentation", "radiogroup"])),
        "footer" => ElementSpec::new(AllowedRoles::Only(&["group", "none", "presentation", "doc-footnote"])),
        "form" => ElementSpec::new(AllowedRoles::Only(&["search", "none", "presentation"])),
        "h1" => ElementSpec::new(AllowedRoles::Only(&["none", "presentation", "tab", "doc-subtitle"]))
            .implicit(&[("aria-level", "1")]),
        "h2" => ElementSpec::new(AllowedRoles::Only(&["none", "presentation", "tab", "doc-subtitle"]))
            .implicit(&[("aria-level", "2")]),
        "h3" => ElementSpec::new(AllowedRoles::Only(&["none", "presentation", "tab", "doc-subtitle"]))
            .implicit(&[("aria-level", "3")]),
        "h4" => ElementSpec::new(AllowedRoles::Only(&["none", "presentation", "tab", "doc-subtitle"]))
            .implicit(&[("aria-level", "4")]),
        "h5" => ElementSpec::new(AllowedRoles::Only(&["none", "presentation", "tab", "doc-subtitle"]))
            .implicit(&[("aria-level", "5")]),
        "h6" => ElementSpec::new(AllowedRoles::Only(&["none", "presentation", "tab", "doc-subtitle"]))
            .implicit(&[("aria-level", "6")]),
        "header" => ElementSpec::new(AllowedRoles::Only(&["group", "none", "presentation", "doc-pageheader"])),
        "hr" => ElementSpec::new(AllowedRoles::Only(&["none", "presentation", "doc-pagebreak"])),
        "img" if node.attr("alt") == Some("") => ElementSpec::new(AllowedRoles::Only(&["none", "presentation"])),
        "img" => ElementSpec::new(AllowedRoles::Only(IMG_ROLES)),
        "input" => input_spec(node),
        "li" => ElementSpec::new(AllowedRoles::Only(&[
            "menuitem",
            "menuitemcheckbox",
            "menuitemradio",
            "option",
            "none",
            "presentation",
            "radio",
            "separator",
            "tab",
            "treeitem",
            "doc-biblioentry",
            "doc-endnote",
        ])),
        "menu" | "ol" | "ul" => ElementSpec::new(AllowedRoles::Only(LIST_ROLES)),
        "nav" => ElementSpec::new(AllowedRoles::Only(&[
            "doc-index",
            "doc-pagelist",
            "doc-toc",
            "menu",
            "menubar",
            "none",
            "presentation",
            "tablist",
        ])),
        "object" => ElementSpec::new(AllowedRoles::Only(&["application", "document", "img"])),
        "section" => ElementSpec::new(AllowedRoles::Only(SECTION_ROLES)),
        "select" if node.has_attr("multiple") || node.attr("size").and_then(|s| s.parse::<u32>().ok()).is_some_and(|s| s > 1) => NONE,
        "select" => ElementSpec::new(AllowedRoles::Only(&["menu"])).implicit(&[("aria-expanded", "false"), ("aria-controls", "")]),
        _ => ANY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_vdom::SerialNode;

    fn spec_of(node: SerialNode) -> ElementSpec {
        let tree = VirtualTree::from_serial(&node).unwrap();
        element_spec(&tree, tree.root().unwrap())
    }

    #[test]
    fn test_link_depends_on_href() {
        assert_eq!(spec_of(SerialNode::element("a")).allowed_roles, AllowedRoles::Any);
        assert_eq!(
            spec_of(SerialNode::element("a").with_attr("href", "#")).allowed_roles,
            AllowedRoles::Only(LINK_ROLES)
        );
    }

    #[test]
    fn test_input_implicit_attrs() {
        let checkbox = spec_of(SerialNode::element("input").with_attr("type", "checkbox"));
        assert!(checkbox.implies("aria-checked"));
        let hidden = spec_of(SerialNode::element("input").with_attr("type", "hidden"));
        assert!(hidden.no_aria_attrs);
    }

    #[test]
    fn test_custom_elements_allow_anything() {
        assert_eq!(spec_of(SerialNode::element("my-widget")).allowed_roles, AllowedRoles::Any);
    }
}
