//! Run scope
//!
//! A [`ContextSpec`] names what to test: selector paths to include and
//! exclude, each path descending through frames (`["iframe#pay", "form"]`).
//! [`Context::resolve`] turns it into node roots of the composed tree plus
//! the frames that must be asked for partial results because the tree could
//! not look inside them.

use crate::result::NodeRef;
use crate::{AuditError, Result};
use fos_vdom::{compile, matches, FrameLink, ScopeId, VNodeId, VirtualTree};
use serde::{Deserialize, Serialize};

/// Selectors from the outer document down through frames; the last one
/// selects nodes, the others select frame elements
pub type FramePath = Vec<String>;

#[derive(Deserialize)]
#[serde(untagged)]
enum PathRepr {
    Selector(String),
    Path(Vec<String>),
}

impl From<PathRepr> for FramePath {
    fn from(repr: PathRepr) -> Self {
        match repr {
            PathRepr::Selector(selector) => vec![selector],
            PathRepr::Path(path) => path,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListRepr {
    One(String),
    Many(Vec<PathRepr>),
}

impl From<ListRepr> for Vec<FramePath> {
    fn from(repr: ListRepr) -> Self {
        match repr {
            ListRepr::One(selector) => vec![vec![selector]],
            ListRepr::Many(paths) => paths.into_iter().map(FramePath::from).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContextRepr {
    List(ListRepr),
    Object {
        #[serde(default)]
        include: Option<ListRepr>,
        #[serde(default)]
        exclude: Option<ListRepr>,
    },
}

/// What to test, as the caller describes it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ContextRepr")]
pub struct ContextSpec {
    /// Empty means the whole document
    pub include: Vec<FramePath>,
    pub exclude: Vec<FramePath>,
}

impl From<ContextRepr> for ContextSpec {
    fn from(repr: ContextRepr) -> Self {
        match repr {
            ContextRepr::List(list) => ContextSpec {
                include: list.into(),
                exclude: Vec::new(),
            },
            ContextRepr::Object { include, exclude } => ContextSpec {
                include: include.map(Into::into).unwrap_or_default(),
                exclude: exclude.map(Into::into).unwrap_or_default(),
            },
        }
    }
}

impl ContextSpec {
    /// The whole document
    pub fn document() -> Self {
        Self::default()
    }

    pub fn selector(selector: &str) -> Self {
        Self {
            include: vec![vec![selector.to_string()]],
            exclude: Vec::new(),
        }
    }

    pub fn include(mut self, path: &[&str]) -> Self {
        self.include.push(path.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn exclude(mut self, path: &[&str]) -> Self {
        self.exclude.push(path.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AuditError::InvalidArgument(format!("context: {e}")))
    }
}

/// A frame the tree could not enter, with the part of the context it owns
#[derive(Debug, Clone, PartialEq)]
pub struct FrameContext {
    pub frame: VNodeId,
    pub node: NodeRef,
    pub src: Option<String>,
    pub context: ContextSpec,
}

/// Resolved scope of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub include: Vec<VNodeId>,
    pub exclude: Vec<VNodeId>,
    pub frames: Vec<FrameContext>,
    /// The whole top-level document is in scope
    pub page: bool,
    ranges: Vec<Range>,
}

/// Subtree of an include or exclude root, as a document-order interval
#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    start: VNodeId,
    end: VNodeId,
    included: bool,
}

fn ranges(tree: &VirtualTree, include: &[VNodeId], exclude: &[VNodeId]) -> Vec<Range> {
    let range = |root: VNodeId, included: bool| Range {
        start: root,
        end: tree.subtree(root).last().unwrap_or(root),
        included,
    };
    include
        .iter()
        .map(|root| range(*root, true))
        .chain(exclude.iter().map(|root| range(*root, false)))
        .collect()
}

enum Resolved {
    Node(VNodeId),
    Frame(VNodeId, FramePath),
}

/// Elements of the document `scope` (light tree only) under `root` matching `selector`
fn select_in(tree: &VirtualTree, root: VNodeId, scope: ScopeId, selector: &str) -> Result<Vec<VNodeId>> {
    let list = compile(tree, selector).map_err(|e| AuditError::InvalidArgument(format!("{selector:?}: {e}")))?;
    Ok(tree
        .subtree(root)
        .filter(|id| tree[*id].is_element() && tree[*id].scope() == scope)
        .filter(|id| matches(tree, *id, &list))
        .collect())
}

/// Follow one path through resolved frames
fn resolve_path(tree: &VirtualTree, root: VNodeId, path: &[String], out: &mut Vec<Resolved>) -> Result<()> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(());
    };
    let scope = tree[root].scope();
    for hit in select_in(tree, root, scope, first)? {
        if rest.is_empty() {
            out.push(Resolved::Node(hit));
            continue;
        }
        match tree[hit].frame() {
            Some(FrameLink::Resolved { .. }) => {
                if let Some(document_element) = tree.element_children(hit).next() {
                    resolve_path(tree, document_element, rest, out)?;
                }
            }
            Some(FrameLink::Unresolved { .. }) => out.push(Resolved::Frame(hit, rest.to_vec())),
            None => tracing::debug!("Context selector {} matched a non-frame element", first),
        }
    }
    Ok(())
}

fn unresolved_src(tree: &VirtualTree, frame: VNodeId) -> Option<String> {
    match tree[frame].frame() {
        Some(FrameLink::Unresolved { src, .. }) => src.clone(),
        _ => None,
    }
}

impl Context {
    /// The whole tree, without frame bookkeeping
    pub fn whole(tree: &VirtualTree) -> Self {
        let include: Vec<VNodeId> = tree.root().into_iter().collect();
        Self {
            ranges: ranges(tree, &include, &[]),
            include,
            exclude: Vec::new(),
            frames: Vec::new(),
            page: true,
        }
    }

    /// Resolve a spec against a composed tree
    pub fn resolve(tree: &VirtualTree, spec: &ContextSpec, iframes: bool) -> Result<Self> {
        let Some(root) = tree.root() else {
            return Err(AuditError::InvalidArgument("cannot run on an empty tree".to_string()));
        };

        let mut frames: Vec<FrameContext> = Vec::new();
        let mut add_frame = |tree: &VirtualTree, frame: VNodeId, include: Option<FramePath>, exclude: Option<FramePath>| {
            let index = match frames.iter().position(|f| f.frame == frame) {
                Some(index) => index,
                None => {
                    frames.push(FrameContext {
                        frame,
                        node: NodeRef::of(tree, frame),
                        src: unresolved_src(tree, frame),
                        context: ContextSpec::default(),
                    });
                    frames.len() - 1
                }
            };
            let context = &mut frames[index].context;
            if let Some(path) = include {
                context.include.push(path);
            }
            if let Some(path) = exclude {
                context.exclude.push(path);
            }
        };

        let mut include = Vec::new();
        if spec.include.is_empty() {
            include.push(root);
        } else {
            for path in &spec.include {
                let mut resolved = Vec::new();
                resolve_path(tree, root, path, &mut resolved)?;
                for hit in resolved {
                    match hit {
                        Resolved::Node(node) => include.push(node),
                        Resolved::Frame(frame, rest) if iframes => add_frame(tree, frame, Some(rest), None),
                        Resolved::Frame(..) => {}
                    }
                }
            }
        }

        let mut exclude = Vec::new();
        for path in &spec.exclude {
            let mut resolved = Vec::new();
            resolve_path(tree, root, path, &mut resolved)?;
            for hit in resolved {
                match hit {
                    Resolved::Node(node) => exclude.push(node),
                    Resolved::Frame(frame, rest) if iframes => add_frame(tree, frame, None, Some(rest)),
                    Resolved::Frame(..) => {}
                }
            }
        }

        include.sort();
        include.dedup();
        exclude.sort();
        exclude.dedup();

        let mut context = Context {
            ranges: ranges(tree, &include, &exclude),
            include,
            exclude,
            frames: Vec::new(),
            page: spec.include.is_empty(),
        };

        // Unreachable frames inside included content are tested whole
        let contained: Vec<VNodeId> = if iframes {
            tree.nodes()
                .filter(|n| matches!(n.frame(), Some(FrameLink::Unresolved { .. })))
                .map(|n| n.id())
                .filter(|id| context.contains(*id))
                .collect()
        } else {
            Vec::new()
        };
        for frame in &contained {
            add_frame(tree, *frame, None, None);
        }
        for frame in frames.iter_mut().filter(|f| contained.contains(&f.frame)) {
            frame.context.include.clear();
        }

        // A frame picked only through an exclude path is otherwise out of scope
        frames.retain(|f| !f.context.include.is_empty() || contained.contains(&f.frame));
        frames.sort_by_key(|f| f.frame);
        context.frames = frames;

        if !spec.include.is_empty() && context.include.is_empty() && context.frames.is_empty() {
            return Err(AuditError::InvalidArgument(
                "no elements found for include in context".to_string(),
            ));
        }
        tracing::debug!(
            "Context: {} include roots, {} exclude roots, {} frames",
            context.include.len(),
            context.exclude.len(),
            context.frames.len()
        );
        Ok(context)
    }

    /// Whether the node is in scope: the deepest include or exclude root
    /// containing it decides, exclude winning ties
    pub fn contains(&self, id: VNodeId) -> bool {
        let deepest = |included: bool| {
            self.ranges
                .iter()
                .filter(|r| r.included == included && r.start <= id && id <= r.end)
                .map(|r| r.start)
                .max()
        };
        match (deepest(true), deepest(false)) {
            (Some(include), Some(exclude)) => include > exclude,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_vdom::SerialNode;
    use serde_json::json;

    #[test]
    fn test_spec_shapes() {
        let one: ContextSpec = serde_json::from_value(json!("main")).unwrap();
        assert_eq!(one, ContextSpec::selector("main"));

        let list: ContextSpec = serde_json::from_value(json!(["header", ["iframe", "form"]])).unwrap();
        assert_eq!(list.include, vec![vec!["header".to_string()], vec!["iframe".to_string(), "form".to_string()]]);

        let object: ContextSpec = serde_json::from_value(json!({ "exclude": [".ad"] })).unwrap();
        assert!(object.include.is_empty());
        assert_eq!(object.exclude, vec![vec![".ad".to_string()]]);

        let empty: ContextSpec = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty, ContextSpec::document());
    }

    fn tree() -> VirtualTree {
        let root = SerialNode::element("div")
            .with_attr("id", "root")
            .with_child(
                SerialNode::element("section")
                    .with_attr("id", "a")
                    .with_child(SerialNode::element("p").with_attr("id", "x")),
            )
            .with_child(
                SerialNode::element("section")
                    .with_attr("id", "b")
                    .with_child(SerialNode::element("p").with_attr("id", "y").with_child(
                        SerialNode::element("span").with_attr("class", "keep"),
                    )),
            );
        VirtualTree::from_serial(&root).unwrap()
    }

    fn node(tree: &VirtualTree, id: &str) -> VNodeId {
        tree.nodes().find(|n| n.attr("id") == Some(id)).map(|n| n.id()).unwrap()
    }

    #[test]
    fn test_whole_document() {
        let tree = tree();
        let context = Context::resolve(&tree, &ContextSpec::document(), true).unwrap();
        assert!(context.page);
        assert!(context.frames.is_empty());
        assert!(tree.nodes().all(|n| context.contains(n.id())));
    }

    #[test]
    fn test_include_and_exclude() {
        let tree = tree();
        let spec = ContextSpec::selector("#root").exclude(&["#b"]);
        let context = Context::resolve(&tree, &spec, true).unwrap();
        assert!(!context.page);
        assert!(context.contains(node(&tree, "x")));
        assert!(!context.contains(node(&tree, "b")));
        assert!(!context.contains(node(&tree, "y")));
    }

    #[test]
    fn test_deepest_root_decides() {
        let tree = tree();
        let spec = ContextSpec::document().exclude(&["#b"]).include(&[".keep"]);
        let context = Context::resolve(&tree, &spec, true).unwrap();
        let keep = tree.nodes().find(|n| n.attr("class") == Some("keep")).map(|n| n.id()).unwrap();
        assert!(context.contains(keep));
        assert!(!context.contains(node(&tree, "y")));
        assert!(!context.contains(node(&tree, "x")));
    }

    #[test]
    fn test_include_matching_nothing() {
        let tree = tree();
        assert!(matches!(
            Context::resolve(&tree, &ContextSpec::selector("#missing"), true),
            Err(AuditError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bad_selector() {
        let tree = tree();
        assert!(matches!(
            Context::resolve(&tree, &ContextSpec::selector("[[["), true),
            Err(AuditError::InvalidArgument(_))
        ));
    }
}
