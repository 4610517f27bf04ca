//! Selector queries over a virtual tree
//!
//! Matching is scoped: combinators never cross a shadow root or frame
//! document boundary, but the search itself walks every scope below the
//! starting node.

use crate::{VNodeId, VRef, VdomError, VirtualTree};
use fos_css::{parse_selector_list, SelectorList};
use std::rc::Rc;

/// Parse a selector, memoized in the tree cache
pub fn compile(tree: &VirtualTree, selector: &str) -> Result<Rc<SelectorList>, VdomError> {
    let key = format!("selector:{}", selector);
    if let Some(Some(list)) = tree.cache().get::<SelectorList>(&key) {
        return Ok(list);
    }
    let list = parse_selector_list(selector)?;
    tree.cache().set(&key, Some(list))?;
    tree.cache()
        .get::<SelectorList>(&key)
        .flatten()
        .ok_or_else(|| VdomError::Cache(crate::CacheError::UndefinedDefault(key)))
}

/// Whether an element matches a parsed selector list
pub fn matches(tree: &VirtualTree, id: VNodeId, selector: &SelectorList) -> bool {
    VRef::scoped(tree, id).is_some_and(|r| selector.matches(&r))
}

/// Whether an element matches a selector string
pub fn matches_str(tree: &VirtualTree, id: VNodeId, selector: &str) -> Result<bool, VdomError> {
    let list = compile(tree, selector)?;
    Ok(matches(tree, id, &list))
}

/// Elements in the subtree of `root` (inclusive) matching `selector`, in document order
pub fn query_selector_all(tree: &VirtualTree, root: VNodeId, selector: &SelectorList) -> Vec<VNodeId> {
    tree.subtree(root).filter(|id| matches(tree, *id, selector)).collect()
}

pub fn query_selector_all_str(tree: &VirtualTree, root: VNodeId, selector: &str) -> Result<Vec<VNodeId>, VdomError> {
    let list = compile(tree, selector)?;
    Ok(query_selector_all(tree, root, &list))
}

/// Nearest inclusive ancestor matching `selector`, following the composed tree
pub fn closest(tree: &VirtualTree, id: VNodeId, selector: &SelectorList) -> Option<VNodeId> {
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .find(|candidate| matches(tree, *candidate, selector))
}
