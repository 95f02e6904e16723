//! Live document model of the host page.
//!
//! A `Document` is a cheaply clonable handle to a shared element tree
//! (`<html>` with `<head>` and `<body>`). Elements are addressed by `NodeId`
//! and stay valid after removal (detached nodes are simply not matched by
//! queries). Slots are only reclaimed through `discard`, which invalidates the
//! handle. Structural changes are pushed to registered `MutationObserver`s.

mod observer;
mod selector;
mod tree;

pub use observer::{MutationObserver, MutationRecord};
pub use selector::Selector;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use tree::Tree;

/// Handle to an element of a `Document`.
///
/// The generation tells a handle to a discarded element apart from the
/// element that later reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

/// Where `Document::insert` places a node relative to the reference element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertPosition {
    /// Last child of the reference.
    #[default]
    AppendChild,
    /// First child of the reference.
    Prepend,
    /// Previous sibling of the reference.
    Before,
    /// Next sibling of the reference.
    After,
    /// Takes the reference's place; the reference is detached.
    ReplaceWith,
}

/// Result of an atomic "query, else start observing" lookup.
pub(crate) enum Lookup {
    Found(NodeId),
    Observing(MutationObserver),
}

pub(crate) fn lock(tree: &Mutex<Tree>) -> MutexGuard<'_, Tree> {
    tree.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub struct Document {
    tree: Arc<Mutex<Tree>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tree = self.tree();
        f.debug_struct("Document")
            .field("nodes", &tree.descendants().len())
            .field("listeners", &tree.listener_count())
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            tree: Arc::new(Mutex::new(Tree::new())),
        }
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        lock(&self.tree)
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> NodeId {
        self.tree().root()
    }

    pub fn body(&self) -> NodeId {
        self.tree().body()
    }

    /// Creates a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.tree().create(tag)
    }

    /// First element in document order matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.query(&selector))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        let tree = self.tree();
        Ok(tree
            .descendants()
            .into_iter()
            .filter(|n| selector.matches(&tree, *n))
            .collect())
    }

    pub(crate) fn query(&self, selector: &Selector) -> Option<NodeId> {
        let tree = self.tree();
        tree.descendants()
            .into_iter()
            .find(|n| selector.matches(&tree, *n))
    }

    pub fn is_element_present(&self, selector: &str) -> Result<bool> {
        Ok(self.query_selector(selector)?.is_some())
    }

    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool> {
        let selector = Selector::parse(selector)?;
        Ok(selector.matches(&self.tree(), node))
    }

    /// Registers a subtree-wide child-list listener on the document root.
    pub fn observe(&self) -> MutationObserver {
        let mut tree = self.tree();
        self.register(&mut tree)
    }

    fn register(&self, tree: &mut Tree) -> MutationObserver {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = tree.add_listener(tx);
        MutationObserver::new(id, rx, Arc::downgrade(&self.tree))
    }

    /// Queries and, if nothing matches, registers a listener under the same lock
    /// so no mutation can slip in between.
    pub(crate) fn query_or_observe(&self, selector: &Selector) -> Lookup {
        let mut tree = self.tree();
        let found = tree
            .descendants()
            .into_iter()
            .find(|n| selector.matches(&tree, *n));
        match found {
            Some(node) => Lookup::Found(node),
            None => Lookup::Observing(self.register(&mut tree)),
        }
    }

    /// Number of live mutation listeners.
    pub fn listener_count(&self) -> usize {
        self.tree().listener_count()
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert(parent, child, InsertPosition::AppendChild)
    }

    /// Places `node` relative to `reference`. A node already in the tree is moved.
    /// Sibling positions on a parentless reference are a no-op.
    pub fn insert(&self, reference: NodeId, node: NodeId, position: InsertPosition) -> Result<()> {
        let mut tree = self.tree();
        tree.get(reference).ok_or(Error::UnknownNode)?;
        tree.get(node).ok_or(Error::UnknownNode)?;

        match position {
            InsertPosition::AppendChild | InsertPosition::Prepend => {
                if tree.is_inclusive_ancestor(node, reference) {
                    return Err(Error::HierarchyRequest);
                }
                detach(&mut tree, node);
                let index = match position {
                    InsertPosition::Prepend => 0,
                    _ => tree.get(reference).map_or(0, |e| e.children.len()),
                };
                tree.link_at(reference, index, node);
                tree.notify(MutationRecord {
                    target: reference,
                    added: vec![node],
                    removed: Vec::new(),
                });
            }
            InsertPosition::Before | InsertPosition::After | InsertPosition::ReplaceWith => {
                if node == reference {
                    return Ok(());
                }
                let Some(parent) = tree.parent(reference) else {
                    return Ok(());
                };
                if tree.is_inclusive_ancestor(node, parent) {
                    return Err(Error::HierarchyRequest);
                }
                detach(&mut tree, node);
                let (_, index) = tree.index_in_parent(reference).ok_or(Error::UnknownNode)?;
                let mut removed = Vec::new();
                let index = match position {
                    InsertPosition::Before => index,
                    InsertPosition::After => index + 1,
                    _ => {
                        tree.unlink(reference);
                        removed.push(reference);
                        index
                    }
                };
                tree.link_at(parent, index, node);
                tree.notify(MutationRecord {
                    target: parent,
                    added: vec![node],
                    removed,
                });
            }
        }
        Ok(())
    }

    /// Inserts `node` relative to the first match of `parent_selector`.
    /// Returns false (and changes nothing) when nothing matches.
    pub fn safe_inject(&self, parent_selector: &str, node: NodeId, position: InsertPosition) -> Result<bool> {
        match self.query_selector(parent_selector)? {
            Some(target) => {
                self.insert(target, node, position)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Detaches `node` from its parent. Removing a detached node is a no-op.
    pub fn remove(&self, node: NodeId) -> Result<()> {
        let mut tree = self.tree();
        tree.get(node).ok_or(Error::UnknownNode)?;
        detach(&mut tree, node);
        Ok(())
    }

    /// Detaches `node` and frees its subtree's slots for reuse. Handles into the
    /// subtree become unknown. The root and `<body>` cannot be discarded.
    pub fn discard(&self, node: NodeId) -> Result<()> {
        let mut tree = self.tree();
        tree.get(node).ok_or(Error::UnknownNode)?;
        if node == tree.root() || node == tree.body() {
            return Err(Error::HierarchyRequest);
        }
        detach(&mut tree, node);
        tree.release(node);
        Ok(())
    }

    /// Allocated element slots, live or detached.
    pub fn slot_count(&self) -> usize {
        self.tree().slot_count()
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree().is_connected(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree().parent(node)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree()
            .get(node)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let tree = self.tree();
        let (parent, index) = tree.index_in_parent(node)?;
        tree.get(parent)?.children.get(index + 1).copied()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.tree().get(node).map(|e| e.tag.clone())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree()
            .get(node)
            .and_then(|e| e.attribute(name).map(str::to_string))
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.tree()
            .get_mut(node)
            .ok_or(Error::UnknownNode)?
            .set_attribute(name, value);
        Ok(())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.tree().get(node).is_some_and(|e| e.has_class(class))
    }

    pub fn add_class(&self, node: NodeId, class: &str) -> Result<()> {
        let mut tree = self.tree();
        let element = tree.get_mut(node).ok_or(Error::UnknownNode)?;
        if element.has_class(class) {
            return Ok(());
        }
        let mut classes: Vec<String> = element.classes().map(str::to_string).collect();
        classes.push(class.to_string());
        element.set_attribute("class", &classes.join(" "));
        Ok(())
    }

    pub fn remove_class(&self, node: NodeId, class: &str) -> Result<()> {
        let mut tree = self.tree();
        let element = tree.get_mut(node).ok_or(Error::UnknownNode)?;
        let classes: Vec<String> = element
            .classes()
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        element.set_attribute("class", &classes.join(" "));
        Ok(())
    }

    pub fn text(&self, node: NodeId) -> Option<String> {
        self.tree().get(node).map(|e| e.text.clone())
    }

    pub fn set_text(&self, node: NodeId, text: &str) -> Result<()> {
        self.tree().get_mut(node).ok_or(Error::UnknownNode)?.text = text.to_string();
        Ok(())
    }
}

fn detach(tree: &mut Tree, node: NodeId) {
    if let Some(old_parent) = tree.unlink(node) {
        tree.notify(MutationRecord {
            target: old_parent,
            added: Vec::new(),
            removed: vec![node],
        });
    }
}
