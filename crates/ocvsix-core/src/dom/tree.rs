//! Arena-backed element tree and the mutation-listener registry.

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;

use super::{MutationRecord, NodeId};

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag: String,
    attributes: Vec<(String, String)>,
    pub(crate) text: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// One arena slot. A free slot keeps its generation so stale handles miss.
#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub(crate) fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or("").split_whitespace()
    }

    pub(crate) fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

pub(crate) struct Tree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    body: NodeId,
    listeners: HashMap<u64, UnboundedSender<MutationRecord>>,
    next_listener: u64,
}

impl Tree {
    /// `<html><head></head><body></body></html>`
    pub(crate) fn new() -> Self {
        let mut tree = Tree {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
            body: NodeId { index: 0, generation: 0 },
            listeners: HashMap::new(),
            next_listener: 0,
        };
        let root = tree.create("html");
        let head = tree.create("head");
        let body = tree.create("body");
        tree.link_last(root, head);
        tree.link_last(root, body);
        tree.root = root;
        tree.body = body;
        tree
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn body(&self) -> NodeId {
        self.body
    }

    pub(crate) fn create(&mut self, tag: &str) -> NodeId {
        let element = Some(Element::new(tag));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.element = element;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            element,
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, node: NodeId) -> Option<&Element> {
        self.slots
            .get(node.index)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.element.as_ref())
    }

    pub(crate) fn get_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.slots
            .get_mut(node.index)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.element.as_mut())
    }

    /// Frees the slots of a detached subtree.
    pub(crate) fn release(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(n.index)
                .filter(|s| s.generation == n.generation)
            else {
                continue;
            };
            let Some(element) = slot.element.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(n.index);
            stack.extend(element.children);
        }
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|e| e.parent)
    }

    pub(crate) fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.root {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    pub(crate) fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Pre-order traversal of the connected tree.
    pub(crate) fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(n) = stack.pop() {
            out.push(n);
            if let Some(e) = self.get(n) {
                stack.extend(e.children.iter().rev().copied());
            }
        }
        out
    }

    /// Detaches `node` from its parent, returning the former parent.
    pub(crate) fn unlink(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.get_mut(node)?.parent.take()?;
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|c| *c != node);
        }
        Some(parent)
    }

    pub(crate) fn link_at(&mut self, parent: NodeId, index: usize, node: NodeId) {
        if let Some(p) = self.get_mut(parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, node);
        }
        if let Some(n) = self.get_mut(node) {
            n.parent = Some(parent);
        }
    }

    pub(crate) fn link_last(&mut self, parent: NodeId, node: NodeId) {
        let len = self.get(parent).map_or(0, |p| p.children.len());
        self.link_at(parent, len, node);
    }

    pub(crate) fn index_in_parent(&self, node: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(node)?;
        let index = self.get(parent)?.children.iter().position(|c| *c == node)?;
        Some((parent, index))
    }

    pub(crate) fn add_listener(&mut self, tx: UnboundedSender<MutationRecord>) -> u64 {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.insert(id, tx);
        id
    }

    pub(crate) fn remove_listener(&mut self, id: u64) {
        self.listeners.remove(&id);
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Delivers a child-list record to every live listener, if the target is in the document.
    pub(crate) fn notify(&mut self, record: MutationRecord) {
        if !self.is_connected(record.target) {
            return;
        }
        self.listeners
            .retain(|_, tx| tx.send(record.clone()).is_ok());
    }
}
