//! Child-list mutation listeners.
//!
//! A `MutationObserver` is registered on the document root and receives a
//! record for every structural change anywhere in the connected tree. It is
//! deregistered by `disconnect()` or on drop, whichever comes first.

use std::sync::{Mutex, Weak};

use tokio::sync::mpsc::UnboundedReceiver;

use super::tree::Tree;
use super::{lock, NodeId};

/// One structural change: nodes added to or removed from `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

pub struct MutationObserver {
    id: u64,
    rx: UnboundedReceiver<MutationRecord>,
    tree: Weak<Mutex<Tree>>,
    connected: bool,
}

impl MutationObserver {
    pub(super) fn new(id: u64, rx: UnboundedReceiver<MutationRecord>, tree: Weak<Mutex<Tree>>) -> Self {
        Self {
            id,
            rx,
            tree,
            connected: true,
        }
    }

    /// Next record, or `None` once the document is gone or the observer is disconnected.
    pub async fn next(&mut self) -> Option<MutationRecord> {
        if !self.connected {
            return None;
        }
        self.rx.recv().await
    }

    /// Records already queued, without waiting.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        let mut out = Vec::new();
        while let Ok(r) = self.rx.try_recv() {
            out.push(r);
        }
        out
    }

    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        self.rx.close();
        if let Some(tree) = self.tree.upgrade() {
            lock(&tree).remove_listener(self.id);
        }
    }
}

impl Drop for MutationObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}
