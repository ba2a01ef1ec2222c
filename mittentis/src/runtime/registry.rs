use crate::runtime::task::Manageable;
use crate::utils::slab::Slab;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Generational identifier of a registry node.
///
/// Slab indices are reused after removal, so every node also carries a
/// process-unique serial number. A stale `NodeId` (its slot was freed,
/// possibly reoccupied) is detected by a serial mismatch and treated as
/// a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId {
    pub(crate) index: usize,
    pub(crate) serial: u64,
}

/// One live task in the ownership tree.
struct Node {
    /// The task itself. Weak so the registry never keeps a task alive.
    task: Weak<dyn Manageable>,

    /// Serial number guarding against slot reuse.
    serial: u64,

    /// Index of the owning parent, if the task was spawned from inside
    /// another task without opting out of inheritance.
    parent: Option<usize>,

    /// Indices of directly owned children.
    children: Vec<usize>,
}

/// Process-wide registry of live tasks, keyed by arena index.
///
/// The registry records who owns whom: a task spawned from inside
/// another task becomes a child of it, and cancelling a parent walks
/// the subtree and cancels every descendant. Tasks spawned
/// independently are separate roots and are never reached by a
/// parent's cancellation walk.
///
/// Every scheduled task occupies one node until it reaches a terminal
/// state, at which point it releases its slot and its children are
/// handed to its own parent. This gives fire-and-forget work an explicit
/// owner of last resort: on shutdown the scheduler cancels every node
/// still present here.
pub(crate) struct Registry {
    nodes: Mutex<Slab<Node>>,
    next_serial: AtomicU64,
}

impl Registry {
    /// Creates an empty registry.
    pub(crate) fn new() -> Self {
        Self {
            nodes: Mutex::new(Slab::new(16)),
            next_serial: AtomicU64::new(1),
        }
    }

    /// Registers a task, optionally under a parent.
    ///
    /// A stale parent id (the parent already reached a terminal state)
    /// degrades the task to a root rather than failing.
    pub(crate) fn insert(&self, parent: Option<NodeId>, task: Weak<dyn Manageable>) -> NodeId {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let mut nodes = self.nodes.lock().unwrap();

        let parent_index = parent.and_then(|p| {
            nodes
                .get(p.index)
                .filter(|node| node.serial == p.serial)
                .map(|_| p.index)
        });

        let index = nodes.insert(Node {
            task,
            serial,
            parent: parent_index,
            children: Vec::new(),
        });

        if let Some(p) = parent_index
            && let Some(parent_node) = nodes.get_mut(p)
        {
            parent_node.children.push(index);
        }

        NodeId { index, serial }
    }

    /// Removes a node once its task reached a terminal state.
    ///
    /// The node is detached from its parent's child list. Its own
    /// surviving children are handed to the grandparent, so an
    /// enclosing scope still owns (drains, cancels) them; without a
    /// grandparent they become roots. They are never cancelled here:
    /// completion of a parent does not imply anything about work it
    /// spawned.
    pub(crate) fn release(&self, id: NodeId) {
        let mut nodes = self.nodes.lock().unwrap();

        let Some(node) = nodes.get(id.index) else {
            return;
        };
        if node.serial != id.serial {
            return;
        }

        let node = nodes.remove(id.index);

        if let Some(p) = node.parent
            && let Some(parent_node) = nodes.get_mut(p)
        {
            parent_node.children.retain(|&c| c != id.index);
        }

        let mut inherited = Vec::new();
        for child in node.children {
            if let Some(child_node) = nodes.get_mut(child) {
                child_node.parent = node.parent;
                inherited.push(child);
            }
        }

        if let Some(p) = node.parent
            && let Some(parent_node) = nodes.get_mut(p)
        {
            parent_node.children.extend(inherited);
        }
    }

    /// Collects the task at `id` and all its transitive descendants.
    ///
    /// The walk is performed under the registry lock; aborting the
    /// collected tasks is left to the caller so that terminal
    /// transitions (which re-enter the registry to release their node)
    /// never run with the lock held.
    pub(crate) fn collect_subtree(&self, id: NodeId) -> Vec<Arc<dyn Manageable>> {
        let nodes = self.nodes.lock().unwrap();

        let Some(root) = nodes.get(id.index) else {
            return Vec::new();
        };
        if root.serial != id.serial {
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut stack = vec![id.index];

        while let Some(index) = stack.pop() {
            if let Some(node) = nodes.get(index) {
                if let Some(task) = node.task.upgrade() {
                    out.push(task);
                }
                stack.extend(node.children.iter().copied());
            }
        }

        out
    }

    /// Returns the live direct children of `id`.
    ///
    /// Used by the blocking entry point to drain work submitted within
    /// its scope before returning.
    pub(crate) fn live_children(&self, id: NodeId) -> Vec<Arc<dyn Manageable>> {
        let nodes = self.nodes.lock().unwrap();

        let Some(node) = nodes.get(id.index) else {
            return Vec::new();
        };
        if node.serial != id.serial {
            return Vec::new();
        }

        node.children
            .iter()
            .filter_map(|&c| nodes.get(c).and_then(|n| n.task.upgrade()))
            .collect()
    }

    /// Collects every live task in the registry.
    ///
    /// Called once during scheduler shutdown to cancel outstanding
    /// work, including independent fire-and-forget tasks.
    pub(crate) fn collect_all(&self) -> Vec<Arc<dyn Manageable>> {
        let nodes = self.nodes.lock().unwrap();

        nodes
            .occupied()
            .into_iter()
            .filter_map(|i| nodes.get(i).and_then(|n| n.task.upgrade()))
            .collect()
    }
}
