use std::any::Any;

use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{NodeId, Tree};
use crate::pipeline::Phase;

/// Per-run scratch space shared between pass invocations.
///
/// A pass that needs memory across nodes (fingerprint tables, hoist
/// bookkeeping) stores it here under its own key. The map is created fresh
/// for every pipeline run, so no state leaks between programs.
#[derive(Default)]
pub struct SharedState {
    slots: FxHashMap<&'static str, Box<dyn Any>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_with<T: Any>(&mut self, key: &'static str, init: impl FnOnce() -> T) -> &mut T {
        self.slots
            .entry(key)
            .or_insert_with(|| Box::new(init()))
            .downcast_mut()
            .expect("shared-state slot accessed with a different type than it was created with")
    }

    pub fn get<T: Any>(&self, key: &'static str) -> Option<&T> {
        self.slots.get(key)?.downcast_ref()
    }
}

/// Everything a pass sees while visiting one node.
pub struct TransformContext<'a> {
    pub tree: &'a mut Tree,
    pub phase: Phase,
    /// Parent of the visited node; `None` at the root.
    pub parent: Option<NodeId>,
    /// Names declared anywhere in the tree; passes that introduce bindings
    /// insert into it so later renaming sees them.
    pub declared: &'a mut FxHashSet<CompactString>,
    pub shared: &'a mut SharedState,
    hoisted: &'a mut Vec<NodeId>,
}

impl<'a> TransformContext<'a> {
    pub(crate) fn new(
        tree: &'a mut Tree,
        phase: Phase,
        parent: Option<NodeId>,
        declared: &'a mut FxHashSet<CompactString>,
        shared: &'a mut SharedState,
        hoisted: &'a mut Vec<NodeId>,
    ) -> Self {
        Self {
            tree,
            phase,
            parent,
            declared,
            shared,
            hoisted,
        }
    }

    /// Produces an identifier name not declared anywhere in the tree and
    /// records it as declared.
    pub fn fresh_ident(&mut self, base: &str) -> CompactString {
        let mut candidate = CompactString::from(format!("_{base}"));
        let mut counter = 2u32;
        while self.declared.contains(&candidate) {
            candidate = CompactString::from(format!("_{base}{counter}"));
            counter += 1;
        }
        self.declared.insert(candidate.clone());
        candidate
    }

    /// Inserts a statement before the visited node in its parent's list
    /// slot. `false` when the node has no parent or sits in a single slot.
    pub fn insert_before(&mut self, current: NodeId, new: NodeId) -> bool {
        match self.parent {
            Some(parent) => self.tree.insert_sibling(parent, current, new, false),
            None => false,
        }
    }

    pub fn insert_after(&mut self, current: NodeId, new: NodeId) -> bool {
        match self.parent {
            Some(parent) => self.tree.insert_sibling(parent, current, new, true),
            None => false,
        }
    }

    /// Replaces `from` with `to` anywhere in the tree by identity, walking
    /// down from the root to locate the parent. Replacing the root swaps
    /// the root handle. `false` when `from` is not reachable.
    pub fn replace_in_tree(&mut self, from: NodeId, to: NodeId) -> bool {
        match self.tree.parent_of(from) {
            Some(parent) => self.tree.replace_child(parent, from, to),
            None if self.tree.root() == Some(from) => {
                self.tree.set_root(to);
                true
            }
            None => false,
        }
    }

    /// Schedules a declaration for appending to the program body after the
    /// current phase's traversal finishes.
    pub fn hoist(&mut self, declaration: NodeId) {
        self.hoisted.push(declaration);
    }
}
