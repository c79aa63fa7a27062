use std::ops::{Index, IndexMut};

use crate::{
    arena::Arena,
    ast::node::{Field, Node, NodeId, NodeKind},
    schema,
};

/// An arena-backed syntax tree.
///
/// Nodes are owned by the arena and referenced by [`NodeId`] handles, so
/// structural rewrites (replace, remove, splice, insert) are index rewrites
/// on the parent's fields and never invalidate other handles. Nodes detached
/// by a rewrite simply become unreachable from the root; the encoder only
/// walks reachable nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    nodes: Arena<Node>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node with positional fields aligned to the tag's schema.
    pub fn node(&mut self, kind: NodeKind, fields: impl IntoIterator<Item = Field>) -> NodeId {
        self.nodes.alloc(Node::new(kind, fields))
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn clear_root(&mut self) {
        self.root = None;
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a field by schema name.
    pub fn field(&self, id: NodeId, name: &str) -> Option<&Field> {
        let node = &self.nodes[id];
        let index = schema::field_index(&node.kind, name)?;
        node.fields.get(index)
    }

    pub fn field_mut(&mut self, id: NodeId, name: &str) -> Option<&mut Field> {
        let kind = self.nodes[id].kind.clone();
        let index = schema::field_index(&kind, name)?;
        self.nodes[id].fields.get_mut(index)
    }

    /// Overwrites a field by schema name; `false` if the tag has no such field.
    pub fn set_field(&mut self, id: NodeId, name: &str, value: Field) -> bool {
        match self.field_mut(id, name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// The child node stored directly in the named field, if any.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.field(id, name).and_then(Field::as_node)
    }

    /// All direct child nodes in field order, including list elements.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for field in &self.nodes[id].fields {
            collect_child_nodes(field, &mut out);
        }
        out
    }

    /// Deep-copies the subtree rooted at `id` and returns the new root.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let node = self.nodes[id].clone();
        let fields = node
            .fields
            .iter()
            .map(|field| self.clone_field(field))
            .collect::<Vec<_>>();
        self.node(node.kind, fields)
    }

    fn clone_field(&mut self, field: &Field) -> Field {
        match field {
            Field::Node(child) => Field::Node(self.clone_subtree(*child)),
            Field::List(items) => {
                Field::List(items.iter().map(|item| self.clone_field(item)).collect())
            }
            other => other.clone(),
        }
    }

    /// Swaps `old` for `new` wherever it appears among `parent`'s fields.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> bool {
        for field in self.nodes[parent].fields.iter_mut() {
            if replace_in_field(field, old, new) {
                return true;
            }
        }
        false
    }

    /// Removes `old` from `parent`: dropped from a list field, or reset to
    /// `Field::Null` in a single-child slot.
    pub fn remove_child(&mut self, parent: NodeId, old: NodeId) -> bool {
        for field in self.nodes[parent].fields.iter_mut() {
            match field {
                Field::Node(id) if *id == old => {
                    *field = Field::Null;
                    return true;
                }
                Field::List(items) => {
                    if let Some(position) = position_of(items, old) {
                        items.remove(position);
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Replaces `old` inside one of `parent`'s list fields with an ordered
    /// run of siblings. Fails when `old` does not sit in a list slot.
    pub fn splice_child(&mut self, parent: NodeId, old: NodeId, replacements: &[NodeId]) -> bool {
        for field in self.nodes[parent].fields.iter_mut() {
            if let Field::List(items) = field
                && let Some(position) = position_of(items, old)
            {
                items.splice(
                    position..position + 1,
                    replacements.iter().map(|id| Field::Node(*id)),
                );
                return true;
            }
        }
        false
    }

    /// Inserts `new` as a sibling of `anchor` inside one of `parent`'s list
    /// fields, before or after the anchor.
    pub fn insert_sibling(
        &mut self,
        parent: NodeId,
        anchor: NodeId,
        new: NodeId,
        after: bool,
    ) -> bool {
        for field in self.nodes[parent].fields.iter_mut() {
            if let Field::List(items) = field
                && let Some(position) = position_of(items, anchor)
            {
                let at = if after { position + 1 } else { position };
                items.insert(at, Field::Node(new));
                return true;
            }
        }
        false
    }

    /// Finds the parent of `target` by walking down from the root.
    pub fn parent_of(&self, target: NodeId) -> Option<NodeId> {
        let root = self.root?;
        if root == target {
            return None;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for child in self.children(id) {
                if child == target {
                    return Some(id);
                }
                stack.push(child);
            }
        }
        None
    }

    /// Pre-order iteration over all nodes reachable from the root.
    pub fn walk(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let children = self.children(id);
            stack.extend(children.into_iter().rev());
            Some(id)
        })
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

fn collect_child_nodes(field: &Field, out: &mut Vec<NodeId>) {
    match field {
        Field::Node(id) => out.push(*id),
        Field::List(items) => {
            for item in items {
                collect_child_nodes(item, out);
            }
        }
        _ => {}
    }
}

fn replace_in_field(field: &mut Field, old: NodeId, new: NodeId) -> bool {
    match field {
        Field::Node(id) if *id == old => {
            *id = new;
            true
        }
        Field::List(items) => items.iter_mut().any(|item| replace_in_field(item, old, new)),
        _ => false,
    }
}

fn position_of(items: &[Field], target: NodeId) -> Option<usize> {
    items
        .iter()
        .position(|item| matches!(item, Field::Node(id) if *id == target))
}
