//! The rewrite pass interface.
//!
//! A pass inspects one node at a time and answers with a [`Verdict`]. The
//! pipeline owns the traversal; passes only decide what happens to the node
//! they were handed.

use crate::{
    ast::{NodeId, NodeKind},
    pipeline::{Phase, TransformContext},
};

/// Outcome of applying a pass to one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The node stands; later passes in the chain still run on it.
    Unchanged,
    /// The node was replaced; the chain restarts on the replacement.
    Replace(NodeId),
    /// The node was expanded into an ordered run of siblings. Only valid
    /// when the node sits in a list slot of its parent.
    Many(Vec<NodeId>),
    /// The node is deleted along with its subtree.
    Remove,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransformError {
    #[error("transform error: {0}")]
    Internal(String),
    #[error("node is missing required field \"{0}\"")]
    MissingField(&'static str),
}

/// One rewrite pass.
///
/// `test` is a cheap filter; `transform` performs the rewrite. A pass that
/// mutates the tree in place (rather than substituting the node) returns
/// [`Verdict::Unchanged`] so the chain continues on the same node.
pub trait Transform {
    /// Stable identifier, also the key for the pass's shared-state slot.
    fn key(&self) -> &'static str;

    fn display_name(&self) -> &'static str {
        self.key()
    }

    /// Phases in which this pass runs.
    fn phases(&self) -> &'static [Phase] {
        &Phase::ALL
    }

    /// Node tags this pass applies to; `None` means every tag.
    fn kinds(&self) -> Option<&'static [NodeKind]> {
        None
    }

    fn test(&self, node: NodeId, ctx: &TransformContext) -> bool;

    fn transform(&self, node: NodeId, ctx: &mut TransformContext)
    -> Result<Verdict, TransformError>;
}
