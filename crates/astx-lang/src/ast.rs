pub mod builder;
pub mod node;
pub mod tree;

pub use node::{Field, Fields, Node, NodeId, NodeKind};
pub use tree::Tree;
