//! `astx-lang` optimizes JavaScript-style syntax trees and compiles them
//! to a compact, dictionary-compressed bytecode container.
//!
//! ## Examples
//!
//! ```
//! use astx_lang::{Engine, NodeKind, Tree};
//!
//! // let x = 1 + 2; x;
//! let mut tree = Tree::new();
//! let x = tree.identifier("x");
//! let one = tree.numeric_literal(1.0);
//! let two = tree.numeric_literal(2.0);
//! let sum = tree.binary_expression(one, "+", two);
//! let declarator = tree.variable_declarator(x, Some(sum));
//! let declaration = tree.variable_declaration("let", vec![declarator]);
//! let x_use = tree.identifier("x");
//! let statement = tree.expression_statement(x_use);
//! let program = tree.program(vec![declaration, statement]);
//! tree.file(program);
//!
//! let engine = Engine::default();
//! let bytes = engine.compile_to_bytes(&mut tree).unwrap();
//! assert_eq!(&bytes[..4], b"ASTX");
//!
//! let decoded = engine.load(&bytes).unwrap();
//! let root = decoded.root().unwrap();
//! assert_eq!(*decoded.kind(root), NodeKind::File);
//! ```

mod arena;
mod ast;
mod bytecode;
mod container;
mod engine;
mod error;
mod host;
mod names;
mod pipeline;
mod schema;
mod transform;
mod transforms;

pub use arena::{Arena, ArenaId};
pub use ast::{Field, Fields, Node, NodeId, NodeKind, Tree};
pub use bytecode::{CompiledProgram, DictValue, Operand, Record};
pub use container::{FORMAT_VERSION, MAGIC};
pub use engine::{Engine, Options};
pub use error::{ContainerError, DecodeError, EncodeError, Error};
pub use host::{CodeGenerator, RunError, RunMode, RunOptions, ScriptHost, SourceParser};
pub use names::short_name;
pub use pipeline::{Phase, Pipeline, SharedState, TransformContext};
pub use transform::{Transform, TransformError, Verdict};
pub use transforms::{
    ArrowToFunction, ConstantFolding, DeadCode, HoistArrayLength, LogicalSimplification,
    PowToMultiply, ReusedBlockDedup, UnusedDeclarations,
};

pub use host::{run, safe_run};

/// Optimizes and encodes a tree with the default engine.
pub fn compile(tree: &mut Tree) -> Result<CompiledProgram, Error> {
    Engine::default().compile(tree)
}

/// Optimizes and encodes a tree straight into container bytes.
pub fn compile_to_bytes(tree: &mut Tree) -> Result<Vec<u8>, Error> {
    Engine::default().compile_to_bytes(tree)
}

/// Rebuilds a tree from container bytes.
pub fn load(bytes: &[u8]) -> Result<Tree, Error> {
    Engine::default().load(bytes)
}
