//! The compiled program artifact: two dictionaries plus a flat record table.
//!
//! Records reference earlier records by index (children are emitted before
//! their parents), type tags by `TypeDict` index, and literal values by
//! `ValueDict` index. The shape is self-describing and serializes through
//! serde, so the container layer can pick any binary format.

pub mod decode;
pub mod encode;

pub use decode::decode;
pub use encode::encode;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A deduplicated literal value.
///
/// Equality is structural; two `f64` entries only dedup when they compare
/// equal, so NaN literals each get their own slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DictValue {
    String(CompactString),
    Number(f64),
    Bool(bool),
    Null,
    /// The raw/cooked text pair of a template fragment.
    Template {
        raw: CompactString,
        cooked: CompactString,
    },
}

/// One field slot of a [`Record`].
///
/// `Index` is contextual: in an identifier-name slot it is a rename id, in
/// a literal-value slot a `ValueDict` index, and everywhere else a record
/// reference. The slot's meaning comes from the schema, exactly as on the
/// encode side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Index(u32),
    String(CompactString),
    Number(f64),
    Bool(bool),
    /// A field the source tree left undefined.
    Absent,
    List(Vec<Operand>),
}

/// One encoded node: a `TypeDict` index plus schema-ordered operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub type_index: u32,
    pub operands: Vec<Operand>,
}

/// The full encoder output. The last record is the program root.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompiledProgram {
    pub type_dict: Vec<CompactString>,
    pub value_dict: Vec<DictValue>,
    pub bytecode: Vec<Record>,
}
