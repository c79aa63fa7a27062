//! The built-in rewrite passes.
//!
//! Order matters: [`crate::pipeline::Pipeline::with_defaults`] registers
//! these in the fixed order documented there.

mod arrow_to_function;
mod constant_folding;
mod dead_code;
mod hoist_array_length;
mod logical_simplification;
mod pow_to_multiply;
mod reused_block_dedup;
mod unused_declarations;

pub use arrow_to_function::ArrowToFunction;
pub use constant_folding::ConstantFolding;
pub use dead_code::DeadCode;
pub use hoist_array_length::HoistArrayLength;
pub use logical_simplification::LogicalSimplification;
pub use pow_to_multiply::PowToMultiply;
pub use reused_block_dedup::ReusedBlockDedup;
pub use unused_declarations::UnusedDeclarations;
