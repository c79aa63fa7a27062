use compact_str::CompactString;
use rustc_hash::FxHashSet;

use crate::{
    ast::Tree,
    bytecode::{self, CompiledProgram},
    container,
    error::Error,
    names,
    pipeline::Pipeline,
};

#[derive(Debug, Clone)]
pub struct Options {
    pub optimize: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// The compile/load facade tying the pipeline and the codec together.
pub struct Engine {
    pipeline: Pipeline,
    pub(crate) options: Options,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            pipeline: Pipeline::with_defaults(),
            options: Options::default(),
        }
    }
}

impl Engine {
    /// An engine running a custom pass roster instead of the default one.
    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            options: Options::default(),
        }
    }

    pub fn set_optimize(&mut self, optimize: bool) {
        self.options.optimize = optimize;
    }

    /// Optimizes the tree (unless disabled) and encodes it.
    ///
    /// Returns the compiled program together with the declared-bindings
    /// set as it stood after the pipeline ran.
    pub fn compile(&self, tree: &mut Tree) -> Result<CompiledProgram, Error> {
        let mut declared = names::collect_declared(tree);
        if self.options.optimize {
            self.pipeline.run(tree, &mut declared);
        }
        tracing::debug!(
            nodes = tree.len(),
            declared = declared.len(),
            optimized = self.options.optimize,
            "encoding tree"
        );
        let compiled = bytecode::encode(tree, &declared)?;
        Ok(compiled)
    }

    /// [`Engine::compile`] straight through to container bytes.
    pub fn compile_to_bytes(&self, tree: &mut Tree) -> Result<Vec<u8>, Error> {
        let compiled = self.compile(tree)?;
        Ok(container::pack(&compiled)?)
    }

    /// Unwraps container bytes without decoding the tree.
    pub fn load_program(&self, bytes: &[u8]) -> Result<CompiledProgram, Error> {
        Ok(container::unpack(bytes)?)
    }

    /// Decodes a compiled program into a tree rooted at a `File` wrapper.
    pub fn decode(&self, compiled: &CompiledProgram) -> Result<Tree, Error> {
        Ok(bytecode::decode(compiled)?)
    }

    /// Container bytes all the way back to a tree.
    pub fn load(&self, bytes: &[u8]) -> Result<Tree, Error> {
        let compiled = self.load_program(bytes)?;
        self.decode(&compiled)
    }

    /// Runs only the pipeline, leaving the tree in source form.
    pub fn optimize(&self, tree: &mut Tree) -> FxHashSet<CompactString> {
        let mut declared = names::collect_declared(tree);
        self.pipeline.run(tree, &mut declared);
        declared
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn folding_candidate() -> (Tree, crate::ast::NodeId) {
        // let x = 1 + 2; x;
        let mut tree = Tree::new();
        let x = tree.identifier("x");
        let one = tree.numeric_literal(1.0);
        let two = tree.numeric_literal(2.0);
        let sum = tree.binary_expression(one, "+", two);
        let declarator = tree.variable_declarator(x, Some(sum));
        let declaration = tree.variable_declaration("let", vec![declarator]);
        let x_use = tree.identifier("x");
        let statement = tree.expression_statement(x_use);
        let program = tree.program(vec![declaration, statement]);
        tree.file(program);
        (tree, declarator)
    }

    #[test]
    fn test_compile_with_optimization_folds_constants() {
        let (mut tree, declarator) = folding_candidate();
        let engine = Engine::default();
        let compiled = engine.compile(&mut tree).unwrap();

        let init = tree.child(declarator, "init").unwrap();
        assert_eq!(tree[init].kind, NodeKind::NumericLiteral);
        assert_eq!(tree.field(init, "value").unwrap().as_number(), Some(3.0));

        use crate::bytecode::DictValue;
        assert!(compiled.value_dict.contains(&DictValue::Number(3.0)));
        assert!(!compiled.value_dict.contains(&DictValue::Number(1.0)));
        assert!(!compiled.value_dict.contains(&DictValue::Number(2.0)));
    }

    #[test]
    fn test_compile_without_optimization_keeps_tree() {
        let (mut tree, declarator) = folding_candidate();
        let mut engine = Engine::default();
        engine.set_optimize(false);
        engine.compile(&mut tree).unwrap();

        let init = tree.child(declarator, "init").unwrap();
        assert_eq!(tree[init].kind, NodeKind::BinaryExpression);
    }

    #[test]
    fn test_compile_load_round_trip_through_container() {
        let (mut tree, _) = folding_candidate();
        let engine = Engine::default();
        let bytes = engine.compile_to_bytes(&mut tree).unwrap();
        let decoded = engine.load(&bytes).unwrap();

        let root = decoded.root().unwrap();
        assert_eq!(*decoded.kind(root), NodeKind::File);
        let program = decoded.child(root, "program").unwrap();
        assert_eq!(*decoded.kind(program), NodeKind::Program);
    }
}
