//! Boundary interfaces to the surrounding toolchain.
//!
//! The core neither parses source text nor executes regenerated code; it
//! trades trees with a parser, a code generator, and a script host. These
//! traits define those seams; implementations live with the embedder.

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::{ast::Tree, bytecode::CompiledProgram, error::Error};

/// Produces a tree from source text.
pub trait SourceParser {
    type Error: std::error::Error;

    fn parse(&self, source: &str) -> Result<Tree, Self::Error>;
}

/// Regenerates source text from a tree.
pub trait CodeGenerator {
    type Error: std::error::Error;

    fn generate(&self, tree: &Tree) -> Result<String, Self::Error>;
}

/// How the host executes regenerated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum RunMode {
    /// Evaluate directly in the caller's scope.
    #[default]
    #[strum(serialize = "eval")]
    Eval,
    /// Invoke as a freshly scoped callable with explicit injected bindings.
    #[strum(serialize = "scoped")]
    Scoped,
    /// Execute inside an isolated context with scoped module resolution.
    #[strum(serialize = "vm")]
    Vm,
}

/// Execution options handed to a [`ScriptHost`].
#[derive(Debug, Clone)]
pub struct RunOptions<V> {
    pub mode: RunMode,
    /// Name to value bindings made visible to the program.
    pub inject: FxHashMap<CompactString, V>,
    /// Leave out the host's standard bindings.
    pub skip_default_injects: bool,
}

impl<V> Default for RunOptions<V> {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            inject: FxHashMap::default(),
            skip_default_injects: false,
        }
    }
}

/// Executes regenerated code.
pub trait ScriptHost {
    type Value;
    type Error: std::error::Error;

    fn run(&self, code: &str, options: RunOptions<Self::Value>) -> Result<Self::Value, Self::Error>;
}

/// Regenerates and runs a compiled program on the given host.
pub fn run<G, H>(
    compiled: &CompiledProgram,
    generator: &G,
    host: &H,
    options: RunOptions<H::Value>,
) -> Result<H::Value, RunError<G::Error, H::Error>>
where
    G: CodeGenerator,
    H: ScriptHost,
{
    let tree = crate::bytecode::decode(compiled).map_err(Error::from)?;
    let code = generator.generate(&tree).map_err(RunError::Generate)?;
    host.run(&code, options).map_err(RunError::Host)
}

/// Like [`run`], but swallows host failures after logging them, returning
/// `None` instead of aborting the caller. Decode and generation failures
/// still propagate: without code there is nothing to shield.
pub fn safe_run<G, H>(
    compiled: &CompiledProgram,
    generator: &G,
    host: &H,
) -> Result<Option<H::Value>, RunError<G::Error, H::Error>>
where
    G: CodeGenerator,
    H: ScriptHost,
{
    let tree = crate::bytecode::decode(compiled).map_err(Error::from)?;
    let code = generator.generate(&tree).map_err(RunError::Generate)?;
    match host.run(&code, RunOptions::default()) {
        Ok(value) => Ok(Some(value)),
        Err(error) => {
            tracing::error!(%error, "program execution failed");
            Ok(None)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError<G: std::error::Error, H: std::error::Error> {
    #[error(transparent)]
    Decode(#[from] Error),
    #[error("code generation failed: {0}")]
    Generate(G),
    #[error("execution failed: {0}")]
    Host(H),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::bytecode::encode;
    use rustc_hash::FxHashSet;
    use std::convert::Infallible;

    /// Renders just the top-level node kinds, enough to see decode output.
    struct KindLister;

    impl CodeGenerator for KindLister {
        type Error = Infallible;

        fn generate(&self, tree: &Tree) -> Result<String, Self::Error> {
            let root = tree.root().expect("decoded trees always have a root");
            let program = tree.child(root, "program").expect("File wraps a program");
            let kinds: Vec<String> = tree
                .children(program)
                .iter()
                .map(|id| tree.kind(*id).to_string())
                .collect();
            Ok(kinds.join(";"))
        }
    }

    struct Echo;

    #[derive(Debug, thiserror::Error)]
    #[error("host refused")]
    struct Refused;

    impl ScriptHost for Echo {
        type Value = String;
        type Error = Refused;

        fn run(
            &self,
            code: &str,
            options: RunOptions<Self::Value>,
        ) -> Result<Self::Value, Self::Error> {
            if options.mode == RunMode::Vm {
                return Err(Refused);
            }
            Ok(code.to_owned())
        }
    }

    fn compiled_fixture() -> CompiledProgram {
        let mut tree = Tree::new();
        let this = tree.this_expression();
        let statement = tree.expression_statement(this);
        let program = tree.program(vec![statement]);
        tree.file(program);
        encode(&tree, &FxHashSet::default()).unwrap()
    }

    #[test]
    fn test_run_feeds_generated_code_to_the_host() {
        let compiled = compiled_fixture();
        let result = run(&compiled, &KindLister, &Echo, RunOptions::default()).unwrap();
        assert_eq!(result, NodeKind::ExpressionStatement.to_string());
    }

    #[test]
    fn test_safe_run_swallows_host_failures() {
        let compiled = compiled_fixture();
        struct AlwaysFails;
        impl ScriptHost for AlwaysFails {
            type Value = String;
            type Error = Refused;

            fn run(
                &self,
                _code: &str,
                _options: RunOptions<Self::Value>,
            ) -> Result<Self::Value, Self::Error> {
                Err(Refused)
            }
        }

        let result = safe_run(&compiled, &KindLister, &AlwaysFails).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_run_mode_names() {
        assert_eq!(RunMode::Eval.to_string(), "eval");
        assert_eq!(RunMode::Scoped.to_string(), "scoped");
        assert_eq!(RunMode::Vm.to_string(), "vm");
    }
}
