//! The phased rewrite pipeline.
//!
//! A run executes the fixed phase order `pre -> main -> post`. Within a
//! phase the tree is walked in pre-order; registered passes are tried on
//! each node in registration order, and their verdicts are applied to the
//! tree before traversal continues, so a replacement subtree is visited in
//! the same phase and a removed subtree is never entered.

pub mod context;

pub use context::{SharedState, TransformContext};

use compact_str::CompactString;
use rustc_hash::FxHashSet;

use crate::{
    ast::{Field, NodeId, NodeKind, Tree},
    transform::{Transform, Verdict},
    transforms,
};

/// Upper bound on replacement chaining at a single position. A pass pair
/// that keeps substituting each other's output is a bug in the passes;
/// the walk gives up on the position instead of looping.
const MAX_REENTRY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Phase {
    #[strum(serialize = "pre")]
    Pre,
    #[strum(serialize = "main")]
    Main,
    #[strum(serialize = "post")]
    Post,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Pre, Phase::Main, Phase::Post];
}

/// An ordered collection of rewrite passes.
///
/// Registration order is part of the contract: passes are tried on each
/// node in the order they were registered.
#[derive(Default)]
pub struct Pipeline {
    transforms: Vec<Box<dyn Transform>>,
}

enum Step {
    /// Node survived its pass chain; descend into its children.
    Descend(NodeId),
    /// Node was deleted; skip its subtree.
    Removed,
    /// Node was expanded into siblings; visit each in order.
    Spliced(Vec<NodeId>),
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default pass roster in its fixed registration order.
    pub fn with_defaults() -> Self {
        let mut pipeline = Self::new();
        pipeline
            .register(transforms::ArrowToFunction)
            .register(transforms::ConstantFolding)
            .register(transforms::LogicalSimplification)
            .register(transforms::PowToMultiply)
            .register(transforms::HoistArrayLength)
            .register(transforms::DeadCode)
            .register(transforms::ReusedBlockDedup)
            .register(transforms::UnusedDeclarations);
        pipeline
    }

    pub fn register(&mut self, transform: impl Transform + 'static) -> &mut Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Runs all phases over the tree.
    ///
    /// `declared` is the set of binding names collected before the run;
    /// passes may add fresh names to it. Scratch state and the hoist queue
    /// live exactly as long as this call.
    pub fn run(&self, tree: &mut Tree, declared: &mut FxHashSet<CompactString>) {
        let mut shared = SharedState::new();
        for phase in Phase::ALL {
            let mut hoisted = Vec::new();
            self.run_phase(tree, phase, declared, &mut shared, &mut hoisted);
            append_to_program_body(tree, hoisted);
        }
    }

    fn run_phase(
        &self,
        tree: &mut Tree,
        phase: Phase,
        declared: &mut FxHashSet<CompactString>,
        shared: &mut SharedState,
        hoisted: &mut Vec<NodeId>,
    ) {
        let Some(root) = tree.root() else {
            return;
        };
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(root, None)];
        while let Some((node, parent)) = stack.pop() {
            match self.apply_at(tree, node, parent, phase, declared, shared, hoisted) {
                Step::Removed => {}
                Step::Descend(current) => {
                    let children = tree.children(current);
                    for child in children.into_iter().rev() {
                        stack.push((child, Some(current)));
                    }
                }
                Step::Spliced(siblings) => {
                    for sibling in siblings.into_iter().rev() {
                        stack.push((sibling, parent));
                    }
                }
            }
        }
    }

    /// Tries every registered pass on one node and applies the verdicts.
    #[allow(clippy::too_many_arguments)]
    fn apply_at(
        &self,
        tree: &mut Tree,
        node: NodeId,
        parent: Option<NodeId>,
        phase: Phase,
        declared: &mut FxHashSet<CompactString>,
        shared: &mut SharedState,
        hoisted: &mut Vec<NodeId>,
    ) -> Step {
        let mut current = node;
        let mut reentries = 0;
        let mut index = 0;
        while index < self.transforms.len() {
            let transform = &self.transforms[index];
            index += 1;

            if !transform.phases().contains(&phase) {
                continue;
            }
            if let Some(kinds) = transform.kinds()
                && !kinds.contains(tree.kind(current))
            {
                continue;
            }
            let ctx = TransformContext::new(tree, phase, parent, declared, shared, hoisted);
            if !transform.test(current, &ctx) {
                continue;
            }

            let mut ctx = TransformContext::new(tree, phase, parent, declared, shared, hoisted);
            let verdict = match transform.transform(current, &mut ctx) {
                Ok(verdict) => verdict,
                Err(error) => {
                    tracing::warn!(
                        phase = %phase,
                        pass = transform.display_name(),
                        kind = %tree.kind(current),
                        %error,
                        "transform failed; node left unchanged"
                    );
                    continue;
                }
            };

            match verdict {
                Verdict::Unchanged => {}
                Verdict::Remove => {
                    match parent {
                        Some(parent) => {
                            tree.remove_child(parent, current);
                        }
                        None => tree.clear_root(),
                    }
                    return Step::Removed;
                }
                Verdict::Replace(new) => {
                    match parent {
                        Some(parent) => {
                            tree.replace_child(parent, current, new);
                        }
                        None => tree.set_root(new),
                    }
                    current = new;
                    reentries += 1;
                    if reentries >= MAX_REENTRY {
                        tracing::warn!(
                            phase = %phase,
                            pass = transform.display_name(),
                            "replacement chain exceeded re-entry budget; moving on"
                        );
                        break;
                    }
                    // The replacement is a different node; restart the chain
                    // so earlier passes get a look at it too.
                    index = 0;
                }
                Verdict::Many(siblings) => match parent {
                    Some(parent) if tree.splice_child(parent, current, &siblings) => {
                        return Step::Spliced(siblings);
                    }
                    _ => {
                        tracing::warn!(
                            phase = %phase,
                            pass = transform.display_name(),
                            "many-verdict outside a list slot; node left unchanged"
                        );
                    }
                },
            }
        }
        Step::Descend(current)
    }
}

/// Appends hoisted declarations to the end of the program body.
fn append_to_program_body(tree: &mut Tree, hoisted: Vec<NodeId>) {
    if hoisted.is_empty() {
        return;
    }
    let Some(root) = tree.root() else {
        return;
    };
    let program = match tree.kind(root) {
        NodeKind::File => match tree.child(root, "program") {
            Some(program) => program,
            None => return,
        },
        NodeKind::Program => root,
        _ => return,
    };
    if let Some(Field::List(body)) = tree.field_mut(program, "body") {
        body.extend(hoisted.into_iter().map(Field::Node));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{TransformError, Verdict};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct PhaseRecorder {
        seen: Rc<RefCell<Vec<Phase>>>,
    }

    impl Transform for PhaseRecorder {
        fn key(&self) -> &'static str {
            "phase-recorder"
        }

        fn phases(&self) -> &'static [Phase] {
            &[Phase::Main]
        }

        fn kinds(&self) -> Option<&'static [NodeKind]> {
            Some(&[NodeKind::Program])
        }

        fn test(&self, _node: NodeId, _ctx: &TransformContext) -> bool {
            true
        }

        fn transform(
            &self,
            _node: NodeId,
            ctx: &mut TransformContext,
        ) -> Result<Verdict, TransformError> {
            self.seen.borrow_mut().push(ctx.phase);
            Ok(Verdict::Unchanged)
        }
    }

    struct RemoveLiterals;

    impl Transform for RemoveLiterals {
        fn key(&self) -> &'static str {
            "remove-literals"
        }

        fn kinds(&self) -> Option<&'static [NodeKind]> {
            Some(&[NodeKind::ExpressionStatement])
        }

        fn test(&self, node: NodeId, ctx: &TransformContext) -> bool {
            ctx.tree
                .child(node, "expression")
                .is_some_and(|e| ctx.tree.kind(e).has_literal_value())
        }

        fn transform(
            &self,
            _node: NodeId,
            _ctx: &mut TransformContext,
        ) -> Result<Verdict, TransformError> {
            Ok(Verdict::Remove)
        }
    }

    struct AfterRemoval {
        fired: Rc<RefCell<bool>>,
    }

    impl Transform for AfterRemoval {
        fn key(&self) -> &'static str {
            "after-removal"
        }

        fn kinds(&self) -> Option<&'static [NodeKind]> {
            Some(&[NodeKind::ExpressionStatement])
        }

        fn test(&self, _node: NodeId, _ctx: &TransformContext) -> bool {
            true
        }

        fn transform(
            &self,
            _node: NodeId,
            _ctx: &mut TransformContext,
        ) -> Result<Verdict, TransformError> {
            *self.fired.borrow_mut() = true;
            Ok(Verdict::Unchanged)
        }
    }

    struct Failing;

    impl Transform for Failing {
        fn key(&self) -> &'static str {
            "failing"
        }

        fn test(&self, _node: NodeId, _ctx: &TransformContext) -> bool {
            true
        }

        fn transform(
            &self,
            _node: NodeId,
            _ctx: &mut TransformContext,
        ) -> Result<Verdict, TransformError> {
            Err(TransformError::Internal("boom".into()))
        }
    }

    fn literal_statement_program(tree: &mut Tree) -> NodeId {
        let one = tree.numeric_literal(1.0);
        let statement = tree.expression_statement(one);
        let program = tree.program(vec![statement]);
        tree.file(program);
        program
    }

    #[test]
    fn test_phase_filter_restricts_invocations() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.register(PhaseRecorder { seen: seen.clone() });

        let mut tree = Tree::new();
        literal_statement_program(&mut tree);
        let mut declared = FxHashSet::default();
        pipeline.run(&mut tree, &mut declared);

        assert_eq!(*seen.borrow(), vec![Phase::Main]);
    }

    #[test]
    fn test_removal_short_circuits_later_passes() {
        let fired = Rc::new(RefCell::new(false));
        let mut pipeline = Pipeline::new();
        pipeline
            .register(RemoveLiterals)
            .register(AfterRemoval { fired: fired.clone() });

        let mut tree = Tree::new();
        let program = literal_statement_program(&mut tree);
        let mut declared = FxHashSet::default();
        pipeline.run(&mut tree, &mut declared);

        assert!(tree.children(program).is_empty());
        assert!(!*fired.borrow());
    }

    #[test]
    fn test_failing_pass_is_isolated() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline
            .register(Failing)
            .register(PhaseRecorder { seen: seen.clone() });

        let mut tree = Tree::new();
        literal_statement_program(&mut tree);
        let mut declared = FxHashSet::default();
        pipeline.run(&mut tree, &mut declared);

        // The run completed and the later pass still fired.
        assert_eq!(seen.borrow().len(), 1);
    }
}
