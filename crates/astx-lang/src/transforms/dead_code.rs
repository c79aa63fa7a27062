use crate::{
    ast::{Field, NodeId, NodeKind, Tree},
    pipeline::{Phase, TransformContext},
    transform::{Transform, TransformError, Verdict},
};

/// Removes unreachable code: statements after a terminator inside a block,
/// and branches of `if` statements with a constant boolean test.
pub struct DeadCode;

impl Transform for DeadCode {
    fn key(&self) -> &'static str {
        "dead-code-elimination"
    }

    fn display_name(&self) -> &'static str {
        "Dead Code Elimination"
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Post]
    }

    fn kinds(&self) -> Option<&'static [NodeKind]> {
        Some(&[NodeKind::BlockStatement, NodeKind::IfStatement])
    }

    fn test(&self, _node: NodeId, _ctx: &TransformContext) -> bool {
        true
    }

    fn transform(
        &self,
        node: NodeId,
        ctx: &mut TransformContext,
    ) -> Result<Verdict, TransformError> {
        match ctx.tree.kind(node) {
            NodeKind::BlockStatement => {
                truncate_after_terminator(ctx.tree, node)?;
                Ok(Verdict::Unchanged)
            }
            NodeKind::IfStatement => Ok(fold_constant_if(ctx.tree, node)),
            _ => Ok(Verdict::Unchanged),
        }
    }
}

/// Cuts a block's body after its first return/throw/break/continue.
fn truncate_after_terminator(tree: &mut Tree, block: NodeId) -> Result<(), TransformError> {
    let body = tree
        .field(block, "body")
        .and_then(Field::as_list)
        .ok_or(TransformError::MissingField("body"))?;
    let terminator = body.iter().position(|statement| {
        statement
            .as_node()
            .is_some_and(|id| tree.kind(id).is_terminator())
    });
    if let Some(index) = terminator
        && index + 1 < body.len()
        && let Some(Field::List(items)) = tree.field_mut(block, "body")
    {
        items.truncate(index + 1);
    }
    Ok(())
}

/// `if (true) a else b` -> `a`; `if (false) a else b` -> `b`; an `if
/// (false)` without an alternate disappears entirely.
fn fold_constant_if(tree: &Tree, node: NodeId) -> Verdict {
    let Some(test) = tree.child(node, "test") else {
        return Verdict::Unchanged;
    };
    if *tree.kind(test) != NodeKind::BooleanLiteral {
        return Verdict::Unchanged;
    }
    let value = tree.field(test, "value").and_then(Field::as_bool);
    match value {
        Some(true) => match tree.child(node, "consequent") {
            Some(consequent) => Verdict::Replace(consequent),
            None => Verdict::Remove,
        },
        Some(false) => match tree.child(node, "alternate") {
            Some(alternate) => Verdict::Replace(alternate),
            None => Verdict::Remove,
        },
        None => Verdict::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use rustc_hash::FxHashSet;

    fn run(tree: &mut Tree) {
        let mut pipeline = Pipeline::new();
        pipeline.register(DeadCode);
        pipeline.run(tree, &mut FxHashSet::default());
    }

    #[test]
    fn test_statements_after_return_are_removed() {
        // { return 1; console.log(2); }
        let mut tree = Tree::new();
        let one = tree.numeric_literal(1.0);
        let ret = tree.return_statement(Some(one));
        let console = tree.identifier("console");
        let log = tree.identifier("log");
        let callee = tree.member_expression(console, log, false);
        let two = tree.numeric_literal(2.0);
        let call = tree.call_expression(callee, vec![two]);
        let unreachable = tree.expression_statement(call);
        let block = tree.block_statement(vec![ret, unreachable]);
        let program = tree.program(vec![block]);
        tree.file(program);

        run(&mut tree);

        assert_eq!(tree.children(block), vec![ret]);
    }

    #[test]
    fn test_block_without_terminator_is_untouched() {
        let mut tree = Tree::new();
        let one = tree.numeric_literal(1.0);
        let first = tree.expression_statement(one);
        let two = tree.numeric_literal(2.0);
        let second = tree.expression_statement(two);
        let block = tree.block_statement(vec![first, second]);
        let program = tree.program(vec![block]);
        tree.file(program);

        run(&mut tree);

        assert_eq!(tree.children(block).len(), 2);
    }

    #[test]
    fn test_if_true_keeps_consequent() {
        let mut tree = Tree::new();
        let test = tree.boolean_literal(true);
        let one = tree.numeric_literal(1.0);
        let statement = tree.expression_statement(one);
        let consequent = tree.block_statement(vec![statement]);
        let two = tree.numeric_literal(2.0);
        let other = tree.expression_statement(two);
        let alternate = tree.block_statement(vec![other]);
        let if_statement = tree.if_statement(test, consequent, Some(alternate));
        let program = tree.program(vec![if_statement]);
        tree.file(program);

        run(&mut tree);

        assert_eq!(tree.children(program), vec![consequent]);
    }

    #[test]
    fn test_if_false_keeps_alternate() {
        let mut tree = Tree::new();
        let test = tree.boolean_literal(false);
        let one = tree.numeric_literal(1.0);
        let statement = tree.expression_statement(one);
        let consequent = tree.block_statement(vec![statement]);
        let two = tree.numeric_literal(2.0);
        let other = tree.expression_statement(two);
        let alternate = tree.block_statement(vec![other]);
        let if_statement = tree.if_statement(test, consequent, Some(alternate));
        let program = tree.program(vec![if_statement]);
        tree.file(program);

        run(&mut tree);

        assert_eq!(tree.children(program), vec![alternate]);
    }

    #[test]
    fn test_if_false_without_alternate_is_removed() {
        let mut tree = Tree::new();
        let test = tree.boolean_literal(false);
        let one = tree.numeric_literal(1.0);
        let statement = tree.expression_statement(one);
        let consequent = tree.block_statement(vec![statement]);
        let if_statement = tree.if_statement(test, consequent, None);
        let program = tree.program(vec![if_statement]);
        tree.file(program);

        run(&mut tree);

        assert!(tree.children(program).is_empty());
    }

    #[test]
    fn test_non_constant_test_is_untouched() {
        let mut tree = Tree::new();
        let test = tree.identifier("flag");
        let one = tree.numeric_literal(1.0);
        let statement = tree.expression_statement(one);
        let consequent = tree.block_statement(vec![statement]);
        let if_statement = tree.if_statement(test, consequent, None);
        let program = tree.program(vec![if_statement]);
        tree.file(program);

        run(&mut tree);

        assert_eq!(tree.children(program), vec![if_statement]);
    }
}
