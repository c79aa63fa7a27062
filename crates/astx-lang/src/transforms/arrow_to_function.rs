use crate::{
    ast::{Field, NodeId, NodeKind},
    pipeline::{Phase, TransformContext},
    transform::{Transform, TransformError, Verdict},
};

/// Rewrites arrow functions as anonymous function expressions, wrapping
/// expression bodies in a block with a single `return`.
pub struct ArrowToFunction;

impl Transform for ArrowToFunction {
    fn key(&self) -> &'static str {
        "arrow-to-function"
    }

    fn display_name(&self) -> &'static str {
        "Arrow Function to Function Expression"
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Pre]
    }

    fn kinds(&self) -> Option<&'static [NodeKind]> {
        Some(&[NodeKind::ArrowFunctionExpression])
    }

    fn test(&self, _node: NodeId, _ctx: &TransformContext) -> bool {
        true
    }

    fn transform(
        &self,
        node: NodeId,
        ctx: &mut TransformContext,
    ) -> Result<Verdict, TransformError> {
        let params = ctx
            .tree
            .field(node, "params")
            .cloned()
            .ok_or(TransformError::MissingField("params"))?;
        let body = ctx
            .tree
            .child(node, "body")
            .ok_or(TransformError::MissingField("body"))?;

        let body = if *ctx.tree.kind(body) == NodeKind::BlockStatement {
            body
        } else {
            let ret = ctx.tree.return_statement(Some(body));
            ctx.tree.block_statement(vec![ret])
        };

        let function = ctx.tree.node(
            NodeKind::FunctionExpression,
            [Field::Null, params, Field::Node(body)],
        );
        Ok(Verdict::Replace(function))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Tree;
    use crate::pipeline::Pipeline;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_expression_body_gains_return_block() {
        let mut tree = Tree::new();
        let x = tree.identifier("x");
        let one = tree.numeric_literal(1.0);
        let body = tree.binary_expression(x, "+", one);
        let param = tree.identifier("x");
        let arrow = tree.arrow_function_expression(vec![param], body, true);
        let statement = tree.expression_statement(arrow);
        let program = tree.program(vec![statement]);
        tree.file(program);

        let mut pipeline = Pipeline::new();
        pipeline.register(ArrowToFunction);
        pipeline.run(&mut tree, &mut FxHashSet::default());

        let function = tree.child(statement, "expression").unwrap();
        assert_eq!(tree[function].kind, NodeKind::FunctionExpression);
        assert!(tree.field(function, "id").unwrap().is_null());

        let block = tree.child(function, "body").unwrap();
        assert_eq!(tree[block].kind, NodeKind::BlockStatement);
        let ret = tree.children(block)[0];
        assert_eq!(tree[ret].kind, NodeKind::ReturnStatement);
    }

    #[test]
    fn test_block_body_is_kept_as_is() {
        let mut tree = Tree::new();
        let one = tree.numeric_literal(1.0);
        let ret = tree.return_statement(Some(one));
        let block = tree.block_statement(vec![ret]);
        let arrow = tree.arrow_function_expression(Vec::new(), block, false);
        let statement = tree.expression_statement(arrow);
        let program = tree.program(vec![statement]);
        tree.file(program);

        let mut pipeline = Pipeline::new();
        pipeline.register(ArrowToFunction);
        pipeline.run(&mut tree, &mut FxHashSet::default());

        let function = tree.child(statement, "expression").unwrap();
        assert_eq!(tree.child(function, "body"), Some(block));
    }
}
