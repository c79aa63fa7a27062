use crate::{
    ast::{Field, NodeId, NodeKind, Tree},
    pipeline::{Phase, TransformContext},
    transform::{Transform, TransformError, Verdict},
};

/// Boolean algebra rewrites: double negation, negated literals, and
/// comparisons against boolean literals.
pub struct LogicalSimplification;

impl Transform for LogicalSimplification {
    fn key(&self) -> &'static str {
        "logical-simplification"
    }

    fn display_name(&self) -> &'static str {
        "Simplify Boolean Expressions"
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Main]
    }

    fn kinds(&self) -> Option<&'static [NodeKind]> {
        Some(&[NodeKind::UnaryExpression, NodeKind::BinaryExpression])
    }

    fn test(&self, node: NodeId, ctx: &TransformContext) -> bool {
        let operator = ctx.tree.field(node, "operator").and_then(Field::as_str);
        match ctx.tree.kind(node) {
            NodeKind::UnaryExpression => operator == Some("!"),
            NodeKind::BinaryExpression => matches!(operator, Some("===") | Some("!==")),
            _ => false,
        }
    }

    fn transform(
        &self,
        node: NodeId,
        ctx: &mut TransformContext,
    ) -> Result<Verdict, TransformError> {
        if *ctx.tree.kind(node) == NodeKind::UnaryExpression {
            let argument = ctx
                .tree
                .child(node, "argument")
                .ok_or(TransformError::MissingField("argument"))?;

            // !!x -> x
            if *ctx.tree.kind(argument) == NodeKind::UnaryExpression
                && ctx.tree.field(argument, "operator").and_then(Field::as_str) == Some("!")
            {
                let inner = ctx
                    .tree
                    .child(argument, "argument")
                    .ok_or(TransformError::MissingField("argument"))?;
                return Ok(Verdict::Replace(inner));
            }

            // !true -> false, !false -> true
            if let Some(value) = boolean_literal(ctx.tree, argument) {
                let negated = ctx.tree.boolean_literal(!value);
                return Ok(Verdict::Replace(negated));
            }

            return Ok(Verdict::Unchanged);
        }

        let operator = ctx
            .tree
            .field(node, "operator")
            .and_then(Field::as_str)
            .ok_or(TransformError::MissingField("operator"))?
            .to_owned();
        let left = ctx
            .tree
            .child(node, "left")
            .ok_or(TransformError::MissingField("left"))?;
        let right = ctx
            .tree
            .child(node, "right")
            .ok_or(TransformError::MissingField("right"))?;

        let verdict = match (
            operator.as_str(),
            boolean_literal(ctx.tree, left),
            boolean_literal(ctx.tree, right),
        ) {
            // x === true -> x, x === false -> !x
            ("===", _, Some(value)) => Some(keep_or_negate(ctx.tree, left, value)),
            // true === x -> x, false === x -> !x
            ("===", Some(value), _) => Some(keep_or_negate(ctx.tree, right, value)),
            // x !== true -> !x, x !== false -> x
            ("!==", _, Some(value)) => Some(keep_or_negate(ctx.tree, left, !value)),
            // true !== x -> !x, false !== x -> x
            ("!==", Some(value), _) => Some(keep_or_negate(ctx.tree, right, !value)),
            _ => None,
        };

        Ok(verdict.map_or(Verdict::Unchanged, Verdict::Replace))
    }
}

fn boolean_literal(tree: &Tree, node: NodeId) -> Option<bool> {
    if *tree.kind(node) == NodeKind::BooleanLiteral {
        tree.field(node, "value").and_then(Field::as_bool)
    } else {
        None
    }
}

fn keep_or_negate(tree: &mut Tree, operand: NodeId, keep: bool) -> NodeId {
    if keep {
        operand
    } else {
        tree.unary_expression("!", operand)
    }
}
