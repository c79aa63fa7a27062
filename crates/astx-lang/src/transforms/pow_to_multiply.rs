use crate::{
    ast::{Field, NodeId, NodeKind, Tree},
    pipeline::{Phase, TransformContext},
    transform::{Transform, TransformError, Verdict},
};

/// Expands `Math.pow(x, n)` into repeated multiplication for small
/// integer exponents.
pub struct PowToMultiply;

/// Exponents above this expand into more code than they are worth.
const MAX_EXPONENT: f64 = 5.0;

impl Transform for PowToMultiply {
    fn key(&self) -> &'static str {
        "pow-to-multiply"
    }

    fn display_name(&self) -> &'static str {
        "Replace Math.pow(x, n) with x * x"
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Main]
    }

    fn kinds(&self) -> Option<&'static [NodeKind]> {
        Some(&[NodeKind::CallExpression])
    }

    fn test(&self, node: NodeId, ctx: &TransformContext) -> bool {
        is_math_pow(ctx.tree, node) && small_integer_exponent(ctx.tree, node).is_some()
    }

    fn transform(
        &self,
        node: NodeId,
        ctx: &mut TransformContext,
    ) -> Result<Verdict, TransformError> {
        let exponent = small_integer_exponent(ctx.tree, node)
            .ok_or(TransformError::MissingField("arguments"))?;
        let base = call_argument(ctx.tree, node, 0)
            .ok_or(TransformError::MissingField("arguments"))?;

        let mut product = base;
        for _ in 1..exponent {
            let copy = ctx.tree.clone_subtree(base);
            product = ctx.tree.binary_expression(product, "*", copy);
        }
        Ok(Verdict::Replace(product))
    }
}

fn is_math_pow(tree: &Tree, node: NodeId) -> bool {
    let Some(callee) = tree.child(node, "callee") else {
        return false;
    };
    *tree.kind(callee) == NodeKind::MemberExpression
        && identifier_named(tree, tree.child(callee, "object"), "Math")
        && identifier_named(tree, tree.child(callee, "property"), "pow")
}

fn identifier_named(tree: &Tree, node: Option<NodeId>, name: &str) -> bool {
    node.is_some_and(|id| {
        *tree.kind(id) == NodeKind::Identifier
            && tree.field(id, "name").and_then(Field::as_str) == Some(name)
    })
}

fn small_integer_exponent(tree: &Tree, node: NodeId) -> Option<u32> {
    let arguments = tree.field(node, "arguments").and_then(Field::as_list)?;
    if arguments.len() != 2 {
        return None;
    }
    let exponent = arguments[1].as_node()?;
    if *tree.kind(exponent) != NodeKind::NumericLiteral {
        return None;
    }
    let value = tree.field(exponent, "value").and_then(Field::as_number)?;
    (value.fract() == 0.0 && (2.0..=MAX_EXPONENT).contains(&value)).then_some(value as u32)
}

fn call_argument(tree: &Tree, node: NodeId, index: usize) -> Option<NodeId> {
    tree.field(node, "arguments")
        .and_then(Field::as_list)?
        .get(index)?
        .as_node()
}
