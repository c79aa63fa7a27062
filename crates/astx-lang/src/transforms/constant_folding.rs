use compact_str::CompactString;

use crate::{
    ast::{Field, NodeId, NodeKind, Tree},
    pipeline::TransformContext,
    transform::{Transform, TransformError, Verdict},
};

/// Evaluates binary expressions over two literal operands at compile time.
///
/// Folding only fires when both operands carry the same literal type;
/// mixed-type operands keep the host language's coercion rules at runtime
/// instead of approximating them here.
pub struct ConstantFolding;

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Number(f64),
    String(CompactString),
    Bool(bool),
}

impl Transform for ConstantFolding {
    fn key(&self) -> &'static str {
        "constant-folding"
    }

    fn display_name(&self) -> &'static str {
        "Constant Folding (Compile-time Evaluation of Binary Expressions)"
    }

    fn kinds(&self) -> Option<&'static [NodeKind]> {
        Some(&[NodeKind::BinaryExpression])
    }

    fn test(&self, node: NodeId, ctx: &TransformContext) -> bool {
        literal_operand(ctx.tree, node, "left").is_some()
            && literal_operand(ctx.tree, node, "right").is_some()
    }

    fn transform(
        &self,
        node: NodeId,
        ctx: &mut TransformContext,
    ) -> Result<Verdict, TransformError> {
        let left =
            literal_operand(ctx.tree, node, "left").ok_or(TransformError::MissingField("left"))?;
        let right = literal_operand(ctx.tree, node, "right")
            .ok_or(TransformError::MissingField("right"))?;
        let operator = ctx
            .tree
            .field(node, "operator")
            .and_then(Field::as_str)
            .ok_or(TransformError::MissingField("operator"))?
            .to_owned();

        let Some(folded) = evaluate(&operator, &left, &right) else {
            return Ok(Verdict::Unchanged);
        };

        let replacement = match folded {
            Literal::Number(n) => ctx.tree.numeric_literal(n),
            Literal::String(s) => ctx.tree.string_literal(s),
            Literal::Bool(b) => ctx.tree.boolean_literal(b),
        };
        Ok(Verdict::Replace(replacement))
    }
}

fn literal_operand(tree: &Tree, node: NodeId, side: &str) -> Option<Literal> {
    let operand = tree.child(node, side)?;
    match tree.kind(operand) {
        NodeKind::NumericLiteral => tree
            .field(operand, "value")
            .and_then(Field::as_number)
            .map(Literal::Number),
        NodeKind::StringLiteral => tree
            .field(operand, "value")
            .and_then(Field::as_str)
            .map(|s| Literal::String(s.into())),
        NodeKind::BooleanLiteral => tree
            .field(operand, "value")
            .and_then(Field::as_bool)
            .map(Literal::Bool),
        _ => None,
    }
}

fn evaluate(operator: &str, left: &Literal, right: &Literal) -> Option<Literal> {
    match (left, right) {
        (Literal::Number(l), Literal::Number(r)) => evaluate_numbers(operator, *l, *r),
        (Literal::String(l), Literal::String(r)) => evaluate_strings(operator, l, r),
        (Literal::Bool(l), Literal::Bool(r)) => match operator {
            "==" | "===" => Some(Literal::Bool(l == r)),
            "!=" | "!==" => Some(Literal::Bool(l != r)),
            _ => None,
        },
        _ => None,
    }
}

fn evaluate_numbers(operator: &str, l: f64, r: f64) -> Option<Literal> {
    let folded = match operator {
        "+" => Literal::Number(l + r),
        "-" => Literal::Number(l - r),
        "*" => Literal::Number(l * r),
        "/" => Literal::Number(if r != 0.0 { l / r } else { f64::NAN }),
        "%" => Literal::Number(if r != 0.0 { l % r } else { f64::NAN }),
        "**" => Literal::Number(l.powf(r)),
        "==" | "===" => Literal::Bool(l == r),
        "!=" | "!==" => Literal::Bool(l != r),
        "<" => Literal::Bool(l < r),
        "<=" => Literal::Bool(l <= r),
        ">" => Literal::Bool(l > r),
        ">=" => Literal::Bool(l >= r),
        _ => return None,
    };
    Some(folded)
}

fn evaluate_strings(operator: &str, l: &str, r: &str) -> Option<Literal> {
    let folded = match operator {
        "+" => Literal::String(CompactString::from(format!("{l}{r}"))),
        "==" | "===" => Literal::Bool(l == r),
        "!=" | "!==" => Literal::Bool(l != r),
        "<" => Literal::Bool(l < r),
        "<=" => Literal::Bool(l <= r),
        ">" => Literal::Bool(l > r),
        ">=" => Literal::Bool(l >= r),
        _ => return None,
    };
    Some(folded)
}
