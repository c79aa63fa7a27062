use crate::{
    ast::{Field, NodeId, NodeKind, Tree},
    pipeline::{Phase, TransformContext},
    transform::{Transform, TransformError, Verdict},
};

/// Hoists an `arr.length` loop bound into a `const` binding declared just
/// before the loop, so the length is read once instead of per iteration.
pub struct HoistArrayLength;

impl Transform for HoistArrayLength {
    fn key(&self) -> &'static str {
        "hoist-array-length"
    }

    fn display_name(&self) -> &'static str {
        "Hoist array.length out of loop"
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Main, Phase::Post]
    }

    fn kinds(&self) -> Option<&'static [NodeKind]> {
        Some(&[NodeKind::ForStatement])
    }

    fn test(&self, node: NodeId, ctx: &TransformContext) -> bool {
        length_bound(ctx.tree, node).is_some()
    }

    fn transform(
        &self,
        node: NodeId,
        ctx: &mut TransformContext,
    ) -> Result<Verdict, TransformError> {
        let Some((test, member, array_name)) = length_bound(ctx.tree, node) else {
            return Ok(Verdict::Unchanged);
        };

        let fresh = ctx.fresh_ident(&format!("{array_name}_len"));
        let hoisted_id = ctx.tree.identifier(fresh.clone());

        // const arr_len = arr.length; reuses the member expression the loop
        // test is about to give up.
        let declarator = ctx.tree.variable_declarator(hoisted_id, Some(member));
        let declaration = ctx.tree.variable_declaration("const", vec![declarator]);

        if !ctx.insert_before(node, declaration) {
            // The loop does not sit in a statement list; nothing to hoist to.
            return Ok(Verdict::Unchanged);
        }

        let bound = ctx.tree.identifier(fresh);
        ctx.tree.set_field(test, "right", Field::Node(bound));
        Ok(Verdict::Unchanged)
    }
}

/// Matches `for (...; i < arr.length; ...)` and returns the test node, the
/// member expression, and the array's name.
fn length_bound(tree: &Tree, node: NodeId) -> Option<(NodeId, NodeId, String)> {
    let test = tree.child(node, "test")?;
    if *tree.kind(test) != NodeKind::BinaryExpression
        || tree.field(test, "operator").and_then(Field::as_str) != Some("<")
    {
        return None;
    }
    let member = tree.child(test, "right")?;
    if *tree.kind(member) != NodeKind::MemberExpression {
        return None;
    }
    let property = tree.child(member, "property")?;
    if *tree.kind(property) != NodeKind::Identifier
        || tree.field(property, "name").and_then(Field::as_str) != Some("length")
    {
        return None;
    }
    let object = tree.child(member, "object")?;
    if *tree.kind(object) != NodeKind::Identifier {
        return None;
    }
    let name = tree.field(object, "name").and_then(Field::as_str)?;
    Some((test, member, name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use rustc_hash::FxHashSet;

    fn counting_loop(tree: &mut Tree) -> NodeId {
        // for (let i = 0; i < arr.length; i++) {}
        let i = tree.identifier("i");
        let zero = tree.numeric_literal(0.0);
        let declarator = tree.variable_declarator(i, Some(zero));
        let init = tree.variable_declaration("let", vec![declarator]);

        let i_test = tree.identifier("i");
        let arr = tree.identifier("arr");
        let length = tree.identifier("length");
        let member = tree.member_expression(arr, length, false);
        let test = tree.binary_expression(i_test, "<", member);

        let i_update = tree.identifier("i");
        let update = tree.node(
            NodeKind::UpdateExpression,
            [
                Field::String("++".into()),
                Field::Node(i_update),
                Field::Bool(false),
            ],
        );
        let body = tree.block_statement(Vec::new());
        tree.for_statement(Some(init), Some(test), Some(update), body)
    }

    #[test]
    fn test_length_bound_is_hoisted_before_loop() {
        let mut tree = Tree::new();
        let loop_statement = counting_loop(&mut tree);
        let program = tree.program(vec![loop_statement]);
        tree.file(program);

        let mut pipeline = Pipeline::new();
        pipeline.register(HoistArrayLength);
        let mut declared = FxHashSet::default();
        declared.insert("i".into());
        declared.insert("arr".into());
        pipeline.run(&mut tree, &mut declared);

        let body = tree.children(program);
        assert_eq!(body.len(), 2);
        let declaration = body[0];
        assert_eq!(tree[declaration].kind, NodeKind::VariableDeclaration);
        assert_eq!(tree.field(declaration, "kind").unwrap().as_str(), Some("const"));
        assert_eq!(body[1], loop_statement);

        // The declarator init is the old member expression.
        let declarator = tree.children(declaration)[0];
        let init = tree.child(declarator, "init").unwrap();
        assert_eq!(tree[init].kind, NodeKind::MemberExpression);

        // The loop test now compares against the fresh binding.
        let test = tree.child(loop_statement, "test").unwrap();
        let bound = tree.child(test, "right").unwrap();
        assert_eq!(tree[bound].kind, NodeKind::Identifier);
        let name = tree.field(bound, "name").unwrap().as_str().unwrap().to_owned();
        assert!(name.starts_with("_arr_len"));
        assert!(declared.contains(name.as_str()));
    }

    #[test]
    fn test_other_loop_bounds_are_ignored() {
        let mut tree = Tree::new();
        let i = tree.identifier("i");
        let ten = tree.numeric_literal(10.0);
        let test = tree.binary_expression(i, "<", ten);
        let body = tree.block_statement(Vec::new());
        let loop_statement = tree.for_statement(None, Some(test), None, body);
        let program = tree.program(vec![loop_statement]);
        tree.file(program);

        let mut pipeline = Pipeline::new();
        pipeline.register(HoistArrayLength);
        pipeline.run(&mut tree, &mut FxHashSet::default());

        assert_eq!(tree.children(program).len(), 1);
    }
}
