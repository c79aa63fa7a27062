use std::fmt::Write;

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::{
    ast::{Field, NodeId, NodeKind, Tree},
    pipeline::{Phase, TransformContext},
    transform::{Transform, TransformError, Verdict},
};

/// Replaces repeated statement windows with calls to a single hoisted
/// helper function.
///
/// Every block is scanned in fixed-size windows. The first occurrence of a
/// window registers its structural fingerprint; a later identical window is
/// replaced with a call to a helper whose body is a deep copy of the first
/// occurrence. Fingerprints live in the run's shared state, so nothing
/// leaks between pipeline runs.
pub struct ReusedBlockDedup;

const MIN_BLOCK_SIZE: usize = 3;

const STATE_KEY: &str = "reused-block-dedup";

#[derive(Debug, Clone)]
struct KnownBlock {
    name: CompactString,
    statements: Vec<NodeId>,
    hoisted: bool,
}

type BlockIndex = FxHashMap<String, KnownBlock>;

impl Transform for ReusedBlockDedup {
    fn key(&self) -> &'static str {
        STATE_KEY
    }

    fn display_name(&self) -> &'static str {
        "Deduplicate Reused Statement Blocks"
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Post]
    }

    fn kinds(&self) -> Option<&'static [NodeKind]> {
        Some(&[NodeKind::BlockStatement])
    }

    fn test(&self, node: NodeId, ctx: &TransformContext) -> bool {
        ctx.tree
            .field(node, "body")
            .and_then(Field::as_list)
            .is_some_and(|body| body.len() >= MIN_BLOCK_SIZE)
    }

    fn transform(
        &self,
        node: NodeId,
        ctx: &mut TransformContext,
    ) -> Result<Verdict, TransformError> {
        let body: Vec<NodeId> = ctx
            .tree
            .field(node, "body")
            .and_then(Field::as_list)
            .ok_or(TransformError::MissingField("body"))?
            .iter()
            .filter_map(Field::as_node)
            .collect();

        for start in 0..=body.len().saturating_sub(MIN_BLOCK_SIZE) {
            let window = &body[start..start + MIN_BLOCK_SIZE];
            if !is_safe_window(ctx.tree, window) {
                continue;
            }
            let hash = fingerprint_window(ctx.tree, window);

            let known = ctx
                .shared
                .get::<BlockIndex>(STATE_KEY)
                .and_then(|index| index.get(&hash))
                .cloned();

            let Some(mut known) = known else {
                // First sighting; remember it and keep scanning.
                let name = ctx.fresh_ident("shared_block");
                ctx.shared
                    .get_or_insert_with(STATE_KEY, BlockIndex::default)
                    .insert(
                        hash,
                        KnownBlock {
                            name,
                            statements: window.to_vec(),
                            hoisted: false,
                        },
                    );
                continue;
            };

            if !known.hoisted {
                let copies: Vec<NodeId> = known
                    .statements
                    .iter()
                    .map(|statement| ctx.tree.clone_subtree(*statement))
                    .collect();
                let helper_body = ctx.tree.block_statement(copies);
                let helper_id = ctx.tree.identifier(known.name.clone());
                let helper = ctx
                    .tree
                    .function_declaration(helper_id, Vec::new(), helper_body);
                ctx.hoist(helper);
                known.hoisted = true;
                ctx.shared
                    .get_or_insert_with(STATE_KEY, BlockIndex::default)
                    .insert(hash, known.clone());
            }

            let callee = ctx.tree.identifier(known.name.clone());
            let call = ctx.tree.call_expression(callee, Vec::new());
            let replacement = ctx.tree.expression_statement(call);

            if let Some(Field::List(items)) = ctx.tree.field_mut(node, "body") {
                items.splice(
                    start..start + MIN_BLOCK_SIZE,
                    [Field::Node(replacement)],
                );
            }
            // One rewrite per block visit.
            break;
        }

        Ok(Verdict::Unchanged)
    }
}

/// Control-flow statements and `this`/`arguments` references pin a window
/// to its enclosing function; such windows are never shared.
fn is_safe_window(tree: &Tree, window: &[NodeId]) -> bool {
    window.iter().all(|statement| {
        !tree.kind(*statement).is_terminator() && !captures_environment(tree, *statement)
    })
}

fn captures_environment(tree: &Tree, root: NodeId) -> bool {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        match tree.kind(id) {
            NodeKind::ThisExpression => return true,
            NodeKind::Identifier
                if tree.field(id, "name").and_then(Field::as_str) == Some("arguments") =>
            {
                return true;
            }
            _ => {}
        }
        stack.extend(tree.children(id));
    }
    false
}

fn fingerprint_window(tree: &Tree, window: &[NodeId]) -> String {
    let mut out = String::new();
    for statement in window {
        fingerprint_node(tree, *statement, &mut out);
        out.push('\n');
    }
    out
}

fn fingerprint_node(tree: &Tree, id: NodeId, out: &mut String) {
    let node = &tree[id];
    let _ = write!(out, "{}(", node.kind);
    for field in &node.fields {
        fingerprint_field(tree, field, out);
        out.push(',');
    }
    out.push(')');
}

fn fingerprint_field(tree: &Tree, field: &Field, out: &mut String) {
    match field {
        Field::Node(child) => fingerprint_node(tree, *child, out),
        Field::List(items) => {
            out.push('[');
            for item in items {
                fingerprint_field(tree, item, out);
                out.push(',');
            }
            out.push(']');
        }
        Field::String(s) => {
            let _ = write!(out, "{s:?}");
        }
        Field::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Field::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Field::Null => out.push_str("null"),
        Field::Absent => out.push_str("absent"),
        Field::Template { raw, cooked } => {
            let _ = write!(out, "`{raw:?}/{cooked:?}`");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use rustc_hash::FxHashSet;

    /// Three `f(n)` call statements.
    fn call_window(tree: &mut Tree) -> Vec<NodeId> {
        (0..3)
            .map(|n| {
                let callee = tree.identifier("f");
                let argument = tree.numeric_literal(n as f64);
                let call = tree.call_expression(callee, vec![argument]);
                tree.expression_statement(call)
            })
            .collect()
    }

    #[test]
    fn test_second_occurrence_becomes_helper_call() {
        let mut tree = Tree::new();
        let first_window = call_window(&mut tree);
        let first_block = tree.block_statement(first_window);
        let second_window = call_window(&mut tree);
        let second_block = tree.block_statement(second_window);
        let program = tree.program(vec![first_block, second_block]);
        tree.file(program);

        let mut pipeline = Pipeline::new();
        pipeline.register(ReusedBlockDedup);
        let mut declared = FxHashSet::default();
        pipeline.run(&mut tree, &mut declared);

        // First block untouched.
        assert_eq!(tree.children(first_block).len(), 3);

        // Second block collapsed to a single call.
        let second_body = tree.children(second_block);
        assert_eq!(second_body.len(), 1);
        let statement = second_body[0];
        assert_eq!(tree[statement].kind, NodeKind::ExpressionStatement);
        let call = tree.child(statement, "expression").unwrap();
        assert_eq!(tree[call].kind, NodeKind::CallExpression);

        // The helper was appended to the program body.
        let top = tree.children(program);
        assert_eq!(top.len(), 3);
        let helper = top[2];
        assert_eq!(tree[helper].kind, NodeKind::FunctionDeclaration);
        assert_eq!(tree.children(tree.child(helper, "body").unwrap()).len(), 3);

        // The call and the helper share the generated name.
        let callee = tree.child(call, "callee").unwrap();
        let helper_id = tree.child(helper, "id").unwrap();
        assert_eq!(
            tree.field(callee, "name").unwrap().as_str(),
            tree.field(helper_id, "name").unwrap().as_str()
        );
        assert!(declared.contains("_shared_block"));
    }

    #[test]
    fn test_windows_with_control_flow_are_not_shared() {
        let mut tree = Tree::new();
        let mut with_return = |tree: &mut Tree| {
            let callee = tree.identifier("f");
            let call = tree.call_expression(callee, Vec::new());
            let first = tree.expression_statement(call);
            let callee = tree.identifier("g");
            let call = tree.call_expression(callee, Vec::new());
            let second = tree.expression_statement(call);
            let third = tree.return_statement(None);
            tree.block_statement(vec![first, second, third])
        };
        let first_block = with_return(&mut tree);
        let second_block = with_return(&mut tree);
        let program = tree.program(vec![first_block, second_block]);
        tree.file(program);

        let mut pipeline = Pipeline::new();
        pipeline.register(ReusedBlockDedup);
        pipeline.run(&mut tree, &mut FxHashSet::default());

        assert_eq!(tree.children(first_block).len(), 3);
        assert_eq!(tree.children(second_block).len(), 3);
        assert_eq!(tree.children(program).len(), 2);
    }

    #[test]
    fn test_state_does_not_leak_between_runs() {
        let mut pipeline = Pipeline::new();
        pipeline.register(ReusedBlockDedup);

        let mut build = || {
            let mut tree = Tree::new();
            let window = call_window(&mut tree);
            let block = tree.block_statement(window);
            let program = tree.program(vec![block]);
            tree.file(program);
            (tree, block)
        };

        // A single occurrence registers but never rewrites; a second run
        // over a fresh tree with the same shape must also stay untouched.
        let (mut first_tree, first_block) = build();
        pipeline.run(&mut first_tree, &mut FxHashSet::default());
        let (mut second_tree, second_block) = build();
        pipeline.run(&mut second_tree, &mut FxHashSet::default());

        assert_eq!(first_tree.children(first_block).len(), 3);
        assert_eq!(second_tree.children(second_block).len(), 3);
    }
}
