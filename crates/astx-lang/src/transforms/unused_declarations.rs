use compact_str::CompactString;
use rustc_hash::FxHashSet;

use crate::{
    ast::{Field, NodeId, NodeKind, Tree},
    pipeline::{Phase, TransformContext},
    transform::{Transform, TransformError, Verdict},
};

/// Drops top-level variable and function declarations that are never
/// referenced anywhere in the program.
///
/// A name counts as referenced when an identifier with that name appears
/// outside a binding position (declarator ids, function names, parameter
/// lists). Runs last: earlier passes may have turned the only use of a
/// binding into dead code.
pub struct UnusedDeclarations;

impl Transform for UnusedDeclarations {
    fn key(&self) -> &'static str {
        "unused-declaration-elimination"
    }

    fn display_name(&self) -> &'static str {
        "Remove Unused Variables and Functions"
    }

    fn phases(&self) -> &'static [Phase] {
        &[Phase::Post]
    }

    fn kinds(&self) -> Option<&'static [NodeKind]> {
        Some(&[NodeKind::Program])
    }

    fn test(&self, _node: NodeId, _ctx: &TransformContext) -> bool {
        true
    }

    fn transform(
        &self,
        node: NodeId,
        ctx: &mut TransformContext,
    ) -> Result<Verdict, TransformError> {
        let referenced = collect_references(ctx.tree, node);

        let body: Vec<NodeId> = ctx
            .tree
            .field(node, "body")
            .and_then(Field::as_list)
            .ok_or(TransformError::MissingField("body"))?
            .iter()
            .filter_map(Field::as_node)
            .collect();

        let mut kept: Vec<NodeId> = Vec::with_capacity(body.len());
        let mut changed = false;
        for statement in body {
            match ctx.tree.kind(statement) {
                NodeKind::FunctionDeclaration => {
                    if declared_name(ctx.tree, statement, "id")
                        .is_some_and(|name| !referenced.contains(&name))
                    {
                        changed = true;
                        continue;
                    }
                    kept.push(statement);
                }
                NodeKind::VariableDeclaration => {
                    let declarators: Vec<NodeId> = ctx.tree.children(statement);
                    let surviving: Vec<NodeId> = declarators
                        .iter()
                        .copied()
                        .filter(|declarator| {
                            declared_name(ctx.tree, *declarator, "id")
                                .is_none_or(|name| referenced.contains(&name))
                        })
                        .collect();
                    if surviving.is_empty() {
                        changed = true;
                        continue;
                    }
                    if surviving.len() < declarators.len() {
                        changed = true;
                        let items = surviving.iter().map(|id| Field::Node(*id)).collect();
                        ctx.tree
                            .set_field(statement, "declarations", Field::List(items));
                    }
                    kept.push(statement);
                }
                _ => kept.push(statement),
            }
        }

        if changed {
            let items = kept.into_iter().map(Field::Node).collect();
            ctx.tree.set_field(node, "body", Field::List(items));
        }
        Ok(Verdict::Unchanged)
    }
}

/// The plain-identifier name bound by the node's `id`-like field, if any.
fn declared_name(tree: &Tree, node: NodeId, field: &str) -> Option<CompactString> {
    let id = tree.child(node, field)?;
    if *tree.kind(id) != NodeKind::Identifier {
        return None;
    }
    tree.field(id, "name")
        .and_then(Field::as_str)
        .map(CompactString::from)
}

/// Every identifier name appearing outside a binding position.
fn collect_references(tree: &Tree, root: NodeId) -> FxHashSet<CompactString> {
    let mut referenced = FxHashSet::default();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        match tree.kind(id) {
            NodeKind::Identifier => {
                if let Some(name) = tree.field(id, "name").and_then(Field::as_str) {
                    referenced.insert(CompactString::from(name));
                }
            }
            NodeKind::VariableDeclarator => {
                push_skipping_binding(tree, id, "id", &mut stack);
            }
            NodeKind::FunctionDeclaration | NodeKind::FunctionExpression => {
                push_skipping_binding(tree, id, "id", &mut stack);
                skip_params(tree, id, &mut stack);
            }
            NodeKind::ArrowFunctionExpression | NodeKind::ClassMethod => {
                stack.extend(tree.children(id));
                skip_params(tree, id, &mut stack);
            }
            _ => stack.extend(tree.children(id)),
        }
    }
    referenced
}

/// Pushes all children except a plain-identifier binding in `field`.
fn push_skipping_binding(tree: &Tree, node: NodeId, field: &str, stack: &mut Vec<NodeId>) {
    let binding = tree
        .child(node, field)
        .filter(|id| *tree.kind(*id) == NodeKind::Identifier);
    for child in tree.children(node) {
        if Some(child) != binding {
            stack.push(child);
        }
    }
}

/// Removes plain-identifier parameters from the pending stack; patterns
/// stay, since their defaults may reference outer bindings.
fn skip_params(tree: &Tree, node: NodeId, stack: &mut Vec<NodeId>) {
    let Some(Field::List(params)) = tree.field(node, "params") else {
        return;
    };
    for param in params {
        if let Field::Node(param) = param
            && *tree.kind(*param) == NodeKind::Identifier
        {
            stack.retain(|pending| pending != param);
        }
    }
}
