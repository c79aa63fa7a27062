//! The schema registry: a static, total mapping from node type tags to
//! their ordered lists of semantically relevant field names.
//!
//! Both the encoder and the decoder iterate these lists in order, so the
//! registry is the single source of truth for record layout. Two tags are
//! handled before generic field iteration and deviate from the plain-list
//! shape: `null` (no fields, canonical absence record) and `TemplateElement`
//! (value-dictionary index plus a trailing tail flag).

use crate::ast::NodeKind;

pub type FieldName = &'static str;

/// Returns the ordered field names for `kind`, or `None` when the tag is
/// outside the supported subset. A `None` during encoding means the input
/// tree cannot be represented and the whole encode pass fails.
pub fn fields(kind: &NodeKind) -> Option<&'static [FieldName]> {
    let fields: &'static [FieldName] = match kind {
        // Wrapper; skipped by the encoder, re-added by the decoder.
        NodeKind::File => &["program"],

        // Program structure
        NodeKind::Program => &["body", "sourceType"],
        NodeKind::BlockStatement => &["body"],

        // Declarations
        NodeKind::VariableDeclaration => &["declarations", "kind"],
        NodeKind::VariableDeclarator => &["id", "init"],
        NodeKind::FunctionDeclaration => &["id", "params", "body"],
        NodeKind::FunctionExpression => &["id", "params", "body"],

        // Expressions
        NodeKind::BinaryExpression => &["left", "operator", "right"],
        NodeKind::UpdateExpression => &["operator", "argument", "prefix"],
        NodeKind::AssignmentExpression => &["left", "operator", "right"],
        NodeKind::CallExpression => &["callee", "arguments"],
        NodeKind::MemberExpression => &["object", "property", "computed"],
        NodeKind::ArrowFunctionExpression => &["params", "body", "expression"],
        NodeKind::ExpressionStatement => &["expression"],
        NodeKind::NewExpression => &["callee", "arguments"],
        NodeKind::UnaryExpression => &["operator", "argument", "prefix"],
        NodeKind::LogicalExpression => &["left", "operator", "right"],
        NodeKind::ConditionalExpression => &["test", "consequent", "alternate"],
        NodeKind::ObjectExpression => &["properties"],
        NodeKind::ArrayExpression => &["elements"],
        NodeKind::ClassExpression => &["id", "superClass", "body"],
        NodeKind::ThisExpression => &[],
        NodeKind::AwaitExpression => &["argument"],

        // Statements
        NodeKind::IfStatement => &["test", "consequent", "alternate"],
        NodeKind::ForStatement => &["init", "test", "update", "body"],
        NodeKind::WhileStatement => &["test", "body"],
        NodeKind::ReturnStatement => &["argument"],
        NodeKind::ForOfStatement => &["left", "right", "body"],
        NodeKind::ContinueStatement => &["label"],
        NodeKind::BreakStatement => &["label"],
        NodeKind::ThrowStatement => &["argument"],
        NodeKind::SwitchStatement => &["discriminant", "cases"],

        // Literals and identifiers
        NodeKind::Identifier => &["name"],
        NodeKind::Literal => &["value"],
        NodeKind::NumericLiteral => &["value"],
        NodeKind::StringLiteral => &["value"],
        NodeKind::BooleanLiteral => &["value"],
        NodeKind::NullLiteral => &[],
        NodeKind::RegExpLiteral => &["pattern", "flags"],
        NodeKind::TemplateLiteral => &["quasis", "expressions"],

        // Elements
        NodeKind::RestElement => &["argument"],
        NodeKind::SpreadElement => &["argument"],
        NodeKind::TemplateElement => &["value", "tail"],

        // Patterns
        NodeKind::AssignmentPattern => &["left", "right"],
        NodeKind::ObjectPattern => &["properties"],

        // Other
        NodeKind::ObjectProperty => &["key", "value"],
        NodeKind::ClassBody => &["body"],
        NodeKind::ClassMethod => &["key", "params", "body"],
        NodeKind::SwitchCase => &["test", "consequent"],

        NodeKind::Null => &[],

        NodeKind::Custom(_) => return None,
    };

    Some(fields)
}

/// Position of `name` within the schema entry for `kind`.
pub fn field_index(kind: &NodeKind, name: &str) -> Option<usize> {
    fields(kind)?.iter().position(|field| *field == name)
}
