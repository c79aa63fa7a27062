use compact_str::CompactString;
use smallvec::SmallVec;

use crate::arena::ArenaId;

pub type NodeId = ArenaId<Node>;
pub type Fields = SmallVec<[Field; 4]>;

/// The type tag of a syntax-tree node.
///
/// Covers the supported subset of an ESTree-style JavaScript AST. Tags
/// produced by an external parser that fall outside this subset are carried
/// as [`NodeKind::Custom`]; they have no schema entry and make the tree
/// unencodable, which is reported as an unsupported construct at encode time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum NodeKind {
    // Wrapper produced by the parser; never encoded.
    File,

    // Program structure
    Program,
    BlockStatement,

    // Declarations
    VariableDeclaration,
    VariableDeclarator,
    FunctionDeclaration,
    FunctionExpression,

    // Expressions
    BinaryExpression,
    UpdateExpression,
    AssignmentExpression,
    CallExpression,
    MemberExpression,
    ArrowFunctionExpression,
    ExpressionStatement,
    NewExpression,
    UnaryExpression,
    LogicalExpression,
    ConditionalExpression,
    ObjectExpression,
    ArrayExpression,
    ClassExpression,
    ThisExpression,
    AwaitExpression,

    // Statements
    IfStatement,
    ForStatement,
    WhileStatement,
    ReturnStatement,
    ForOfStatement,
    ContinueStatement,
    BreakStatement,
    ThrowStatement,
    SwitchStatement,

    // Literals and identifiers
    Identifier,
    Literal,
    NumericLiteral,
    StringLiteral,
    BooleanLiteral,
    NullLiteral,
    RegExpLiteral,
    TemplateLiteral,

    // Elements
    RestElement,
    SpreadElement,
    TemplateElement,

    // Patterns
    AssignmentPattern,
    ObjectPattern,

    // Other
    ObjectProperty,
    ClassBody,
    ClassMethod,
    SwitchCase,

    /// The canonical "absence" tag, encoded as an empty-field record.
    #[strum(serialize = "null")]
    Null,

    /// Any tag outside the supported subset.
    #[strum(default)]
    Custom(CompactString),
}

impl NodeKind {
    /// `true` for tags whose `value` field is interned into the value
    /// dictionary during encoding.
    pub fn has_literal_value(&self) -> bool {
        matches!(
            self,
            NodeKind::Literal
                | NodeKind::NumericLiteral
                | NodeKind::StringLiteral
                | NodeKind::BooleanLiteral
        )
    }

    /// `true` for statements after which the rest of a block is unreachable.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            NodeKind::ReturnStatement
                | NodeKind::ThrowStatement
                | NodeKind::ContinueStatement
                | NodeKind::BreakStatement
        )
    }
}

/// One field value of a [`Node`], in schema order.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A child node.
    Node(NodeId),
    /// An ordered sequence of child nodes and scalars.
    List(Vec<Field>),
    /// A scalar string (operators, declaration kinds, identifier names).
    String(CompactString),
    Number(f64),
    Bool(bool),
    /// An explicitly `null` value or child slot.
    Null,
    /// A field the parser left undefined; passed through the codec verbatim.
    Absent,
    /// The raw/cooked pair of a template element.
    Template {
        raw: CompactString,
        cooked: CompactString,
    },
}

impl Field {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Field::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Field::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Field::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Field]> {
        match self {
            Field::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }
}

/// One tagged node of the tree.
///
/// `fields` are stored positionally, aligned with the node's schema entry;
/// the tag alone determines how many fields the node carries and what each
/// position means.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub fields: Fields,
}

impl Node {
    pub fn new(kind: NodeKind, fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            kind,
            fields: fields.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(NodeKind::BinaryExpression, "BinaryExpression")]
    #[case(NodeKind::Null, "null")]
    #[case(NodeKind::TemplateElement, "TemplateElement")]
    fn test_kind_display(#[case] kind: NodeKind, #[case] expected: &str) {
        assert_eq!(kind.to_string(), expected);
    }

    #[rstest]
    #[case("Identifier", NodeKind::Identifier)]
    #[case("null", NodeKind::Null)]
    #[case("TSTypeAnnotation", NodeKind::Custom("TSTypeAnnotation".into()))]
    fn test_kind_from_str(#[case] tag: &str, #[case] expected: NodeKind) {
        assert_eq!(NodeKind::from_str(tag).unwrap(), expected);
    }

    #[rstest]
    #[case(NodeKind::NumericLiteral, true)]
    #[case(NodeKind::Literal, true)]
    #[case(NodeKind::TemplateLiteral, false)]
    #[case(NodeKind::RegExpLiteral, false)]
    #[case(NodeKind::Identifier, false)]
    fn test_has_literal_value(#[case] kind: NodeKind, #[case] expected: bool) {
        assert_eq!(kind.has_literal_value(), expected);
    }
}
