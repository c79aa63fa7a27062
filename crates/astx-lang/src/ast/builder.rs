//! Convenience constructors for building trees with schema-aligned fields.
//!
//! Each constructor allocates one node whose positional fields match the
//! schema entry for its tag, so trees built here are encodable by
//! construction. Tests and transforms both build through these.

use compact_str::CompactString;

use crate::ast::{
    node::{Field, NodeId, NodeKind},
    tree::Tree,
};

impl Tree {
    /// Allocates a `File` wrapper around `program` and makes it the root.
    pub fn file(&mut self, program: NodeId) -> NodeId {
        let id = self.node(NodeKind::File, [Field::Node(program)]);
        self.set_root(id);
        id
    }

    pub fn program(&mut self, body: impl IntoIterator<Item = NodeId>) -> NodeId {
        let body = body.into_iter().map(Field::Node).collect();
        self.node(
            NodeKind::Program,
            [Field::List(body), Field::String("script".into())],
        )
    }

    pub fn block_statement(&mut self, body: impl IntoIterator<Item = NodeId>) -> NodeId {
        let body = body.into_iter().map(Field::Node).collect();
        self.node(NodeKind::BlockStatement, [Field::List(body)])
    }

    pub fn identifier(&mut self, name: impl Into<CompactString>) -> NodeId {
        self.node(NodeKind::Identifier, [Field::String(name.into())])
    }

    pub fn numeric_literal(&mut self, value: f64) -> NodeId {
        self.node(NodeKind::NumericLiteral, [Field::Number(value)])
    }

    pub fn string_literal(&mut self, value: impl Into<CompactString>) -> NodeId {
        self.node(NodeKind::StringLiteral, [Field::String(value.into())])
    }

    pub fn boolean_literal(&mut self, value: bool) -> NodeId {
        self.node(NodeKind::BooleanLiteral, [Field::Bool(value)])
    }

    pub fn null_literal(&mut self) -> NodeId {
        self.node(NodeKind::NullLiteral, [])
    }

    pub fn this_expression(&mut self) -> NodeId {
        self.node(NodeKind::ThisExpression, [])
    }

    pub fn binary_expression(&mut self, left: NodeId, operator: &str, right: NodeId) -> NodeId {
        self.node(
            NodeKind::BinaryExpression,
            [
                Field::Node(left),
                Field::String(operator.into()),
                Field::Node(right),
            ],
        )
    }

    pub fn logical_expression(&mut self, left: NodeId, operator: &str, right: NodeId) -> NodeId {
        self.node(
            NodeKind::LogicalExpression,
            [
                Field::Node(left),
                Field::String(operator.into()),
                Field::Node(right),
            ],
        )
    }

    pub fn unary_expression(&mut self, operator: &str, argument: NodeId) -> NodeId {
        self.node(
            NodeKind::UnaryExpression,
            [
                Field::String(operator.into()),
                Field::Node(argument),
                Field::Bool(true),
            ],
        )
    }

    pub fn conditional_expression(
        &mut self,
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    ) -> NodeId {
        self.node(
            NodeKind::ConditionalExpression,
            [
                Field::Node(test),
                Field::Node(consequent),
                Field::Node(alternate),
            ],
        )
    }

    pub fn call_expression(
        &mut self,
        callee: NodeId,
        arguments: impl IntoIterator<Item = NodeId>,
    ) -> NodeId {
        let arguments = arguments.into_iter().map(Field::Node).collect();
        self.node(
            NodeKind::CallExpression,
            [Field::Node(callee), Field::List(arguments)],
        )
    }

    pub fn member_expression(&mut self, object: NodeId, property: NodeId, computed: bool) -> NodeId {
        self.node(
            NodeKind::MemberExpression,
            [
                Field::Node(object),
                Field::Node(property),
                Field::Bool(computed),
            ],
        )
    }

    pub fn assignment_expression(&mut self, left: NodeId, operator: &str, right: NodeId) -> NodeId {
        self.node(
            NodeKind::AssignmentExpression,
            [
                Field::Node(left),
                Field::String(operator.into()),
                Field::Node(right),
            ],
        )
    }

    pub fn expression_statement(&mut self, expression: NodeId) -> NodeId {
        self.node(NodeKind::ExpressionStatement, [Field::Node(expression)])
    }

    pub fn return_statement(&mut self, argument: Option<NodeId>) -> NodeId {
        let argument = argument.map_or(Field::Null, Field::Node);
        self.node(NodeKind::ReturnStatement, [argument])
    }

    pub fn throw_statement(&mut self, argument: NodeId) -> NodeId {
        self.node(NodeKind::ThrowStatement, [Field::Node(argument)])
    }

    pub fn break_statement(&mut self) -> NodeId {
        self.node(NodeKind::BreakStatement, [Field::Null])
    }

    pub fn continue_statement(&mut self) -> NodeId {
        self.node(NodeKind::ContinueStatement, [Field::Null])
    }

    pub fn if_statement(
        &mut self,
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    ) -> NodeId {
        let alternate = alternate.map_or(Field::Null, Field::Node);
        self.node(
            NodeKind::IfStatement,
            [Field::Node(test), Field::Node(consequent), alternate],
        )
    }

    pub fn while_statement(&mut self, test: NodeId, body: NodeId) -> NodeId {
        self.node(
            NodeKind::WhileStatement,
            [Field::Node(test), Field::Node(body)],
        )
    }

    pub fn for_statement(
        &mut self,
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        self.node(
            NodeKind::ForStatement,
            [
                init.map_or(Field::Null, Field::Node),
                test.map_or(Field::Null, Field::Node),
                update.map_or(Field::Null, Field::Node),
                Field::Node(body),
            ],
        )
    }

    pub fn variable_declaration(
        &mut self,
        kind: &str,
        declarations: impl IntoIterator<Item = NodeId>,
    ) -> NodeId {
        let declarations = declarations.into_iter().map(Field::Node).collect();
        self.node(
            NodeKind::VariableDeclaration,
            [Field::List(declarations), Field::String(kind.into())],
        )
    }

    pub fn variable_declarator(&mut self, id: NodeId, init: Option<NodeId>) -> NodeId {
        let init = init.map_or(Field::Null, Field::Node);
        self.node(NodeKind::VariableDeclarator, [Field::Node(id), init])
    }

    pub fn function_declaration(
        &mut self,
        id: NodeId,
        params: impl IntoIterator<Item = NodeId>,
        body: NodeId,
    ) -> NodeId {
        let params = params.into_iter().map(Field::Node).collect();
        self.node(
            NodeKind::FunctionDeclaration,
            [Field::Node(id), Field::List(params), Field::Node(body)],
        )
    }

    pub fn function_expression(
        &mut self,
        id: Option<NodeId>,
        params: impl IntoIterator<Item = NodeId>,
        body: NodeId,
    ) -> NodeId {
        let id = id.map_or(Field::Null, Field::Node);
        let params = params.into_iter().map(Field::Node).collect();
        self.node(
            NodeKind::FunctionExpression,
            [id, Field::List(params), Field::Node(body)],
        )
    }

    pub fn arrow_function_expression(
        &mut self,
        params: impl IntoIterator<Item = NodeId>,
        body: NodeId,
        expression: bool,
    ) -> NodeId {
        let params = params.into_iter().map(Field::Node).collect();
        self.node(
            NodeKind::ArrowFunctionExpression,
            [
                Field::List(params),
                Field::Node(body),
                Field::Bool(expression),
            ],
        )
    }

    pub fn array_expression(&mut self, elements: impl IntoIterator<Item = NodeId>) -> NodeId {
        let elements = elements.into_iter().map(Field::Node).collect();
        self.node(NodeKind::ArrayExpression, [Field::List(elements)])
    }

    pub fn template_element(
        &mut self,
        raw: impl Into<CompactString>,
        cooked: impl Into<CompactString>,
        tail: bool,
    ) -> NodeId {
        self.node(
            NodeKind::TemplateElement,
            [
                Field::Template {
                    raw: raw.into(),
                    cooked: cooked.into(),
                },
                Field::Bool(tail),
            ],
        )
    }

    pub fn template_literal(
        &mut self,
        quasis: impl IntoIterator<Item = NodeId>,
        expressions: impl IntoIterator<Item = NodeId>,
    ) -> NodeId {
        let quasis = quasis.into_iter().map(Field::Node).collect();
        let expressions = expressions.into_iter().map(Field::Node).collect();
        self.node(
            NodeKind::TemplateLiteral,
            [Field::List(quasis), Field::List(expressions)],
        )
    }
}
