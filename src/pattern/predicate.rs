//! Leaf predicates over a single node's kind and attributes.

use crate::node::{Node, NodeKind, Role, TypeCategory};

/// Binary operator spellings a pattern may name.
pub const BINARY_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "&", "|", "^", "<<", ">>", "<", ">", "<=", ">=", "==", "!=", "&&",
    "||", "=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", ",",
];

/// Returns true if `op` is a binary operator spelling.
pub fn is_known_binary_operator(op: &str) -> bool {
    BINARY_OPERATORS.contains(&op)
}

/// A test against one node, without looking at its children's shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// Node kind is one of the listed kinds.
    Kind(Vec<NodeKind>),
    /// Binary operation whose operator is in the set.
    BinaryOperator(Vec<String>),
    /// Unary operation whose operator is in the set.
    UnaryOperator(Vec<String>),
    IntegerLiteral,
    /// `NULL`, `nullptr`, or the integer constant zero.
    NullLiteral,
    /// Declared type category of the node.
    Type(TypeCategory),
    /// Call with exactly this many arguments.
    ArgumentCount(usize),
    /// Call whose callee is a plain name in the set.
    Callee(Vec<String>),
}

impl NodeTest {
    pub fn matches(&self, node: Node<'_>) -> bool {
        match self {
            NodeTest::Kind(kinds) => kinds.contains(&node.kind()),
            NodeTest::BinaryOperator(ops) => {
                node.kind() == NodeKind::BinaryOp && operator_in(node, ops)
            }
            NodeTest::UnaryOperator(ops) => node.kind() == NodeKind::UnaryOp && operator_in(node, ops),
            NodeTest::IntegerLiteral => {
                node.kind() == NodeKind::Literal
                    && matches!(node.literal(), Some(crate::node::Literal::Integer(_)))
            }
            NodeTest::NullLiteral => {
                node.kind() == NodeKind::Literal
                    && node.literal().is_some_and(|lit| lit.is_null_constant())
            }
            NodeTest::Type(category) => node.ty() == *category,
            NodeTest::ArgumentCount(count) => {
                node.kind() == NodeKind::Call && node.children_with(Role::Argument).count() == *count
            }
            NodeTest::Callee(names) => {
                node.kind() == NodeKind::Call
                    && node
                        .name()
                        .is_some_and(|name| names.iter().any(|n| n == name))
            }
        }
    }
}

fn operator_in(node: Node<'_>, ops: &[String]) -> bool {
    node.operator()
        .is_some_and(|op| ops.iter().any(|candidate| candidate == op))
}
