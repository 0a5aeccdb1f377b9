//! Read-only node model over one translation unit.
//!
//! A front end lowers its own parse tree into a [`SyntaxTree`] through a
//! [`TreeBuilder`]. The tree owns the source buffer and an arena of nodes;
//! [`Node`] is a copyable handle whose lifetime is bounded by the tree.
//! Every node keeps the exact byte range it spans, so the text a pattern
//! captures is always a verbatim slice of the original buffer.

use crate::error::{FixrevError, Result};
use std::fmt;
use std::ops::Range;

/// The shape of a node.
///
/// Operator names and jump variants are attributes on the node rather than
/// part of the tag, see [`Node::operator`] and [`Node::jump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    TranslationUnit,
    FunctionDefinition,
    Declaration,
    Literal,
    VariableReference,
    MemberAccess,
    Call,
    UnaryOp,
    BinaryOp,
    Cast,
    Parenthesis,
    CompoundStatement,
    ExpressionStatement,
    IfStatement,
    WhileStatement,
    ForStatement,
    JumpStatement,
    /// Anything the front end does not classify further. See [`Node::label`].
    Other,
}

impl NodeKind {
    /// Returns true for kinds that appear in statement position.
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::Declaration
                | NodeKind::CompoundStatement
                | NodeKind::ExpressionStatement
                | NodeKind::IfStatement
                | NodeKind::WhileStatement
                | NodeKind::ForStatement
                | NodeKind::JumpStatement
        )
    }
}

/// Variant of a [`NodeKind::JumpStatement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpKind {
    Break,
    Continue,
    Goto,
    Return,
}

/// Value carried by a [`NodeKind::Literal`].
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(u128),
    /// `NULL`, `nullptr` and friends.
    Null,
    Float,
    Char,
    String,
    Bool(bool),
}

impl Literal {
    /// Null pointer literals and the integer constant zero.
    pub fn is_null_constant(&self) -> bool {
        matches!(self, Literal::Null | Literal::Integer(0))
    }
}

/// Coarse category of a node's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeCategory {
    Integer,
    Pointer,
    #[default]
    Other,
}

/// The role a child plays in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Top-level item of a translation unit.
    Item,
    Body,
    Condition,
    Then,
    Else,
    Init,
    Update,
    /// Return value or declarator initializer.
    Value,
    /// Expression of an expression statement.
    Expression,
    /// Direct statement of a compound statement.
    Statement,
    Left,
    Right,
    Operand,
    Callee,
    Argument,
    Child,
}

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Storage for a single node, assembled by a front end.
#[derive(Debug, Clone)]
pub struct NodeData {
    kind: NodeKind,
    range: Range<usize>,
    operator: Option<String>,
    jump: Option<JumpKind>,
    literal: Option<Literal>,
    ty: TypeCategory,
    name: Option<String>,
    label: Option<String>,
    children: Vec<(Role, NodeId)>,
}

impl NodeData {
    pub fn new(kind: NodeKind, range: Range<usize>) -> Self {
        Self {
            kind,
            range,
            operator: None,
            jump: None,
            literal: None,
            ty: TypeCategory::Other,
            name: None,
            label: None,
            children: Vec::new(),
        }
    }

    pub fn with_operator(mut self, op: impl Into<String>) -> Self {
        self.operator = Some(op.into());
        self
    }

    pub fn with_jump(mut self, jump: JumpKind) -> Self {
        self.jump = Some(jump);
        self
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }

    pub fn with_type(mut self, ty: TypeCategory) -> Self {
        self.ty = ty;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Appends a child. Children must already be added to the builder.
    pub fn with_child(mut self, role: Role, child: NodeId) -> Self {
        self.children.push((role, child));
        self
    }

    pub fn push_child(&mut self, role: Role, child: NodeId) {
        self.children.push((role, child));
    }
}

/// Bottom-up builder for a [`SyntaxTree`].
///
/// Children are added before their parents, which keeps the arena acyclic.
pub struct TreeBuilder {
    source: String,
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            nodes: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Adds a node and returns its id.
    pub fn add(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(data);
        NodeId(self.nodes.len() - 1)
    }

    /// Validates the arena and freezes it into a tree rooted at `root`.
    pub fn finish(self, root: NodeId) -> Result<SyntaxTree> {
        let len = self.source.len();
        if root.0 >= self.nodes.len() {
            return Err(FixrevError::MalformedTree(format!(
                "root {} is not a node",
                root.0
            )));
        }

        for (index, data) in self.nodes.iter().enumerate() {
            let Range { start, end } = data.range;
            if start > end || end > len {
                return Err(FixrevError::MalformedTree(format!(
                    "node {index} spans {start}..{end} in a buffer of {len} bytes"
                )));
            }
            if !self.source.is_char_boundary(start) || !self.source.is_char_boundary(end) {
                return Err(FixrevError::MalformedTree(format!(
                    "node {index} range {start}..{end} splits a UTF-8 sequence"
                )));
            }
            for &(_, child) in &data.children {
                if child.0 >= index {
                    return Err(FixrevError::MalformedTree(format!(
                        "node {index} references child {} that was not added before it",
                        child.0
                    )));
                }
                let inner = &self.nodes[child.0].range;
                if inner.start < start || inner.end > end {
                    return Err(FixrevError::MalformedTree(format!(
                        "child {} ({}..{}) escapes parent {index} ({start}..{end})",
                        child.0, inner.start, inner.end
                    )));
                }
            }
        }

        let line_starts = std::iter::once(0)
            .chain(self.source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Ok(SyntaxTree {
            source: self.source,
            nodes: self.nodes,
            root,
            line_starts,
        })
    }
}

/// An immutable, fully built tree for one translation unit.
#[derive(Debug)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
    root: NodeId,
    line_starts: Vec<usize>,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        self.node(self.root)
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        assert!(id.0 < self.nodes.len(), "node id out of range");
        Node { tree: self, id }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Converts a byte offset into a 1-based (line, column) pair.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self
            .source
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);
        (line, column + 1)
    }
}

/// A non-owning reference to a node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn range(&self) -> Range<usize> {
        self.data().range.clone()
    }

    /// The exact source slice this node spans.
    pub fn text(&self) -> &'t str {
        &self.tree.source[self.data().range.clone()]
    }

    pub fn operator(&self) -> Option<&'t str> {
        self.data().operator.as_deref()
    }

    pub fn jump(&self) -> Option<JumpKind> {
        self.data().jump
    }

    pub fn literal(&self) -> Option<&'t Literal> {
        self.data().literal.as_ref()
    }

    pub fn ty(&self) -> TypeCategory {
        self.data().ty
    }

    /// Variable, field, or callee name.
    pub fn name(&self) -> Option<&'t str> {
        self.data().name.as_deref()
    }

    /// Front-end specific kind name, set on [`NodeKind::Other`] nodes.
    pub fn label(&self) -> Option<&'t str> {
        self.data().label.as_deref()
    }

    /// All children in source order, with their roles.
    pub fn roles(&self) -> impl Iterator<Item = (Role, Node<'t>)> + 't {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&(role, id)| (role, Node { tree, id }))
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.roles().map(|(_, node)| node)
    }

    pub fn children_with(&self, role: Role) -> impl Iterator<Item = Node<'t>> + 't {
        self.roles()
            .filter(move |(r, _)| *r == role)
            .map(|(_, node)| node)
    }

    /// The first child playing `role`.
    pub fn child(&self, role: Role) -> Option<Node<'t>> {
        self.children_with(role).next()
    }

    /// Number of direct statements of a compound statement.
    pub fn statement_count(&self) -> usize {
        self.children_with(Role::Statement).count()
    }

    /// Pre-order traversal starting with this node.
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants { stack: vec![*self] }
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = self.range();
        write!(f, "{:?}@{}..{}", self.kind(), range.start, range.end)?;
        if let Some(op) = self.operator() {
            write!(f, "({op})")?;
        }
        Ok(())
    }
}

/// Pre-order iterator returned by [`Node::descendants`].
pub struct Descendants<'t> {
    stack: Vec<Node<'t>>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let children: Vec<_> = node.children().collect();
        self.stack.extend(children.into_iter().rev());
        Some(node)
    }
}
