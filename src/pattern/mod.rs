//! Composable structural patterns over the node model.
//!
//! Patterns are built once from a handful of combinators and evaluated by a
//! small recursive interpreter:
//!
//! ```rust
//! use fixrev::node::{NodeKind, TypeCategory};
//! use fixrev::pattern::Pattern;
//!
//! // `ptr == <anything>` or `<anything> == ptr`, capturing the pointer.
//! let pointer = Pattern::all_of([
//!     Pattern::kind(NodeKind::VariableReference),
//!     Pattern::of_type(TypeCategory::Pointer),
//! ])
//! .bind("p");
//! let compare = Pattern::all_of([
//!     Pattern::binary_operator(["=="]),
//!     Pattern::has_operands(pointer, Pattern::any()),
//! ]);
//! assert!(compare.guaranteed_captures().contains("p"));
//! ```
//!
//! `Or` is ordered: the first alternative that matches wins and keeps its
//! captures, later alternatives are never tried. A failed sub-match never
//! leaks captures into the result.

mod bindings;
mod predicate;

pub use bindings::{Bindings, MatchResult};
pub use predicate::{BINARY_OPERATORS, NodeTest, is_known_binary_operator};

use crate::error::{FixrevError, Result};
use crate::node::{Node, NodeKind, Role, TypeCategory};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Upper bound for [`Pattern::operator_chain`] depths. Each optional level
/// doubles the number of alternatives tried per node.
pub const MAX_CHAIN_DEPTH: usize = 16;

/// Operand order for [`Pattern::has_operands`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandOrder {
    /// First pattern on the left operand, second on the right.
    Ordered,
    /// Either assignment of the two patterns to the two operands; the
    /// left/right assignment is tried first.
    Either,
}

/// Structure of a [`Pattern`].
#[derive(Debug)]
pub enum PatternKind {
    Any,
    Test(NodeTest),
    And(Vec<Pattern>),
    Or(Vec<Pattern>),
    Not(Pattern),
    Bind(String, Pattern),
    HasOperands {
        first: Pattern,
        second: Pattern,
        order: OperandOrder,
    },
    HasChild(Role, Pattern),
    HasArgument(usize, Pattern),
    HasDescendant {
        inner: Pattern,
        include_self: bool,
    },
    /// Descends through wrapper nodes of the listed kinds before testing.
    Ignoring {
        strip: Vec<NodeKind>,
        inner: Pattern,
    },
    /// Compound statement with at most this many direct statements.
    CountAtMost(usize),
}

/// An immutable, cheaply clonable pattern.
///
/// Sub-patterns are shared, so a library of patterns can be built once and
/// reused by any number of rules across threads.
#[derive(Clone)]
pub struct Pattern(Arc<PatternKind>);

impl Pattern {
    fn from_kind(kind: PatternKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn structure(&self) -> &PatternKind {
        &self.0
    }

    /// Matches every node.
    pub fn any() -> Self {
        Self::from_kind(PatternKind::Any)
    }

    pub fn test(test: NodeTest) -> Self {
        Self::from_kind(PatternKind::Test(test))
    }

    pub fn kind(kind: NodeKind) -> Self {
        Self::test(NodeTest::Kind(vec![kind]))
    }

    pub fn kinds(kinds: impl IntoIterator<Item = NodeKind>) -> Self {
        Self::test(NodeTest::Kind(kinds.into_iter().collect()))
    }

    pub fn binary_operator<I, S>(ops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::test(NodeTest::BinaryOperator(
            ops.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn unary_operator<I, S>(ops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::test(NodeTest::UnaryOperator(
            ops.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn integer_literal() -> Self {
        Self::test(NodeTest::IntegerLiteral)
    }

    pub fn null_literal() -> Self {
        Self::test(NodeTest::NullLiteral)
    }

    pub fn of_type(category: TypeCategory) -> Self {
        Self::test(NodeTest::Type(category))
    }

    pub fn argument_count(count: usize) -> Self {
        Self::test(NodeTest::ArgumentCount(count))
    }

    pub fn callee<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::test(NodeTest::Callee(names.into_iter().map(Into::into).collect()))
    }

    /// True iff every pattern matches the same node. Empty means true.
    pub fn all_of(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        Self::from_kind(PatternKind::And(patterns.into_iter().collect()))
    }

    /// True iff some pattern matches, tried in order. Empty means false.
    pub fn any_of(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        Self::from_kind(PatternKind::Or(patterns.into_iter().collect()))
    }

    /// Negation. Never records captures.
    pub fn unless(pattern: Pattern) -> Self {
        Self::from_kind(PatternKind::Not(pattern))
    }

    /// Records the matched node under `name` when `self` matches.
    pub fn bind(self, name: impl Into<String>) -> Self {
        Self::from_kind(PatternKind::Bind(name.into(), self))
    }

    /// Binary operation whose operands match `first` and `second` in either order.
    pub fn has_operands(first: Pattern, second: Pattern) -> Self {
        Self::from_kind(PatternKind::HasOperands {
            first,
            second,
            order: OperandOrder::Either,
        })
    }

    /// Binary operation with `left` on the left and `right` on the right.
    pub fn has_operands_ordered(left: Pattern, right: Pattern) -> Self {
        Self::from_kind(PatternKind::HasOperands {
            first: left,
            second: right,
            order: OperandOrder::Ordered,
        })
    }

    pub fn has_child(role: Role, pattern: Pattern) -> Self {
        Self::from_kind(PatternKind::HasChild(role, pattern))
    }

    /// Call whose `index`-th argument matches.
    pub fn has_argument(index: usize, pattern: Pattern) -> Self {
        Self::from_kind(PatternKind::HasArgument(index, pattern))
    }

    /// Some proper descendant matches.
    pub fn has_descendant(pattern: Pattern) -> Self {
        Self::from_kind(PatternKind::HasDescendant {
            inner: pattern,
            include_self: false,
        })
    }

    /// The node itself or some descendant matches.
    pub fn has_descendant_or_self(pattern: Pattern) -> Self {
        Self::from_kind(PatternKind::HasDescendant {
            inner: pattern,
            include_self: true,
        })
    }

    /// Skips any chain of `strip`-kind wrappers, then tests `pattern`.
    pub fn ignoring(strip: impl IntoIterator<Item = NodeKind>, pattern: Pattern) -> Self {
        Self::from_kind(PatternKind::Ignoring {
            strip: strip.into_iter().collect(),
            inner: pattern,
        })
    }

    pub fn count_at_most(max_statements: usize) -> Self {
        Self::from_kind(PatternKind::CountAtMost(max_statements))
    }

    /// Chain of `op` operations whose leaves all match `unit`, holding at
    /// least `min_depth` and at most `max_depth` operators.
    ///
    /// The mandatory part is built first, then each optional level wraps the
    /// chain so far as `any_of(chain, op(unit, chain))`.
    pub fn operator_chain(
        unit: Pattern,
        op: &str,
        min_depth: usize,
        max_depth: usize,
    ) -> Result<Self> {
        if min_depth > max_depth {
            return Err(FixrevError::InvalidPattern(format!(
                "operator chain over '{op}' has min depth {min_depth} above max depth {max_depth}"
            )));
        }
        if max_depth > MAX_CHAIN_DEPTH {
            return Err(FixrevError::InvalidPattern(format!(
                "operator chain over '{op}' is deeper than {MAX_CHAIN_DEPTH}"
            )));
        }
        if !is_known_binary_operator(op) {
            return Err(FixrevError::UnknownOperator(op.to_string()));
        }

        let link = |inner: &Pattern| {
            Pattern::all_of([
                Pattern::binary_operator([op]),
                Pattern::has_operands(unit.clone(), inner.clone()),
            ])
        };

        let mut chain = unit.clone();
        for _ in 0..min_depth {
            chain = link(&chain);
        }
        for _ in min_depth..max_depth {
            chain = Pattern::any_of([chain.clone(), link(&chain)]);
        }
        Ok(chain)
    }

    /// Matches `node` against this pattern.
    pub fn matches<'t>(&self, node: Node<'t>) -> Option<MatchResult<'t>> {
        let mut bindings = Bindings::new();
        self.eval(node, &mut bindings)
            .then(|| MatchResult::new(node, bindings))
    }

    pub fn is_match(&self, node: Node<'_>) -> bool {
        self.eval(node, &mut Bindings::new())
    }

    // Leaves `bindings` untouched when it returns false.
    fn eval<'t>(&self, node: Node<'t>, bindings: &mut Bindings<'t>) -> bool {
        match self.structure() {
            PatternKind::Any => true,
            PatternKind::Test(test) => test.matches(node),
            PatternKind::And(patterns) => {
                let snapshot = bindings.clone();
                for pattern in patterns {
                    if !pattern.eval(node, bindings) {
                        *bindings = snapshot;
                        return false;
                    }
                }
                true
            }
            PatternKind::Or(patterns) => patterns.iter().any(|p| p.eval(node, bindings)),
            PatternKind::Not(pattern) => !pattern.eval(node, &mut bindings.clone()),
            PatternKind::Bind(name, pattern) => {
                if pattern.eval(node, bindings) {
                    bindings.insert(name.clone(), node);
                    true
                } else {
                    false
                }
            }
            PatternKind::HasOperands {
                first,
                second,
                order,
            } => {
                if node.kind() != NodeKind::BinaryOp {
                    return false;
                }
                let (Some(left), Some(right)) = (node.child(Role::Left), node.child(Role::Right))
                else {
                    return false;
                };
                eval_pair(first, left, second, right, bindings)
                    || (*order == OperandOrder::Either
                        && eval_pair(first, right, second, left, bindings))
            }
            PatternKind::HasChild(role, pattern) => node
                .child(*role)
                .is_some_and(|child| pattern.eval(child, bindings)),
            PatternKind::HasArgument(index, pattern) => {
                node.kind() == NodeKind::Call
                    && node
                        .children_with(Role::Argument)
                        .nth(*index)
                        .is_some_and(|arg| pattern.eval(arg, bindings))
            }
            PatternKind::HasDescendant {
                inner,
                include_self,
            } => {
                let mut candidates = node.descendants();
                if !include_self {
                    candidates.next();
                }
                candidates.any(|candidate| inner.eval(candidate, bindings))
            }
            PatternKind::Ignoring { strip, inner } => {
                let mut current = node;
                while strip.contains(&current.kind()) {
                    match current.child(Role::Operand) {
                        Some(wrapped) => current = wrapped,
                        None => break,
                    }
                }
                inner.eval(current, bindings)
            }
            PatternKind::CountAtMost(max) => {
                node.kind() == NodeKind::CompoundStatement && node.statement_count() <= *max
            }
        }
    }

    /// Captures that every successful match of this pattern records.
    pub fn guaranteed_captures(&self) -> BTreeSet<String> {
        match self.structure() {
            PatternKind::Any | PatternKind::Test(_) | PatternKind::CountAtMost(_) => {
                BTreeSet::new()
            }
            PatternKind::Not(_) => BTreeSet::new(),
            PatternKind::And(patterns) => patterns
                .iter()
                .flat_map(|p| p.guaranteed_captures())
                .collect(),
            PatternKind::Or(patterns) => {
                let mut branches = patterns.iter().map(|p| p.guaranteed_captures());
                let Some(first) = branches.next() else {
                    return BTreeSet::new();
                };
                branches.fold(first, |acc, branch| {
                    acc.intersection(&branch).cloned().collect()
                })
            }
            PatternKind::Bind(name, pattern) => {
                let mut names = pattern.guaranteed_captures();
                names.insert(name.clone());
                names
            }
            PatternKind::HasOperands { first, second, .. } => {
                let mut names = first.guaranteed_captures();
                names.extend(second.guaranteed_captures());
                names
            }
            PatternKind::HasChild(_, pattern)
            | PatternKind::HasArgument(_, pattern)
            | PatternKind::HasDescendant { inner: pattern, .. }
            | PatternKind::Ignoring { inner: pattern, .. } => pattern.guaranteed_captures(),
        }
    }
}

fn eval_pair<'t>(
    first: &Pattern,
    first_node: Node<'t>,
    second: &Pattern,
    second_node: Node<'t>,
    bindings: &mut Bindings<'t>,
) -> bool {
    let mut trial = bindings.clone();
    if first.eval(first_node, &mut trial) && second.eval(second_node, &mut trial) {
        *bindings = trial;
        true
    } else {
        false
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{C, Language};
    use crate::node::SyntaxTree;

    fn parse(source: &str) -> SyntaxTree {
        C.build_tree(source).unwrap()
    }

    fn first<'t>(tree: &'t SyntaxTree, kind: NodeKind) -> Node<'t> {
        tree.root()
            .descendants()
            .find(|n| n.kind() == kind)
            .expect("node of requested kind")
    }

    fn var() -> Pattern {
        Pattern::kind(NodeKind::VariableReference)
    }

    /// `a || b || ...` with `leaves` variables, as an expression statement.
    fn or_chain_source(leaves: usize) -> String {
        let names: Vec<String> = (0..leaves).map(|i| format!("v{i}")).collect();
        format!(
            "void f(int v0, int v1, int v2, int v3, int v4, int v5, int v6) {{ {}; }}",
            names.join(" || ")
        )
    }

    #[test]
    fn test_not_inverts_and_never_binds() {
        let tree = parse("void f(int x) { x; }");
        let x = first(&tree, NodeKind::VariableReference);

        let bound = var().bind("x");
        assert!(bound.matches(x).is_some());
        assert!(Pattern::unless(bound.clone()).matches(x).is_none());

        let negated_miss = Pattern::unless(Pattern::kind(NodeKind::Literal).bind("lit"));
        let result = negated_miss.matches(x).unwrap();
        assert!(result.bindings().is_empty());
    }

    #[test]
    fn test_or_keeps_first_alternative() {
        let tree = parse("void f(int x) { x; }");
        let x = first(&tree, NodeKind::VariableReference);

        let or = Pattern::any_of([var().bind("first"), var().bind("second")]);
        let result = or.matches(x).unwrap();
        assert!(result.get("first").is_some());
        assert!(result.get("second").is_none());
    }

    #[test]
    fn test_failed_and_does_not_leak_captures() {
        let tree = parse("void f(int x) { x; }");
        let x = first(&tree, NodeKind::VariableReference);

        let leaky = Pattern::all_of([var().bind("early"), Pattern::kind(NodeKind::Literal)]);
        let or = Pattern::any_of([leaky, var().bind("late")]);
        let result = or.matches(x).unwrap();
        assert!(!result.bindings().contains("early"));
        assert!(result.bindings().contains("late"));
    }

    #[test]
    fn test_bind_overwrites_same_name() {
        let tree = parse("void f(int a, int b) { a + b; }");
        let sum = first(&tree, NodeKind::BinaryOp);

        let pattern = Pattern::all_of([
            Pattern::has_operands_ordered(var().bind("n"), var()),
            Pattern::has_operands_ordered(var(), var().bind("n")),
        ]);
        let result = pattern.matches(sum).unwrap();
        assert_eq!(result.bindings().text("n"), Some("b"));
    }

    #[test]
    fn test_has_operands_order() {
        let tree = parse("void f(int a) { a == 0; }");
        let cmp = first(&tree, NodeKind::BinaryOp);

        let literal_first = Pattern::has_operands(Pattern::integer_literal().bind("lit"), var());
        let result = literal_first.matches(cmp).unwrap();
        assert_eq!(result.bindings().text("lit"), Some("0"));

        let ordered = Pattern::has_operands_ordered(Pattern::integer_literal(), var());
        assert!(!ordered.is_match(cmp));
        let ordered = Pattern::has_operands_ordered(var(), Pattern::integer_literal());
        assert!(ordered.is_match(cmp));
    }

    #[test]
    fn test_ignoring_without_wrappers_is_transparent() {
        let tree = parse("void f(int a) { a; 7; }");
        let nodes: Vec<Node> = tree
            .root()
            .descendants()
            .filter(|n| matches!(n.kind(), NodeKind::VariableReference | NodeKind::Literal))
            .collect();
        let inner = var();
        let wrapped = Pattern::ignoring([NodeKind::Cast, NodeKind::Parenthesis], inner.clone());
        for node in nodes {
            assert_eq!(wrapped.is_match(node), inner.is_match(node));
        }
    }

    #[test]
    fn test_ignoring_strips_casts_and_parens() {
        let tree = parse("void f(int a) { ((long)(a)); }");
        let stmt = first(&tree, NodeKind::ExpressionStatement);
        let expr = stmt.child(Role::Expression).unwrap();
        assert_eq!(expr.kind(), NodeKind::Parenthesis);

        let stripped = Pattern::ignoring([NodeKind::Cast, NodeKind::Parenthesis], var().bind("v"));
        let result = stripped.matches(expr).unwrap();
        assert_eq!(result.bindings().text("v"), Some("a"));

        let casts_only = Pattern::ignoring([NodeKind::Cast], var());
        assert!(!casts_only.is_match(expr));
    }

    #[test]
    fn test_operator_chain_depth_bounds() {
        for min in 0..3usize {
            let max = min + 2;
            let chain = Pattern::operator_chain(var(), "||", min, max).unwrap();
            for leaves in 1..=max + 2 {
                let tree = parse(&or_chain_source(leaves));
                let expr = first(&tree, NodeKind::ExpressionStatement)
                    .child(Role::Expression)
                    .unwrap();
                let ops = leaves - 1;
                assert_eq!(
                    chain.is_match(expr),
                    ops >= min && ops <= max,
                    "min {min} max {max} leaves {leaves}"
                );
            }
        }
    }

    #[test]
    fn test_operator_chain_rejects_other_operators() {
        let chain = Pattern::operator_chain(var(), "&&", 0, 3).unwrap();
        let tree = parse("void f(int a, int b) { a || b; }");
        let expr = first(&tree, NodeKind::ExpressionStatement)
            .child(Role::Expression)
            .unwrap();
        assert!(!chain.is_match(expr));
    }

    #[test]
    fn test_operator_chain_construction_errors() {
        assert!(matches!(
            Pattern::operator_chain(var(), "||", 3, 2),
            Err(FixrevError::InvalidPattern(_))
        ));
        assert!(matches!(
            Pattern::operator_chain(var(), "or", 0, 2),
            Err(FixrevError::UnknownOperator(_))
        ));
        assert!(Pattern::operator_chain(var(), "||", 0, MAX_CHAIN_DEPTH + 1).is_err());
    }

    #[test]
    fn test_count_at_most_counts_direct_statements() {
        let tree = parse("void f(int a) { a; { a; a; a; a; } a; }");
        let body = first(&tree, NodeKind::CompoundStatement);
        assert_eq!(body.statement_count(), 3);
        assert!(Pattern::count_at_most(3).is_match(body));
        assert!(!Pattern::count_at_most(2).is_match(body));
    }

    #[test]
    fn test_has_descendant_excludes_self() {
        let tree = parse("void f(void) { return; }");
        let ret = first(&tree, NodeKind::JumpStatement);
        let jump = Pattern::kind(NodeKind::JumpStatement);
        assert!(!Pattern::has_descendant(jump.clone()).is_match(ret));
        assert!(Pattern::has_descendant_or_self(jump.clone()).is_match(ret));

        let body = first(&tree, NodeKind::CompoundStatement);
        assert!(Pattern::has_descendant(jump).is_match(body));
    }

    #[test]
    fn test_guaranteed_captures() {
        let p = Pattern::all_of([
            Pattern::any_of([var().bind("a").bind("both"), Pattern::any().bind("both")]),
            Pattern::unless(var().bind("never")),
            Pattern::has_child(Role::Left, var().bind("left")),
        ]);
        let names: Vec<String> = p.guaranteed_captures().into_iter().collect();
        assert_eq!(names, vec!["both".to_string(), "left".to_string()]);
    }
}
