//! Classification library.
//!
//! A fixed vocabulary of patterns, built from the combinators, that recognise
//! numeric values, pointer values, comparisons, null tests and jump
//! statements. Build it once and hand it to every rule constructor.

use crate::error::{FixrevError, Result};
use crate::node::{NodeKind, Role, TypeCategory};
use crate::pattern::{Pattern, is_known_binary_operator};
use serde::{Deserialize, Serialize};

/// Wrappers skipped when looking for the value underneath.
const VALUE_WRAPPERS: [NodeKind; 2] = [NodeKind::Cast, NodeKind::Parenthesis];

/// Operator sets and call names the classification patterns are built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Operators that combine two numeric values into a numeric value.
    pub arithmetic_operators: Vec<String>,

    /// Ordering comparisons.
    pub relational_operators: Vec<String>,

    /// Equality comparisons.
    pub equality_operators: Vec<String>,

    /// Functions whose call, used as a statement, counts as a jump.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub noreturn_functions: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let owned = |ops: &[&str]| -> Vec<String> { ops.iter().map(|op| op.to_string()).collect() };
        Self {
            arithmetic_operators: owned(&["+", "-", "*", "/", "%", "&", "|", "^", "<<", ">>"]),
            relational_operators: owned(&["<", ">", "<=", ">="]),
            equality_operators: owned(&["==", "!="]),
            noreturn_functions: Vec::new(),
        }
    }
}

impl ClassifierConfig {
    /// Checks that every operator name is a binary operator spelling.
    pub fn validate(&self) -> Result<()> {
        let all = self
            .arithmetic_operators
            .iter()
            .chain(&self.relational_operators)
            .chain(&self.equality_operators);
        for op in all {
            if !is_known_binary_operator(op) {
                return Err(FixrevError::UnknownOperator(op.clone()));
            }
        }
        if self.noreturn_functions.iter().any(|name| name.trim().is_empty()) {
            return Err(FixrevError::InvalidConfig(
                "noreturn function names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// The shared classification patterns.
#[derive(Debug, Clone)]
pub struct Classifiers {
    /// Null pointer literal or zero, under any casts.
    pub null_constant: Pattern,
    /// Integer literal or null constant.
    pub numeric_literal: Pattern,
    /// Variable or member of integer type.
    pub numeric_variable: Pattern,
    /// `sizeof x` or a one-argument call on a bare variable.
    pub single_argument_call: Pattern,
    pub numeric_value: Pattern,
    /// A numeric value, or arithmetic on two numeric values.
    pub numeric_operation: Pattern,
    /// Comparison with at least one numeric operand.
    pub numeric_comparison: Pattern,
    pub pointer_variable: Pattern,
    /// A pointer, or a pointer offset by a numeric value.
    pub pointer_operation: Pattern,
    /// Ordering comparison between two pointer operations.
    pub pointer_comparison: Pattern,
    pub equals_null: Pattern,
    pub not_equals_null: Pattern,
    pub jump_statement: Pattern,
}

impl Classifiers {
    /// Validates `config` and builds the library from it.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &ClassifierConfig) -> Self {
        let null_constant = Pattern::ignoring([NodeKind::Cast], Pattern::null_literal());
        let numeric_literal = Pattern::any_of([Pattern::integer_literal(), null_constant.clone()]);
        let numeric_variable = Pattern::all_of([
            Pattern::kinds([NodeKind::VariableReference, NodeKind::MemberAccess]),
            Pattern::of_type(TypeCategory::Integer),
        ]);

        let bare_variable =
            Pattern::ignoring(VALUE_WRAPPERS, Pattern::kind(NodeKind::VariableReference));
        let single_argument_call = Pattern::any_of([
            Pattern::all_of([
                Pattern::unary_operator(["sizeof"]),
                Pattern::has_child(Role::Operand, bare_variable.clone()),
            ]),
            Pattern::all_of([
                Pattern::argument_count(1),
                Pattern::has_argument(0, bare_variable),
            ]),
        ]);

        let numeric_value = Pattern::ignoring(
            VALUE_WRAPPERS,
            Pattern::any_of([
                numeric_literal.clone(),
                numeric_variable.clone(),
                single_argument_call.clone(),
            ]),
        );

        let arithmetic = Pattern::binary_operator(config.arithmetic_operators.iter().cloned());
        let numeric_operation = Pattern::any_of([
            numeric_value.clone(),
            Pattern::all_of([
                arithmetic.clone(),
                Pattern::has_operands(numeric_value.clone(), numeric_value.clone()),
            ]),
        ]);

        let comparison = Pattern::binary_operator(
            config
                .relational_operators
                .iter()
                .chain(&config.equality_operators)
                .cloned(),
        );
        let numeric_comparison = Pattern::all_of([
            comparison,
            Pattern::has_operands(numeric_operation.clone(), Pattern::any()),
        ]);

        let pointer_variable = Pattern::all_of([
            Pattern::kinds([NodeKind::VariableReference, NodeKind::MemberAccess]),
            Pattern::of_type(TypeCategory::Pointer),
        ]);
        let pointer_operation = Pattern::any_of([
            pointer_variable.clone(),
            Pattern::all_of([
                arithmetic,
                Pattern::has_operands(numeric_value.clone(), pointer_variable.clone()),
            ]),
        ]);
        let pointer_comparison = Pattern::all_of([
            Pattern::binary_operator(config.relational_operators.iter().cloned()),
            Pattern::has_operands(pointer_operation.clone(), pointer_operation.clone()),
        ]);

        let null_test = |op: &str| {
            Pattern::all_of([
                Pattern::binary_operator([op]),
                Pattern::has_operands(
                    Pattern::ignoring(VALUE_WRAPPERS, pointer_variable.clone()),
                    Pattern::ignoring(VALUE_WRAPPERS, null_constant.clone()),
                ),
            ])
        };
        let equals_null = null_test("==");
        let not_equals_null = null_test("!=");

        let jump = Pattern::kind(NodeKind::JumpStatement);
        let jump_statement = if config.noreturn_functions.is_empty() {
            jump
        } else {
            Pattern::any_of([
                jump,
                Pattern::all_of([
                    Pattern::kind(NodeKind::ExpressionStatement),
                    Pattern::has_child(
                        Role::Expression,
                        Pattern::ignoring(
                            VALUE_WRAPPERS,
                            Pattern::callee(config.noreturn_functions.iter().cloned()),
                        ),
                    ),
                ]),
            ])
        };

        Self {
            null_constant,
            numeric_literal,
            numeric_variable,
            single_argument_call,
            numeric_value,
            numeric_operation,
            numeric_comparison,
            pointer_variable,
            pointer_operation,
            pointer_comparison,
            equals_null,
            not_equals_null,
            jump_statement,
        }
    }
}

impl Default for Classifiers {
    fn default() -> Self {
        Self::build(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{C, Language};
    use crate::node::Node;

    const PRELUDE: &str = "struct buf { int len; char *data; };\n\
                           unsigned long strlen(const char *s);\n\
                           int pair(int a, int b);\n";
    const PARAMS: &str = "int n, int x, char *p, char *q, char *end, double d, struct buf *b";

    /// Whether `select(classifiers)` matches the condition expression `expr`.
    fn classify(classifiers: &Classifiers, select: fn(&Classifiers) -> &Pattern, expr: &str) -> bool {
        let source = format!("{PRELUDE}void f({PARAMS}) {{ if ({expr}) ; }}");
        let tree = C.build_tree(&source).unwrap();
        let condition: Node = tree
            .root()
            .descendants()
            .find(|n| n.kind() == NodeKind::IfStatement)
            .and_then(|n| n.child(Role::Condition))
            .unwrap();
        select(classifiers).is_match(condition)
    }

    fn check(select: fn(&Classifiers) -> &Pattern, cases: &[(&str, bool)]) {
        let classifiers = Classifiers::default();
        for &(expr, expected) in cases {
            assert_eq!(classify(&classifiers, select, expr), expected, "{expr}");
        }
    }

    #[test]
    fn test_null_constant() {
        check(
            |c| &c.null_constant,
            &[
                ("NULL", true),
                ("0", true),
                ("(void *)0", true),
                ("1", false),
                ("((void *)0)", false),
            ],
        );
    }

    #[test]
    fn test_numeric_value() {
        check(
            |c| &c.numeric_value,
            &[
                ("x", true),
                ("(long)x", true),
                ("(x)", true),
                ("b->len", true),
                ("42", true),
                ("strlen(p)", true),
                ("sizeof(p)", true),
                ("pair(n, x)", false),
                ("p", false),
                ("d", false),
                ("1.5", false),
            ],
        );
    }

    #[test]
    fn test_numeric_operation() {
        check(
            |c| &c.numeric_operation,
            &[
                ("n + 1", true),
                ("x << 2", true),
                ("b->len % 8", true),
                ("n + d", false),
                ("n + 1 + 2", false),
            ],
        );
    }

    #[test]
    fn test_numeric_comparison_needs_one_numeric_side() {
        check(
            |c| &c.numeric_comparison,
            &[
                ("n > 10", true),
                ("n < -10", true),
                ("-10 < n", true),
                ("x == 0", true),
                ("n + 1 >= d", true),
                ("d > 1.5", false),
                ("p < q", false),
                ("n + x", false),
            ],
        );
    }

    #[test]
    fn test_pointer_comparison_needs_both_sides() {
        check(
            |c| &c.pointer_comparison,
            &[
                ("p < end", true),
                ("p + n >= end", true),
                ("b->data < end", true),
                ("p == q", false),
                ("p < n", false),
            ],
        );
    }

    #[test]
    fn test_null_tests() {
        check(
            |c| &c.equals_null,
            &[
                ("p == NULL", true),
                ("NULL == p", true),
                ("b->data == (void *)0", true),
                ("(p) == ((void *)0)", true),
                ("p != NULL", false),
                ("x == 0", false),
            ],
        );
        check(
            |c| &c.not_equals_null,
            &[("p != NULL", true), ("0 != b", true), ("p == NULL", false)],
        );
    }

    #[test]
    fn test_noreturn_calls_are_jumps_only_when_configured() {
        let source = "void abort(void); void f(void) { abort(); return; }";
        let tree = C.build_tree(source).unwrap();
        let call_stmt = tree
            .root()
            .descendants()
            .find(|n| n.kind() == NodeKind::ExpressionStatement)
            .unwrap();

        assert!(!Classifiers::default().jump_statement.is_match(call_stmt));

        let config = ClassifierConfig {
            noreturn_functions: vec!["abort".to_string()],
            ..Default::default()
        };
        let classifiers = Classifiers::new(&config).unwrap();
        assert!(classifiers.jump_statement.is_match(call_stmt));
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let config = ClassifierConfig {
            arithmetic_operators: vec!["+".to_string(), "**".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            Classifiers::new(&config),
            Err(FixrevError::UnknownOperator(op)) if op == "**"
        ));
    }
}
