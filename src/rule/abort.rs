//! Abort check: reverts defensive early-exit guards.
//!
//! `if (p == NULL || n > 10) return;` becomes `if (0) return;`. The guard is
//! disabled but the branch stays in place for review.

use super::{Rule, Trigger};
use crate::classify::Classifiers;
use crate::error::Result;
use crate::node::NodeKind;
use crate::pattern::Pattern;
use serde::{Deserialize, Serialize};

pub const ABORT_CHECK: &str = "fixrev-abort";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbortConfig {
    /// Fewest `||` operators in the condition.
    pub min_depth: usize,
    /// Most `||` operators in the condition.
    pub max_depth: usize,
    /// Largest block, in direct statements, still treated as an abort branch.
    pub max_statement_count: usize,
    pub edit_template: String,
    pub message_template: String,
}

impl Default for AbortConfig {
    fn default() -> Self {
        Self {
            min_depth: 0,
            max_depth: 4,
            max_statement_count: 3,
            edit_template: "if (0) @T".to_string(),
            message_template: "revert abort condition: @C".to_string(),
        }
    }
}

/// Builds the abort rule over `if` statements.
pub fn abort_rule(classifiers: &Classifiers, config: &AbortConfig) -> Result<Rule> {
    let disjunct = Pattern::any_of([
        classifiers.equals_null.clone(),
        classifiers.pointer_comparison.clone(),
        classifiers.numeric_comparison.clone(),
    ]);
    let condition = Pattern::operator_chain(disjunct, "||", config.min_depth, config.max_depth)?;

    let jump = classifiers.jump_statement.clone();
    let body = Pattern::any_of([
        jump.clone(),
        Pattern::all_of([
            Pattern::kind(NodeKind::CompoundStatement),
            Pattern::count_at_most(config.max_statement_count),
            Pattern::has_descendant(jump),
        ]),
    ]);

    Rule::builder("abort")
        .check(ABORT_CHECK)
        .on(Trigger::If)
        .condition(condition)
        .body(body)
        .edit(config.edit_template.as_str())
        .message(config.message_template.as_str())
        .build()
}
