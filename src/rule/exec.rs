//! Exec check: reverts guards around straight-line code.
//!
//! A conjunction of null tests and comparisons guarding a body without any
//! jump is spliced into unconditional code: the condition text followed by
//! the body text. One rule instance exists per construct (`if`, `for`,
//! `while`), registered in that order.

use super::{Rule, Trigger};
use crate::classify::Classifiers;
use crate::error::Result;
use crate::pattern::Pattern;
use serde::{Deserialize, Serialize};

pub const EXEC_CHECK: &str = "fixrev-exec";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Fewest `&&` operators in the condition.
    pub min_depth: usize,
    /// Most `&&` operators in the condition.
    pub max_depth: usize,
    pub edit_template: String,
    pub message_template: String,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            min_depth: 1,
            max_depth: 4,
            edit_template: "@C@T".to_string(),
            message_template: "revert exec condition: @C".to_string(),
        }
    }
}

/// Builds the `exec-if`, `exec-for` and `exec-while` rules, in that order.
pub fn exec_rules(classifiers: &Classifiers, config: &ExecConfig) -> Result<Vec<Rule>> {
    let conjunct = Pattern::any_of([
        classifiers.not_equals_null.clone(),
        classifiers.pointer_comparison.clone(),
        classifiers.numeric_comparison.clone(),
    ]);
    let condition = Pattern::operator_chain(conjunct, "&&", config.min_depth, config.max_depth)?;
    let body = Pattern::unless(Pattern::has_descendant_or_self(
        classifiers.jump_statement.clone(),
    ));

    [
        ("exec-if", Trigger::If),
        ("exec-for", Trigger::For),
        ("exec-while", Trigger::While),
    ]
    .into_iter()
    .map(|(name, trigger)| {
        Rule::builder(name)
            .check(EXEC_CHECK)
            .on(trigger)
            .condition(condition.clone())
            .body(body.clone())
            .edit(config.edit_template.as_str())
            .message(config.message_template.as_str())
            .build()
    })
    .collect()
}
