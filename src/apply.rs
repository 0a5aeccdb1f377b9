//! Rule application.
//!
//! A [`RuleSet`] walks a tree's statements in source order and hands one
//! [`Edit`] per matched statement to an [`EditSink`].

use crate::node::{Node, SyntaxTree};
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, trace, warn};

/// A located rewrite: replace `start..end` of the source with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Check the emitting rule belongs to.
    pub check: String,
    pub rule: String,
    pub start: usize,
    pub end: usize,
    /// 1-based line of `start`.
    pub line: usize,
    /// 1-based column of `start`, in characters.
    pub column: usize,
    pub replacement: String,
    /// Informational diagnostic; never applied to the source.
    pub message: String,
}

impl Edit {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Receiver of emitted edits.
pub trait EditSink {
    fn emit(&mut self, edit: Edit);
}

impl EditSink for Vec<Edit> {
    fn emit(&mut self, edit: Edit) {
        self.push(edit);
    }
}

/// An ordered list of rules applied with first-match-wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    statement_budget: Option<usize>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            statement_budget: None,
        }
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Stops scanning after `budget` candidate statements per tree.
    pub fn with_statement_budget(mut self, budget: usize) -> Self {
        self.statement_budget = Some(budget);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Scans `tree` and emits an edit for each matched statement. Returns the
    /// number of edits emitted.
    ///
    /// Statements are visited in pre-order. The first rule that matches a
    /// statement wins, and nothing inside an edited statement is examined.
    pub fn apply(&self, tree: &SyntaxTree, sink: &mut dyn EditSink) -> usize {
        let mut stack = vec![tree.root()];
        let mut examined = 0;
        let mut emitted = 0;

        while let Some(node) = stack.pop() {
            if self.is_candidate(node) {
                if self.statement_budget.is_some_and(|budget| examined >= budget) {
                    debug!(examined, "statement budget exhausted");
                    break;
                }
                examined += 1;

                if let Some(edit) = self.first_match(node) {
                    debug!(
                        rule = %edit.rule,
                        line = edit.line,
                        column = edit.column,
                        "{}",
                        edit.message
                    );
                    sink.emit(edit);
                    emitted += 1;
                    continue;
                }
            }

            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }

        emitted
    }

    /// Collects the edits for `tree` into a vector.
    pub fn collect(&self, tree: &SyntaxTree) -> Vec<Edit> {
        let mut edits = Vec::new();
        self.apply(tree, &mut edits);
        edits
    }

    fn is_candidate(&self, node: Node<'_>) -> bool {
        node.kind().is_statement() && self.rules.iter().any(|rule| rule.trigger_for(node).is_some())
    }

    fn first_match(&self, statement: Node<'_>) -> Option<Edit> {
        for rule in &self.rules {
            let Some(found) = rule.try_match(statement) else {
                continue;
            };
            match found.to_edit() {
                Ok(edit) => return Some(edit),
                Err(e) => warn!(rule = rule.name(), "failed to render edit: {e}"),
            }
        }
        trace!(statement = ?statement, "no rule matched");
        None
    }
}
