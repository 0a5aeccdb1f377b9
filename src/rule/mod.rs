//! Rewrite rules.
//!
//! A [`Rule`] ties a statement trigger to a condition pattern (captured as
//! `C`), a body pattern (captured as `T`), an edit template and a message
//! template. Rules are immutable values built once and reused for every
//! translation unit.

pub mod abort;
pub mod exec;
mod template;

pub use abort::{ABORT_CHECK, AbortConfig, abort_rule};
pub use exec::{EXEC_CHECK, ExecConfig, exec_rules};
pub use template::Template;

use crate::apply::Edit;
use crate::error::{FixrevError, Result};
use crate::node::{Node, NodeKind, Role};
use crate::pattern::{Bindings, Pattern};

/// Capture name of a rule's condition.
pub const CONDITION: &str = "C";

/// Capture name of a rule's body.
pub const BODY: &str = "T";

/// Every check shipped with the engine.
pub const CHECKS: &[&str] = &[ABORT_CHECK, EXEC_CHECK];

/// Statement shapes a rule can be triggered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    If,
    While,
    For,
}

impl Trigger {
    pub fn kind(self) -> NodeKind {
        match self {
            Trigger::If => NodeKind::IfStatement,
            Trigger::While => NodeKind::WhileStatement,
            Trigger::For => NodeKind::ForStatement,
        }
    }

    /// Role of the child the body pattern is tested against.
    pub fn body_role(self) -> Role {
        match self {
            Trigger::If => Role::Then,
            Trigger::While | Trigger::For => Role::Body,
        }
    }
}

/// A rewrite rule.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    check: String,
    triggers: Vec<Trigger>,
    condition: Pattern,
    body: Pattern,
    edit: Template,
    message: Template,
}

impl Rule {
    pub fn builder(name: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the check this rule belongs to.
    pub fn check(&self) -> &str {
        &self.check
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn edit_template(&self) -> &Template {
        &self.edit
    }

    pub fn message_template(&self) -> &Template {
        &self.message
    }

    /// The trigger that makes `node` a candidate for this rule.
    pub fn trigger_for(&self, node: Node<'_>) -> Option<Trigger> {
        self.triggers
            .iter()
            .copied()
            .find(|trigger| trigger.kind() == node.kind())
    }

    /// Tests a candidate statement. The body is only examined once the
    /// condition has matched.
    pub fn try_match<'r, 't>(&'r self, statement: Node<'t>) -> Option<RuleMatch<'r, 't>> {
        let trigger = self.trigger_for(statement)?;
        let condition = self.condition.matches(statement.child(Role::Condition)?)?;
        let body = self.body.matches(statement.child(trigger.body_role())?)?;

        let mut bindings = condition.into_bindings();
        bindings.merge(body.into_bindings());
        Some(RuleMatch {
            rule: self,
            statement,
            bindings,
        })
    }
}

/// A statement that fully matched a rule.
#[derive(Debug)]
pub struct RuleMatch<'r, 't> {
    rule: &'r Rule,
    statement: Node<'t>,
    bindings: Bindings<'t>,
}

impl<'r, 't> RuleMatch<'r, 't> {
    pub fn rule(&self) -> &'r Rule {
        self.rule
    }

    pub fn statement(&self) -> Node<'t> {
        self.statement
    }

    pub fn bindings(&self) -> &Bindings<'t> {
        &self.bindings
    }

    /// Renders the rule's templates into an edit over the whole statement.
    pub fn to_edit(&self) -> Result<Edit> {
        let replacement = self.rule.edit.render(&self.bindings)?;
        let message = self.rule.message.render(&self.bindings)?;
        let range = self.statement.range();
        let (line, column) = self.statement.tree().line_col(range.start);
        Ok(Edit {
            check: self.rule.check.clone(),
            rule: self.rule.name.clone(),
            start: range.start,
            end: range.end,
            line,
            column,
            replacement,
            message,
        })
    }
}

/// Builder for [`Rule`]. All validation happens in [`RuleBuilder::build`].
pub struct RuleBuilder {
    name: String,
    check: Option<String>,
    triggers: Vec<Trigger>,
    condition: Option<Pattern>,
    body: Option<Pattern>,
    edit: Option<String>,
    message: Option<String>,
}

impl RuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            check: None,
            triggers: Vec::new(),
            condition: None,
            body: None,
            edit: None,
            message: None,
        }
    }

    /// Groups the rule under a check name. Defaults to the rule name.
    pub fn check(mut self, check: impl Into<String>) -> Self {
        self.check = Some(check.into());
        self
    }

    pub fn on(mut self, trigger: Trigger) -> Self {
        if !self.triggers.contains(&trigger) {
            self.triggers.push(trigger);
        }
        self
    }

    /// Pattern for the statement's condition, captured as `C`.
    pub fn condition(mut self, pattern: Pattern) -> Self {
        self.condition = Some(pattern);
        self
    }

    /// Pattern for the statement's body or then-branch, captured as `T`.
    pub fn body(mut self, pattern: Pattern) -> Self {
        self.body = Some(pattern);
        self
    }

    pub fn edit(mut self, template: impl Into<String>) -> Self {
        self.edit = Some(template.into());
        self
    }

    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    pub fn build(self) -> Result<Rule> {
        let missing = |what: &str| {
            FixrevError::InvalidPattern(format!("rule '{}' has no {what}", self.name))
        };
        if self.triggers.is_empty() {
            return Err(missing("trigger"));
        }
        let condition = self.condition.clone().ok_or_else(|| missing("condition pattern"))?;
        let body = self.body.clone().ok_or_else(|| missing("body pattern"))?;
        let edit = Template::parse(self.edit.as_deref().ok_or_else(|| missing("edit template"))?)?;
        let message =
            Template::parse(self.message.as_deref().ok_or_else(|| missing("message template"))?)?;

        let condition = condition.bind(CONDITION);
        let body = body.bind(BODY);

        let mut available = condition.guaranteed_captures();
        available.extend(body.guaranteed_captures());
        for capture in edit.captures().chain(message.captures()) {
            if !available.contains(capture) {
                return Err(FixrevError::UnboundCapture {
                    rule: self.name.clone(),
                    capture: capture.to_string(),
                });
            }
        }

        Ok(Rule {
            check: self.check.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            triggers: self.triggers,
            condition,
            body,
            edit,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{C, Language};

    fn comparison_rule() -> RuleBuilder {
        Rule::builder("cmp")
            .on(Trigger::While)
            .condition(Pattern::binary_operator(["<"]))
            .body(Pattern::any())
            .edit("/* @C */ @T")
            .message("saw @C")
    }

    #[test]
    fn test_build_and_match() {
        let rule = comparison_rule().build().unwrap();
        assert_eq!(rule.check(), "cmp");

        let tree = C
            .build_tree("void f(int i, int n) { while (i < n) i++; if (i < n) i++; }")
            .unwrap();
        let statements: Vec<Node> = tree
            .root()
            .descendants()
            .filter(|n| matches!(n.kind(), NodeKind::WhileStatement | NodeKind::IfStatement))
            .collect();

        let found = rule.try_match(statements[0]).unwrap();
        assert_eq!(found.bindings().text(CONDITION), Some("i < n"));
        assert_eq!(found.bindings().text(BODY), Some("i++;"));

        let edit = found.to_edit().unwrap();
        assert_eq!(edit.replacement, "/* i < n */ i++;");
        assert_eq!(edit.message, "saw i < n");
        assert_eq!(&tree.source()[edit.range()], "while (i < n) i++;");

        // Same shape, wrong trigger.
        assert!(rule.try_match(statements[1]).is_none());
    }

    #[test]
    fn test_unbound_capture_is_a_build_error() {
        let err = comparison_rule().edit("@C @X").build().unwrap_err();
        assert!(matches!(
            err,
            FixrevError::UnboundCapture { ref capture, .. } if capture == "X"
        ));
    }

    #[test]
    fn test_capture_bound_in_only_one_branch_is_rejected() {
        let err = comparison_rule()
            .condition(Pattern::any_of([
                Pattern::binary_operator(["<"]).bind("lt"),
                Pattern::binary_operator([">"]),
            ]))
            .message("@lt")
            .build()
            .unwrap_err();
        assert!(matches!(err, FixrevError::UnboundCapture { .. }));
    }

    #[test]
    fn test_inner_captures_are_available() {
        let rule = comparison_rule()
            .condition(Pattern::all_of([
                Pattern::binary_operator(["<"]),
                Pattern::has_child(Role::Left, Pattern::any().bind("lhs")),
            ]))
            .message("lhs is @lhs")
            .check("custom")
            .build()
            .unwrap();
        assert_eq!(rule.check(), "custom");
    }

    #[test]
    fn test_missing_parts_are_errors() {
        assert!(Rule::builder("empty").build().is_err());
        let no_body = Rule::builder("no-body")
            .on(Trigger::If)
            .condition(Pattern::any())
            .edit("x")
            .message("y")
            .build();
        assert!(matches!(no_body, Err(FixrevError::InvalidPattern(_))));
    }
}
