//! # fixrev
//!
//! A source-to-source rewrite engine that reverts defensive guards in C code.
//!
//! Statements are matched against declarative structural patterns built from
//! a small combinator algebra. Each match yields an [`apply::Edit`]: a source
//! range, its replacement text and an explanatory message.
//!
//! Two checks ship with the engine:
//!
//! - `fixrev-abort` turns early-exit guards such as
//!   `if (p == NULL || n > 10) return;` into `if (0) return;`.
//! - `fixrev-exec` splices guards around jump-free bodies, such as
//!   `while (p != NULL && n > 0) { ... }`, into unconditional code.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fixrev::prelude::*;
//!
//! let result = Fixrev::in_dir("./src")
//!     .files(|f| f.exclude("vendor/**"))
//!     .dry_run()
//!     .run()?;
//!
//! println!("{}", result.diff());
//! println!("{}", result.summary);
//! # Ok::<(), fixrev::error::FixrevError>(())
//! ```
//!
//! ## Running rules on a single buffer
//!
//! ```rust
//! use fixrev::prelude::*;
//!
//! let classifiers = Classifiers::default();
//! let rules = RuleSet::new(vec![abort_rule(&classifiers, &AbortConfig::default())?]);
//!
//! let tree = C.build_tree("void f(int *p) { if (p == NULL) { return; } }")?;
//! let edits = rules.collect(&tree);
//!
//! assert_eq!(edits[0].replacement, "if (0) { return; }");
//! assert_eq!(edits[0].message, "revert abort condition: p == NULL");
//! # Ok::<(), fixrev::error::FixrevError>(())
//! ```

pub mod apply;
pub mod classify;
pub mod config;
pub mod diff;
pub mod driver;
pub mod error;
pub mod lang;
pub mod node;
pub mod pattern;
pub mod rule;
pub mod transform;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::apply::{Edit, EditSink, RuleSet};
    pub use crate::classify::{ClassifierConfig, Classifiers};
    pub use crate::config::FixrevConfig;
    pub use crate::diff::DiffSummary;
    pub use crate::driver::{FileFailure, Fixrev, FixrevResult, SourceSelector};
    pub use crate::error::{FixrevError, Result};
    pub use crate::lang::{C, Language, LanguageRegistry};
    pub use crate::node::{Node, NodeKind, SyntaxTree};
    pub use crate::pattern::{MatchResult, Pattern};
    pub use crate::rule::{
        ABORT_CHECK, AbortConfig, CHECKS, EXEC_CHECK, ExecConfig, Rule, Trigger, abort_rule,
        exec_rules,
    };
    pub use crate::transform::{FileChange, RuleTransform, Transform, apply_edits};
}

pub use prelude::*;
