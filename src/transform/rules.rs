//! Rule-driven transformation of whole files.

use super::{FileChange, Transform, apply_edits};
use crate::apply::{Edit, RuleSet};
use crate::error::{FixrevError, Result};
use crate::lang::LanguageRegistry;
use std::path::Path;
use tracing::debug;

/// Runs a [`RuleSet`] over files of any registered language.
pub struct RuleTransform {
    rules: RuleSet,
    registry: LanguageRegistry,
}

impl RuleTransform {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            registry: LanguageRegistry::new(),
        }
    }

    /// Uses a custom language registry.
    pub fn with_registry(mut self, registry: LanguageRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Parses `source` and returns the edits the rules emit for it.
    pub fn check(&self, source: &str, path: &Path) -> Result<Vec<Edit>> {
        let lang = self.registry.detect(path).ok_or_else(|| {
            FixrevError::UnsupportedLanguage(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            )
        })?;

        let tree = lang.build_tree(source).map_err(|e| match e {
            FixrevError::Parse { message, .. } => FixrevError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        let edits = self.rules.collect(&tree);
        debug!(path = %path.display(), edits = edits.len(), "checked");
        Ok(edits)
    }

    /// Checks `source` and applies the resulting edits.
    pub fn run(&self, source: &str, path: &Path) -> Result<FileChange> {
        let edits = self.check(source, path)?;
        let transformed = apply_edits(source, &edits)?;
        Ok(FileChange {
            path: path.to_path_buf(),
            original: source.to_string(),
            transformed,
            edits,
        })
    }
}

impl Transform for RuleTransform {
    fn apply(&self, source: &str, path: &Path) -> Result<String> {
        Ok(self.run(source, path)?.transformed)
    }

    fn describe(&self) -> String {
        let names: Vec<&str> = self.rules.rules().iter().map(|r| r.name()).collect();
        format!("Apply rules: {}", names.join(", "))
    }
}
