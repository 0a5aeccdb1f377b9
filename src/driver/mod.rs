//! Multi-file runner and DSL entry point.

mod files;

pub use files::SourceSelector;

use crate::apply::Edit;
use crate::config::FixrevConfig;
use crate::diff::{DiffSummary, colorized_diff, unified_diff};
use crate::error::{FixrevError, Result};
use crate::lang::LanguageRegistry;
use crate::transform::{FileChange, RuleTransform};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A file that could not be processed.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: FixrevError,
}

/// The result of a fixrev run.
#[derive(Debug, Default)]
pub struct FixrevResult {
    /// One entry per processed file, in path order.
    pub changes: Vec<FileChange>,
    pub failures: Vec<FileFailure>,
    pub summary: DiffSummary,
}

impl FixrevResult {
    /// Every emitted edit with the file it belongs to.
    pub fn edits(&self) -> impl Iterator<Item = (&Path, &Edit)> {
        self.changes
            .iter()
            .flat_map(|c| c.edits.iter().map(move |e| (c.path.as_path(), e)))
    }

    pub fn edit_count(&self) -> usize {
        self.changes.iter().map(|c| c.edits.len()).sum()
    }

    /// Returns the number of files that were modified.
    pub fn files_modified(&self) -> usize {
        self.changes.iter().filter(|c| c.is_modified()).count()
    }

    /// Generates a unified diff of all changes.
    pub fn diff(&self) -> String {
        self.changes
            .iter()
            .filter(|c| c.is_modified())
            .map(|c| unified_diff(&c.original, &c.transformed, &c.path))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Generates a colorized diff for terminal display.
    pub fn colorized_diff(&self) -> String {
        self.changes
            .iter()
            .filter(|c| c.is_modified())
            .map(|c| colorized_diff(&c.original, &c.transformed, &c.path))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Runs the configured checks over a directory tree or a single file.
///
/// ```rust,no_run
/// use fixrev::prelude::*;
///
/// let result = Fixrev::in_dir("./src")
///     .files(|f| f.exclude("third_party/**"))
///     .checks(["fixrev-abort"])
///     .dry_run()
///     .run()?;
///
/// for (path, edit) in result.edits() {
///     println!("{}:{}:{}: {}", path.display(), edit.line, edit.column, edit.message);
/// }
/// # Ok::<(), fixrev::error::FixrevError>(())
/// ```
pub struct Fixrev {
    root: PathBuf,
    selector: Option<SourceSelector>,
    config: FixrevConfig,
    dry_run: bool,
}

impl Fixrev {
    pub fn in_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            root: path.into(),
            selector: None,
            config: FixrevConfig::default(),
            dry_run: false,
        }
    }

    pub fn current_dir() -> Result<Self> {
        Ok(Self::in_dir(std::env::current_dir()?))
    }

    /// Narrows the set of files to process.
    ///
    /// Without an explicit extension the selector only picks files of the
    /// registered languages.
    pub fn files<F>(mut self, f: F) -> Self
    where
        F: FnOnce(SourceSelector) -> SourceSelector,
    {
        self.selector = Some(f(SourceSelector::new()));
        self
    }

    pub fn config(mut self, config: FixrevConfig) -> Self {
        self.config = config;
        self
    }

    /// Restricts the run to the given checks.
    pub fn checks<I, S>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config = self.config.with_checks(checks);
        self
    }

    /// Enables dry-run mode (preview changes without applying).
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs the checks and, unless in dry-run mode, writes the rewritten
    /// files back.
    ///
    /// Files that cannot be read or parsed are reported in
    /// [`FixrevResult::failures`] and left untouched.
    pub fn run(self) -> Result<FixrevResult> {
        if !self.root.exists() {
            return Err(FixrevError::PathNotFound(self.root));
        }

        let transform = RuleTransform::new(self.config.build_rule_set()?);
        let files = self.select_files()?;
        if files.is_empty() {
            return Err(FixrevError::NoFilesMatched);
        }
        info!(files = files.len(), root = %self.root.display(), "running checks");

        let outcomes: Vec<(PathBuf, Result<FileChange>)> = files
            .into_par_iter()
            .map(|path| {
                let outcome = fs::read_to_string(&path)
                    .map_err(FixrevError::from)
                    .and_then(|source| transform.run(&source, &path));
                (path, outcome)
            })
            .collect();

        let mut result = FixrevResult::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(change) => {
                    let summary = DiffSummary::from_diff(&change.original, &change.transformed)
                        .with_edits(change.edits.len());
                    result.summary.merge(&summary);
                    result.changes.push(change);
                }
                Err(error) => {
                    warn!(path = %path.display(), "skipping file: {error}");
                    result.failures.push(FileFailure { path, error });
                }
            }
        }

        if !self.dry_run {
            for change in &result.changes {
                change.apply()?;
                if change.is_modified() {
                    debug!(path = %change.path.display(), edits = change.edits.len(), "rewrote");
                }
            }
        }

        Ok(result)
    }

    /// Runs in dry-run mode and returns the diff.
    pub fn preview(self) -> Result<String> {
        let result = self.dry_run().run()?;
        Ok(result.diff())
    }

    fn select_files(&self) -> Result<Vec<PathBuf>> {
        let mut selector = self.selector.clone().unwrap_or_default();
        if !selector.has_extensions() {
            selector = selector.extensions(LanguageRegistry::new().extensions());
        }
        for pattern in &self.config.exclude_patterns {
            selector = selector.exclude(pattern.as_str());
        }
        selector.collect(&self.root)
    }
}
