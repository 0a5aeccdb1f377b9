//! Source file selection.

use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Predicates for picking the translation units to process.
#[derive(Debug, Default, Clone)]
pub struct SourceSelector {
    extensions: Vec<String>,
    include_globs: Vec<String>,
    exclude_globs: Vec<String>,
    content_patterns: Vec<String>,
    name_patterns: Vec<String>,
    max_size: Option<u64>,
}

impl SourceSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches files with the given extension (without dot).
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.push(ext.into());
        self
    }

    /// Matches files with any of the given extensions.
    pub fn extensions(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions.extend(exts.into_iter().map(Into::into));
        self
    }

    /// Includes files matching the glob pattern.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_globs.push(pattern.into());
        self
    }

    /// Excludes files matching the glob pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_globs.push(pattern.into());
        self
    }

    /// Matches files containing the given regex pattern.
    pub fn contains_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.content_patterns.push(pattern.into());
        self
    }

    /// Matches files whose name matches the regex pattern.
    pub fn name_matches(mut self, pattern: impl Into<String>) -> Self {
        self.name_patterns.push(pattern.into());
        self
    }

    /// Skips files larger than the given size in bytes.
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    pub fn has_extensions(&self) -> bool {
        !self.extensions.is_empty()
    }

    /// Collects matching files under `root`, sorted by path.
    ///
    /// A `root` that is itself a file is tested on its own; globs are then
    /// matched against its file name.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let include_set = build_glob_set(&self.include_globs)?;
        let exclude_set = build_glob_set(&self.exclude_globs)?;
        let content_regexes = compile_patterns(&self.content_patterns)?;
        let name_regexes = compile_patterns(&self.name_patterns)?;

        let mut matched = Vec::new();

        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }

            if !self.extensions.is_empty() {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if !self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
                    continue;
                }
            }

            let rel_path = match path.strip_prefix(root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel,
                _ => Path::new(path.file_name().unwrap_or(path.as_os_str())),
            };
            if !self.include_globs.is_empty() && !include_set.is_match(rel_path) {
                continue;
            }
            if exclude_set.is_match(rel_path) {
                continue;
            }

            if !name_regexes.is_empty() {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                if !name_regexes.iter().any(|re| re.is_match(name)) {
                    continue;
                }
            }

            if let Some(max) = self.max_size
                && entry.metadata().map(|m| m.len() > max).unwrap_or(true)
            {
                continue;
            }

            // Reads the file, so it goes last.
            if !content_regexes.is_empty() {
                let Ok(content) = fs::read_to_string(path) else {
                    continue;
                };
                if !content_regexes.iter().any(|re| re.is_match(&content)) {
                    continue;
                }
            }

            matched.push(path.to_path_buf());
        }

        matched.sort();
        Ok(matched)
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| Ok(Regex::new(p)?)).collect()
}
