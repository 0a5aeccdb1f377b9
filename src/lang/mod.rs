//! Front ends that turn source text into the node model.

mod c;

pub use c::C;

use crate::error::{FixrevError, Result};
use crate::node::SyntaxTree;
use std::path::Path;
use tree_sitter::{Language as TsLanguage, Parser, Tree};

/// A source language the rewrite engine can run on.
pub trait Language: Send + Sync {
    /// Returns the name of the language.
    fn name(&self) -> &'static str;

    /// Returns the file extensions associated with this language.
    fn extensions(&self) -> &[&'static str];

    /// Returns the tree-sitter language grammar.
    fn grammar(&self) -> TsLanguage;

    /// Parses source code into a tree-sitter tree.
    fn parse(&self, source: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar())
            .map_err(|e| FixrevError::Parse {
                path: Path::new("<source>").to_path_buf(),
                message: format!("Failed to set language: {e}"),
            })?;

        parser.parse(source, None).ok_or_else(|| FixrevError::Parse {
            path: Path::new("<source>").to_path_buf(),
            message: "Failed to parse source".to_string(),
        })
    }

    /// Parses and lowers source code into an immutable [`SyntaxTree`].
    fn build_tree(&self, source: &str) -> Result<SyntaxTree>;

    /// Checks if this language handles the given file extension.
    fn matches_extension(&self, ext: &str) -> bool {
        self.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Registry of supported languages.
#[derive(Default)]
pub struct LanguageRegistry {
    languages: Vec<Box<dyn Language>>,
}

impl LanguageRegistry {
    /// Creates a new registry with all built-in languages.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(Box::new(C));
        registry
    }

    /// Registers a new language.
    pub fn register(&mut self, lang: Box<dyn Language>) {
        self.languages.push(lang);
    }

    /// Finds a language by file extension.
    pub fn by_extension(&self, ext: &str) -> Option<&dyn Language> {
        self.languages
            .iter()
            .find(|l| l.matches_extension(ext))
            .map(|l| l.as_ref())
    }

    /// Finds a language by name.
    pub fn by_name(&self, name: &str) -> Option<&dyn Language> {
        self.languages
            .iter()
            .find(|l| l.name().eq_ignore_ascii_case(name))
            .map(|l| l.as_ref())
    }

    /// Detects the language for a given file path.
    pub fn detect(&self, path: &Path) -> Option<&dyn Language> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension(ext))
    }

    /// All extensions handled by the registered languages.
    pub fn extensions(&self) -> Vec<&'static str> {
        self.languages
            .iter()
            .flat_map(|l| l.extensions().iter().copied())
            .collect()
    }
}
