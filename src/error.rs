//! Error types for the fixrev engine.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for fixrev operations.
///
/// A pattern that simply fails to match is never an error; these variants
/// cover malformed patterns and rules, front-end failures, and I/O.
#[derive(Error, Debug)]
pub enum FixrevError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error for {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("Malformed syntax tree: {0}")]
    MalformedTree(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Invalid template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("Rule '{rule}' references capture '@{capture}' that its patterns never bind")]
    UnboundCapture { rule: String, capture: String },

    #[error("Capture '@{0}' is not bound by this match")]
    MissingCapture(String),

    #[error("Unknown check: {0}")]
    UnknownCheck(String),

    #[error("Edits overlap at bytes {first_end} > {second_start}")]
    OverlappingEdits {
        first_end: usize,
        second_start: usize,
    },

    #[error("Edit range {start}..{end} is outside a source of length {len}")]
    EditOutOfRange { start: usize, end: usize, len: usize },

    #[error("No files matched the specified criteria")]
    NoFilesMatched,

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A specialized Result type for fixrev operations.
pub type Result<T> = std::result::Result<T, FixrevError>;
