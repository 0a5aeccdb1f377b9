//! Applying rule edits to source text.

pub mod rules;

pub use rules::RuleTransform;

use crate::apply::Edit;
use crate::error::{FixrevError, Result};
use std::path::{Path, PathBuf};

/// A source-to-source transformation over one file.
pub trait Transform: Send + Sync {
    /// Applies the transformation to the given source code.
    fn apply(&self, source: &str, path: &Path) -> Result<String>;

    /// Returns a description of the transformation.
    fn describe(&self) -> String;
}

/// Splices `edits` into `source`.
///
/// Edits may arrive in any order. They are applied back to front so earlier
/// offsets stay valid; overlapping or out-of-range edits are rejected and
/// leave nothing applied.
pub fn apply_edits(source: &str, edits: &[Edit]) -> Result<String> {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by_key(|edit| (edit.start, edit.end));

    for edit in &ordered {
        if edit.start > edit.end
            || edit.end > source.len()
            || !source.is_char_boundary(edit.start)
            || !source.is_char_boundary(edit.end)
        {
            return Err(FixrevError::EditOutOfRange {
                start: edit.start,
                end: edit.end,
                len: source.len(),
            });
        }
    }
    for pair in ordered.windows(2) {
        if pair[0].end > pair[1].start {
            return Err(FixrevError::OverlappingEdits {
                first_end: pair[0].end,
                second_start: pair[1].start,
            });
        }
    }

    let mut result = source.to_string();
    for edit in ordered.iter().rev() {
        result.replace_range(edit.range(), &edit.replacement);
    }
    Ok(result)
}

/// The outcome of running the rules over one file.
#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: PathBuf,
    pub original: String,
    pub transformed: String,
    pub edits: Vec<Edit>,
}

impl FileChange {
    /// Returns true if the content was modified.
    pub fn is_modified(&self) -> bool {
        self.original != self.transformed
    }

    /// Writes the transformed content to disk.
    pub fn apply(&self) -> Result<()> {
        if self.is_modified() {
            std::fs::write(&self.path, &self.transformed)?;
        }
        Ok(())
    }
}
