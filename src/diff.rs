//! Diff previews of rewritten files.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::fmt;
use std::path::Path;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Generates a unified diff between two strings.
pub fn unified_diff(original: &str, modified: &str, path: &Path) -> String {
    render(original, modified, path, false)
}

/// Colorized diff output for terminal display.
pub fn colorized_diff(original: &str, modified: &str, path: &Path) -> String {
    render(original, modified, path, true)
}

fn render(original: &str, modified: &str, path: &Path, color: bool) -> String {
    let diff = TextDiff::from_lines(original, modified);
    let paint = |code: &'static str| if color { code } else { "" };
    let mut output = String::new();

    if original == modified {
        return output;
    }

    output.push_str(&format!("{}--- a/{}{}\n", paint(CYAN), path.display(), paint(RESET)));
    output.push_str(&format!("{}+++ b/{}{}\n", paint(CYAN), path.display(), paint(RESET)));

    for group in diff.grouped_ops(3) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old = first.old_range().start..last.old_range().end;
        let new = first.new_range().start..last.new_range().end;
        output.push_str(&format!(
            "{}@@ -{},{} +{},{} @@{}\n",
            paint(CYAN),
            old.start + 1,
            old.len(),
            new.start + 1,
            new.len(),
            paint(RESET)
        ));

        for op in &group {
            for change in diff.iter_changes(op) {
                let (sign, code) = match change.tag() {
                    ChangeTag::Delete => ("-", RED),
                    ChangeTag::Insert => ("+", GREEN),
                    ChangeTag::Equal => (" ", ""),
                };
                let code = if code.is_empty() { "" } else { paint(code) };
                let reset = if code.is_empty() { "" } else { RESET };
                output.push_str(code);
                output.push_str(sign);
                output.push_str(change.value());
                if change.missing_newline() {
                    output.push('\n');
                }
                output.push_str(reset);
            }
        }
    }

    output
}

/// Represents a summary of changes.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub edits: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and modified content.
    pub fn from_diff(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let mut insertions = 0;
        let mut deletions = 0;

        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => insertions += 1,
                ChangeTag::Delete => deletions += 1,
                ChangeTag::Equal => {}
            }
        }

        Self {
            files_changed: usize::from(insertions > 0 || deletions > 0),
            edits: 0,
            insertions,
            deletions,
        }
    }

    /// Records the number of edits behind this diff.
    pub fn with_edits(mut self, edits: usize) -> Self {
        self.edits = edits;
        self
    }

    /// Combines two summaries.
    pub fn merge(&mut self, other: &DiffSummary) {
        self.files_changed += other.files_changed;
        self.edits += other.edits;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) changed, {} edit(s), {} insertions(+), {} deletions(-)",
            self.files_changed, self.edits, self.insertions, self.deletions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEFORE: &str = "int f(int *p) {\n    if (p == NULL) return 1;\n    return 0;\n}\n";
    const AFTER: &str = "int f(int *p) {\n    if (0) return 1;\n    return 0;\n}\n";

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff(BEFORE, AFTER, Path::new("src/f.c"));
        assert!(diff.starts_with("--- a/src/f.c\n+++ b/src/f.c\n@@ -1,4 +1,4 @@\n"));
        assert!(diff.contains("-    if (p == NULL) return 1;\n"));
        assert!(diff.contains("+    if (0) return 1;\n"));
        assert!(diff.contains("     return 0;\n"));
        assert!(!diff.contains('\x1b'));
    }

    #[test]
    fn test_identical_inputs_have_no_diff() {
        assert_eq!(unified_diff(BEFORE, BEFORE, Path::new("f.c")), "");
    }

    #[test]
    fn test_colorized_diff() {
        let diff = colorized_diff(BEFORE, AFTER, Path::new("f.c"));
        assert!(diff.contains(&format!("{RED}-    if (p == NULL) return 1;\n{RESET}")));
        assert!(diff.contains(&format!("{GREEN}+    if (0) return 1;\n{RESET}")));
    }

    #[test]
    fn test_missing_trailing_newline() {
        let diff = unified_diff("a\nb", "a\nc", Path::new("f.c"));
        assert!(diff.ends_with("-b\n+c\n"));
    }

    #[test]
    fn test_summary() {
        let mut total = DiffSummary::from_diff(BEFORE, AFTER).with_edits(1);
        assert_eq!(total.files_changed, 1);
        assert_eq!((total.insertions, total.deletions), (1, 1));

        total.merge(&DiffSummary::from_diff(BEFORE, BEFORE));
        assert_eq!(total.files_changed, 1);
        assert_eq!(
            total.to_string(),
            "1 file(s) changed, 1 edit(s), 1 insertions(+), 1 deletions(-)"
        );
    }
}
