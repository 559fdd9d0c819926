//! Line diffs between recorded contents.

use crate::Change;
use similar::{ChangeTag, TextDiff};

/// Lines added and removed by a change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
}

/// Generate a unified-style diff between two contents.
///
/// Content that is not valid UTF-8 is reported as a binary difference
/// instead of being rendered line by line.
pub fn generate_diff(old: &[u8], new: &[u8], filename: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("--- a/{filename}\n"));
    output.push_str(&format!("+++ b/{filename}\n"));

    let (Ok(old), Ok(new)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        if old != new {
            output.push_str(&format!(
                "Binary content differs ({} -> {} bytes)\n",
                old.len(),
                new.len()
            ));
        }
        return output;
    };

    let diff = TextDiff::from_lines(old, new);
    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push_str("...\n");
        }

        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };

                output.push_str(sign);
                output.push_str(change.value());
                if !change.value().ends_with('\n') {
                    output.push('\n');
                }
            }
        }
    }

    output
}

/// Count added and removed lines. Binary content counts as no lines.
pub fn diff_stats(old: &[u8], new: &[u8]) -> DiffStats {
    let (Ok(old), Ok(new)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return DiffStats::default();
    };

    let mut stats = DiffStats::default();
    for change in TextDiff::from_lines(old, new).iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => stats.additions += 1,
            ChangeTag::Delete => stats.deletions += 1,
            ChangeTag::Equal => {}
        }
    }
    stats
}

/// Diff of a change from its original to its new content.
pub fn change_diff(change: &Change) -> String {
    generate_diff(&change.original_content, &change.new_content, &change.filename)
}
