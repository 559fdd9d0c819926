//! Text renderings of history for terminals and tool output.

use crate::diff::{change_diff, diff_stats};
use crate::group::RevisionGroup;
use crate::query::RevertibleRevision;
use crate::Change;
use std::fmt::Write as _;

/// Diff lines shown per change in a revision report.
const DIFF_PREVIEW_LINES: usize = 6;

const DESCRIPTION_WIDTH: usize = 72;
const DESCRIPTION_INDENT: usize = 4;

/// Render changes as markdown grouped by revision, keeping the given order.
pub fn format_history_view(changes: &[Change], show_content: bool) -> String {
    if changes.is_empty() {
        return "No changes found matching the specified criteria.".to_string();
    }

    let mut revisions: Vec<(&str, Vec<&Change>)> = Vec::new();
    for change in changes {
        match revisions.iter().position(|(id, _)| *id == change.revision_id()) {
            Some(i) => revisions[i].1.push(change),
            None => revisions.push((change.revision_id(), vec![change])),
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "## Change History ({} entries)\n", changes.len());

    for (revision_id, members) in revisions {
        let first = members[0];
        let _ = writeln!(out, "### Revision: {revision_id}");
        let _ = writeln!(out, "**Model:** {}", model_or_unknown(&first.agent_model));
        let _ = writeln!(out, "**Time:** {}", first.timestamp.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "**Files Changed:** {}", members.len());
        if !first.instructions.is_empty() {
            let _ = writeln!(out, "**Instructions:** {}", first.instructions);
        }

        out.push_str("\n**Files:**\n");
        for change in members {
            let _ = writeln!(out, "- **{}** ({})", change.filename, change.status);
            if !change.description.is_empty() {
                let _ = writeln!(out, "  *{}*", change.description);
            }
            if show_content {
                let stats = diff_stats(&change.original_content, &change.new_content);
                out.push_str("  ```diff\n");
                let _ = writeln!(
                    out,
                    "  Content changed ({} bytes -> {} bytes, +{}/-{} lines)",
                    change.original_content.len(),
                    change.new_content.len(),
                    stats.additions,
                    stats.deletions
                );
                out.push_str("  ```\n");
            }
        }
        out.push_str("\n---\n\n");
    }

    out
}

/// Render one revision with per-change status, notes and a diff preview.
pub fn format_revision(group: &RevisionGroup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Revision ID: {}", group.revision_id);
    out.push_str(&"=".repeat(80));
    out.push('\n');
    let _ = writeln!(out, "Time: {}", group.timestamp.format("%a, %d %b %Y %H:%M:%S UTC"));
    let _ = writeln!(out, "Model: {}", model_or_unknown(&group.agent_model));
    if !group.conversation.is_empty() {
        let _ = writeln!(out, "Conversation: {} turns", group.conversation.len());
    }
    out.push('\n');

    let _ = writeln!(out, "File Changes ({}):", group.changes.len());
    for change in &group.changes {
        out.push_str(&"-".repeat(40));
        out.push('\n');
        let _ = writeln!(
            out,
            "({}) -- {} - {}",
            change.filename, change.file_revision_hash, change.status
        );

        if let Some(note) = &change.note {
            let _ = writeln!(out, "    {note}\n");
        }
        if !change.description.is_empty() {
            out.push_str(&wrap_and_indent(
                &change.description,
                DESCRIPTION_WIDTH,
                DESCRIPTION_INDENT,
            ));
            out.push('\n');
        }

        let diff = change_diff(change);
        let lines: Vec<&str> = diff.lines().collect();
        for line in lines.iter().take(DIFF_PREVIEW_LINES) {
            out.push_str(line);
            out.push('\n');
        }
        if lines.len() > DIFF_PREVIEW_LINES {
            out.push_str("...\n");
        }
    }

    out
}

/// Render revisions that can still be reverted, with usage hints.
pub fn format_revertible_revisions(revisions: &[RevertibleRevision]) -> String {
    if revisions.is_empty() {
        return "No active changes found to rollback.".to_string();
    }

    let mut out = String::from("Available revisions to rollback:\n\n");
    for revision in revisions {
        let _ = writeln!(out, "**Revision ID:** {}", revision.revision_id);
        let _ = writeln!(out, "**Model:** {}", model_or_unknown(&revision.agent_model));
        let _ = writeln!(out, "**Time:** {}", revision.timestamp.to_rfc3339());
        let _ = writeln!(out, "**Files changed:** {}", revision.files.len());
        for file in &revision.files {
            let _ = writeln!(out, "  - {file}");
        }
        out.push('\n');
    }

    out.push_str("To rollback a revision, call again with:\n");
    out.push_str("- `revision_id`: the revision to roll back\n");
    out.push_str("- `confirm`: true to perform the rollback\n");
    out.push_str("- `file_path`: optional, to roll back a single file\n");
    out
}

fn model_or_unknown(model: &str) -> &str {
    if model.is_empty() {
        "Not specified"
    } else {
        model
    }
}

/// Greedy word wrap; each output line starts with `indent` spaces.
fn wrap_and_indent(text: &str, width: usize, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(format!("{pad}{current}"));
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(format!("{pad}{current}"));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::group_changes_by_revision;
    use crate::ChangeStatus;
    use chrono::{TimeZone, Utc};

    fn change(hash: &str, revision: &str, filename: &str) -> Change {
        Change {
            file_revision_hash: hash.to_string(),
            request_hash: revision.to_string(),
            filename: filename.to_string(),
            original_content: b"one\ntwo\n".to_vec(),
            new_content: b"one\nTWO\nthree\n".to_vec(),
            status: ChangeStatus::Active,
            timestamp: Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap(),
            agent_model: "model-a".to_string(),
            description: "Uppercase two".to_string(),
            note: Some("review me".to_string()),
            instructions: "shout".to_string(),
            response: String::new(),
            has_conversation: false,
        }
    }

    #[test]
    fn history_view_groups_by_revision() {
        let changes = vec![
            change("c3", "r2", "b.txt"),
            change("c2", "r1", "a.txt"),
            change("c1", "r2", "c.txt"),
        ];

        let out = format_history_view(&changes, true);

        assert!(out.starts_with("## Change History (3 entries)\n"));
        let r2 = out.find("### Revision: r2").unwrap();
        let r1 = out.find("### Revision: r1").unwrap();
        assert!(r2 < r1);
        assert_eq!(out.matches("### Revision:").count(), 2);
        assert!(out.contains("**Files Changed:** 2"));
        assert!(out.contains("- **a.txt** (active)"));
        assert!(out.contains("**Instructions:** shout"));
        assert!(out.contains("**Time:** 2024-02-03 04:05:06"));
        assert!(out.contains("+2/-1 lines"));
    }

    #[test]
    fn history_view_without_content_omits_sizes() {
        let out = format_history_view(&[change("c1", "r1", "a.txt")], false);
        assert!(!out.contains("Content changed"));
    }

    #[test]
    fn revision_report_includes_note_and_diff() {
        let groups = group_changes_by_revision(vec![change("c1", "r1", "a.txt")], |_| Vec::new());
        let out = format_revision(&groups[0]);

        assert!(out.starts_with("Revision ID: r1\n"));
        assert!(out.contains("Time: Sat, 03 Feb 2024 04:05:06 UTC"));
        assert!(out.contains("(a.txt) -- c1 - active"));
        assert!(out.contains("    review me"));
        assert!(out.contains("    Uppercase two"));
        assert!(out.contains("--- a/a.txt"));
        assert!(out.contains("+TWO"));
    }

    #[test]
    fn revertible_revisions_listing() {
        assert_eq!(
            format_revertible_revisions(&[]),
            "No active changes found to rollback."
        );

        let out = format_revertible_revisions(&[RevertibleRevision {
            revision_id: "r1".to_string(),
            agent_model: String::new(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            files: vec!["a.txt".to_string(), "b.txt".to_string()],
        }]);

        assert!(out.contains("**Revision ID:** r1"));
        assert!(out.contains("**Model:** Not specified"));
        assert!(out.contains("**Files changed:** 2"));
        assert!(out.contains("  - b.txt"));
    }

    #[test]
    fn wrap_respects_width_and_indent() {
        let text = "alpha beta gamma delta epsilon";
        let wrapped = wrap_and_indent(text, 11, 2);
        assert_eq!(wrapped, "  alpha beta\n  gamma delta\n  epsilon");
        assert_eq!(wrap_and_indent("", 10, 4), "");
    }
}
