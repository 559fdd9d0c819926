//! Grouping changes into revisions.

use crate::conversation::ConversationTurn;
use crate::store::sort_newest_first;
use crate::Change;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// All changes produced by one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionGroup {
    pub revision_id: String,
    pub instructions: String,
    pub response: String,
    pub agent_model: String,
    /// Earliest timestamp among the members.
    pub timestamp: DateTime<Utc>,
    /// Members, newest first.
    pub changes: Vec<Change>,
    /// Empty unless a member has a stored conversation.
    pub conversation: Vec<ConversationTurn>,
}

impl RevisionGroup {
    /// Members that can still be reverted.
    pub fn active_changes(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(|c| c.is_active())
    }

    pub fn has_active_changes(&self) -> bool {
        self.changes.iter().any(Change::is_active)
    }

    /// Distinct filenames touched by the revision, in member order.
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        for change in &self.changes {
            if !files.contains(&change.filename.as_str()) {
                files.push(&change.filename);
            }
        }
        files
    }

    /// Whether any member was produced from a multi-turn conversation.
    pub fn has_conversation(&self) -> bool {
        self.changes.iter().any(|c| c.has_conversation)
    }
}

/// Group changes by revision ID.
///
/// Groups are ordered by their earliest member, newest revision first.
/// `load_conversation` is called once for each group that has a member with
/// a stored conversation.
pub fn group_changes_by_revision<F>(changes: Vec<Change>, mut load_conversation: F) -> Vec<RevisionGroup>
where
    F: FnMut(&str) -> Vec<ConversationTurn>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<RevisionGroup> = Vec::new();

    for change in changes {
        let existing = index.get(change.revision_id()).copied();
        match existing {
            Some(i) => {
                let group = &mut groups[i];
                if change.timestamp < group.timestamp {
                    group.timestamp = change.timestamp;
                }
                group.changes.push(change);
            }
            None => {
                index.insert(change.revision_id().to_string(), groups.len());
                groups.push(RevisionGroup {
                    revision_id: change.revision_id().to_string(),
                    instructions: change.instructions.clone(),
                    response: change.response.clone(),
                    agent_model: change.agent_model.clone(),
                    timestamp: change.timestamp,
                    changes: vec![change],
                    conversation: Vec::new(),
                });
            }
        }
    }

    for group in &mut groups {
        sort_newest_first(&mut group.changes);
        if group.has_conversation() {
            group.conversation = load_conversation(&group.revision_id);
        }
    }

    groups.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.revision_id.cmp(&a.revision_id))
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChangeStatus;
    use chrono::TimeZone;

    fn change(hash: &str, revision: &str, filename: &str, minute: u32) -> Change {
        Change {
            file_revision_hash: hash.to_string(),
            request_hash: revision.to_string(),
            filename: filename.to_string(),
            original_content: Vec::new(),
            new_content: Vec::new(),
            status: ChangeStatus::Active,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap(),
            agent_model: format!("model-{hash}"),
            description: String::new(),
            note: None,
            instructions: format!("instructions-{hash}"),
            response: String::new(),
            has_conversation: false,
        }
    }

    #[test]
    fn groups_are_ordered_by_earliest_member() {
        // r1 starts at t1 and has a late edit at t4; r2 spans t2..t3.
        let changes = vec![
            change("c4", "r1", "d.txt", 4),
            change("c3", "r2", "c.txt", 3),
            change("c2", "r2", "b.txt", 2),
            change("c1", "r1", "a.txt", 1),
        ];

        let groups = group_changes_by_revision(changes, |_| Vec::new());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].revision_id, "r2");
        assert_eq!(groups[0].timestamp.format("%M").to_string(), "02");
        assert_eq!(groups[1].revision_id, "r1");
        assert_eq!(groups[1].timestamp.format("%M").to_string(), "01");

        let r1: Vec<&str> = groups[1].changes.iter().map(|c| c.file_revision_hash.as_str()).collect();
        assert_eq!(r1, vec!["c4", "c1"]);
    }

    #[test]
    fn members_sorted_newest_first_regardless_of_input_order() {
        let changes = vec![
            change("c1", "r1", "a.txt", 1),
            change("c3", "r1", "c.txt", 3),
            change("c2", "r1", "b.txt", 2),
        ];

        let groups = group_changes_by_revision(changes, |_| Vec::new());
        let order: Vec<&str> = groups[0].changes.iter().map(|c| c.filename.as_str()).collect();
        assert_eq!(order, vec!["c.txt", "b.txt", "a.txt"]);
    }

    #[test]
    fn metadata_comes_from_first_seen_member() {
        let changes = vec![change("c2", "r1", "b.txt", 2), change("c1", "r1", "a.txt", 1)];

        let groups = group_changes_by_revision(changes, |_| Vec::new());
        assert_eq!(groups[0].instructions, "instructions-c2");
        assert_eq!(groups[0].agent_model, "model-c2");
    }

    #[test]
    fn conversation_loaded_only_when_flagged() {
        let mut with_conversation = change("c1", "r1", "a.txt", 1);
        with_conversation.has_conversation = true;
        let changes = vec![with_conversation, change("c2", "r2", "b.txt", 2)];

        let mut requested = Vec::new();
        let groups = group_changes_by_revision(changes, |id| {
            requested.push(id.to_string());
            vec![ConversationTurn::user("hello")]
        });

        assert_eq!(requested, vec!["r1"]);
        let r1 = groups.iter().find(|g| g.revision_id == "r1").unwrap();
        assert_eq!(r1.conversation.len(), 1);
        let r2 = groups.iter().find(|g| g.revision_id == "r2").unwrap();
        assert!(r2.conversation.is_empty());
    }

    #[test]
    fn files_and_active_changes() {
        let mut reverted = change("c2", "r1", "a.txt", 2);
        reverted.status = ChangeStatus::Reverted;
        let changes = vec![reverted, change("c1", "r1", "a.txt", 1), change("c3", "r1", "b.txt", 3)];

        let groups = group_changes_by_revision(changes, |_| Vec::new());
        let group = &groups[0];

        assert_eq!(group.files(), vec!["b.txt", "a.txt"]);
        assert_eq!(group.active_changes().count(), 2);
        assert!(group.has_active_changes());
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_changes_by_revision(Vec::new(), |_| Vec::new()).is_empty());
    }
}
