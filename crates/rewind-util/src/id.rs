//! ULID-based identifier generation with prefixes.
//!
//! Identifiers in rewind follow the pattern: `prefix_ulid`
//! For example: `rev_01hqxyz...` for revisions.

use ulid::Ulid;

/// Known identifier prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPrefix {
    /// A revision: one user request, possibly touching many files.
    Revision,
    /// A single file change inside a revision.
    Change,
}

impl IdPrefix {
    /// Get the string prefix for this identifier type.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdPrefix::Revision => "rev",
            IdPrefix::Change => "chg",
        }
    }

    /// Parse a prefix from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rev" => Some(IdPrefix::Revision),
            "chg" => Some(IdPrefix::Change),
            _ => None,
        }
    }
}

/// Identifier generation and parsing utilities.
pub struct Identifier;

impl Identifier {
    /// Generate a new ascending identifier (newer = larger).
    pub fn ascending(prefix: IdPrefix) -> String {
        Self::with_ulid(prefix, Ulid::new())
    }

    /// Generate an identifier with a specific ULID (for testing or imports).
    pub fn with_ulid(prefix: IdPrefix, ulid: Ulid) -> String {
        format!("{}_{}", prefix.as_str(), ulid.to_string().to_lowercase())
    }

    /// Parse an identifier into its prefix and ULID parts.
    pub fn parse(id: &str) -> Option<(IdPrefix, Ulid)> {
        let (prefix, rest) = id.split_once('_')?;
        let prefix = IdPrefix::parse(prefix)?;
        let ulid = Ulid::from_string(rest).ok()?;
        Some((prefix, ulid))
    }

    /// Check if an identifier has the expected prefix.
    pub fn has_prefix(id: &str, prefix: IdPrefix) -> bool {
        id.strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.starts_with('_'))
    }

    /// Generate a revision ID.
    pub fn revision() -> String {
        Self::ascending(IdPrefix::Revision)
    }

    /// Generate a file-revision hash for a single change.
    pub fn change() -> String {
        Self::ascending(IdPrefix::Change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascending_id() {
        let id = Identifier::ascending(IdPrefix::Revision);
        assert!(id.starts_with("rev_"));
        assert_eq!(id.len(), 30); // "rev_" (4) + ULID (26)
    }

    #[test]
    fn test_ascending_order() {
        let id1 = Identifier::ascending(IdPrefix::Change);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = Identifier::ascending(IdPrefix::Change);
        assert!(id1 < id2, "Ascending IDs should increase over time");
    }

    #[test]
    fn test_parse_id() {
        let id = Identifier::change();
        let (prefix, _ulid) = Identifier::parse(&id).unwrap();
        assert_eq!(prefix, IdPrefix::Change);
    }

    #[test]
    fn test_has_prefix() {
        let id = Identifier::revision();
        assert!(Identifier::has_prefix(&id, IdPrefix::Revision));
        assert!(!Identifier::has_prefix(&id, IdPrefix::Change));
        assert!(!Identifier::has_prefix("rev123", IdPrefix::Revision));
    }

    #[test]
    fn test_id_prefix_parse() {
        assert_eq!(IdPrefix::parse("rev"), Some(IdPrefix::Revision));
        assert_eq!(IdPrefix::parse("chg"), Some(IdPrefix::Change));
        assert_eq!(IdPrefix::parse("ses"), None);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Identifier::parse("nounderscore").is_none());
        assert!(Identifier::parse("xyz_01HQXYZ").is_none());
        assert!(Identifier::parse("rev_notaulid").is_none());
    }

    #[test]
    fn test_with_ulid_round_trips() {
        let ulid = Ulid::new();
        let id = Identifier::with_ulid(IdPrefix::Revision, ulid);
        let (_, parsed) = Identifier::parse(&id).unwrap();
        assert_eq!(parsed, ulid);
    }
}
