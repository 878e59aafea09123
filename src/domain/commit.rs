/// A commit in the release graph
///
/// Commits are immutable once created. Parents are referenced by hash, and a
/// commit can only name parents that already exist, so the graph stays acyclic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub parents: Vec<String>,
    pub message: String,
}

impl Commit {
    pub fn new(hash: impl Into<String>, parents: Vec<String>, message: impl Into<String>) -> Self {
        Commit {
            hash: hash.into(),
            parents,
            message: message.into(),
        }
    }

    /// True for the first commit of a history
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// True for commits joining two or more lines of history
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Abbreviated hash for display
    pub fn short_hash(&self) -> &str {
        short_hash(&self.hash)
    }
}

/// First seven characters of a hash, or the whole string when shorter
pub fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_commit() {
        let commit = Commit::new("a1", vec![], "initial commit");
        assert!(commit.is_root());
        assert!(!commit.is_merge());
    }

    #[test]
    fn test_merge_commit() {
        let commit = Commit::new("c3", vec!["a1".to_string(), "b2".to_string()], "merge");
        assert!(commit.is_merge());
        assert!(!commit.is_root());
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("abc1234def5678"), "abc1234");
        assert_eq!(short_hash("abc"), "abc");
        let commit = Commit::new("0123456789", vec![], "x");
        assert_eq!(commit.short_hash(), "0123456");
    }
}
