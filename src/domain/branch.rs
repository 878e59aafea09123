/// A named, movable pointer to a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub head: String,
}

/// Branch every fresh graph starts on
pub const DEFAULT_BRANCH: &str = "main";

impl Branch {
    /// Create a new branch pointing at `head`
    pub fn new(name: impl Into<String>, head: impl Into<String>) -> Self {
        Branch {
            name: name.into(),
            head: head.into(),
        }
    }

    /// Move the branch to a new commit
    pub fn advance(&mut self, head: impl Into<String>) {
        self.head = head.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_advance() {
        let mut branch = Branch::new("canary", "a1");
        branch.advance("b2");
        assert_eq!(branch.head, "b2");
        assert_eq!(branch.name, "canary");
    }
}
