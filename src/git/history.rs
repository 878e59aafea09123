use crate::error::{ReleaseError, Result};
use git2::{ErrorCode, Oid, Repository as Git2Repo, Sort};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File provenance lookups used to group changesets by commit
pub trait FileHistory {
    /// Commit that first introduced `path`
    ///
    /// # Returns
    /// * `Ok(Some(hash))` - The introducing commit
    /// * `Ok(None)` - If the file is not tracked in history reachable from HEAD
    fn file_creation_commit(&self, path: &Path) -> Result<Option<String>>;

    /// Full message of a commit
    fn commit_message(&self, sha: &str) -> Result<String>;
}

/// [FileHistory] backed by libgit2
pub struct Git2FileHistory {
    repo: Git2Repo,
}

impl Git2FileHistory {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        Ok(Git2FileHistory { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2FileHistory { repo }
    }

    /// Root of the working tree, `None` for bare repositories
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        match self.repo.workdir() {
            Some(workdir) => path.strip_prefix(workdir).unwrap_or(path),
            None => path,
        }
    }
}

impl FileHistory for Git2FileHistory {
    fn file_creation_commit(&self, path: &Path) -> Result<Option<String>> {
        let relative = self.relative(path);

        let mut revwalk = self.repo.revwalk()?;
        match revwalk.push_head() {
            Ok(()) => {}
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        }
        // Parents before children, so the first hit is where the file appeared.
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;

        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            if commit.tree()?.get_path(relative).is_err() {
                continue;
            }

            let in_parent = match commit.parent(0) {
                Ok(parent) => parent.tree()?.get_path(relative).is_ok(),
                Err(_) => false,
            };
            if !in_parent {
                return Ok(Some(commit.id().to_string()));
            }
        }

        Ok(None)
    }

    fn commit_message(&self, sha: &str) -> Result<String> {
        let oid = Oid::from_str(sha)?;
        let commit = self.repo.find_commit(oid)?;
        Ok(commit.message().unwrap_or_default().to_string())
    }
}

/// Fixed lookup table, for tests and for workspaces without git history
#[derive(Debug, Clone, Default)]
pub struct StaticFileHistory {
    creations: HashMap<PathBuf, String>,
    messages: HashMap<String, String>,
}

impl StaticFileHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `commit` introduced `path`
    pub fn with_file(mut self, path: impl Into<PathBuf>, commit: impl Into<String>) -> Self {
        self.creations.insert(path.into(), commit.into());
        self
    }

    pub fn with_commit(mut self, sha: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(sha.into(), message.into());
        self
    }
}

impl FileHistory for StaticFileHistory {
    fn file_creation_commit(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.creations.get(path).cloned())
    }

    fn commit_message(&self, sha: &str) -> Result<String> {
        self.messages
            .get(sha)
            .cloned()
            .ok_or_else(|| ReleaseError::not_found(format!("Commit '{}' not found", sha)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;

    fn commit_file(repo: &Git2Repo, relative: &str, message: &str) -> Oid {
        let workdir = repo.workdir().unwrap().to_path_buf();
        let full = workdir.join(relative);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, message).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(relative)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("monorel", "monorel@localhost").unwrap();

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    #[test]
    fn test_git2_file_creation_commit() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        let first = commit_file(&repo, ".changeset/brave-cats.md", "add brave cats");
        let second = commit_file(&repo, ".changeset/quiet-dogs.md", "add quiet dogs");
        // touching the first file again must not move its creation commit
        commit_file(&repo, ".changeset/brave-cats.md", "edit brave cats");

        let history = Git2FileHistory::from_git2(repo);
        assert_eq!(
            history
                .file_creation_commit(Path::new(".changeset/brave-cats.md"))
                .unwrap(),
            Some(first.to_string())
        );
        assert_eq!(
            history
                .file_creation_commit(Path::new(".changeset/quiet-dogs.md"))
                .unwrap(),
            Some(second.to_string())
        );
        assert_eq!(
            history.commit_message(&second.to_string()).unwrap(),
            "add quiet dogs"
        );
    }

    #[test]
    fn test_git2_untracked_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        commit_file(&repo, "README.md", "readme");

        let history = Git2FileHistory::from_git2(repo);
        assert_eq!(
            history
                .file_creation_commit(Path::new(".changeset/unknown.md"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_git2_empty_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        let history = Git2FileHistory::from_git2(repo);
        assert_eq!(history.file_creation_commit(Path::new("x")).unwrap(), None);
    }

    #[test]
    fn test_static_history() {
        let history = StaticFileHistory::new()
            .with_file(".changeset/a.md", "c1")
            .with_commit("c1", "feat: a");
        assert_eq!(
            history
                .file_creation_commit(Path::new(".changeset/a.md"))
                .unwrap()
                .as_deref(),
            Some("c1")
        );
        assert_eq!(history.commit_message("c1").unwrap(), "feat: a");
        assert!(history.commit_message("c2").unwrap_err().is_not_found());
    }
}
