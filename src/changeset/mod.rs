//! Pending changes and where they come from
//!
//! A [Changeset] declares which projects need which bump. The core only
//! reads changesets; a [ChangesetStore] owns their storage and deletes them
//! once they have been applied.

pub mod store;

pub use store::DirChangesetStore;

use crate::domain::BumpType;
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Pull request that introduced a changeset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub author: Option<String>,
}

/// A recorded, pending change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
    pub id: String,
    /// Location of the changeset file, used to find the commit that added it
    pub path: PathBuf,
    pub message: String,
    pub project_bumps: BTreeMap<String, BumpType>,
    pub pr: Option<PullRequest>,
}

impl Changeset {
    /// Create a changeset stored at the conventional `.changeset/{id}.md`
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        let id = id.into();
        Changeset {
            path: PathBuf::from(".changeset").join(format!("{}.md", id)),
            id,
            message: message.into(),
            project_bumps: BTreeMap::new(),
            pr: None,
        }
    }

    pub fn with_bump(mut self, project: impl Into<String>, bump: BumpType) -> Self {
        self.project_bumps.insert(project.into(), bump);
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_pr(mut self, pr: PullRequest) -> Self {
        self.pr = Some(pr);
        self
    }

    /// Bump declared for `project`, `None` when the changeset is silent on it
    pub fn bump_for(&self, project: &str) -> Option<BumpType> {
        self.project_bumps.get(project).copied()
    }

    /// Names of the projects this changeset declares, sorted
    pub fn projects(&self) -> impl Iterator<Item = &str> {
        self.project_bumps.keys().map(String::as_str)
    }
}

/// Source of pending changesets
pub trait ChangesetStore {
    /// Every pending changeset, in a stable order
    fn read_all(&self) -> Result<Vec<Changeset>>;

    /// Remove a changeset once it has been applied
    fn delete(&self, changeset: &Changeset) -> Result<()>;
}
