//! Release graph abstraction layer
//!
//! This module provides a trait-based abstraction over the commit, branch and
//! tag operations monorel needs, with two interchangeable backends.
//!
//! # Overview
//!
//! The primary abstraction is the [ReleaseGraph] trait. Implementations:
//!
//! - [cli::GitCliGraph]: a live backend running one `git` subprocess per operation
//! - [memory::InMemoryGraph]: a pure in-memory graph for tests and dry runs
//!
//! Both must answer every query identically for the same sequence of
//! operations; only commit hashes differ.
//!
//! # Usage
//!
//! Callers pick a backend once, through [open_graph], and depend on
//! `dyn ReleaseGraph` afterwards.
//!
//! ```rust
//! # use monorel::git::{open_graph, GraphBackend};
//! # fn example() -> monorel::Result<()> {
//! let graph = open_graph(GraphBackend::InMemory)?;
//! graph.create_commit("feat: add billing")?;
//! graph.create_tag("backend@v1.0.0", "backend v1.0.0")?;
//! assert_eq!(graph.tags_with_prefix("backend@v*")?, vec!["backend@v1.0.0"]);
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod cli;
pub mod history;
pub mod memory;

pub use cancel::CancelToken;
pub use cli::GitCliGraph;
pub use history::{FileHistory, Git2FileHistory, StaticFileHistory};
pub use memory::InMemoryGraph;

use crate::domain::tag::{sort_tags_descending, TagPattern};
use crate::domain::Project;
use crate::error::{ReleaseError, Result};
use std::path::PathBuf;
use tracing::debug;

/// Commit graph, tag index and ancestry queries behind one contract
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync`. The in-memory backend allows
/// concurrent reads; mutation is expected from a single caller at a time.
///
/// ## Error Handling
///
/// Missing branches and tags are [ReleaseError::NotFound], duplicate names
/// are [ReleaseError::Conflict]. Backend failures are surfaced as-is.
///
/// ## Provided queries
///
/// [tags_with_prefix](ReleaseGraph::tags_with_prefix) and
/// [latest_tag](ReleaseGraph::latest_tag) are built on
/// [reachable_tags](ReleaseGraph::reachable_tags), so ordering rules are
/// shared by every backend.
pub trait ReleaseGraph: Send + Sync {
    /// Hash of the commit HEAD points at
    fn head(&self) -> Result<String>;

    /// Name of the checked-out branch, `None` when HEAD is detached
    fn current_branch(&self) -> Result<Option<String>>;

    /// Create a commit whose only parent is HEAD and advance HEAD to it
    ///
    /// # Returns
    /// * `Ok(String)` - Hash of the new commit
    fn create_commit(&self, message: &str) -> Result<String>;

    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Create a branch at HEAD without switching to it
    ///
    /// # Returns
    /// * `Err(Conflict)` - If a branch with this name already exists
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Switch HEAD to the named branch
    ///
    /// # Returns
    /// * `Err(NotFound)` - If the branch doesn't exist
    fn checkout_branch(&self, name: &str) -> Result<()>;

    /// Merge the named branch into the current one
    ///
    /// Always creates a commit with two parents (HEAD first, then the merged
    /// branch head), even when no fast-forward or content change is involved.
    ///
    /// # Returns
    /// * `Ok(String)` - Hash of the merge commit
    /// * `Err(NotFound)` - If the branch doesn't exist
    fn merge_branch(&self, name: &str) -> Result<String>;

    /// True when `ancestor` can be reached from `descendant` through parent
    /// links. Every commit is its own ancestor.
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;

    /// Create an annotated tag on HEAD
    ///
    /// # Returns
    /// * `Err(Conflict)` - If the tag already exists. Never swallowed here;
    ///   see [crate::analyzer::resolver::VersionResolver::ensure_tag].
    fn create_tag(&self, name: &str, message: &str) -> Result<()>;

    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Publish a tag to the remote
    ///
    /// # Returns
    /// * `Err(NotFound)` - If the tag doesn't exist
    fn push_tag(&self, name: &str) -> Result<()>;

    /// Whether the tag has been published to the remote
    fn is_tag_pushed(&self, name: &str) -> Result<bool>;

    /// Annotation message stored with a tag
    ///
    /// # Returns
    /// * `Err(NotFound)` - If the tag doesn't exist
    fn tag_annotation(&self, name: &str) -> Result<String>;

    /// Names of tags matching `pattern` whose commit is an ancestor of HEAD,
    /// in no particular order
    fn reachable_tags(&self, pattern: &TagPattern) -> Result<Vec<String>>;

    /// Reachable tags matching `pattern`, newest version first
    ///
    /// `pattern` is an exact tag name or a prefix ending in a single `*`.
    /// Returns an empty list when nothing matches.
    fn tags_with_prefix(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = TagPattern::parse(pattern)?;
        let mut tags = self.reachable_tags(&pattern)?;
        sort_tags_descending(&mut tags);
        debug!(pattern = pattern.as_str(), count = tags.len(), "listed reachable tags");
        Ok(tags)
    }

    /// Newest tag of `project` reachable from HEAD
    ///
    /// # Returns
    /// * `Err(NotFound)` - If the project has no reachable tag yet
    fn latest_tag(&self, project: &Project) -> Result<String> {
        let pattern = TagPattern::prefix(&project.tag_prefix())?;
        self.tags_with_prefix(pattern.as_str())?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ReleaseError::not_found(format!("No tags found for project '{}'", project.name))
            })
    }
}

/// Backend choice, made explicitly by the caller at construction time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphBackend {
    /// Live repository driven through the `git` binary
    Live { path: PathBuf, remote: String },
    /// Fresh in-memory graph with a root commit on `main`
    InMemory,
}

/// Build the graph selected by `backend`
pub fn open_graph(backend: GraphBackend) -> Result<Box<dyn ReleaseGraph>> {
    match backend {
        GraphBackend::Live { path, remote } => {
            debug!(path = %path.display(), remote = %remote, "opening live git graph");
            Ok(Box::new(GitCliGraph::open(&path)?.with_remote(remote)))
        }
        GraphBackend::InMemory => {
            debug!("opening in-memory graph");
            Ok(Box::new(InMemoryGraph::new()))
        }
    }
}
