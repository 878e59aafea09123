use crate::domain::{Branch, Commit, Tag, TagPattern, DEFAULT_BRANCH};
use crate::error::{ReleaseError, Result};
use crate::git::ReleaseGraph;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Commits, branches and tags of an in-memory graph
///
/// Commits live in an append-only arena keyed by hash; branches and tags
/// only hold hashes into it.
#[derive(Debug)]
struct GraphState {
    commits: HashMap<String, Commit>,
    branches: HashMap<String, Branch>,
    tags: HashMap<String, Tag>,
    head: String,
    current_branch: Option<String>,
    next_id: u64,
}

impl GraphState {
    fn new(default_branch: &str) -> Self {
        let mut state = GraphState {
            commits: HashMap::new(),
            branches: HashMap::new(),
            tags: HashMap::new(),
            head: String::new(),
            current_branch: Some(default_branch.to_string()),
            next_id: 1,
        };

        let root = state.append_commit(Vec::new(), "initial commit");
        state
            .branches
            .insert(default_branch.to_string(), Branch::new(default_branch, root.clone()));
        state.head = root;
        state
    }

    fn append_commit(&mut self, parents: Vec<String>, message: &str) -> String {
        let hash = format!("{:040x}", self.next_id);
        self.next_id += 1;
        self.commits
            .insert(hash.clone(), Commit::new(hash.clone(), parents, message));
        hash
    }

    /// Record a new commit on top of HEAD and move HEAD (and the current branch) to it
    fn commit_on_head(&mut self, mut extra_parents: Vec<String>, message: &str) -> String {
        let mut parents = vec![self.head.clone()];
        parents.append(&mut extra_parents);

        let hash = self.append_commit(parents, message);
        self.head = hash.clone();
        if let Some(branch) = self
            .current_branch
            .as_ref()
            .and_then(|name| self.branches.get_mut(name))
        {
            branch.advance(hash.clone());
        }
        hash
    }

    /// Breadth-first walk over parent links starting at `descendant`
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        if ancestor == descendant {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([descendant]);

        while let Some(hash) = queue.pop_front() {
            if !visited.insert(hash) {
                continue;
            }
            if hash == ancestor {
                return true;
            }
            if let Some(commit) = self.commits.get(hash) {
                queue.extend(commit.parents.iter().map(String::as_str));
            }
        }

        false
    }

    fn tag(&self, name: &str) -> Result<&Tag> {
        self.tags
            .get(name)
            .ok_or_else(|| ReleaseError::not_found(format!("Tag '{}' not found", name)))
    }
}

/// In-memory release graph for tests and dry runs
///
/// Starts with a root commit on `main`. Hashes are synthetic but unique.
/// One coarse reader/writer lock guards all state, so concurrent reads are
/// safe while writes are serialized.
#[derive(Debug)]
pub struct InMemoryGraph {
    state: RwLock<GraphState>,
}

impl InMemoryGraph {
    /// Create a graph with a root commit on the default branch
    pub fn new() -> Self {
        Self::with_default_branch(DEFAULT_BRANCH)
    }

    pub fn with_default_branch(branch: &str) -> Self {
        InMemoryGraph {
            state: RwLock::new(GraphState::new(branch)),
        }
    }

    /// Look up a commit by hash
    pub fn commit(&self, hash: &str) -> Result<Commit> {
        self.read()
            .commits
            .get(hash)
            .cloned()
            .ok_or_else(|| ReleaseError::not_found(format!("Commit '{}' not found", hash)))
    }

    /// Number of commits recorded so far, root included
    pub fn commit_count(&self) -> usize {
        self.read().commits.len()
    }

    /// Full record of a tag
    pub fn tag(&self, name: &str) -> Result<Tag> {
        self.read().tag(name).cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseGraph for InMemoryGraph {
    fn head(&self) -> Result<String> {
        Ok(self.read().head.clone())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.read().current_branch.clone())
    }

    fn create_commit(&self, message: &str) -> Result<String> {
        let hash = self.write().commit_on_head(Vec::new(), message);
        debug!(commit = %hash, "created commit");
        Ok(hash)
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.read().branches.contains_key(name))
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        let mut state = self.write();
        if state.branches.contains_key(name) {
            return Err(ReleaseError::conflict(format!(
                "Branch '{}' already exists",
                name
            )));
        }
        let head = state.head.clone();
        state.branches.insert(name.to_string(), Branch::new(name, head));
        debug!(branch = name, "created branch");
        Ok(())
    }

    fn checkout_branch(&self, name: &str) -> Result<()> {
        let mut state = self.write();
        let head = state
            .branches
            .get(name)
            .map(|branch| branch.head.clone())
            .ok_or_else(|| ReleaseError::not_found(format!("Branch '{}' not found", name)))?;
        state.head = head;
        state.current_branch = Some(name.to_string());
        debug!(branch = name, "checked out branch");
        Ok(())
    }

    fn merge_branch(&self, name: &str) -> Result<String> {
        let mut state = self.write();
        let other = state
            .branches
            .get(name)
            .map(|branch| branch.head.clone())
            .ok_or_else(|| ReleaseError::not_found(format!("Branch '{}' not found", name)))?;
        let hash = state.commit_on_head(vec![other], &format!("Merge branch '{}'", name));
        debug!(branch = name, commit = %hash, "merged branch");
        Ok(hash)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        Ok(self.read().is_ancestor(ancestor, descendant))
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        let mut state = self.write();
        if state.tags.contains_key(name) {
            return Err(ReleaseError::conflict(format!("Tag '{}' already exists", name)));
        }
        let head = state.head.clone();
        state
            .tags
            .insert(name.to_string(), Tag::new(name, head.clone(), message));
        info!(tag = name, commit = %head, "created tag");
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.read().tags.contains_key(name))
    }

    fn push_tag(&self, name: &str) -> Result<()> {
        let mut state = self.write();
        let tag = state
            .tags
            .get_mut(name)
            .ok_or_else(|| ReleaseError::not_found(format!("Tag '{}' not found", name)))?;
        tag.pushed = true;
        info!(tag = name, "pushed tag");
        Ok(())
    }

    fn is_tag_pushed(&self, name: &str) -> Result<bool> {
        Ok(self.read().tag(name)?.pushed)
    }

    fn tag_annotation(&self, name: &str) -> Result<String> {
        Ok(self.read().tag(name)?.message.clone())
    }

    fn reachable_tags(&self, pattern: &TagPattern) -> Result<Vec<String>> {
        let state = self.read();
        Ok(state
            .tags
            .values()
            .filter(|tag| pattern.matches(&tag.name))
            .filter(|tag| state.is_ancestor(&tag.commit, &state.head))
            .map(|tag| tag.name.clone())
            .collect())
    }
}
