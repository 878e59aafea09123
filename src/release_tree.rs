//! Release tree: which projects were changed together
//!
//! Changesets are grouped by the commit that introduced their file. A group
//! lists, per project, the changesets that touch it. Projects sharing a group
//! were released together, and [ReleaseTree::group_for_project] follows those
//! links across every group to find all release PRs that must reference each
//! other.

use crate::changeset::Changeset;
use crate::error::{ReleaseError, Result};
use crate::git::FileHistory;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Group name for changesets whose file has no commit yet
pub const UNKNOWN_COMMIT: &str = "unknown";

/// Changesets of one project inside a group
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectChanges {
    pub changesets: Vec<Changeset>,
    pub changelog_preview: String,
}

/// Changesets introduced by one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseGroup {
    pub commit: String,
    /// Subject and body of `commit`, when history could provide it
    pub commit_message: Option<String>,
    pub projects: BTreeMap<String, ProjectChanges>,
}

impl ReleaseGroup {
    fn new(commit: impl Into<String>) -> Self {
        ReleaseGroup {
            commit: commit.into(),
            commit_message: None,
            projects: BTreeMap::new(),
        }
    }

    pub fn contains(&self, project: &str) -> bool {
        self.projects.contains_key(project)
    }

    /// True for the synthetic group of untracked changesets
    pub fn is_unknown(&self) -> bool {
        self.commit == UNKNOWN_COMMIT
    }

    pub fn project_names(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }
}

/// Every project ever released together with one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectGroup {
    pub project: String,
    /// Commits of the groups the project appears in, in tree order
    pub commits: Vec<String>,
    pub projects: BTreeMap<String, ProjectChanges>,
}

impl ProjectGroup {
    /// The other projects of the aggregate, sorted
    pub fn related_projects(&self) -> Vec<String> {
        self.projects
            .keys()
            .filter(|name| **name != self.project)
            .cloned()
            .collect()
    }
}

/// Default changelog preview: one bullet per changeset
pub fn default_preview(_project: &str, changesets: &[Changeset]) -> String {
    changesets
        .iter()
        .map(|cs| {
            let summary = cs.message.lines().next().unwrap_or_default().trim();
            match &cs.pr {
                Some(pr) => format!("- {} (#{})", summary, pr.number),
                None => format!("- {}", summary),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Changesets grouped by originating commit, sorted by commit hash
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReleaseTree {
    groups: Vec<ReleaseGroup>,
}

impl ReleaseTree {
    /// Group `changesets` using [default_preview] for changelog previews
    pub fn build(changesets: &[Changeset], history: &dyn FileHistory) -> Result<Self> {
        Self::build_with_preview(changesets, history, default_preview)
    }

    /// Group `changesets`, rendering each project's preview with `preview`
    pub fn build_with_preview<F>(
        changesets: &[Changeset],
        history: &dyn FileHistory,
        preview: F,
    ) -> Result<Self>
    where
        F: Fn(&str, &[Changeset]) -> String,
    {
        let mut by_commit: BTreeMap<String, ReleaseGroup> = BTreeMap::new();

        for changeset in changesets {
            let commit = history
                .file_creation_commit(&changeset.path)?
                .filter(|commit| !commit.is_empty())
                .unwrap_or_else(|| UNKNOWN_COMMIT.to_string());

            let group = by_commit
                .entry(commit.clone())
                .or_insert_with(|| ReleaseGroup::new(commit));
            for project in changeset.projects() {
                group
                    .projects
                    .entry(project.to_string())
                    .or_default()
                    .changesets
                    .push(changeset.clone());
            }
        }

        let mut groups: Vec<ReleaseGroup> = by_commit.into_values().collect();
        for group in &mut groups {
            if !group.is_unknown() {
                group.commit_message = match history.commit_message(&group.commit) {
                    Ok(message) => Some(message),
                    Err(e) => {
                        warn!(commit = %group.commit, error = %e, "could not read commit message");
                        None
                    }
                };
            }
            for (name, changes) in group.projects.iter_mut() {
                changes.changelog_preview = preview(name, &changes.changesets);
            }
        }

        debug!(
            changesets = changesets.len(),
            groups = groups.len(),
            "built release tree"
        );
        Ok(ReleaseTree { groups })
    }

    pub fn groups(&self) -> &[ReleaseGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Union of every group containing `project`
    ///
    /// A project appearing in several matching groups gets their changesets
    /// concatenated in tree order; the first non-empty preview wins.
    ///
    /// # Returns
    /// * `Err(NotFound)` - If `project` appears in no group
    pub fn group_for_project(&self, project: &str) -> Result<ProjectGroup> {
        let mut aggregate = ProjectGroup {
            project: project.to_string(),
            commits: Vec::new(),
            projects: BTreeMap::new(),
        };

        for group in self.groups.iter().filter(|g| g.contains(project)) {
            aggregate.commits.push(group.commit.clone());
            for (name, changes) in &group.projects {
                let entry = aggregate.projects.entry(name.clone()).or_default();
                entry.changesets.extend(changes.changesets.iter().cloned());
                if entry.changelog_preview.is_empty() {
                    entry.changelog_preview = changes.changelog_preview.clone();
                }
            }
        }

        if aggregate.commits.is_empty() {
            return Err(ReleaseError::not_found(format!(
                "Project '{}' has no pending changesets",
                project
            )));
        }
        Ok(aggregate)
    }

    /// Projects whose release PRs must reference the release PR of `project`
    pub fn related_projects(&self, project: &str) -> Result<Vec<String>> {
        Ok(self.group_for_project(project)?.related_projects())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::PullRequest;
    use crate::domain::BumpType;
    use crate::git::StaticFileHistory;

    fn changeset(id: &str, projects: &[&str]) -> Changeset {
        projects.iter().fold(
            Changeset::new(id, format!("{} summary\n\nbody", id)),
            |cs, project| cs.with_bump(*project, BumpType::Patch),
        )
    }

    fn scenario_c() -> (Vec<Changeset>, StaticFileHistory) {
        let changesets = vec![
            changeset("a1", &["analytics", "www"]),
            changeset("b1", &["analytics", "bookkeeper"]),
        ];
        let history = StaticFileHistory::new()
            .with_file(".changeset/a1.md", "aaaa")
            .with_file(".changeset/b1.md", "bbbb")
            .with_commit("aaaa", "feat: dashboards")
            .with_commit("bbbb", "feat: ledgers");
        (changesets, history)
    }

    #[test]
    fn test_group_by_commit_sorted() {
        let (mut changesets, history) = scenario_c();
        changesets.reverse();
        let tree = ReleaseTree::build(&changesets, &history).unwrap();

        let commits: Vec<_> = tree.groups().iter().map(|g| g.commit.as_str()).collect();
        assert_eq!(commits, vec!["aaaa", "bbbb"]);
        assert_eq!(
            tree.groups()[0].commit_message.as_deref(),
            Some("feat: dashboards")
        );
        assert_eq!(
            tree.groups()[0].project_names().collect::<Vec<_>>(),
            vec!["analytics", "www"]
        );
    }

    #[test]
    fn test_changeset_attached_under_every_project() {
        let changesets = vec![changeset("c1", &["api", "web", "docs"])];
        let history = StaticFileHistory::new().with_file(".changeset/c1.md", "cccc");
        let tree = ReleaseTree::build(&changesets, &history).unwrap();

        let group = &tree.groups()[0];
        for project in ["api", "web", "docs"] {
            assert_eq!(group.projects[project].changesets[0].id, "c1");
        }
        // missing commit message is tolerated
        assert_eq!(group.commit_message, None);
    }

    #[test]
    fn test_untracked_changesets_go_to_unknown() {
        let changesets = vec![changeset("new", &["api"])];
        let tree = ReleaseTree::build(&changesets, &StaticFileHistory::new()).unwrap();
        assert_eq!(tree.groups().len(), 1);
        assert!(tree.groups()[0].is_unknown());
        assert_eq!(tree.groups()[0].commit_message, None);
    }

    #[test]
    fn test_group_for_project_unions_related_groups() {
        let (changesets, history) = scenario_c();
        let tree = ReleaseTree::build(&changesets, &history).unwrap();

        let group = tree.group_for_project("analytics").unwrap();
        assert_eq!(
            group.projects.keys().collect::<Vec<_>>(),
            vec!["analytics", "bookkeeper", "www"]
        );
        let ids: Vec<_> = group.projects["analytics"]
            .changesets
            .iter()
            .map(|cs| cs.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a1", "b1"]);
        assert_eq!(group.commits, vec!["aaaa", "bbbb"]);
        assert_eq!(
            tree.related_projects("analytics").unwrap(),
            vec!["bookkeeper", "www"]
        );
    }

    #[test]
    fn test_group_for_project_only_follows_direct_groups() {
        let (changesets, history) = scenario_c();
        let tree = ReleaseTree::build(&changesets, &history).unwrap();

        let group = tree.group_for_project("www").unwrap();
        assert_eq!(
            group.projects.keys().collect::<Vec<_>>(),
            vec!["analytics", "www"]
        );
    }

    #[test]
    fn test_group_for_project_not_found() {
        let (changesets, history) = scenario_c();
        let tree = ReleaseTree::build(&changesets, &history).unwrap();
        assert!(tree.group_for_project("billing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_first_non_empty_preview_wins() {
        let (changesets, history) = scenario_c();
        let tree = ReleaseTree::build_with_preview(&changesets, &history, |_, css| {
            if css.iter().any(|cs| cs.id == "a1") {
                String::new()
            } else {
                format!("preview of {}", css[0].id)
            }
        })
        .unwrap();

        let group = tree.group_for_project("analytics").unwrap();
        assert_eq!(group.projects["analytics"].changelog_preview, "preview of b1");
        assert_eq!(group.projects["www"].changelog_preview, "");
    }

    #[test]
    fn test_default_preview() {
        let changesets = vec![
            Changeset::new("a", "Add export\n\nlong body"),
            Changeset::new("b", "Fix totals").with_pr(PullRequest {
                number: 42,
                title: "Fix totals".to_string(),
                author: None,
            }),
        ];
        assert_eq!(
            default_preview("api", &changesets),
            "- Add export\n- Fix totals (#42)"
        );
    }
}
