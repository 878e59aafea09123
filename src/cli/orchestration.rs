//! Main workflow orchestration logic
//!
//! Each command is a function over the collaborator traits, so the whole
//! workflow runs against an in-memory graph in tests. `main.rs` only parses
//! arguments, builds the live collaborators and prints the reports.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::analyzer::{changesets_for, highest_bump, PublishPlan, SnapshotPlan, TagOutcome, VersionResolver};
use crate::boundary::BoundaryWarning;
use crate::changeset::{Changeset, ChangesetStore};
use crate::domain::{BumpType, Project, Version};
use crate::git::{FileHistory, ReleaseGraph};
use crate::release_tree::{ProjectGroup, ReleaseTree};
use crate::workspace::Workspace;

/// Arguments shared by the tagging workflows
///
/// Mirrors the CLI Args but in a format suitable for orchestration logic.
/// This decoupling allows the workflow to be called programmatically
/// without depending on clap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowArgs {
    /// Restrict the run to these projects; empty means every project
    pub projects: Vec<String>,

    /// Preview mode - don't create tags or push
    pub dry_run: bool,

    /// Push created tags to `remote`
    pub push: bool,

    /// Remote the graph pushes to, for reporting
    pub remote: String,

    /// Publish only: delete changesets fully covered by the new tags
    pub consume_changesets: bool,
}

/// One tag handled by a workflow
#[derive(Debug, Clone, PartialEq)]
pub struct TagReport {
    pub project: String,
    pub tag: String,
    /// `None` in dry-run mode
    pub outcome: Option<TagOutcome>,
    pub pushed: bool,
}

/// Result of a snapshot or publish workflow
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowResult {
    pub tags: Vec<TagReport>,
    pub skipped: Vec<(String, PublishPlan)>,
    pub snapshots: Vec<SnapshotPlan>,
    pub deleted_changesets: Vec<String>,
    pub warnings: Vec<BoundaryWarning>,
}

/// Release state of one project
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectStatus {
    pub project: String,
    pub recorded: Option<Version>,
    pub released: Option<Version>,
    pub latest_tag: Option<String>,
    pub bump: BumpType,
    /// Number of pending changesets declaring a bump
    pub pending: usize,
    /// Version the pending changesets lead to, when there are any
    pub next: Option<Version>,
}

fn selected<'w>(workspace: &'w Workspace, names: &[String]) -> Result<Vec<&'w Project>> {
    if names.is_empty() {
        return Ok(workspace.projects().iter().collect());
    }
    names
        .iter()
        .map(|name| workspace.project(name).map_err(anyhow::Error::from))
        .collect()
}

/// Recorded version, with unreadable manifests reported as warnings
fn recorded_or_warn(
    workspace: &Workspace,
    project: &Project,
    warnings: &mut Vec<BoundaryWarning>,
) -> Option<Version> {
    match workspace.recorded_version(project) {
        Ok(Some(version)) => Some(version),
        Ok(None) => {
            warnings.push(BoundaryWarning::MissingRecordedVersion {
                project: project.name.clone(),
            });
            None
        }
        Err(e) => {
            warnings.push(BoundaryWarning::UnparsableRecordedVersion {
                project: project.name.clone(),
                reason: e.to_string(),
            });
            None
        }
    }
}

fn push_tag(
    graph: &dyn ReleaseGraph,
    tag: &str,
    remote: &str,
    warnings: &mut Vec<BoundaryWarning>,
) -> Result<bool> {
    if graph.is_tag_pushed(tag)? {
        return Ok(true);
    }
    if warnings
        .iter()
        .all(|w| !matches!(w, BoundaryWarning::PushWithoutFetch { .. }))
    {
        warnings.push(BoundaryWarning::PushWithoutFetch {
            remote: remote.to_string(),
            head: graph.head()?,
        });
    }
    graph
        .push_tag(tag)
        .with_context(|| format!("Failed to push tag '{}'", tag))?;
    Ok(true)
}

/// Group pending changesets by the commit that introduced them
pub fn run_tree(store: &dyn ChangesetStore, history: &dyn FileHistory) -> Result<ReleaseTree> {
    let changesets = store.read_all().context("Failed to read changesets")?;
    let tree = ReleaseTree::build(&changesets, history)?;
    Ok(tree)
}

/// Projects that must be released together with `project`
pub fn run_related(
    store: &dyn ChangesetStore,
    history: &dyn FileHistory,
    project: &str,
) -> Result<ProjectGroup> {
    let tree = run_tree(store, history)?;
    Ok(tree.group_for_project(project)?)
}

/// Recorded, released and next version of every project
pub fn run_status(
    graph: &dyn ReleaseGraph,
    workspace: &Workspace,
    store: &dyn ChangesetStore,
) -> Result<(Vec<ProjectStatus>, Vec<BoundaryWarning>)> {
    let changesets = store.read_all().context("Failed to read changesets")?;
    let resolver = VersionResolver::new(graph);
    let mut warnings = Vec::new();
    let mut statuses = Vec::new();

    for project in workspace.projects() {
        let recorded = recorded_or_warn(workspace, project, &mut warnings);
        let released = resolver.released_version(project)?;
        let latest_tag = match graph.latest_tag(project) {
            Ok(tag) => Some(tag),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        let bump = highest_bump(&changesets, &project.name);
        let pending = changesets_for(&changesets, &project.name).len();
        let next = (bump != BumpType::None)
            .then(|| {
                let current = recorded.clone().or_else(|| released.clone()).unwrap_or_else(Version::zero);
                VersionResolver::next_version(&current, bump)
            })
            .transpose()?;

        statuses.push(ProjectStatus {
            project: project.name.clone(),
            recorded,
            released,
            latest_tag,
            bump,
            pending,
            next,
        });
    }

    Ok((statuses, warnings))
}

/// Tag a release candidate for every project with pending changesets
///
/// The candidate builds on the recorded version, falling back to the latest
/// release and then to 0.0.0. RC numbers continue from the highest reachable
/// candidate of the same version.
pub fn run_snapshot(
    graph: &dyn ReleaseGraph,
    workspace: &Workspace,
    store: &dyn ChangesetStore,
    args: &WorkflowArgs,
) -> Result<WorkflowResult> {
    let changesets = store.read_all().context("Failed to read changesets")?;
    let resolver = VersionResolver::new(graph);
    let mut result = WorkflowResult::default();

    for project in selected(workspace, &args.projects)? {
        let bump = highest_bump(&changesets, &project.name);
        let recorded = recorded_or_warn(workspace, project, &mut result.warnings);
        let current = match recorded {
            Some(version) => version,
            None => resolver
                .released_version(project)?
                .unwrap_or_else(Version::zero),
        };

        let Some(plan) = resolver.plan_snapshot(project, &current, bump)? else {
            result.warnings.push(BoundaryWarning::NothingToRelease {
                project: project.name.clone(),
            });
            continue;
        };
        debug!(project = %project.name, tag = %plan.tag_name, "planned snapshot");

        let report = apply_tag(graph, &resolver, &project.name, &plan.tag_name, args, &mut result)?;
        result.tags.push(report);
        result.snapshots.push(plan);
    }

    Ok(result)
}

/// Tag the recorded version of every project that is not released yet
///
/// With `consume_changesets`, changesets whose projects were all tagged by
/// this run are deleted afterwards.
pub fn run_publish(
    graph: &dyn ReleaseGraph,
    workspace: &Workspace,
    store: &dyn ChangesetStore,
    args: &WorkflowArgs,
) -> Result<WorkflowResult> {
    let resolver = VersionResolver::new(graph);
    let mut result = WorkflowResult::default();
    let mut released = Vec::new();

    for project in selected(workspace, &args.projects)? {
        let Some(recorded) = recorded_or_warn(workspace, project, &mut result.warnings) else {
            continue;
        };

        let plan = resolver.plan_publish(project, &recorded)?;
        if plan.is_skip() {
            result.warnings.push(BoundaryWarning::AlreadyPublished {
                project: project.name.clone(),
                tag: plan.tag_name().to_string(),
            });
            result.skipped.push((project.name.clone(), plan));
            continue;
        }

        let tag_name = plan.tag_name().to_string();
        let report = apply_tag(graph, &resolver, &project.name, &tag_name, args, &mut result)?;
        result.tags.push(report);
        released.push(project.name.clone());
    }

    if args.consume_changesets && !args.dry_run {
        let changesets = store.read_all().context("Failed to read changesets")?;
        for changeset in consumed(&changesets, &released) {
            store.delete(changeset)?;
            result.deleted_changesets.push(changeset.id.clone());
        }
    }

    Ok(result)
}

/// Changesets with at least one declared project, all of them in `released`
fn consumed<'c>(changesets: &'c [Changeset], released: &[String]) -> Vec<&'c Changeset> {
    changesets
        .iter()
        .filter(|cs| {
            let mut projects = cs.projects().peekable();
            projects.peek().is_some() && projects.all(|p| released.iter().any(|r| r == p))
        })
        .collect()
}

fn apply_tag(
    graph: &dyn ReleaseGraph,
    resolver: &VersionResolver<'_>,
    project: &str,
    tag: &str,
    args: &WorkflowArgs,
    result: &mut WorkflowResult,
) -> Result<TagReport> {
    if args.dry_run {
        return Ok(TagReport {
            project: project.to_string(),
            tag: tag.to_string(),
            outcome: None,
            pushed: false,
        });
    }

    let outcome = resolver
        .ensure_tag(tag, &format!("Release {}", tag))
        .with_context(|| format!("Failed to create tag '{}'", tag))?;
    info!(tag, ?outcome, "tag ensured");

    let pushed = if args.push {
        push_tag(graph, tag, &args.remote, &mut result.warnings)?
    } else {
        false
    };

    Ok(TagReport {
        project: project.to_string(),
        tag: tag.to_string(),
        outcome: Some(outcome),
        pushed,
    })
}
