// tests/workflow_test.rs
use monorel::analyzer::TagOutcome;
use monorel::boundary::BoundaryWarning;
use monorel::changeset::{ChangesetStore, DirChangesetStore};
use monorel::cli::{run_publish, run_related, run_snapshot, run_status, WorkflowArgs};
use monorel::domain::{BumpType, Project, ProjectType, Version};
use monorel::git::{InMemoryGraph, ReleaseGraph, StaticFileHistory};
use monorel::workspace::Workspace;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Workspace with a Go backend at 1.4.9 and a Node www at 2.0.0
fn workspace() -> (TempDir, Workspace, DirChangesetStore) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("services/backend")).unwrap();
    fs::create_dir_all(root.join("apps/www")).unwrap();
    fs::create_dir_all(root.join(".changeset")).unwrap();
    fs::write(root.join("services/backend/VERSION"), "1.4.9\n").unwrap();
    fs::write(
        root.join("apps/www/package.json"),
        r#"{"name": "www", "version": "2.0.0"}"#,
    )
    .unwrap();

    let ws = Workspace::new(
        root,
        vec![
            Project::new("backend", "services/backend", ProjectType::Go),
            Project::new("www", "apps/www", ProjectType::Node),
        ],
    );
    let store = DirChangesetStore::new(ws.changeset_dir());
    (dir, ws, store)
}

fn write_changeset(root: &Path, id: &str, bumps: &[(&str, &str)], message: &str) {
    let front: String = bumps
        .iter()
        .map(|(project, bump)| format!("\"{}\": {}\n", project, bump))
        .collect();
    fs::write(
        root.join(".changeset").join(format!("{}.md", id)),
        format!("---\n{}---\n\n{}\n", front, message),
    )
    .unwrap();
}

// ============================================================================
// Status
// ============================================================================

#[test]
fn test_status_reports_next_versions() {
    let (dir, ws, store) = workspace();
    write_changeset(dir.path(), "brave-cats", &[("backend", "minor")], "Add export");

    let graph = InMemoryGraph::new();
    graph.create_tag("backend@v1.4.9", "release").unwrap();

    let (statuses, warnings) = run_status(&graph, &ws, &store).unwrap();
    assert!(warnings.is_empty(), "got: {:?}", warnings);

    let backend = &statuses[0];
    assert_eq!(backend.bump, BumpType::Minor);
    assert_eq!(backend.pending, 1);
    assert_eq!(backend.released, Some(Version::new(1, 4, 9)));
    assert_eq!(backend.latest_tag.as_deref(), Some("backend@v1.4.9"));
    assert_eq!(backend.next, Some(Version::new(1, 5, 0)));

    let www = &statuses[1];
    assert_eq!(www.bump, BumpType::None);
    assert_eq!(www.released, None);
    assert_eq!(www.next, None);
}

// ============================================================================
// Snapshot
// ============================================================================

#[test]
fn test_snapshot_tags_release_candidates() {
    let (dir, ws, store) = workspace();
    write_changeset(dir.path(), "brave-cats", &[("backend", "minor")], "Add export");

    let graph = InMemoryGraph::new();
    let args = WorkflowArgs::default();

    let first = run_snapshot(&graph, &ws, &store, &args).unwrap();
    assert_eq!(first.tags.len(), 1);
    assert_eq!(first.tags[0].tag, "backend@v1.5.0-rc0");
    assert_eq!(first.tags[0].outcome, Some(TagOutcome::Created));
    assert!(first
        .warnings
        .contains(&BoundaryWarning::NothingToRelease {
            project: "www".to_string()
        }));

    graph.create_commit("more work").unwrap();
    let second = run_snapshot(&graph, &ws, &store, &args).unwrap();
    assert_eq!(second.tags[0].tag, "backend@v1.5.0-rc1");
    assert_eq!(
        graph.tags_with_prefix("backend@v*").unwrap(),
        vec!["backend@v1.5.0-rc1", "backend@v1.5.0-rc0"]
    );
}

#[test]
fn test_snapshot_dry_run_creates_nothing() {
    let (dir, ws, store) = workspace();
    write_changeset(dir.path(), "quiet-dogs", &[("www", "patch")], "Fix layout");

    let graph = InMemoryGraph::new();
    let args = WorkflowArgs {
        dry_run: true,
        ..WorkflowArgs::default()
    };
    let result = run_snapshot(&graph, &ws, &store, &args).unwrap();
    assert_eq!(result.tags[0].tag, "www@2.0.1-rc0");
    assert_eq!(result.tags[0].outcome, None);
    assert!(!graph.tag_exists("www@2.0.1-rc0").unwrap());
}

#[test]
fn test_snapshot_push_marks_tag_pushed() {
    let (dir, ws, store) = workspace();
    write_changeset(dir.path(), "brave-cats", &[("backend", "patch")], "Fix");

    let graph = InMemoryGraph::new();
    let args = WorkflowArgs {
        push: true,
        remote: "origin".to_string(),
        ..WorkflowArgs::default()
    };
    let result = run_snapshot(&graph, &ws, &store, &args).unwrap();
    assert!(result.tags[0].pushed);
    assert!(graph.is_tag_pushed("backend@v1.4.10-rc0").unwrap());
    assert!(result
        .warnings
        .iter()
        .any(|w| matches!(w, BoundaryWarning::PushWithoutFetch { .. })));
}

// ============================================================================
// Publish
// ============================================================================

#[test]
fn test_publish_is_idempotent() {
    let (_dir, ws, store) = workspace();
    let graph = InMemoryGraph::new();
    let args = WorkflowArgs::default();

    let first = run_publish(&graph, &ws, &store, &args).unwrap();
    let tags: Vec<_> = first.tags.iter().map(|t| t.tag.as_str()).collect();
    assert_eq!(tags, vec!["backend@v1.4.9", "www@2.0.0"]);

    let second = run_publish(&graph, &ws, &store, &args).unwrap();
    assert!(second.tags.is_empty());
    assert_eq!(second.skipped.len(), 2);
    assert!(second.skipped.iter().all(|(_, plan)| plan.is_skip()));
}

#[test]
fn test_publish_consumes_covered_changesets() {
    let (dir, ws, store) = workspace();
    write_changeset(dir.path(), "backend-only", &[("backend", "patch")], "Fix");
    write_changeset(
        dir.path(),
        "shared",
        &[("backend", "minor"), ("billing", "patch")],
        "Shared",
    );

    let graph = InMemoryGraph::new();
    let args = WorkflowArgs {
        projects: vec!["backend".to_string()],
        consume_changesets: true,
        ..WorkflowArgs::default()
    };
    let result = run_publish(&graph, &ws, &store, &args).unwrap();
    assert_eq!(result.deleted_changesets, vec!["backend-only"]);

    let remaining: Vec<_> = store.read_all().unwrap().into_iter().map(|cs| cs.id).collect();
    assert_eq!(remaining, vec!["shared"]);
}

#[test]
fn test_publish_unknown_project_fails() {
    let (_dir, ws, store) = workspace();
    let graph = InMemoryGraph::new();
    let args = WorkflowArgs {
        projects: vec!["billing".to_string()],
        ..WorkflowArgs::default()
    };
    assert!(run_publish(&graph, &ws, &store, &args).is_err());
}

#[test]
fn test_unreadable_manifest_is_warning() {
    let (dir, ws, store) = workspace();
    fs::write(dir.path().join("apps/www/package.json"), "{ broken").unwrap();

    let graph = InMemoryGraph::new();
    let result = run_publish(&graph, &ws, &store, &WorkflowArgs::default()).unwrap();
    assert_eq!(result.tags.len(), 1);
    assert!(result.warnings.iter().any(|w| matches!(
        w,
        BoundaryWarning::UnparsableRecordedVersion { project, .. } if project == "www"
    )));
}

// ============================================================================
// Release tree
// ============================================================================

#[test]
fn test_related_projects_from_store() {
    let (dir, _ws, store) = workspace();
    write_changeset(
        dir.path(),
        "a1",
        &[("analytics", "minor"), ("www", "patch")],
        "Dashboards",
    );
    write_changeset(
        dir.path(),
        "b1",
        &[("analytics", "patch"), ("bookkeeper", "patch")],
        "Ledgers",
    );

    let changeset_dir = dir.path().join(".changeset");
    let history = StaticFileHistory::new()
        .with_file(changeset_dir.join("a1.md"), "aaaa")
        .with_file(changeset_dir.join("b1.md"), "bbbb");

    let group = run_related(&store, &history, "analytics").unwrap();
    assert_eq!(group.related_projects(), vec!["bookkeeper", "www"]);
    assert_eq!(group.projects["analytics"].changesets.len(), 2);

    let group = run_related(&store, &history, "www").unwrap();
    assert_eq!(group.related_projects(), vec!["analytics"]);
}
