use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use monorel::analyzer::TagOutcome;
use monorel::boundary::BoundaryWarning;
use monorel::changeset::DirChangesetStore;
use monorel::cli::{self, ProjectStatus, WorkflowArgs, WorkflowResult};
use monorel::config;
use monorel::git::{open_graph, Git2FileHistory, GraphBackend, ReleaseGraph};
use monorel::ui::{self, formatter};
use monorel::workspace::Workspace;

#[derive(Parser)]
#[command(
    name = "monorel",
    version,
    about = "Version and tag the projects of a monorepo from changesets"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(
        short = 'C',
        long,
        global = true,
        default_value = ".",
        help = "Run as if started in this directory"
    )]
    repo: PathBuf,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show pending changesets grouped by the commit that added them
    Tree {
        #[arg(short, long, help = "Only show projects released together with this one")]
        project: Option<String>,
    },
    /// Show recorded, released and next version of every project
    Status,
    /// Tag release candidates for projects with pending changesets
    Snapshot(TagArgs),
    /// Tag the recorded version of every unreleased project
    Publish {
        #[command(flatten)]
        tag: TagArgs,

        #[arg(long, help = "Delete changesets covered by the new tags")]
        consume_changesets: bool,

        #[arg(short, long, help = "Skip confirmation prompts")]
        force: bool,
    },
}

#[derive(clap::Args)]
struct TagArgs {
    /// Projects to tag; all configured projects when omitted
    projects: Vec<String>,

    #[arg(long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(long, help = "Push created tags to the configured remote")]
    push: bool,
}

fn main() {
    let args = Args::parse();
    cli::init_tracing(if args.verbose { Level::DEBUG } else { Level::WARN });

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let history = Git2FileHistory::open(&args.repo).context("Git repository error")?;
    let root = history
        .workdir()
        .map(PathBuf::from)
        .context("Bare repositories are not supported")?;
    let config =
        config::load_config_in(args.config.as_deref(), &root).context("Error loading config")?;
    let workspace = Workspace::from_config(&root, &config);
    let store = DirChangesetStore::new(workspace.changeset_dir());

    match args.command {
        Command::Tree { project } => {
            match project {
                Some(name) => {
                    let group = cli::run_related(&store, &history, &name)?;
                    println!("{}", formatter::render_project_group(&group));
                    for (name, changes) in &group.projects {
                        println!("\n{}", console::style(name).bold());
                        println!("{}", changes.changelog_preview);
                    }
                }
                None => {
                    let tree = cli::run_tree(&store, &history)?;
                    let uncommitted: BTreeSet<&str> = tree
                        .groups()
                        .iter()
                        .filter(|g| g.is_unknown())
                        .flat_map(|g| g.projects.values())
                        .flat_map(|changes| changes.changesets.iter().map(|cs| cs.id.as_str()))
                        .collect();
                    if !uncommitted.is_empty() {
                        ui::display_boundary_warning(&BoundaryWarning::UncommittedChangesets {
                            count: uncommitted.len(),
                        });
                    }
                    ui::display_release_tree(&tree);
                }
            }
            Ok(())
        }
        Command::Status => {
            let graph = live_graph(&root, &config.release.remote)?;
            let (statuses, warnings) = cli::run_status(graph.as_ref(), &workspace, &store)?;
            for warning in &warnings {
                ui::display_boundary_warning(warning);
            }
            print_statuses(&statuses);
            Ok(())
        }
        Command::Snapshot(tag) => {
            let graph = live_graph(&root, &config.release.remote)?;
            let workflow = workflow_args(&tag, &config, false);
            let result = cli::run_snapshot(graph.as_ref(), &workspace, &store, &workflow)?;
            for plan in &result.snapshots {
                ui::display_status(&formatter::render_snapshot_plan(plan));
            }
            report(&result, &workflow);
            Ok(())
        }
        Command::Publish {
            tag,
            consume_changesets,
            force,
        } => {
            let graph = live_graph(&root, &config.release.remote)?;
            let workflow = workflow_args(&tag, &config, consume_changesets);

            if !force && !workflow.dry_run {
                let preview = WorkflowArgs {
                    dry_run: true,
                    ..workflow.clone()
                };
                let planned = cli::run_publish(graph.as_ref(), &workspace, &store, &preview)?;
                if planned.tags.is_empty() {
                    report(&planned, &preview);
                    return Ok(());
                }
                for tag in &planned.tags {
                    ui::display_status(&format!("{}: {}", tag.project, tag.tag));
                }
                if !ui::confirm_action("Create these tags?")? {
                    println!("Operation cancelled by user.");
                    return Ok(());
                }
            }

            let result = cli::run_publish(graph.as_ref(), &workspace, &store, &workflow)?;
            for (project, plan) in &result.skipped {
                ui::display_status(&formatter::render_publish_plan(project, plan));
            }
            report(&result, &workflow);
            Ok(())
        }
    }
}

fn live_graph(root: &Path, remote: &str) -> Result<Box<dyn ReleaseGraph>> {
    open_graph(GraphBackend::Live {
        path: root.to_path_buf(),
        remote: remote.to_string(),
    })
    .context("Git repository error")
}

fn workflow_args(tag: &TagArgs, config: &config::Config, consume_changesets: bool) -> WorkflowArgs {
    WorkflowArgs {
        projects: tag.projects.clone(),
        dry_run: tag.dry_run,
        push: tag.push || config.behavior.push_tags,
        remote: config.release.remote.clone(),
        consume_changesets,
    }
}

fn report(result: &WorkflowResult, workflow: &WorkflowArgs) {
    for warning in &result.warnings {
        ui::display_boundary_warning(warning);
    }

    for tag in &result.tags {
        match tag.outcome {
            None => ui::display_status(&format!("Would create tag: {}", tag.tag)),
            Some(TagOutcome::Created) => ui::display_success(&format!("Created tag: {}", tag.tag)),
            Some(TagOutcome::AlreadyExists) => {
                ui::display_status(&format!("Tag already exists: {}", tag.tag))
            }
        }
        if tag.pushed {
            ui::display_success(&format!("Pushed tag: {} to {}", tag.tag, workflow.remote));
        } else if tag.outcome.is_some() {
            ui::display_manual_push_instruction(&tag.tag, &workflow.remote);
        }
    }

    for id in &result.deleted_changesets {
        ui::display_success(&format!("Consumed changeset: {}", id));
    }
}

fn print_statuses(statuses: &[ProjectStatus]) {
    let show = |v: &Option<monorel::domain::Version>| {
        v.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
    };

    println!(
        "{:<20} {:<12} {:<12} {:<8} {:<8} {}",
        "PROJECT", "RECORDED", "RELEASED", "PENDING", "BUMP", "NEXT"
    );
    for status in statuses {
        println!(
            "{:<20} {:<12} {:<12} {:<8} {:<8} {}",
            status.project,
            show(&status.recorded),
            show(&status.released),
            status.pending,
            status.bump.to_string(),
            show(&status.next)
        );
    }
}
