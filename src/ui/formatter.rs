//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! `render_*` functions build the text and are unit tested; `display_*` functions print it.

use console::style;

use crate::analyzer::{PublishPlan, SkipReason, SnapshotPlan};
use crate::boundary::BoundaryWarning;
use crate::domain::commit::short_hash;
use crate::release_tree::{ProjectGroup, ReleaseTree};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
///
/// Shows a yellow warning icon followed by the warning message.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Render the release tree, one block per originating commit.
///
/// ```text
/// a1b2c3d feat: dashboards
///   analytics (1 changeset)
///     - Add dashboards (#12)
///   www (1 changeset)
///     - Add dashboards (#12)
/// ```
pub fn render_release_tree(tree: &ReleaseTree) -> String {
    let mut out = String::new();
    for group in tree.groups() {
        let subject = group
            .commit_message
            .as_deref()
            .and_then(|m| m.lines().next())
            .unwrap_or("");
        let header = if group.is_unknown() {
            format!("{} (not committed)", group.commit)
        } else {
            format!("{} {}", short_hash(&group.commit), subject)
        };
        out.push_str(header.trim_end());
        out.push('\n');

        for (name, changes) in &group.projects {
            let count = changes.changesets.len();
            out.push_str(&format!(
                "  {} ({} changeset{})\n",
                name,
                count,
                if count == 1 { "" } else { "s" }
            ));
            for line in changes.changelog_preview.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
    }
    out
}

/// Display the release tree, or a note when there is nothing pending.
pub fn display_release_tree(tree: &ReleaseTree) {
    if tree.is_empty() {
        display_status("No pending changesets");
        return;
    }
    println!("\n{}", style("Release groups:").bold());
    print!("{}", render_release_tree(tree));
}

/// Render the projects that must be released together with one project.
pub fn render_project_group(group: &ProjectGroup) -> String {
    let related = group.related_projects();
    if related.is_empty() {
        format!("{} is released on its own", group.project)
    } else {
        format!("{} is released together with: {}", group.project, related.join(", "))
    }
}

/// Render a planned release candidate.
pub fn render_snapshot_plan(plan: &SnapshotPlan) -> String {
    format!(
        "{}: {} (rc{} of {})",
        plan.project, plan.tag_name, plan.rc_number, plan.base
    )
}

/// Render a publish decision.
pub fn render_publish_plan(project: &str, plan: &PublishPlan) -> String {
    match plan {
        PublishPlan::Tag { tag_name, .. } => format!("{}: {}", project, tag_name),
        PublishPlan::Skip {
            tag_name,
            reason: SkipReason::AlreadyReleased,
        } => format!("{}: {} is the latest release, skipping", project, tag_name),
        PublishPlan::Skip {
            tag_name,
            reason: SkipReason::TagExists,
        } => format!("{}: {} already exists, skipping", project, tag_name),
    }
}

/// Display manual push instruction for a tag.
pub fn display_manual_push_instruction(tag: &str, remote: &str) {
    println!(
        "\n{} To push this tag later, run:\n  {}",
        style("→").yellow(),
        style(format!("git push {} refs/tags/{}", remote, tag)).cyan()
    );
}
