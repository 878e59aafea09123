use crate::domain::commit::short_hash;
use std::fmt;

/// Non-fatal conditions met while planning a release.
/// These are reported to the user and never abort the command.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No changeset declares a bump for the project
    NothingToRelease { project: String },
    /// The recorded version is already tagged
    AlreadyPublished { project: String, tag: String },
    /// package.json or VERSION exists but does not hold a semantic version
    UnparsableRecordedVersion { project: String, reason: String },
    /// Project has no package.json or VERSION file
    MissingRecordedVersion { project: String },
    /// Changesets not yet committed, grouped under the synthetic commit
    UncommittedChangesets { count: usize },
    /// Tags are pushed without fetching first; the remote may already hold them
    PushWithoutFetch { remote: String, head: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NothingToRelease { project } => {
                write!(f, "No pending changesets for '{}'", project)
            }
            BoundaryWarning::AlreadyPublished { project, tag } => {
                write!(f, "'{}' is already published as '{}'", project, tag)
            }
            BoundaryWarning::UnparsableRecordedVersion { project, reason } => {
                write!(
                    f,
                    "Cannot read the recorded version of '{}': {}",
                    project, reason
                )
            }
            BoundaryWarning::MissingRecordedVersion { project } => {
                write!(f, "'{}' has no recorded version", project)
            }
            BoundaryWarning::UncommittedChangesets { count } => {
                write!(
                    f,
                    "{} changeset(s) are not committed yet and have no release group",
                    count
                )
            }
            BoundaryWarning::PushWithoutFetch { remote, head } => {
                write!(
                    f,
                    "Pushing to '{}' from {} without fetching; remote tags were not checked",
                    remote,
                    short_hash(head)
                )
            }
        }
    }
}
