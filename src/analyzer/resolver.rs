use crate::domain::{extract_rc_number, BumpType, Project, Version};
use crate::error::{ReleaseError, Result};
use crate::git::ReleaseGraph;
use tracing::{debug, info, warn};

/// Release-candidate tag planned by [VersionResolver::plan_snapshot]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPlan {
    pub project: String,
    /// Bumped version the candidate leads up to
    pub base: Version,
    pub rc_number: u64,
    /// `base` with the `rcN` prerelease attached
    pub version: Version,
    pub tag_name: String,
}

/// Why a publish is skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The recorded version is already the latest final release
    AlreadyReleased,
    /// A tag for the recorded version exists, though not as latest release
    TagExists,
}

/// Decision for a final release
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishPlan {
    Skip {
        tag_name: String,
        reason: SkipReason,
    },
    Tag {
        version: Version,
        tag_name: String,
    },
}

impl PublishPlan {
    pub fn is_skip(&self) -> bool {
        matches!(self, PublishPlan::Skip { .. })
    }

    pub fn tag_name(&self) -> &str {
        match self {
            PublishPlan::Skip { tag_name, .. } | PublishPlan::Tag { tag_name, .. } => tag_name,
        }
    }
}

/// Result of [VersionResolver::ensure_tag]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    Created,
    AlreadyExists,
}

/// Combines recorded versions, bumps and tag state into next versions
pub struct VersionResolver<'a> {
    graph: &'a dyn ReleaseGraph,
}

impl<'a> VersionResolver<'a> {
    pub fn new(graph: &'a dyn ReleaseGraph) -> Self {
        VersionResolver { graph }
    }

    /// Version a bump leads to from `current`
    pub fn next_version(current: &Version, bump: BumpType) -> Result<Version> {
        current.bump(bump)
    }

    /// Newest final (non-RC) version of `project` reachable from HEAD
    ///
    /// # Returns
    /// * `Err(NotFound)` - If the project has never had a final release.
    ///   Callers treat this as "start from 0.0.0".
    /// * `Err(InvalidFormat)` - If a newer tag carries a malformed `-rc` suffix
    pub fn latest_non_rc_version(&self, project: &Project) -> Result<Version> {
        let pattern = format!("{}*", project.tag_prefix());

        for tag in self.graph.tags_with_prefix(&pattern)? {
            if extract_rc_number(&tag)?.is_some() {
                continue;
            }
            match Version::from_tag_name(&tag) {
                Ok(version) => return Ok(version),
                Err(e) => warn!(tag = %tag, error = %e, "skipping tag without a semantic version"),
            }
        }

        Err(ReleaseError::not_found(format!(
            "No released version found for project '{}'",
            project.name
        )))
    }

    /// [latest_non_rc_version](Self::latest_non_rc_version) with the
    /// "never released" sentinel mapped to `None`
    pub fn released_version(&self, project: &Project) -> Result<Option<Version>> {
        match self.latest_non_rc_version(project) {
            Ok(version) => Ok(Some(version)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Next free RC number for `version` of `project`: one past the highest
    /// reachable `-rcN` tag, or 0 when there is none
    pub fn find_next_rc_number(&self, project: &Project, version: &Version) -> Result<u64> {
        let base = version.release();
        let rc_prefix = format!("{}-rc", project.tag_name(&base));
        let pattern = format!("{}*", project.tag_prefix());

        let mut highest: Option<u64> = None;
        for tag in self.graph.tags_with_prefix(&pattern)? {
            if !tag.starts_with(&rc_prefix) {
                continue;
            }
            if let Some(n) = extract_rc_number(&tag)? {
                highest = Some(highest.map_or(n, |h| h.max(n)));
            }
        }

        let next = match highest {
            None => 0,
            Some(n) => n.checked_add(1).ok_or_else(|| {
                ReleaseError::invalid_format(format!("RC number of {} overflows", base))
            })?,
        };
        debug!(project = %project.name, version = %base, next, "resolved next RC number");
        Ok(next)
    }

    /// Plan a release-candidate tag for `project`
    ///
    /// # Returns
    /// * `Ok(None)` - If `bump` is [BumpType::None]: nothing to release
    /// * `Ok(Some(plan))` - The tag to create
    pub fn plan_snapshot(
        &self,
        project: &Project,
        current: &Version,
        bump: BumpType,
    ) -> Result<Option<SnapshotPlan>> {
        if bump == BumpType::None {
            debug!(project = %project.name, "no bump, nothing to snapshot");
            return Ok(None);
        }

        let base = Self::next_version(current, bump)?;
        let rc_number = self.find_next_rc_number(project, &base)?;
        let version = base.with_prerelease(format!("rc{}", rc_number));
        let tag_name = project.tag_name(&version);

        Ok(Some(SnapshotPlan {
            project: project.name.clone(),
            base,
            rc_number,
            version,
            tag_name,
        }))
    }

    /// Decide whether the recorded version of `project` still needs a tag
    ///
    /// Publishing is idempotent: when the recorded version already is the
    /// latest final release, or its tag exists, the plan is a skip.
    pub fn plan_publish(&self, project: &Project, recorded: &Version) -> Result<PublishPlan> {
        let tag_name = project.tag_name(recorded);

        if self.released_version(project)?.as_ref() == Some(recorded) {
            return Ok(PublishPlan::Skip {
                tag_name,
                reason: SkipReason::AlreadyReleased,
            });
        }

        if self.graph.tag_exists(&tag_name)? {
            return Ok(PublishPlan::Skip {
                tag_name,
                reason: SkipReason::TagExists,
            });
        }

        Ok(PublishPlan::Tag {
            version: recorded.clone(),
            tag_name,
        })
    }

    /// Create `name` on HEAD unless it already exists
    pub fn ensure_tag(&self, name: &str, message: &str) -> Result<TagOutcome> {
        if self.graph.tag_exists(name)? {
            info!(tag = name, "tag already exists");
            return Ok(TagOutcome::AlreadyExists);
        }
        self.graph.create_tag(name, message)?;
        Ok(TagOutcome::Created)
    }
}
