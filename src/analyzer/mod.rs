//! Analysis engine: from changesets and tags to the next release

pub mod bump;
pub mod resolver;

pub use bump::{changesets_for, highest_bump};
pub use resolver::{PublishPlan, SkipReason, SnapshotPlan, TagOutcome, VersionResolver};
