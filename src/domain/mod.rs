//! Domain logic - pure release rules independent of any git backend

pub mod branch;
pub mod commit;
pub mod project;
pub mod tag;
pub mod version;

pub use branch::{Branch, DEFAULT_BRANCH};
pub use commit::Commit;
pub use project::{Project, ProjectType};
pub use tag::{extract_rc_number, sort_tags_descending, Tag, TagPattern};
pub use version::{BumpType, Version};
