use crate::changeset::Changeset;
use crate::domain::BumpType;

/// Highest bump any changeset declares for `project`
///
/// Changesets silent on the project are skipped. An empty or irrelevant
/// input yields [BumpType::None], meaning there is nothing to release. The
/// result does not depend on input order.
pub fn highest_bump(changesets: &[Changeset], project: &str) -> BumpType {
    changesets
        .iter()
        .filter_map(|cs| cs.bump_for(project))
        .max()
        .unwrap_or(BumpType::None)
}

/// Changesets that declare a bump for `project`
pub fn changesets_for<'a>(changesets: &'a [Changeset], project: &str) -> Vec<&'a Changeset> {
    changesets
        .iter()
        .filter(|cs| cs.bump_for(project).is_some())
        .collect()
}
