use crate::domain::project::ProjectType;
use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Semantic version representation
///
/// Ordering follows (major, minor, patch) first. At equal numbers a final
/// release outranks any of its prereleases, `rcN` prereleases compare by `N`,
/// and other prerelease labels rank below release candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

impl Version {
    /// Create a new final version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// The version used when a project has never been released
    pub fn zero() -> Self {
        Version::new(0, 0, 0)
    }

    /// Parse "MAJOR.MINOR.PATCH" or "MAJOR.MINOR.PATCH-PRERELEASE"
    pub fn parse(s: &str) -> Result<Self> {
        let parsed = semver::Version::parse(s.trim()).map_err(|e| {
            ReleaseError::invalid_format(format!("Invalid version '{}': {}", s, e))
        })?;

        let prerelease = if parsed.pre.is_empty() {
            None
        } else {
            Some(parsed.pre.as_str().to_string())
        };

        Ok(Version {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            prerelease,
        })
    }

    /// Parse the version part of a tag name (e.g., "backend@v1.2.3" -> 1.2.3)
    pub fn from_tag_name(tag: &str) -> Result<Self> {
        let version_part = match tag.rfind('@') {
            Some(pos) => &tag[pos + 1..],
            None => tag,
        };
        Version::parse(version_part.strip_prefix('v').unwrap_or(version_part))
    }

    /// Bump version according to bump type. Every bump clears the prerelease.
    ///
    /// # Returns
    /// * `Err(InvalidFormat)` - If the bumped component would overflow
    pub fn bump(&self, bump_type: BumpType) -> Result<Self> {
        let overflow = || {
            ReleaseError::invalid_format(format!(
                "Cannot apply a {} bump to {}: component overflows",
                bump_type, self
            ))
        };
        Ok(match bump_type {
            BumpType::None => self.release(),
            BumpType::Patch => {
                Version::new(self.major, self.minor, self.patch.checked_add(1).ok_or_else(overflow)?)
            }
            BumpType::Minor => {
                Version::new(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0)
            }
            BumpType::Major => Version::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
        })
    }

    /// Copy of this version without its prerelease
    pub fn release(&self) -> Self {
        Version::new(self.major, self.minor, self.patch)
    }

    /// Copy of this version carrying `label` as its prerelease
    pub fn with_prerelease(&self, label: impl Into<String>) -> Self {
        Version {
            prerelease: Some(label.into()),
            ..self.clone()
        }
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Render the version as it appears after `{project}@` in a tag name
    pub fn tag(&self, project_type: ProjectType) -> String {
        match project_type {
            ProjectType::Go => format!("v{}", self),
            ProjectType::Node => self.to_string(),
        }
    }

    fn prerelease_key(pre: &str) -> (u8, u64) {
        match rc_number(pre) {
            Some(n) => (1, n),
            None => (0, 0),
        }
    }
}

/// Number carried by an `rcN` prerelease label
pub(crate) fn rc_number(prerelease: &str) -> Option<u64> {
    let digits = prerelease.strip_prefix("rc")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => Version::prerelease_key(a)
                    .cmp(&Version::prerelease_key(b))
                    .then_with(|| a.cmp(b)),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Version {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

/// Version bump category declared by changesets.
///
/// Declaration order is the release priority: `None < Patch < Minor < Major`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl FromStr for BumpType {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(BumpType::None),
            "patch" => Ok(BumpType::Patch),
            "minor" => Ok(BumpType::Minor),
            "major" => Ok(BumpType::Major),
            other => Err(ReleaseError::invalid_format(format!(
                "Unknown bump type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BumpType::None => "none",
            BumpType::Patch => "patch",
            BumpType::Minor => "minor",
            BumpType::Major => "major",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
        assert!(!v.is_prerelease());
    }

    #[test]
    fn test_version_parse_rc() {
        let v = Version::parse("1.2.0-rc5").unwrap();
        assert_eq!(v, Version::new(1, 2, 0).with_prerelease("rc5"));
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("v1.2.3").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
        assert!(Version::parse("").unwrap_err().is_invalid_format());
    }

    #[test]
    fn test_version_from_tag_name() {
        assert_eq!(
            Version::from_tag_name("backend@v1.2.3").unwrap(),
            Version::new(1, 2, 3)
        );
        assert_eq!(
            Version::from_tag_name("@scope/web@2.0.0-rc1").unwrap(),
            Version::new(2, 0, 0).with_prerelease("rc1")
        );
        assert!(Version::from_tag_name("backend@vnext").is_err());
    }

    #[test]
    fn test_version_bump_from_1_4_9() {
        let v = Version::new(1, 4, 9);
        assert_eq!(v.bump(BumpType::Minor).unwrap(), Version::new(1, 5, 0));
        assert_eq!(v.bump(BumpType::Major).unwrap(), Version::new(2, 0, 0));
        assert_eq!(v.bump(BumpType::Patch).unwrap(), Version::new(1, 4, 10));
        assert_eq!(v.bump(BumpType::None).unwrap(), v);
    }

    #[test]
    fn test_version_bump_overflow_is_error() {
        let v = Version::parse(&format!("1.{}.{}", u64::MAX, u64::MAX)).unwrap();
        assert!(v.bump(BumpType::Patch).unwrap_err().is_invalid_format());
        assert!(v.bump(BumpType::Minor).unwrap_err().is_invalid_format());
        assert_eq!(v.bump(BumpType::Major).unwrap(), Version::new(2, 0, 0));
        assert_eq!(v.bump(BumpType::None).unwrap(), v);
    }

    #[test]
    fn test_version_bump_clears_prerelease() {
        let rc = Version::new(1, 4, 9).with_prerelease("rc2");
        for bump in [BumpType::None, BumpType::Patch, BumpType::Minor, BumpType::Major] {
            assert_eq!(rc.bump(bump).unwrap().prerelease, None);
        }
    }

    #[test]
    fn test_with_prerelease_keeps_numbers() {
        let base = Version::new(1, 3, 0);
        let rc = base.with_prerelease("rc0");
        assert_eq!((rc.major, rc.minor, rc.patch), (1, 3, 0));
        assert_eq!(rc.to_string(), "1.3.0-rc0");
    }

    #[test]
    fn test_final_outranks_release_candidates() {
        let final_release = Version::new(1, 3, 0);
        let rc = Version::new(1, 3, 0).with_prerelease("rc9");
        assert!(final_release > rc);
        assert!(Version::new(1, 2, 9) < rc);
    }

    #[test]
    fn test_rc_numbers_compare_numerically() {
        let rc2 = Version::parse("1.0.0-rc2").unwrap();
        let rc10 = Version::parse("1.0.0-rc10").unwrap();
        assert!(rc10 > rc2);
    }

    #[test]
    fn test_other_prereleases_rank_below_rc() {
        let beta = Version::parse("1.0.0-beta").unwrap();
        let rc0 = Version::parse("1.0.0-rc0").unwrap();
        assert!(beta < rc0);
    }

    #[test]
    fn test_tag_rendering() {
        let v = Version::new(1, 2, 3);
        assert_eq!(v.tag(ProjectType::Go), "v1.2.3");
        assert_eq!(v.tag(ProjectType::Node), "1.2.3");
        assert_eq!(v.with_prerelease("rc1").tag(ProjectType::Go), "v1.2.3-rc1");
    }

    #[test]
    fn test_bump_type_order() {
        assert!(BumpType::None < BumpType::Patch);
        assert!(BumpType::Patch < BumpType::Minor);
        assert!(BumpType::Minor < BumpType::Major);
    }

    #[test]
    fn test_bump_type_parse() {
        assert_eq!("minor".parse::<BumpType>().unwrap(), BumpType::Minor);
        assert_eq!(" MAJOR ".parse::<BumpType>().unwrap(), BumpType::Major);
        assert!("huge".parse::<BumpType>().unwrap_err().is_invalid_format());
    }
}
