use crate::domain::version::Version;
use crate::error::{ReleaseError, Result};
use std::cmp::Ordering;

/// An annotated tag bound to a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit: String,
    pub message: String,
    pub pushed: bool,
}

impl Tag {
    /// Create a new, not yet pushed tag
    pub fn new(name: impl Into<String>, commit: impl Into<String>, message: impl Into<String>) -> Self {
        Tag {
            name: name.into(),
            commit: commit.into(),
            message: message.into(),
            pushed: false,
        }
    }

    /// Version encoded in the tag name (e.g., "backend@v1.2.3" -> 1.2.3)
    pub fn version(&self) -> Result<Version> {
        Version::from_tag_name(&self.name)
    }
}

/// Tag query pattern: an exact name, or a prefix followed by a single `*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pattern: String,
}

impl TagPattern {
    /// Validate a pattern. Only one trailing `*` is supported.
    pub fn parse(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(ReleaseError::invalid_format("Empty tag pattern"));
        }

        let stars = pattern.matches('*').count();
        if stars > 1 || (stars == 1 && !pattern.ends_with('*')) {
            return Err(ReleaseError::invalid_format(format!(
                "Tag pattern '{}' may only contain a single trailing '*'",
                pattern
            )));
        }

        Ok(TagPattern { pattern })
    }

    /// Pattern matching every tag of a prefix
    pub fn prefix(prefix: &str) -> Result<Self> {
        TagPattern::parse(format!("{}*", prefix))
    }

    pub fn is_wildcard(&self) -> bool {
        self.pattern.ends_with('*')
    }

    /// The pattern text, usable as a `git tag --list` glob
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, tag: &str) -> bool {
        match self.pattern.strip_suffix('*') {
            Some(prefix) => tag.starts_with(prefix),
            None => tag == self.pattern,
        }
    }
}

/// Extract the release-candidate number of a tag.
///
/// Returns `Ok(None)` when the tag is not a release candidate and an
/// `InvalidFormat` error when `-rc` is followed by nothing or by non-digits.
pub fn extract_rc_number(tag: &str) -> Result<Option<u64>> {
    let version_part = match tag.rfind('@') {
        Some(pos) => &tag[pos + 1..],
        None => tag,
    };

    let Some(pos) = version_part.rfind("-rc") else {
        return Ok(None);
    };

    let suffix = &version_part[pos + 3..];
    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
        return Err(ReleaseError::invalid_format(format!(
            "Invalid RC suffix in tag '{}'",
            tag
        )));
    }

    suffix
        .parse::<u64>()
        .map(Some)
        .map_err(|e| ReleaseError::invalid_format(format!("Invalid RC number in '{}': {}", tag, e)))
}

/// Ordering used for every tag listing: newest version first.
///
/// Names whose version does not parse sort after all parsable ones, by
/// descending name; equal versions fall back to descending name.
pub fn compare_tags_descending(a: &str, b: &str) -> Ordering {
    match (Version::from_tag_name(a), Version::from_tag_name(b)) {
        (Ok(va), Ok(vb)) => vb.cmp(&va).then_with(|| b.cmp(a)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.cmp(a),
    }
}

pub fn sort_tags_descending(tags: &mut [String]) {
    tags.sort_by(|a, b| compare_tags_descending(a, b));
}
