use crate::changeset::{Changeset, ChangesetStore};
use crate::domain::BumpType;
use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `"project": bump` or `project: bump`
const BUMP_LINE: &str = r#"^\s*["']?([^"':]+?)["']?\s*:\s*([A-Za-z]+)\s*$"#;

/// Changesets stored as markdown files in one directory
///
/// Each file carries a front matter block of project bumps followed by the
/// message:
///
/// ```text
/// ---
/// "backend": minor
/// www: patch
/// ---
///
/// Add invoice export.
/// ```
#[derive(Debug, Clone)]
pub struct DirChangesetStore {
    dir: PathBuf,
}

impl DirChangesetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirChangesetStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Parse the contents of one changeset file
pub fn parse_changeset(id: &str, path: &Path, content: &str) -> Result<Changeset> {
    let mut lines = content.trim_start().lines();
    if lines.next().map(str::trim) != Some("---") {
        return Err(ReleaseError::invalid_format(format!(
            "Changeset '{}' does not start with a '---' front matter block",
            id
        )));
    }

    let re = Regex::new(BUMP_LINE)
        .map_err(|e| ReleaseError::invalid_format(format!("Bad bump pattern: {}", e)))?;

    let mut changeset = Changeset::new(id, "").with_path(path);
    let mut closed = false;

    for line in lines.by_ref() {
        if line.trim() == "---" {
            closed = true;
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let captures = re.captures(line).ok_or_else(|| {
            ReleaseError::invalid_format(format!(
                "Changeset '{}' has a malformed bump line: '{}'",
                id, line
            ))
        })?;
        let project = captures[1].trim().to_string();
        let bump: BumpType = captures[2].parse()?;
        changeset.project_bumps.insert(project, bump);
    }

    if !closed {
        return Err(ReleaseError::invalid_format(format!(
            "Changeset '{}' has an unterminated front matter block",
            id
        )));
    }

    changeset.message = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    Ok(changeset)
}

impl ChangesetStore for DirChangesetStore {
    fn read_all(&self) -> Result<Vec<Changeset>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_markdown = path.extension().is_some_and(|ext| ext == "md");
            let is_readme = path
                .file_stem()
                .is_some_and(|stem| stem.eq_ignore_ascii_case("readme"));
            if path.is_file() && is_markdown && !is_readme {
                paths.push(path);
            }
        }
        paths.sort();

        let mut changesets = Vec::with_capacity(paths.len());
        for path in paths {
            let id = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let content = fs::read_to_string(&path)?;
            changesets.push(parse_changeset(&id, &path, &content)?);
        }

        debug!(dir = %self.dir.display(), count = changesets.len(), "read changesets");
        Ok(changesets)
    }

    fn delete(&self, changeset: &Changeset) -> Result<()> {
        match fs::remove_file(&changeset.path) {
            Ok(()) => {
                debug!(id = %changeset.id, "deleted changeset");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ReleaseError::not_found(format!(
                "Changeset file '{}' not found",
                changeset.path.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\n\"backend\": minor\nwww: patch\n---\n\nAdd invoice export.\n\nWith CSV support.\n";

    #[test]
    fn test_parse_changeset() {
        let cs = parse_changeset("brave-cats", Path::new(".changeset/brave-cats.md"), SAMPLE)
            .unwrap();
        assert_eq!(cs.bump_for("backend"), Some(BumpType::Minor));
        assert_eq!(cs.bump_for("www"), Some(BumpType::Patch));
        assert_eq!(cs.message, "Add invoice export.\n\nWith CSV support.");
        assert_eq!(cs.path, PathBuf::from(".changeset/brave-cats.md"));
    }

    #[test]
    fn test_parse_scoped_package_name() {
        let content = "---\n\"@acme/web\": major\n---\nDrop IE support";
        let cs = parse_changeset("x", Path::new("x.md"), content).unwrap();
        assert_eq!(cs.bump_for("@acme/web"), Some(BumpType::Major));
    }

    #[test]
    fn test_parse_rejects_unknown_bump() {
        let content = "---\nbackend: huge\n---\nx";
        let err = parse_changeset("x", Path::new("x.md"), content).unwrap_err();
        assert!(err.is_invalid_format());
    }

    #[test]
    fn test_parse_rejects_missing_front_matter() {
        assert!(parse_changeset("x", Path::new("x.md"), "just text").is_err());
        assert!(parse_changeset("x", Path::new("x.md"), "---\nbackend: patch\n").is_err());
    }

    #[test]
    fn test_read_all_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b-second.md"), SAMPLE).unwrap();
        fs::write(dir.path().join("a-first.md"), "---\nbackend: patch\n---\nFix rounding").unwrap();
        fs::write(dir.path().join("README.md"), "# Changesets").unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();

        let store = DirChangesetStore::new(dir.path());
        let changesets = store.read_all().unwrap();
        let ids: Vec<_> = changesets.iter().map(|cs| cs.id.as_str()).collect();
        assert_eq!(ids, vec!["a-first", "b-second"]);

        store.delete(&changesets[0]).unwrap();
        assert_eq!(store.read_all().unwrap().len(), 1);
        assert!(store.delete(&changesets[0]).unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_all_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirChangesetStore::new(dir.path().join(".changeset"));
        assert!(store.read_all().unwrap().is_empty());
    }
}
