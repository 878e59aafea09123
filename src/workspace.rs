//! Workspace layout: configured projects and their recorded versions

use crate::config::Config;
use crate::domain::{Project, ProjectType, Version};
use crate::error::{ReleaseError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Manifest holding the recorded version of a Node project
pub const PACKAGE_JSON: &str = "package.json";
/// Plain-text file holding the recorded version of a Go project
pub const VERSION_FILE: &str = "VERSION";

/// Projects of one repository checkout, resolved against its root
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    projects: Vec<Project>,
    changeset_dir: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, projects: Vec<Project>) -> Self {
        Workspace {
            root: root.into(),
            projects,
            changeset_dir: PathBuf::from(".changeset"),
        }
    }

    /// Workspace described by `config`, rooted at `root`
    pub fn from_config(root: impl Into<PathBuf>, config: &Config) -> Self {
        Workspace {
            root: root.into(),
            projects: config.projects.clone(),
            changeset_dir: config.release.changeset_dir.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, name: &str) -> Result<&Project> {
        self.projects
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ReleaseError::not_found(format!("Project '{}' is not configured", name)))
    }

    /// Absolute directory holding pending changesets
    pub fn changeset_dir(&self) -> PathBuf {
        self.root.join(&self.changeset_dir)
    }

    /// Version currently written in the project's manifest
    ///
    /// # Returns
    /// * `Ok(None)` - If the manifest or its version field is missing
    /// * `Err(InvalidFormat)` - If the manifest or version cannot be parsed
    pub fn recorded_version(&self, project: &Project) -> Result<Option<Version>> {
        let dir = self.root.join(&project.root_path);
        match project.project_type {
            ProjectType::Node => read_package_version(&dir.join(PACKAGE_JSON)),
            ProjectType::Go => read_version_file(&dir.join(VERSION_FILE)),
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn read_package_version(path: &Path) -> Result<Option<Version>> {
    let Some(content) = read_optional(path)? else {
        return Ok(None);
    };

    let manifest: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        ReleaseError::invalid_format(format!("{} is not valid JSON: {}", path.display(), e))
    })?;

    match manifest.get("version") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(version)) => Version::parse(version).map(Some),
        Some(other) => Err(ReleaseError::invalid_format(format!(
            "{} has a non-string version: {}",
            path.display(),
            other
        ))),
    }
}

fn read_version_file(path: &Path) -> Result<Option<Version>> {
    let Some(content) = read_optional(path)? else {
        return Ok(None);
    };
    let version = content.trim();
    if version.is_empty() {
        return Ok(None);
    }
    Version::parse(version.strip_prefix('v').unwrap_or(version)).map(Some)
}
