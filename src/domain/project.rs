use crate::domain::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of project, which decides how its tags are spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    /// Go module: tags carry a leading `v` (`backend@v1.2.3`)
    Go,
    /// Node package: tags are bare semver (`web@1.2.3`)
    Node,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectType::Go => f.write_str("go"),
            ProjectType::Node => f.write_str("node"),
        }
    }
}

/// A releasable project inside the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(rename = "path")]
    pub root_path: PathBuf,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        root_path: impl Into<PathBuf>,
        project_type: ProjectType,
    ) -> Self {
        Project {
            name: name.into(),
            root_path: root_path.into(),
            project_type,
        }
    }

    /// Go project rooted at a directory of the same name
    pub fn go(name: impl Into<String>) -> Self {
        let name = name.into();
        Project::new(name.clone(), name, ProjectType::Go)
    }

    /// Node project rooted at a directory of the same name
    pub fn node(name: impl Into<String>) -> Self {
        let name = name.into();
        Project::new(name.clone(), name, ProjectType::Node)
    }

    /// Prefix shared by every release tag of this project
    ///
    /// `backend@v` for Go projects, `web@` for Node projects.
    pub fn tag_prefix(&self) -> String {
        match self.project_type {
            ProjectType::Go => format!("{}@v", self.name),
            ProjectType::Node => format!("{}@", self.name),
        }
    }

    /// Full tag name for a version of this project
    pub fn tag_name(&self, version: &Version) -> String {
        format!("{}@{}", self.name, version.tag(self.project_type))
    }
}
