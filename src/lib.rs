pub mod analyzer;
pub mod boundary;
pub mod changeset;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod release_tree;
pub mod ui;
pub mod workspace;

pub use error::{ReleaseError, Result};
