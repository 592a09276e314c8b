//! Data processing and serialization.

use serde::Serialize;

use crate::git::CommitMetadata;

pub mod check;
pub mod yaml;

pub use check::*;
pub use yaml::*;

/// Output of the `view` command.
#[derive(Debug, Clone, Serialize)]
pub struct CommitView {
    /// Version information for the tool.
    pub versions: VersionInfo,
    /// Metadata of the analyzed HEAD commit.
    pub commit: CommitMetadata,
}

/// Version information.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    /// Version of commit-inspect that produced the output.
    pub commit_inspect: String,
}

impl CommitView {
    /// Wraps analyzed metadata with version information.
    pub fn new(commit: CommitMetadata) -> Self {
        Self {
            versions: VersionInfo {
                commit_inspect: crate::VERSION.to_string(),
            },
            commit,
        }
    }
}
