//! VCS query capability consumed by the commit analyzer.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VcsResult;

/// Kind of change a commit made to a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Path changed in place.
    Modified,
    /// Path newly introduced.
    Added,
    /// Path removed.
    Deleted,
}

impl ChangeKind {
    /// Parses a git name-status letter.
    ///
    /// `T` (type change) counts as an in-place modification. Rename and copy
    /// letters are not accepted because backends never ask git to detect them.
    pub fn from_status_letter(letter: &str) -> Option<Self> {
        match letter {
            "M" | "T" => Some(Self::Modified),
            "A" => Some(Self::Added),
            "D" => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modified => write!(f, "M"),
            Self::Added => write!(f, "A"),
            Self::Deleted => write!(f, "D"),
        }
    }
}

/// One entry of a name-status diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// What happened to the path.
    pub kind: ChangeKind,
    /// Path relative to the repository root.
    pub path: String,
}

impl FileChange {
    /// Creates a new file change entry.
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Queries the analyzer needs from a version-control system.
///
/// Implementations answer each query independently; the analyzer issues
/// them in order and never overlaps them.
pub trait VcsQuery {
    /// Returns the full message of the HEAD commit.
    fn head_message(&self) -> VcsResult<String>;

    /// Resolves a reference (such as `HEAD`) to a full commit identifier.
    fn commit_id(&self, reference: &str) -> VcsResult<String>;

    /// Returns the parent identifiers of a commit, in VCS order.
    fn parents(&self, commit_id: &str) -> VcsResult<Vec<String>>;

    /// Returns the name-status diff of a commit, in VCS output order.
    fn name_status_diff(&self, commit_id: &str) -> VcsResult<Vec<FileChange>>;
}

impl<T: VcsQuery + ?Sized> VcsQuery for &T {
    fn head_message(&self) -> VcsResult<String> {
        (**self).head_message()
    }

    fn commit_id(&self, reference: &str) -> VcsResult<String> {
        (**self).commit_id(reference)
    }

    fn parents(&self, commit_id: &str) -> VcsResult<Vec<String>> {
        (**self).parents(commit_id)
    }

    fn name_status_diff(&self, commit_id: &str) -> VcsResult<Vec<FileChange>> {
        (**self).name_status_diff(commit_id)
    }
}

impl<T: VcsQuery + ?Sized> VcsQuery for Box<T> {
    fn head_message(&self) -> VcsResult<String> {
        (**self).head_message()
    }

    fn commit_id(&self, reference: &str) -> VcsResult<String> {
        (**self).commit_id(reference)
    }

    fn parents(&self, commit_id: &str) -> VcsResult<Vec<String>> {
        (**self).parents(commit_id)
    }

    fn name_status_diff(&self, commit_id: &str) -> VcsResult<Vec<FileChange>> {
        (**self).name_status_diff(commit_id)
    }
}

/// Combines per-parent diffs of a merge commit the way `git show` does.
///
/// Only paths that differ from every parent survive; the change kind and
/// order come from the first-parent diff. A single diff is returned as is.
pub fn combine_parent_diffs(mut diffs: Vec<Vec<FileChange>>) -> Vec<FileChange> {
    if diffs.is_empty() {
        return Vec::new();
    }

    let first = diffs.remove(0);
    if diffs.is_empty() {
        return first;
    }

    let others: Vec<HashSet<String>> = diffs
        .into_iter()
        .map(|diff| diff.into_iter().map(|change| change.path).collect())
        .collect();

    first
        .into_iter()
        .filter(|change| others.iter().all(|paths| paths.contains(&change.path)))
        .collect()
}
