//! HEAD commit analysis and classification.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{VcsError, VcsResult};
use crate::git::vcs::{ChangeKind, FileChange, VcsQuery};

/// Revert message as written by `git revert`: a quoted title, then the
/// reverted commit id on its own line.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static REVERT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)\ARevert ".*"\n(?:\n)*This reverts commit [0-9a-f]{40}\.$"#).unwrap()
});

/// Generic, provider-agnostic CI-skip marker.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static CI_SKIP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[ci skip\]|\[skip ci\]").unwrap());

/// Classification flag for a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitKind {
    /// The commit has two or more parents.
    Merge,
    /// The message is a `git revert` message.
    Revert,
    /// The message asks CI to skip the build.
    CiSkip,
}

impl fmt::Display for CommitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Revert => write!(f, "revert"),
            Self::CiSkip => write!(f, "ci_skip"),
        }
    }
}

/// Set of classification flags. Flags are independent of each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Classification(BTreeSet<CommitKind>);

impl Classification {
    /// Returns an empty classification (a simple commit).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag.
    pub fn insert(&mut self, kind: CommitKind) {
        self.0.insert(kind);
    }

    /// Checks whether a flag is set.
    pub fn contains(&self, kind: CommitKind) -> bool {
        self.0.contains(&kind)
    }

    /// Checks whether no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the set flags in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = CommitKind> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<CommitKind> for Classification {
    fn from_iter<I: IntoIterator<Item = CommitKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Metadata derived from the HEAD commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMetadata {
    /// Full commit message, trailing blank lines included.
    pub raw_message: String,
    /// Full identifier of the commit.
    pub commit_id: String,
    /// Parent identifiers in VCS order.
    pub parent_ids: Vec<String>,
    /// Classification flags.
    pub classification: Classification,
    /// Paths changed in place.
    pub modified_files: Vec<String>,
    /// Paths newly introduced.
    pub added_files: Vec<String>,
    /// Paths removed.
    pub deleted_files: Vec<String>,
}

impl CommitMetadata {
    /// Iterates over every touched path: modified, then added, then deleted.
    pub fn touched_files(&self) -> impl Iterator<Item = &str> {
        self.modified_files
            .iter()
            .chain(&self.added_files)
            .chain(&self.deleted_files)
            .map(String::as_str)
    }
}

/// Analyzes the HEAD commit through an injected [`VcsQuery`].
pub struct CommitAnalyzer<V> {
    vcs: V,
}

impl<V: VcsQuery> CommitAnalyzer<V> {
    /// Creates an analyzer backed by the given VCS.
    pub fn new(vcs: V) -> Self {
        Self { vcs }
    }

    /// Builds [`CommitMetadata`] for the current HEAD.
    ///
    /// Queries run in order (message, id, parents, diff) and the first
    /// failure is returned unchanged.
    pub fn analyze(&self) -> VcsResult<CommitMetadata> {
        let raw_message = self.vcs.head_message()?;
        let commit_id = self.vcs.commit_id("HEAD")?;
        debug!(commit = %commit_id, "Analyzing HEAD commit");

        let parent_ids = self.vcs.parents(&commit_id)?;

        let mut classification = Classification::new();
        if parent_ids.len() >= 2 {
            classification.insert(CommitKind::Merge);
        }
        if is_revert_message(&raw_message) {
            classification.insert(CommitKind::Revert);
        }
        if has_ci_skip_marker(&raw_message) {
            classification.insert(CommitKind::CiSkip);
        }
        debug!(
            parents = parent_ids.len(),
            flags = ?classification,
            "Classified commit"
        );

        let changes = self.vcs.name_status_diff(&commit_id)?;
        let (modified_files, added_files, deleted_files) = partition_changes(changes)?;

        Ok(CommitMetadata {
            raw_message,
            commit_id,
            parent_ids,
            classification,
            modified_files,
            added_files,
            deleted_files,
        })
    }
}

/// Checks whether a message is a `git revert` message.
///
/// Trailing whitespace, at line ends and at the end of the message, is
/// ignored. Both the `Revert "..."` title and the
/// `This reverts commit <sha>.` line must be present, in that order.
pub fn is_revert_message(message: &str) -> bool {
    let normalized: Vec<&str> = message.trim_end().lines().map(str::trim_end).collect();
    REVERT_PATTERN.is_match(&normalized.join("\n"))
}

/// Checks whether a message carries `[ci skip]` or `[skip ci]` anywhere.
pub fn has_ci_skip_marker(message: &str) -> bool {
    CI_SKIP_PATTERN.is_match(message)
}

/// Splits a name-status diff into modified, added and deleted paths.
///
/// Relative order within each kind is preserved. A path reported twice is
/// malformed output.
pub fn partition_changes(
    changes: Vec<FileChange>,
) -> VcsResult<(Vec<String>, Vec<String>, Vec<String>)> {
    let mut seen = HashSet::new();
    let mut modified = Vec::new();
    let mut added = Vec::new();
    let mut deleted = Vec::new();

    for change in changes {
        if !seen.insert(change.path.clone()) {
            return Err(VcsError::malformed(
                "name-status diff",
                format!("path reported more than once: {}", change.path),
            ));
        }

        match change.kind {
            ChangeKind::Modified => modified.push(change.path),
            ChangeKind::Added => added.push(change.path),
            ChangeKind::Deleted => deleted.push(change.path),
        }
    }

    Ok((modified, added, deleted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_utils::FakeVcs;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn simple_commit_adding_a_file() {
        let vcs = FakeVcs::new("Add testfile1\n\n")
            .with_parents(&["1111111111111111111111111111111111111111"])
            .with_changes(vec![FileChange::new(ChangeKind::Added, "testfile1.txt")]);

        let metadata = CommitAnalyzer::new(&vcs).analyze().unwrap();

        assert_eq!(metadata.raw_message, "Add testfile1\n\n");
        assert_eq!(metadata.commit_id, vcs.id);
        assert!(metadata.classification.is_empty());
        assert_eq!(metadata.added_files, vec!["testfile1.txt"]);
        assert!(metadata.modified_files.is_empty());
        assert!(metadata.deleted_files.is_empty());
    }

    #[test]
    fn root_commit_is_not_a_merge() {
        let vcs = FakeVcs::new("Initial commit\n");
        let metadata = CommitAnalyzer::new(&vcs).analyze().unwrap();
        assert!(metadata.parent_ids.is_empty());
        assert!(!metadata.classification.contains(CommitKind::Merge));
    }

    #[test]
    fn merge_can_also_skip_ci() {
        let vcs = FakeVcs::new("Merge branch 'feature' [skip ci]\n")
            .with_parents(&[SHA, "fedcba9876543210fedcba9876543210fedcba98"]);
        let metadata = CommitAnalyzer::new(&vcs).analyze().unwrap();
        assert!(metadata.classification.contains(CommitKind::Merge));
        assert!(metadata.classification.contains(CommitKind::CiSkip));
        assert!(!metadata.classification.contains(CommitKind::Revert));
    }

    #[test]
    fn revert_commit() {
        let message = format!("Revert \"another commit [skip ci]\"\n\nThis reverts commit {SHA}.\n\n");
        let vcs = FakeVcs::new(&message)
            .with_parents(&[SHA])
            .with_changes(vec![FileChange::new(ChangeKind::Deleted, "testfile3.txt")]);

        let metadata = CommitAnalyzer::new(&vcs).analyze().unwrap();

        assert!(metadata.classification.contains(CommitKind::Revert));
        assert!(metadata.classification.contains(CommitKind::CiSkip));
        assert_eq!(metadata.deleted_files, vec!["testfile3.txt"]);
        assert_eq!(metadata.raw_message, message);
    }

    #[test]
    fn revert_pattern_requires_both_lines() {
        assert!(is_revert_message(&format!(
            "Revert \"X\"\n\nThis reverts commit {SHA}.\n\n"
        )));
        assert!(is_revert_message(&format!(
            "Revert \"X\"   \nThis reverts commit {SHA}.  \n\nBecause it broke the build.\n"
        )));

        // Title only.
        assert!(!is_revert_message("Revert \"X\"\n"));
        // Body only.
        assert!(!is_revert_message(&format!("This reverts commit {SHA}.\n")));
        // Missing closing quote.
        assert!(!is_revert_message(&format!(
            "Revert \"X\n\nThis reverts commit {SHA}.\n"
        )));
        // Id one character short, and one too long.
        assert!(!is_revert_message(&format!(
            "Revert \"X\"\n\nThis reverts commit {}.\n",
            &SHA[..39]
        )));
        assert!(!is_revert_message(&format!(
            "Revert \"X\"\n\nThis reverts commit {SHA}0.\n"
        )));
        // Missing trailing period.
        assert!(!is_revert_message(&format!(
            "Revert \"X\"\n\nThis reverts commit {SHA}\n"
        )));
        // Title must be the first line.
        assert!(!is_revert_message(&format!(
            "Fix\nRevert \"X\"\n\nThis reverts commit {SHA}.\n"
        )));
    }

    #[test]
    fn ci_skip_marker_is_case_sensitive() {
        assert!(has_ci_skip_marker("Add file [ci skip]"));
        assert!(has_ci_skip_marker("Title\n\nbody [skip ci] trailer"));
        assert!(!has_ci_skip_marker("Add file [CI SKIP]"));
        assert!(!has_ci_skip_marker("Add file [skip appveyor]"));
        assert!(!has_ci_skip_marker("Add file ci skip"));
    }

    #[test]
    fn partition_preserves_order_within_kind() {
        let (modified, added, deleted) = partition_changes(vec![
            FileChange::new(ChangeKind::Added, "b"),
            FileChange::new(ChangeKind::Modified, "m1"),
            FileChange::new(ChangeKind::Added, "a"),
            FileChange::new(ChangeKind::Deleted, "d"),
            FileChange::new(ChangeKind::Modified, "m0"),
        ])
        .unwrap();

        assert_eq!(modified, vec!["m1", "m0"]);
        assert_eq!(added, vec!["b", "a"]);
        assert_eq!(deleted, vec!["d"]);
    }

    #[test]
    fn duplicate_path_is_malformed() {
        let err = partition_changes(vec![
            FileChange::new(ChangeKind::Added, "same.txt"),
            FileChange::new(ChangeKind::Deleted, "same.txt"),
        ])
        .unwrap_err();
        assert!(matches!(err, VcsError::MalformedOutput { .. }));
    }

    #[test]
    fn message_failure_stops_analysis() {
        let vcs = FakeVcs::failing_message(VcsError::NoCommit);
        let err = CommitAnalyzer::new(&vcs).analyze().unwrap_err();
        assert!(matches!(err, VcsError::NoCommit));
        assert_eq!(vcs.queries(), vec!["head_message"]);
    }

    #[test]
    fn queries_run_in_order() {
        let vcs = FakeVcs::new("Message\n").with_parents(&[SHA]);
        CommitAnalyzer::new(&vcs).analyze().unwrap();
        assert_eq!(
            vcs.queries(),
            vec!["head_message", "commit_id", "parents", "name_status_diff"]
        );
    }

    #[test]
    fn diff_failure_propagates() {
        let vcs = FakeVcs::new("Message\n")
            .failing_diff(VcsError::malformed("name-status diff", "missing path"));
        let err = CommitAnalyzer::new(&vcs).analyze().unwrap_err();
        assert!(matches!(err, VcsError::MalformedOutput { .. }));
    }

    #[test]
    fn classification_serializes_as_names() {
        let classification: Classification =
            [CommitKind::CiSkip, CommitKind::Merge].into_iter().collect();
        let json = serde_json::to_string(&classification).unwrap();
        assert_eq!(json, r#"["merge","ci_skip"]"#);
    }

    // ── property tests ────────────────────────────────────────────

    mod prop {
        use super::*;
        use proptest::collection::{btree_set, vec as prop_vec};
        use proptest::prelude::*;

        fn kind() -> impl Strategy<Value = ChangeKind> {
            prop_oneof![
                Just(ChangeKind::Modified),
                Just(ChangeKind::Added),
                Just(ChangeKind::Deleted),
            ]
        }

        proptest! {
            #[test]
            fn merge_iff_two_or_more_parents(count in 0_usize..5) {
                let parents: Vec<String> = (0..count).map(|i| format!("{i:040x}")).collect();
                let parent_refs: Vec<&str> = parents.iter().map(String::as_str).collect();
                let vcs = FakeVcs::new("Message\n").with_parents(&parent_refs);

                let metadata = CommitAnalyzer::new(&vcs).analyze().unwrap();
                prop_assert_eq!(
                    metadata.classification.contains(CommitKind::Merge),
                    count >= 2
                );
                prop_assert_eq!(metadata.parent_ids, parents);
            }

            #[test]
            fn marker_anywhere_sets_ci_skip(
                before in "[a-zA-Z0-9 \n]{0,40}",
                after in "[a-zA-Z0-9 \n]{0,40}",
                marker in prop_oneof![Just("[ci skip]"), Just("[skip ci]")],
            ) {
                let message = format!("{before}{marker}{after}");
                let vcs = FakeVcs::new(&message);
                let metadata = CommitAnalyzer::new(&vcs).analyze().unwrap();
                prop_assert!(metadata.classification.contains(CommitKind::CiSkip));
            }

            #[test]
            fn partition_is_complete_and_disjoint(
                paths in btree_set("[a-z]{1,8}(/[a-z]{1,8}){0,2}", 0..20),
                kinds in prop_vec(kind(), 20),
            ) {
                let changes: Vec<FileChange> = paths
                    .iter()
                    .zip(kinds.iter())
                    .map(|(path, kind)| FileChange::new(*kind, path.clone()))
                    .collect();

                let (modified, added, deleted) = partition_changes(changes.clone()).unwrap();

                prop_assert_eq!(modified.len() + added.len() + deleted.len(), changes.len());
                let union: BTreeSet<String> =
                    modified.iter().chain(&added).chain(&deleted).cloned().collect();
                prop_assert_eq!(union, paths);
                for change in &changes {
                    let bucket = match change.kind {
                        ChangeKind::Modified => &modified,
                        ChangeKind::Added => &added,
                        ChangeKind::Deleted => &deleted,
                    };
                    prop_assert!(bucket.contains(&change.path));
                }
            }

            #[test]
            fn revert_detection_deterministic(s in ".*") {
                prop_assert_eq!(is_revert_message(&s), is_revert_message(&s));
            }
        }
    }
}
