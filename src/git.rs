//! Git access and HEAD commit analysis.

pub mod commit;
pub mod repository;
pub mod system;
pub mod vcs;

#[cfg(test)]
pub(crate) mod test_utils;

pub use commit::{
    has_ci_skip_marker, is_revert_message, partition_changes, Classification, CommitAnalyzer,
    CommitKind, CommitMetadata,
};
pub use repository::GitRepository;
pub use system::SystemGit;
pub use vcs::{ChangeKind, FileChange, VcsQuery};

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;

/// Length of a full SHA-1 commit hash in hex characters.
pub const FULL_HASH_LEN: usize = 40;
