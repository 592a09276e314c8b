//! Git repository access through libgit2.

use std::fmt;
use std::path::Path;

use git2::{Commit, Delta, DiffDelta, DiffOptions, ErrorCode, Oid, Repository};
use tracing::debug;

use crate::error::{VcsError, VcsResult};
use crate::git::vcs::{combine_parent_diffs, ChangeKind, FileChange, VcsQuery};

/// Git repository wrapper
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open repository at current directory
    pub fn open() -> VcsResult<Self> {
        Self::open_at(".")
    }

    /// Open repository at specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> VcsResult<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|e| {
            VcsError::Unavailable(format!(
                "Not a git repository: {}: {}",
                path.display(),
                e.message()
            ))
        })?;

        Ok(Self { repo })
    }

    fn head_commit(&self) -> VcsResult<Commit<'_>> {
        let head = self.repo.head().map_err(|e| match e.code() {
            ErrorCode::UnbornBranch | ErrorCode::NotFound => VcsError::NoCommit,
            _ => query_failed("read HEAD", &e),
        })?;

        head.peel_to_commit()
            .map_err(|e| query_failed("peel HEAD to commit", &e))
    }

    fn find_commit(&self, commit_id: &str) -> VcsResult<Commit<'_>> {
        let oid = Oid::from_str(commit_id).map_err(|e| {
            VcsError::malformed("parse commit id", format!("{commit_id:?}: {}", e.message()))
        })?;

        self.repo
            .find_commit(oid)
            .map_err(|e| query_failed(&format!("find commit {commit_id}"), &e))
    }

    /// Diffs a commit tree against one parent tree, or the empty tree.
    fn diff_against(
        &self,
        parent: Option<&Commit<'_>>,
        commit: &Commit<'_>,
    ) -> VcsResult<Vec<FileChange>> {
        let query = "diff commit tree";
        let commit_tree = commit.tree().map_err(|e| query_failed(query, &e))?;
        let parent_tree = parent
            .map(Commit::tree)
            .transpose()
            .map_err(|e| query_failed(query, &e))?;

        // No find_similar: renames stay as separate add and delete deltas.
        // Without typechange a file <-> symlink swap splits into two deltas.
        let mut options = DiffOptions::new();
        options.include_typechange(true);
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), Some(&mut options))
            .map_err(|e| query_failed(query, &e))?;

        diff.deltas().map(|delta| file_change(&delta)).collect()
    }
}

impl fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepository")
            .field("path", &self.repo.path())
            .finish_non_exhaustive()
    }
}

impl VcsQuery for GitRepository {
    fn head_message(&self) -> VcsResult<String> {
        let commit = self.head_commit()?;
        commit
            .message()
            .map(str::to_string)
            .ok_or_else(|| VcsError::malformed("read HEAD message", "message is not valid UTF-8"))
    }

    fn commit_id(&self, reference: &str) -> VcsResult<String> {
        let object = self.repo.revparse_single(reference).map_err(|e| {
            if reference == "HEAD"
                && matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
            {
                VcsError::NoCommit
            } else {
                query_failed(&format!("resolve {reference}"), &e)
            }
        })?;

        let commit = object
            .peel_to_commit()
            .map_err(|e| query_failed(&format!("peel {reference} to commit"), &e))?;

        Ok(commit.id().to_string())
    }

    fn parents(&self, commit_id: &str) -> VcsResult<Vec<String>> {
        let commit = self.find_commit(commit_id)?;
        Ok(commit.parent_ids().map(|oid| oid.to_string()).collect())
    }

    fn name_status_diff(&self, commit_id: &str) -> VcsResult<Vec<FileChange>> {
        let commit = self.find_commit(commit_id)?;

        let diffs = if commit.parent_count() == 0 {
            vec![self.diff_against(None, &commit)?]
        } else {
            commit
                .parents()
                .map(|parent| self.diff_against(Some(&parent), &commit))
                .collect::<VcsResult<Vec<_>>>()?
        };

        let changes = combine_parent_diffs(diffs);
        debug!(commit = commit_id, files = changes.len(), "Read name-status diff");
        Ok(changes)
    }
}

/// Converts a libgit2 delta into a [`FileChange`].
fn file_change(delta: &DiffDelta<'_>) -> VcsResult<FileChange> {
    let query = "name-status diff";
    let (kind, file) = match delta.status() {
        Delta::Added => (ChangeKind::Added, delta.new_file()),
        Delta::Deleted => (ChangeKind::Deleted, delta.old_file()),
        Delta::Modified | Delta::Typechange => (ChangeKind::Modified, delta.new_file()),
        other => {
            return Err(VcsError::malformed(
                query,
                format!("unexpected delta status {other:?}"),
            ))
        }
    };

    let path = file
        .path()
        .ok_or_else(|| VcsError::malformed(query, "delta without a path"))?;
    let path = path
        .to_str()
        .ok_or_else(|| VcsError::malformed(query, format!("path is not valid UTF-8: {}", path.display())))?;

    Ok(FileChange::new(kind, path))
}

fn query_failed(query: &str, error: &git2::Error) -> VcsError {
    VcsError::query_failed(query, error.message())
}
