//! Git access through the system `git` executable.
//!
//! Each query is one plumbing command. Output is requested NUL-terminated
//! where paths are involved so no unquoting is needed.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::error::{VcsError, VcsResult};
use crate::git::FULL_HASH_LEN;
use crate::git::vcs::{combine_parent_diffs, ChangeKind, FileChange, VcsQuery};
use crate::utils::preflight::check_git_installed;

/// Git backend that shells out to the `git` binary.
#[derive(Debug, Clone)]
pub struct SystemGit {
    repo_path: PathBuf,
}

impl SystemGit {
    /// Opens the repository containing `path`.
    ///
    /// Fails with [`VcsError::Unavailable`] when git is not installed or the
    /// path is not inside a repository.
    pub fn open(path: &Path) -> VcsResult<Self> {
        check_git_installed()?;

        let git = Self {
            repo_path: path.to_path_buf(),
        };
        let output = git.run(&["rev-parse", "--git-dir"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VcsError::Unavailable(format!(
                "Not a git repository: {}: {}",
                path.display(),
                stderr.trim()
            )));
        }

        Ok(git)
    }

    /// Creates a git command with an isolated environment.
    fn git_cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_path);

        cmd.env_clear();
        if let Ok(path) = std::env::var("PATH") {
            cmd.env("PATH", path);
        }
        if let Ok(home) = std::env::var("HOME") {
            cmd.env("HOME", home);
        }

        cmd.arg("-c").arg("core.quotePath=false");
        cmd
    }

    fn run(&self, args: &[&str]) -> VcsResult<Output> {
        debug!(args = ?args, "Running git");
        self.git_cmd().args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VcsError::Unavailable("git is not installed.".to_string())
            } else {
                VcsError::query_failed(format!("git {}", args.join(" ")), e.to_string())
            }
        })
    }

    /// Runs a command that must succeed and returns its stdout as UTF-8.
    fn run_checked(&self, args: &[&str]) -> VcsResult<String> {
        let query = format!("git {}", args.join(" "));
        let output = self.run(args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VcsError::query_failed(query, stderr.trim()));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| VcsError::malformed(query, "output is not valid UTF-8"))
    }

    /// Fails with [`VcsError::NoCommit`] when HEAD does not point at a commit.
    fn ensure_head(&self) -> VcsResult<()> {
        let output = self.run(&["rev-parse", "--verify", "--quiet", "HEAD^{commit}"])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(VcsError::NoCommit)
        }
    }

    fn diff_tree(&self, parent: Option<&str>, commit_id: &str) -> VcsResult<Vec<FileChange>> {
        let mut args = vec!["diff-tree", "-r", "-z", "--name-status", "--no-renames"];
        match parent {
            Some(parent) => args.extend([parent, commit_id]),
            None => args.extend(["--no-commit-id", "--root", commit_id]),
        }

        let stdout = self.run_checked(&args)?;
        parse_name_status_z(&stdout)
    }
}

impl VcsQuery for SystemGit {
    fn head_message(&self) -> VcsResult<String> {
        self.ensure_head()?;
        let object = self.run_checked(&["cat-file", "commit", "HEAD"])?;
        parse_commit_message(&object)
    }

    fn commit_id(&self, reference: &str) -> VcsResult<String> {
        let spec = format!("{reference}^{{commit}}");
        let output = self.run(&["rev-parse", "--verify", "--quiet", &spec])?;

        if !output.status.success() {
            return Err(if reference == "HEAD" {
                VcsError::NoCommit
            } else {
                VcsError::query_failed(
                    format!("git rev-parse {spec}"),
                    format!("cannot resolve {reference}"),
                )
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let id = stdout.trim();
        if !is_object_id(id) {
            return Err(VcsError::malformed(
                "git rev-parse",
                format!("not an object id: {id:?}"),
            ));
        }

        Ok(id.to_string())
    }

    fn parents(&self, commit_id: &str) -> VcsResult<Vec<String>> {
        let stdout = self.run_checked(&["log", "-n", "1", "--pretty=%P", commit_id])?;
        parse_parent_ids(&stdout)
    }

    fn name_status_diff(&self, commit_id: &str) -> VcsResult<Vec<FileChange>> {
        let parents = self.parents(commit_id)?;

        let diffs = if parents.is_empty() {
            vec![self.diff_tree(None, commit_id)?]
        } else {
            parents
                .iter()
                .map(|parent| self.diff_tree(Some(parent), commit_id))
                .collect::<VcsResult<Vec<_>>>()?
        };

        Ok(combine_parent_diffs(diffs))
    }
}

/// Extracts the message from `git cat-file commit` output.
///
/// Headers end at the first empty line; everything after it is the message,
/// byte for byte.
pub fn parse_commit_message(object: &str) -> VcsResult<String> {
    if let Some(message) = object.strip_prefix('\n') {
        return Ok(message.to_string());
    }

    object
        .split_once("\n\n")
        .map(|(_, message)| message.to_string())
        .ok_or_else(|| {
            VcsError::malformed("git cat-file commit", "no blank line after commit headers")
        })
}

/// Parses `git log --pretty=%P` output into parent ids.
pub fn parse_parent_ids(output: &str) -> VcsResult<Vec<String>> {
    output
        .split_whitespace()
        .map(|id| {
            if is_object_id(id) {
                Ok(id.to_string())
            } else {
                Err(VcsError::malformed(
                    "git log --pretty=%P",
                    format!("not an object id: {id:?}"),
                ))
            }
        })
        .collect()
}

/// Parses NUL-terminated `--name-status -z` output.
///
/// The output alternates status letters and paths. A status without a path,
/// an empty path, or an unknown status letter is malformed.
pub fn parse_name_status_z(output: &str) -> VcsResult<Vec<FileChange>> {
    let query = "git diff-tree --name-status";
    let output = output.strip_suffix('\0').unwrap_or(output);
    let mut changes = Vec::new();
    if output.is_empty() {
        return Ok(changes);
    }

    let mut fields = output.split('\0');
    while let Some(status) = fields.next() {
        let kind = ChangeKind::from_status_letter(status).ok_or_else(|| {
            VcsError::malformed(query, format!("unknown status {status:?}"))
        })?;
        let path = fields
            .next()
            .filter(|path| !path.is_empty())
            .ok_or_else(|| VcsError::malformed(query, format!("status {status:?} without a path")))?;

        changes.push(FileChange::new(kind, path));
    }

    Ok(changes)
}

/// Checks for a full SHA-1 or SHA-256 object id.
fn is_object_id(id: &str) -> bool {
    matches!(id.len(), FULL_HASH_LEN | 64) && id.chars().all(|c| c.is_ascii_hexdigit())
}
