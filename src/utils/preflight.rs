//! Preflight validation checks for early failure detection

use std::process::Command;

use crate::error::{VcsError, VcsResult};

/// Validate the `git` executable is installed and in PATH
pub fn check_git_installed() -> VcsResult<()> {
    match Command::new("git").arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        _ => Err(VcsError::Unavailable("git is not installed.".to_string())),
    }
}
