//! CLI interface for commit-inspect.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::git::{GitRepository, SystemGit, VcsQuery};

pub mod check;
pub mod providers;
pub mod view;

pub use check::CheckCommand;
pub use providers::ProvidersCommand;
pub use view::ViewCommand;

/// commit-inspect: classify the HEAD commit and enforce the CI-skip policy.
#[derive(Parser)]
#[command(name = "commit-inspect")]
#[command(about = "Inspect the HEAD commit and decide whether it may skip CI", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path of the repository to inspect.
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Git backend used to query the repository.
    #[arg(long, global = true, value_enum, default_value_t = Backend::Libgit2)]
    pub backend: Backend,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Git backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// In-process libgit2.
    Libgit2,
    /// The system `git` executable.
    System,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Analyzes HEAD and prints its metadata.
    View(ViewCommand),
    /// Checks HEAD against the CI-skip policy.
    Check(CheckCommand),
    /// Lists the built-in CI provider table.
    Providers(ProvidersCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::View(ref view_cmd) => view_cmd.execute(&*self.open_vcs()?),
            Commands::Check(ref check_cmd) => check_cmd.execute(&*self.open_vcs()?, &self.repo),
            Commands::Providers(ref providers_cmd) => providers_cmd.execute(),
        }
    }

    /// Opens the selected backend on the repository path.
    fn open_vcs(&self) -> Result<Box<dyn VcsQuery>> {
        let vcs: Box<dyn VcsQuery> = match self.backend {
            Backend::Libgit2 => Box::new(GitRepository::open_at(&self.repo).with_context(|| {
                format!("Failed to open git repository at {}", self.repo.display())
            })?),
            Backend::System => Box::new(SystemGit::open(&self.repo).with_context(|| {
                format!("Failed to open git repository at {}", self.repo.display())
            })?),
        };
        Ok(vcs)
    }
}
