//! # commit-inspect
//!
//! Inspects the HEAD commit of a git repository and decides whether a
//! CI build may be skipped for it.
//!
//! ## Features
//!
//! - Commit metadata: message, id, parents, classification, touched files
//! - Two interchangeable backends: libgit2 and the system `git` binary
//! - CI-skip policy per provider with protected file suffixes
//!
//! ## Quick Start
//!
//! ```no_run
//! use commit_inspect::git::{CommitAnalyzer, GitRepository};
//! use commit_inspect::policy::{CiSkipChecker, PolicyConfig};
//!
//! let repo = GitRepository::open()?;
//! let metadata = CommitAnalyzer::new(&repo).analyze()?;
//! let checker = CiSkipChecker::new(PolicyConfig::with_providers(["Circle CI"]));
//! if let Some(violation) = checker.check(&metadata) {
//!     eprintln!("{violation}");
//! }
//! # Ok::<(), commit_inspect::error::VcsError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod git;
pub mod policy;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of commit-inspect.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
