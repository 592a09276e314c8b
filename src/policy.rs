//! CI-skip policy: decides whether a commit may disable the CI build.
//!
//! The checker is driven by data: a table of [`ProviderRule`]s describing
//! which markers each CI provider honours, and a [`PolicyConfig`] naming the
//! active providers and protected path suffixes.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::git::CommitMetadata;

/// Path suffixes that may not be touched by a commit that skips CI.
pub const DEFAULT_PROTECTED_SUFFIXES: [&str; 2] = ["Test.py", "coafile"];

/// Part of the commit message a provider inspects for its skip markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageScope {
    /// The whole message.
    FullMessage,
    /// The title only: everything up to the first newline.
    TitleOnly,
}

impl fmt::Display for MessageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullMessage => write!(f, "full message"),
            Self::TitleOnly => write!(f, "title only"),
        }
    }
}

/// Skip-marker rule for one CI provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRule {
    /// Provider name as it appears in configuration.
    pub name: String,
    /// Case-sensitive literal markers; any one of them requests a skip.
    pub markers: Vec<String>,
    /// Where in the message the markers are honoured.
    pub scope: MessageScope,
}

impl ProviderRule {
    /// Creates a rule.
    pub fn new(name: impl Into<String>, markers: &[&str], scope: MessageScope) -> Self {
        Self {
            name: name.into(),
            markers: markers.iter().map(|m| (*m).to_string()).collect(),
            scope,
        }
    }

    /// Returns the built-in provider table.
    pub fn builtin_table() -> Vec<Self> {
        vec![
            Self::new(
                "Circle CI",
                &["[ci skip]", "[skip ci]"],
                MessageScope::FullMessage,
            ),
            Self::new(
                "Travis CI",
                &["[ci skip]", "[skip ci]"],
                MessageScope::FullMessage,
            ),
            Self::new(
                "Appveyor CI",
                &["[skip ci]", "[ci skip]", "[skip appveyor]"],
                MessageScope::TitleOnly,
            ),
        ]
    }

    /// Selects the part of `message` this provider inspects.
    pub fn select_text<'a>(&self, message: &'a str) -> &'a str {
        match self.scope {
            MessageScope::FullMessage => message,
            MessageScope::TitleOnly => message.split_once('\n').map_or(message, |(title, _)| title),
        }
    }

    /// Checks whether `message` asks this provider to skip the build.
    pub fn requests_skip(&self, message: &str) -> bool {
        let text = self.select_text(message);
        self.markers.iter().any(|marker| text.contains(marker.as_str()))
    }
}

/// Caller-supplied policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// CI providers active in the current environment.
    #[serde(rename = "ci_providers")]
    pub ci_providers_active: Vec<String>,
    /// Global switch; when false no active provider may be skipped.
    pub allow_ci_skip: bool,
    /// Path suffixes a skipping commit may not touch.
    pub protected_suffixes: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            ci_providers_active: Vec::new(),
            allow_ci_skip: true,
            protected_suffixes: DEFAULT_PROTECTED_SUFFIXES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl PolicyConfig {
    /// Creates a configuration with the given active providers and defaults
    /// for everything else.
    pub fn with_providers<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ci_providers_active: providers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Policy verdict for a commit that may not proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Skipping CI is disabled globally.
    SkipNotAllowed,
    /// The commit requests a skip but touches protected files.
    ProtectedFilesTouched {
        /// Provider whose marker matched.
        provider: String,
        /// Protected paths the commit touches.
        files: Vec<String>,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkipNotAllowed => write!(f, "Skipping CI build is not allowed."),
            Self::ProtectedFilesTouched { .. } => write!(
                f,
                "This commit modifies test files or coafile files and cannot disable CI build."
            ),
        }
    }
}

/// Checks commits against the CI-skip policy.
#[derive(Debug, Clone)]
pub struct CiSkipChecker {
    config: PolicyConfig,
    active: Vec<ProviderRule>,
}

impl CiSkipChecker {
    /// Creates a checker using the built-in provider table.
    pub fn new(config: PolicyConfig) -> Self {
        Self::with_providers(config, ProviderRule::builtin_table())
    }

    /// Creates a checker with a custom provider table.
    ///
    /// Active provider names missing from the table are dropped here.
    pub fn with_providers(config: PolicyConfig, providers: Vec<ProviderRule>) -> Self {
        let active = config
            .ci_providers_active
            .iter()
            .filter_map(|name| {
                let rule = providers.iter().find(|rule| &rule.name == name);
                if rule.is_none() {
                    debug!(provider = %name, "Ignoring unrecognized CI provider");
                }
                rule.cloned()
            })
            .collect();

        Self { config, active }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Returns at most one violation for the commit.
    ///
    /// Checks are ordered and stop at the first violation. Without any
    /// recognized active provider the commit always passes.
    pub fn check(&self, metadata: &CommitMetadata) -> Option<Violation> {
        if !self.config.allow_ci_skip && !self.active.is_empty() {
            debug!(commit = %metadata.commit_id, "CI skip disabled globally");
            return Some(Violation::SkipNotAllowed);
        }

        for rule in &self.active {
            if !rule.requests_skip(&metadata.raw_message) {
                debug!(provider = %rule.name, "No skip marker for provider");
                continue;
            }

            let files = self.protected_files(metadata);
            debug!(
                provider = %rule.name,
                protected = files.len(),
                "Commit requests CI skip"
            );
            if !files.is_empty() {
                return Some(Violation::ProtectedFilesTouched {
                    provider: rule.name.clone(),
                    files,
                });
            }
        }

        None
    }

    fn protected_files(&self, metadata: &CommitMetadata) -> Vec<String> {
        metadata
            .touched_files()
            .filter(|path| {
                self.config
                    .protected_suffixes
                    .iter()
                    .any(|suffix| path.ends_with(suffix.as_str()))
            })
            .map(str::to_string)
            .collect()
    }
}
