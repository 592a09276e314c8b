//! Check command: enforces the CI-skip policy on HEAD.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::ConfigManager;
use crate::data::{CheckReport, OutputFormat};
use crate::git::{CommitAnalyzer, VcsQuery};
use crate::policy::{CiSkipChecker, PolicyConfig};

/// Check command options.
#[derive(Parser)]
pub struct CheckCommand {
    /// Policy configuration file (defaults to .commit-inspect.yaml in the repository).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Active CI provider; repeat for several. Replaces configured providers.
    #[arg(long = "ci-provider", value_name = "NAME")]
    pub ci_providers: Vec<String>,

    /// Disallows skipping CI for every commit.
    #[arg(long)]
    pub disallow_ci_skip: bool,

    /// Protected path suffix; repeat for several. Replaces the defaults.
    #[arg(long = "protected-suffix", value_name = "SUFFIX")]
    pub protected_suffixes: Vec<String>,

    /// Output format: text (default), json, yaml.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

impl CheckCommand {
    /// Executes the check command.
    ///
    /// Exits with code 1 when the commit violates the policy.
    pub fn execute(&self, vcs: &dyn VcsQuery, repo_root: &Path) -> Result<()> {
        let config = self.resolve_config(repo_root)?;

        let metadata = CommitAnalyzer::new(vcs)
            .analyze()
            .context("Failed to analyze HEAD commit")?;

        let checker = CiSkipChecker::new(config);
        let verdict = checker.check(&metadata);
        let report = CheckReport::new(&metadata, &checker.config().ci_providers_active, verdict);

        let output = match self.format {
            OutputFormat::Text => report.render_text(),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&report).context("Failed to serialize to JSON")?
            }
            OutputFormat::Yaml => crate::data::to_yaml(&report)?,
        };
        println!("{output}");

        let exit_code = report.exit_code();
        if exit_code != 0 {
            std::process::exit(exit_code);
        }

        Ok(())
    }

    /// Loads file and environment configuration, then applies flags.
    fn resolve_config(&self, repo_root: &Path) -> Result<PolicyConfig> {
        let manager = match &self.config {
            Some(path) => ConfigManager::with_path(path.clone()),
            None => ConfigManager::new(repo_root),
        };
        let mut config = manager.load().with_context(|| {
            format!(
                "Failed to load policy configuration from {}",
                manager.config_path().display()
            )
        })?;

        self.apply_flags(&mut config);
        Ok(config)
    }

    fn apply_flags(&self, config: &mut PolicyConfig) {
        if !self.ci_providers.is_empty() {
            config.ci_providers_active.clone_from(&self.ci_providers);
        }
        if self.disallow_ci_skip {
            config.allow_ci_skip = false;
        }
        if !self.protected_suffixes.is_empty() {
            config.protected_suffixes.clone_from(&self.protected_suffixes);
        }
    }
}
