//! View command: outputs HEAD commit metadata.

use anyhow::{Context, Result};
use clap::Parser;

use crate::data::{CommitView, OutputFormat};
use crate::git::{CommitAnalyzer, VcsQuery};

/// View command options.
#[derive(Parser)]
pub struct ViewCommand {
    /// Output format: yaml (default) or json.
    #[arg(long, default_value = "yaml", value_parser = parse_view_format)]
    pub format: OutputFormat,
}

/// Accepts the structured formats only; metadata has no text rendering.
fn parse_view_format(value: &str) -> Result<OutputFormat, String> {
    match value.parse::<OutputFormat>()? {
        OutputFormat::Text => Err("view supports yaml or json".to_string()),
        format => Ok(format),
    }
}

impl ViewCommand {
    /// Executes the view command.
    pub fn execute(&self, vcs: &dyn VcsQuery) -> Result<()> {
        let metadata = CommitAnalyzer::new(vcs)
            .analyze()
            .context("Failed to analyze HEAD commit")?;
        let view = CommitView::new(metadata);

        let output = match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&view).context("Failed to serialize to JSON")?
            }
            OutputFormat::Yaml | OutputFormat::Text => crate::data::to_yaml(&view)?,
        };
        println!("{output}");

        Ok(())
    }
}
