//! Providers command: lists the built-in CI provider table.

use anyhow::Result;
use clap::Parser;

use crate::policy::ProviderRule;

/// Providers command options.
#[derive(Parser)]
pub struct ProvidersCommand {}

impl ProvidersCommand {
    /// Executes the providers command.
    pub fn execute(&self) -> Result<()> {
        print!("{}", render_table(&ProviderRule::builtin_table()));
        Ok(())
    }
}

/// Renders one line per provider: name, scope and markers.
fn render_table(rules: &[ProviderRule]) -> String {
    let width = rules.iter().map(|rule| rule.name.len()).max().unwrap_or(0);
    rules
        .iter()
        .map(|rule| {
            format!(
                "{:<width$}  {:<12}  {}\n",
                rule.name,
                rule.scope.to_string(),
                rule.markers.join(" ")
            )
        })
        .collect()
}
