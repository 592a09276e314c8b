//! Check command result types for the CI-skip policy.

use std::fmt;

use serde::Serialize;

use crate::git::{Classification, CommitMetadata, SHORT_HASH_LEN};
use crate::policy::Violation;

/// Result of checking the HEAD commit against the CI-skip policy.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Full commit hash.
    pub commit: String,
    /// Classification flags of the commit.
    pub classification: Classification,
    /// Active CI providers the check ran with.
    pub providers: Vec<String>,
    /// Whether the commit passes the policy.
    pub passes: bool,
    /// Violation found, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
    /// Human-readable violation message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckReport {
    /// Creates a report from analyzed metadata and the checker's verdict.
    pub fn new(metadata: &CommitMetadata, providers: &[String], verdict: Option<Violation>) -> Self {
        Self {
            commit: metadata.commit_id.clone(),
            classification: metadata.classification.clone(),
            providers: providers.to_vec(),
            passes: verdict.is_none(),
            message: verdict.as_ref().map(ToString::to_string),
            violation: verdict,
        }
    }

    /// Determines the process exit code.
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.passes)
    }

    /// Renders the report as plain text.
    pub fn render_text(&self) -> String {
        let short = self.commit.get(..SHORT_HASH_LEN).unwrap_or(&self.commit);
        match &self.message {
            None => format!("✅ {short}: commit passes the CI skip policy"),
            Some(message) => format!("❌ {short}: {message}"),
        }
    }
}

/// Output format for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}
