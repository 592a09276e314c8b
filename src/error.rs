//! Error types for VCS queries and policy configuration.

use thiserror::Error;

/// Failures raised while querying the version-control system.
///
/// Every variant is fatal to an analysis call: the analyzer never returns
/// partial metadata and never substitutes defaults.
#[derive(Error, Debug)]
pub enum VcsError {
    /// The VCS tool cannot be invoked (not installed, or not a repository).
    #[error("VCS unavailable: {0}")]
    Unavailable(String),

    /// The repository has no commit at HEAD yet.
    #[error("Repository has no commit at HEAD")]
    NoCommit,

    /// A query returned output that does not have the expected shape.
    #[error("Malformed output from `{query}`: {detail}")]
    MalformedOutput {
        /// The query that produced the output.
        query: String,
        /// What was wrong with it.
        detail: String,
    },

    /// The VCS reported a failure for a specific query.
    #[error("`{query}` failed: {message}")]
    QueryFailed {
        /// The query that failed.
        query: String,
        /// The message reported by the VCS.
        message: String,
    },
}

impl VcsError {
    /// Creates a [`VcsError::MalformedOutput`].
    pub fn malformed(query: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedOutput {
            query: query.into(),
            detail: detail.into(),
        }
    }

    /// Creates a [`VcsError::QueryFailed`].
    pub fn query_failed(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryFailed {
            query: query.into(),
            message: message.into(),
        }
    }
}

/// Result alias for VCS queries.
pub type VcsResult<T> = std::result::Result<T, VcsError>;

/// Policy configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for a policy config.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// Path of the file.
        path: String,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// An override value could not be interpreted.
    #[error("Invalid value {value:?} for {key}: expected true or false")]
    InvalidBool {
        /// Name of the setting.
        key: String,
        /// Value that was supplied.
        value: String,
    },

    /// The user settings file holding environment fallbacks could not be loaded.
    #[error("Failed to load settings: {detail}")]
    Settings {
        /// Error chain from the settings loader.
        detail: String,
    },
}
