//! Utility functions and helpers.

pub mod preflight;
pub mod settings;

pub use preflight::check_git_installed;
pub use settings::Settings;
