//! Run configuration built once at startup and passed by reference.

use crate::credentials::Credentials;
use crate::git::{self, GitLogger};
use std::path::PathBuf;

/// Everything a mirroring run needs to know, derived from CLI arguments and environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Organization whose repositories are mirrored.
    pub organization: String,
    /// Output root; its immediate subdirectories are the mirrors.
    pub output_dir: PathBuf,
    /// Token for the API and git transport. `None` means unauthenticated.
    pub credentials: Option<Credentials>,
    /// Base URL of the hosting REST API.
    pub api_url: String,
    /// Base URL clone URLs are built from.
    pub git_url: String,
    /// Controls the verbosity level of CLI output.
    pub verbosity: Verbosity,
    /// Ask before deleting each stale mirror.
    pub interactive_prune: bool,
}

impl Config {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Credential-free clone URL for a repository of the configured organization.
    #[must_use]
    pub fn clone_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}.git",
            self.git_url.trim_end_matches('/'),
            self.organization,
            name
        )
    }

    /// Returns the appropriate git logger based on verbosity settings.
    ///
    /// Config only decides which logger to use; the loggers themselves live
    /// in the git module.
    #[must_use]
    pub fn git_logger(&self) -> GitLogger {
        if self.is_verbose() {
            git::verbose_logger
        } else {
            git::no_op_logger
        }
    }
}

/// Verbosity level for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}
