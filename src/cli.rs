//! Command-line arguments.

use crate::config::{Config, Verbosity};
use crate::constants::{DEFAULT_API_URL, DEFAULT_GIT_URL, DEFAULT_OUTPUT_DIR};
use crate::credentials::Credentials;
use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use std::path::PathBuf;

/// Mirror every repository of a GitHub organization into a local directory.
///
/// Set GH_TOKEN to access private repositories and raise API rate limits.
#[derive(Debug, Parser)]
#[command(name = "gh-org-mirror", version, about)]
pub struct Cli {
    /// Name of GitHub organization
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub org: String,

    /// Output directory
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub out: PathBuf,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Base URL repositories are cloned from
    #[arg(long, default_value = DEFAULT_GIT_URL)]
    pub git_url: String,

    /// Ask before removing each stale mirror
    #[arg(short, long)]
    pub interactive: bool,

    /// Only print the final counts and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print every step and git command
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn into_config(self, credentials: Option<Credentials>) -> Config {
        let verbosity = if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Config {
            organization: self.org,
            output_dir: self.out,
            credentials,
            api_url: self.api_url,
            git_url: self.git_url,
            verbosity,
            interactive_prune: self.interactive,
        }
    }
}
