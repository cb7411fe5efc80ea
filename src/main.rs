use anyhow::Context;
use clap::Parser;
use gh_org_mirror::cli::Cli;
use gh_org_mirror::credentials::Credentials;
use gh_org_mirror::git::GitCli;
use gh_org_mirror::github::{self, GitHubClient};
use gh_org_mirror::{mirror, output};
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config(Credentials::from_env());
    let start = Instant::now();

    let client = GitHubClient::new(&config).context("GitHub client setup")?;
    let listing = github::list_repositories(&client, &config.organization)
        .context("GitHub list repositories")?;
    output::print_start(listing.len(), &config);

    let transport = GitCli::new(config.git_logger());
    let progress = output::create_run_progress(listing.len(), &config);
    let report = mirror::reconcile(&listing, &config, &transport, &progress);
    progress.finish();

    output::print_summary(&report?, start.elapsed(), &config);
    Ok(())
}
