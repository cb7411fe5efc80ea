//! Git command wrappers.
//!
//! This module provides a thin wrapper around git CLI commands and the
//! [`MirrorTransport`] implementation built on top of them. Every command line
//! and error message is passed through [`redact_userinfo`] before it leaves
//! this module.

use crate::constants::{
    ALL_REFS_REFSPEC, GC_AUTO, GC_AUTO_DETACH, GC_AUTO_PACK_LIMIT, REMOTE_NAME,
};
use crate::credentials::redact_userinfo;
use anyhow::Context;
use colored::Colorize;
use std::path::Path;

/// Callback invoked with the directory and arguments of every git command about to run.
pub type GitLogger = fn(&Path, &[&str]);

/// Echoes git commands to stderr with credentials removed.
pub fn verbose_logger(dir: &Path, args: &[&str]) {
    let line = redact_userinfo(&args.join(" "));
    eprintln!(
        "    {} git {} {}",
        "$".dimmed(),
        line.dimmed(),
        format!("({})", dir.display()).dimmed()
    );
}

pub fn no_op_logger(_dir: &Path, _args: &[&str]) {}

pub fn run_git(dir: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = std::process::Command::new("git")
        .current_dir(dir)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .context("Failed to spawn git command")?;

    if output.status.success() {
        let result = String::from_utf8_lossy(&output.stdout);
        Ok(result.as_ref().trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "git {} failed: {}",
            redact_userinfo(&args.join(" ")),
            redact_userinfo(stderr.trim())
        )
    }
}

fn run_git_logged(dir: &Path, args: &[&str], logger: GitLogger) -> anyhow::Result<String> {
    logger(dir, args);
    run_git(dir, args)
}

/// Clones every ref of `url` into `path` without a working tree.
/// `path` must already exist and be empty.
pub fn mirror_clone(path: &Path, url: &str, logger: GitLogger) -> anyhow::Result<()> {
    run_git_logged(path, &["clone", "--quiet", "--mirror", url, "."], logger)
        .context("Failed to clone mirror")?;
    Ok(())
}

/// Fails unless `path` is the top of a bare repository.
pub fn open_mirror(path: &Path, logger: GitLogger) -> anyhow::Result<()> {
    let is_bare = run_git_logged(path, &["rev-parse", "--is-bare-repository"], logger)
        .context("Failed to open mirror")?;
    if is_bare != "true" {
        anyhow::bail!("{} is not a bare mirror repository", path.display());
    }
    Ok(())
}

pub fn set_remote_url(path: &Path, url: &str, logger: GitLogger) -> anyhow::Result<()> {
    run_git_logged(path, &["remote", "set-url", REMOTE_NAME, url], logger)
        .context("Failed to set remote URL")?;
    Ok(())
}

/// The remote URL exactly as persisted in the mirror's configuration.
pub fn get_remote_url(path: &Path, logger: GitLogger) -> anyhow::Result<String> {
    let key = format!("remote.{}.url", REMOTE_NAME);
    run_git_logged(path, &["config", "--get", &key], logger).context("Failed to read remote URL")
}

/// One line per ref: `<object id> <ref name>`.
pub fn ref_snapshot(path: &Path, logger: GitLogger) -> anyhow::Result<String> {
    run_git_logged(
        path,
        &["for-each-ref", "--format=%(objectname) %(refname)"],
        logger,
    )
    .context("Failed to list refs")
}

/// Fetches all refs (not only branch heads) and prunes refs deleted upstream.
pub fn fetch_all_refs(path: &Path, logger: GitLogger) -> anyhow::Result<()> {
    run_git_logged(
        path,
        &["fetch", "--quiet", "--prune", REMOTE_NAME, ALL_REFS_REFSPEC],
        logger,
    )
    .context("Failed to fetch from remote")?;
    Ok(())
}

/// Runs `git gc --auto` with bounded thresholds, in the foreground.
pub fn compact(path: &Path, logger: GitLogger) -> anyhow::Result<()> {
    run_git_logged(
        path,
        &[
            "-c",
            GC_AUTO,
            "-c",
            GC_AUTO_PACK_LIMIT,
            "-c",
            GC_AUTO_DETACH,
            "gc",
            "--auto",
            "--quiet",
        ],
        logger,
    )
    .context("Failed to compact repository")?;
    Ok(())
}

/// Result of a successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Updated,
    UpToDate,
}

/// The version-control primitives the reconciler needs.
///
/// A local mirror is addressed by its path; credentials are applied by
/// rewriting the remote URL around a fetch, so no primitive takes a secret.
pub trait MirrorTransport {
    /// Creates a mirror of `url` in the existing, empty directory `path`.
    fn mirror_clone(&self, url: &str, path: &Path) -> anyhow::Result<()>;

    /// Verifies that `path` holds a usable mirror.
    fn open(&self, path: &Path) -> anyhow::Result<()>;

    /// Fetches every ref from the configured remote, pruning deleted ones.
    fn fetch_all_refs(&self, path: &Path) -> anyhow::Result<FetchOutcome>;

    fn set_remote_url(&self, path: &Path, url: &str) -> anyhow::Result<()>;

    /// Housekeeping to keep object storage compact.
    fn compact(&self, path: &Path) -> anyhow::Result<()>;
}

/// [`MirrorTransport`] backed by the `git` executable.
#[derive(Debug, Clone, Copy)]
pub struct GitCli {
    logger: GitLogger,
}

impl GitCli {
    pub fn new(logger: GitLogger) -> Self {
        Self { logger }
    }
}

impl MirrorTransport for GitCli {
    fn mirror_clone(&self, url: &str, path: &Path) -> anyhow::Result<()> {
        mirror_clone(path, url, self.logger)
    }

    fn open(&self, path: &Path) -> anyhow::Result<()> {
        open_mirror(path, self.logger)
    }

    fn fetch_all_refs(&self, path: &Path) -> anyhow::Result<FetchOutcome> {
        let before = ref_snapshot(path, self.logger)?;
        fetch_all_refs(path, self.logger)?;
        let after = ref_snapshot(path, self.logger)?;

        Ok(if before == after {
            FetchOutcome::UpToDate
        } else {
            FetchOutcome::Updated
        })
    }

    fn set_remote_url(&self, path: &Path, url: &str) -> anyhow::Result<()> {
        set_remote_url(path, url, self.logger)
    }

    fn compact(&self, path: &Path) -> anyhow::Result<()> {
        compact(path, self.logger)
    }
}
