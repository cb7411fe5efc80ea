//! Test infrastructure for gh-org-mirror integration tests.
#![allow(dead_code)]

use anyhow::Result;
use gh_org_mirror::config::{Config, Verbosity};
use gh_org_mirror::git::{self, run_git};
use gh_org_mirror::github::{RemoteRepository, RepositoryListing};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ORG: &str = "acme";

/// A fake hosting service: bare repositories under `<root>/acme/<name>.git`,
/// each fed from a working clone under `<root>/work/<name>`.
/// Automatically cleaned up when dropped.
pub struct TestHost {
    root: TempDir,
}

impl TestHost {
    pub fn new() -> Result<Self> {
        Ok(Self {
            root: TempDir::new()?,
        })
    }

    /// Base URL to use as `Config::git_url`.
    pub fn git_url(&self) -> String {
        self.root.path().to_string_lossy().into_owned()
    }

    pub fn bare_path(&self, name: &str) -> PathBuf {
        self.root.path().join(ORG).join(format!("{name}.git"))
    }

    fn work_path(&self, name: &str) -> PathBuf {
        self.root.path().join("work").join(name)
    }

    /// Creates a repository with one commit on master and a `v1` tag.
    pub fn create_repo(&self, name: &str) -> Result<()> {
        let bare = self.bare_path(name);
        std::fs::create_dir_all(&bare)?;
        run_git(&bare, &["init", "--bare", "-b", "master"])?;

        let work = self.work_path(name);
        std::fs::create_dir_all(&work)?;
        run_git(&work, &["init", "-b", "master"])?;
        run_git(&work, &["config", "user.email", "test@example.com"])?;
        run_git(&work, &["config", "user.name", "Test User"])?;
        std::fs::write(work.join("README.md"), format!("# {name}\n"))?;
        run_git(&work, &["add", "README.md"])?;
        run_git(&work, &["commit", "-m", "Initial commit"])?;
        run_git(&work, &["tag", "v1"])?;
        run_git(&work, &["remote", "add", "origin", path_str(&bare)])?;
        run_git(&work, &["push", "--quiet", "origin", "master", "--tags"])?;
        Ok(())
    }

    pub fn push_commit(&self, name: &str, message: &str) -> Result<()> {
        let work = self.work_path(name);
        std::fs::write(work.join("CHANGES.md"), format!("{message}\n"))?;
        run_git(&work, &["add", "CHANGES.md"])?;
        run_git(&work, &["commit", "-m", message])?;
        run_git(&work, &["push", "--quiet", "origin", "HEAD"])?;
        Ok(())
    }

    pub fn push_branch(&self, name: &str, branch: &str) -> Result<()> {
        let work = self.work_path(name);
        run_git(&work, &["branch", branch])?;
        run_git(&work, &["push", "--quiet", "origin", branch])?;
        Ok(())
    }

    pub fn push_ref(&self, name: &str, refname: &str) -> Result<()> {
        let work = self.work_path(name);
        let refspec = format!("HEAD:{refname}");
        run_git(&work, &["push", "--quiet", "origin", &refspec])?;
        Ok(())
    }

    pub fn delete_branch(&self, name: &str, branch: &str) -> Result<()> {
        let work = self.work_path(name);
        run_git(&work, &["push", "--quiet", "origin", "--delete", branch])?;
        Ok(())
    }

    /// Makes the upstream repository unreachable.
    pub fn remove_repo(&self, name: &str) -> Result<()> {
        std::fs::remove_dir_all(self.bare_path(name))?;
        Ok(())
    }
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are valid UTF-8")
}

pub fn test_config(host: &TestHost, output: &Path) -> Config {
    Config {
        organization: ORG.to_string(),
        output_dir: output.to_path_buf(),
        credentials: None,
        api_url: "https://api.github.com".to_string(),
        git_url: host.git_url(),
        verbosity: Verbosity::Quiet,
        interactive_prune: false,
    }
}

pub fn listing(names: &[&str]) -> RepositoryListing {
    RepositoryListing::new(
        names
            .iter()
            .map(|name| RemoteRepository::new(*name, format!("{ORG}/{name}")))
            .collect(),
    )
}

/// Sorted names of the directories directly under `path`.
pub fn dir_names(path: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

pub fn refs(mirror: &Path) -> Result<String> {
    git::ref_snapshot(mirror, git::no_op_logger)
}
