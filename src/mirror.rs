//! Mirror reconciliation.
//!
//! Phase 1 clones or updates a bare mirror for every listed repository, one
//! after another. Phase 2 removes directories under the output root that no
//! listed repository owns. A failure while syncing one repository is recorded
//! in its [`SyncResult`] and never stops the run; only failing to enumerate
//! the output root is fatal.

use crate::config::Config;
use crate::constants::MARKER_FILE;
use crate::git::{FetchOutcome, MirrorTransport};
use crate::github::{RemoteRepository, RepositoryListing};
use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Started,
    Cloning,
    StrippingCredentials,
    Opening,
    InjectingCredentials,
    Fetching,
    RestoringUrl,
    Compacting,
    Completed,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SyncStep::Started => "starting",
            SyncStep::Cloning => "cloning mirror",
            SyncStep::StrippingCredentials => "removing credentials from remote URL",
            SyncStep::Opening => "opening mirror",
            SyncStep::InjectingCredentials => "setting authenticated remote URL",
            SyncStep::Fetching => "fetching all refs",
            SyncStep::RestoringUrl => "restoring remote URL",
            SyncStep::Compacting => "compacting",
            SyncStep::Completed => "completed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub error: String,
    pub step: SyncStep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new mirror was created.
    Cloned,
    /// An existing mirror was fetched; `changed` is false when it was already up to date.
    Updated { changed: bool },
    Failed(SyncFailure),
}

#[derive(Debug)]
pub struct SyncResult {
    pub name: String,
    pub full_name: String,
    pub path: PathBuf,
    pub outcome: SyncOutcome,
    pub duration: Duration,
}

impl SyncResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, SyncOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    Removed,
    /// Removal was declined at the interactive prompt.
    Kept,
    Failed(String),
}

#[derive(Debug)]
pub struct PruneResult {
    pub name: String,
    pub path: PathBuf,
    pub outcome: PruneOutcome,
}

/// Everything a reconcile run did, in processing order.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub synced: Vec<SyncResult>,
    pub pruned: Vec<PruneResult>,
}

impl ReconcileReport {
    pub fn failures(&self) -> impl Iterator<Item = &SyncResult> {
        self.synced.iter().filter(|r| !r.is_success())
    }

    pub fn cloned(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Cloned))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Updated { changed: true }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Updated { changed: false }))
    }

    pub fn removed(&self) -> usize {
        self.pruned
            .iter()
            .filter(|p| p.outcome == PruneOutcome::Removed)
            .count()
    }

    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.synced.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Hooks for progress reporting and prune confirmation. Every method defaults to a no-op.
pub trait ReconcileCallbacks {
    fn on_sync_start(&self, _repo: &RemoteRepository) {}
    fn on_step(&self, _step: &SyncStep) {}
    fn on_sync_complete(&self, _result: &SyncResult) {}

    /// Return false to keep a stale directory.
    fn confirm_prune(&self, _name: &str, _path: &Path) -> bool {
        true
    }

    fn on_pruned(&self, _result: &PruneResult) {}
}

struct SyncError {
    source: anyhow::Error,
    step: SyncStep,
}

fn at_step<T>(step: SyncStep, result: anyhow::Result<T>) -> Result<T, SyncError> {
    result.map_err(|e| SyncError { source: e, step })
}

/// A directory holds a mirror once the mirror's config file exists.
pub fn is_mirrored(path: &Path) -> bool {
    path.join(MARKER_FILE).is_file()
}

/// Repository names become directory names, so they must be a single plain path component.
pub fn validate_repo_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        anyhow::bail!("Invalid repository name: {:?}", name);
    }
    Ok(())
}

/// Clones `repo` if it has no local mirror yet, otherwise fetches it.
pub fn sync_repository<T, C>(
    repo: &RemoteRepository,
    config: &Config,
    transport: &T,
    callbacks: &C,
) -> SyncResult
where
    T: MirrorTransport + ?Sized,
    C: ReconcileCallbacks + ?Sized,
{
    callbacks.on_sync_start(repo);
    let start = Instant::now();
    let path = config.output_dir.join(&repo.name);

    let outcome = match do_sync(repo, &path, config, transport, callbacks) {
        Ok(outcome) => outcome,
        Err(e) => SyncOutcome::Failed(SyncFailure {
            error: format!("{:#}", e.source),
            step: e.step,
        }),
    };

    let result = SyncResult {
        name: repo.name.clone(),
        full_name: repo.full_name.clone(),
        path,
        outcome,
        duration: start.elapsed(),
    };
    callbacks.on_sync_complete(&result);
    result
}

fn do_sync<T, C>(
    repo: &RemoteRepository,
    path: &Path,
    config: &Config,
    transport: &T,
    callbacks: &C,
) -> Result<SyncOutcome, SyncError>
where
    T: MirrorTransport + ?Sized,
    C: ReconcileCallbacks + ?Sized,
{
    callbacks.on_step(&SyncStep::Started);
    at_step(SyncStep::Started, validate_repo_name(&repo.name))?;

    let url = config.clone_url(&repo.name);
    let auth_url = config
        .credentials
        .as_ref()
        .and_then(|c| c.authenticated_url(&url));

    let outcome = if is_mirrored(path) {
        update_mirror(path, &url, auth_url.as_deref(), transport, callbacks)?
    } else {
        clone_mirror(path, &url, auth_url.as_deref(), transport, callbacks)?
    };

    callbacks.on_step(&SyncStep::Completed);
    Ok(outcome)
}

fn clone_mirror<T, C>(
    path: &Path,
    url: &str,
    auth_url: Option<&str>,
    transport: &T,
    callbacks: &C,
) -> Result<SyncOutcome, SyncError>
where
    T: MirrorTransport + ?Sized,
    C: ReconcileCallbacks + ?Sized,
{
    callbacks.on_step(&SyncStep::Cloning);

    // Anything here without a marker is left over from an interrupted clone.
    at_step(SyncStep::Cloning, clear_path(path))?;
    at_step(SyncStep::Cloning, create_mirror_dir(path))?;

    if let Err(e) = transport.mirror_clone(auth_url.unwrap_or(url), path) {
        return Err(SyncError {
            source: discard_incomplete(path, e),
            step: SyncStep::Cloning,
        });
    }

    if auth_url.is_some() {
        callbacks.on_step(&SyncStep::StrippingCredentials);
        // The token must not stay on disk: drop the clone if the URL can't be reset.
        if let Err(e) = transport.set_remote_url(path, url) {
            return Err(SyncError {
                source: discard_incomplete(path, e),
                step: SyncStep::StrippingCredentials,
            });
        }
    }

    Ok(SyncOutcome::Cloned)
}

fn update_mirror<T, C>(
    path: &Path,
    url: &str,
    auth_url: Option<&str>,
    transport: &T,
    callbacks: &C,
) -> Result<SyncOutcome, SyncError>
where
    T: MirrorTransport + ?Sized,
    C: ReconcileCallbacks + ?Sized,
{
    callbacks.on_step(&SyncStep::Opening);
    at_step(SyncStep::Opening, transport.open(path))?;

    let fetched = fetch_with_credentials(path, auth_url, transport, callbacks);

    // Restore unconditionally, also after a failed fetch.
    callbacks.on_step(&SyncStep::RestoringUrl);
    let restored = at_step(SyncStep::RestoringUrl, transport.set_remote_url(path, url));

    let fetch_outcome = match (fetched, restored) {
        (Ok(outcome), restored) => {
            restored?;
            outcome
        }
        (Err(fetch_error), Ok(())) => return Err(fetch_error),
        // The credentialed URL may still be on disk: report that first.
        (Err(fetch_error), Err(restore_error)) => {
            return Err(SyncError {
                source: restore_error.source.context(format!(
                    "credential-free remote URL not restored after failed fetch ({:#})",
                    fetch_error.source
                )),
                step: SyncStep::RestoringUrl,
            });
        }
    };

    callbacks.on_step(&SyncStep::Compacting);
    at_step(SyncStep::Compacting, transport.compact(path))?;

    Ok(SyncOutcome::Updated {
        changed: fetch_outcome == FetchOutcome::Updated,
    })
}

fn fetch_with_credentials<T, C>(
    path: &Path,
    auth_url: Option<&str>,
    transport: &T,
    callbacks: &C,
) -> Result<FetchOutcome, SyncError>
where
    T: MirrorTransport + ?Sized,
    C: ReconcileCallbacks + ?Sized,
{
    if let Some(auth_url) = auth_url {
        callbacks.on_step(&SyncStep::InjectingCredentials);
        at_step(
            SyncStep::InjectingCredentials,
            transport.set_remote_url(path, auth_url),
        )?;
    }

    callbacks.on_step(&SyncStep::Fetching);
    at_step(SyncStep::Fetching, transport.fetch_all_refs(path))
}

fn create_mirror_dir(path: &Path) -> anyhow::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(crate::constants::MIRROR_DIR_MODE);
    }
    builder
        .create(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))
}

fn clear_path(path: &Path) -> anyhow::Result<()> {
    let Ok(metadata) = std::fs::symlink_metadata(path) else {
        return Ok(());
    };
    let removed = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.with_context(|| format!("Failed to remove incomplete mirror {}", path.display()))
}

fn discard_incomplete(path: &Path, error: anyhow::Error) -> anyhow::Error {
    match std::fs::remove_dir_all(path) {
        Ok(()) => error,
        Err(e) => error.context(format!(
            "also failed to remove incomplete mirror {}: {}",
            path.display(),
            e
        )),
    }
}

/// Removes every directory under `output_dir` whose name is not a listed repository.
///
/// Entries that are not directories (including symlinks) are left alone. A
/// directory that cannot be removed is reported and skipped.
pub fn prune_stale<C>(
    listing: &RepositoryListing,
    output_dir: &Path,
    callbacks: &C,
) -> anyhow::Result<Vec<PruneResult>>
where
    C: ReconcileCallbacks + ?Sized,
{
    let list_context = || format!("Failed to list output directory {}", output_dir.display());

    let mut stale = Vec::new();
    for entry in std::fs::read_dir(output_dir).with_context(list_context)? {
        let entry = entry.with_context(list_context)?;
        let file_type = entry.file_type().with_context(list_context)?;
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !listing.contains_name(&name) {
            stale.push((name, entry.path()));
        }
    }
    stale.sort();

    let mut results = Vec::with_capacity(stale.len());
    for (name, path) in stale {
        let outcome = if !callbacks.confirm_prune(&name, &path) {
            PruneOutcome::Kept
        } else {
            match std::fs::remove_dir_all(&path) {
                Ok(()) => PruneOutcome::Removed,
                Err(e) => PruneOutcome::Failed(e.to_string()),
            }
        };

        let result = PruneResult {
            name,
            path,
            outcome,
        };
        callbacks.on_pruned(&result);
        results.push(result);
    }

    Ok(results)
}

/// Syncs every listed repository in order, then prunes stale directories.
///
/// Fails only if the output root cannot be created or enumerated.
pub fn reconcile<T, C>(
    listing: &RepositoryListing,
    config: &Config,
    transport: &T,
    callbacks: &C,
) -> anyhow::Result<ReconcileReport>
where
    T: MirrorTransport + ?Sized,
    C: ReconcileCallbacks + ?Sized,
{
    create_mirror_dir(&config.output_dir).context("Failed to prepare output directory")?;

    let synced = listing
        .iter()
        .map(|repo| sync_repository(repo, config, transport, callbacks))
        .collect();

    let pruned = prune_stale(listing, &config.output_dir, callbacks)?;

    Ok(ReconcileReport { synced, pruned })
}
