//! Application-wide constants.
//!
//! Centralized configuration values to avoid magic numbers throughout the codebase.

/// Number of repositories requested per page from the listing endpoint.
/// A page shorter than this is the last one.
pub const PAGE_SIZE: u32 = 100;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default base URL clone URLs are built from (`<base>/<org>/<name>.git`).
pub const DEFAULT_GIT_URL: &str = "https://github.com";

/// Default output directory for mirrors.
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Environment variable holding the optional access token.
pub const TOKEN_ENV: &str = "GH_TOKEN";

/// User name paired with the token when it is embedded in an https URL.
pub const CREDENTIAL_USER: &str = "x-access-token";

/// Sent on every API request; GitHub rejects requests without a user agent.
pub const USER_AGENT: &str = concat!("gh-org-mirror/", env!("CARGO_PKG_VERSION"));

/// Pinned REST API version.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// File inside a bare mirror whose presence marks the directory as already cloned.
pub const MARKER_FILE: &str = "config";

/// Remote name created by `git clone --mirror`.
pub const REMOTE_NAME: &str = "origin";

/// Refspec that mirrors every ref, not only the default branch heads.
pub const ALL_REFS_REFSPEC: &str = "+refs/*:refs/*";

/// Housekeeping thresholds passed to `git gc --auto`.
pub const GC_AUTO: &str = "gc.auto=1000";
pub const GC_AUTO_PACK_LIMIT: &str = "gc.autoPackLimit=10";
pub const GC_AUTO_DETACH: &str = "gc.autoDetach=false";

/// Permission bits for newly created mirror directories on unix.
pub const MIRROR_DIR_MODE: u32 = 0o755;

/// Progress bar tick interval in milliseconds.
/// Controls how often the spinner/bar animates.
pub const PROGRESS_TICK_MS: u64 = 80;
