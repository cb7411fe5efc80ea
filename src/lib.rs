//! GitHub organization mirroring library.
//!
//! This crate keeps a local directory of bare mirrors in sync with an organization:
//! - Listing every repository of the organization, page by page
//! - Cloning mirrors for new repositories
//! - Fetching and pruning all refs of existing mirrors, then compacting them
//! - Removing local mirrors of repositories that are gone upstream

pub mod cli;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod git;
pub mod github;
pub mod mirror;
pub mod output;
