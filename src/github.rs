//! Repository listing from the GitHub REST API.
//!
//! [`list_repositories`] pages through an organization's repositories until a
//! short page comes back. Any failed page aborts the whole listing: a partial
//! list would make the reconciler prune mirrors that still exist upstream.

use crate::config::Config;
use crate::constants::{GITHUB_API_VERSION, PAGE_SIZE, USER_AGENT};
use crate::credentials::Credentials;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// One repository owned by the organization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRepository {
    /// Short name, used as the local directory name.
    pub name: String,
    /// `org/name`, used for diagnostics.
    pub full_name: String,
}

impl RemoteRepository {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
        }
    }
}

/// All repositories of an organization, in the order the service returned them
/// (sorted by full name).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryListing {
    repositories: Vec<RemoteRepository>,
}

impl RepositoryListing {
    pub fn new(repositories: Vec<RemoteRepository>) -> Self {
        Self { repositories }
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RemoteRepository> {
        self.repositories.iter()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.repositories.iter().any(|r| r.name == name)
    }
}

impl<'a> IntoIterator for &'a RepositoryListing {
    type Item = &'a RemoteRepository;
    type IntoIter = std::slice::Iter<'a, RemoteRepository>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Error)]
pub enum ListError {
    #[error("invalid API base URL: {0}")]
    InvalidApiUrl(String),

    #[error("access token is not a valid HTTP header value")]
    InvalidToken,

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("request for page {page} failed")]
    Request {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("GitHub API returned {status} for page {page}: {body}")]
    Status { page: u32, status: u16, body: String },

    #[error("failed to decode page {page}")]
    Decode {
        page: u32,
        #[source]
        source: reqwest::Error,
    },
}

/// A paged source of organization repositories.
pub trait RepositorySource {
    /// Returns page `page` (1-based) with at most `per_page` entries, sorted by full name.
    fn list_page(
        &self,
        organization: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemoteRepository>, ListError>;
}

/// Collects every page of `organization`'s repositories.
///
/// Stops at the first page holding fewer than [`PAGE_SIZE`] entries. The
/// service's ordering is kept as-is.
pub fn list_repositories<S>(source: &S, organization: &str) -> Result<RepositoryListing, ListError>
where
    S: RepositorySource + ?Sized,
{
    let mut repositories = Vec::new();

    for page in 1.. {
        let batch = source.list_page(organization, page, PAGE_SIZE)?;
        let is_last = batch.len() < PAGE_SIZE as usize;
        repositories.extend(batch);
        if is_last {
            break;
        }
    }

    Ok(RepositoryListing::new(repositories))
}

/// Blocking client for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    base_url: Url,
    client: Client,
}

impl GitHubClient {
    pub fn new(config: &Config) -> Result<Self, ListError> {
        let base_url = Url::parse(&config.api_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ListError::InvalidApiUrl(config.api_url.clone()))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers(config.credentials.as_ref())?)
            .build()
            .map_err(ListError::Client)?;

        Ok(Self { base_url, client })
    }

    fn repos_url(&self, organization: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["orgs", organization, "repos"]);
        }
        url
    }
}

impl RepositorySource for GitHubClient {
    fn list_page(
        &self,
        organization: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemoteRepository>, ListError> {
        let response = self
            .client
            .get(self.repos_url(organization))
            .query(&[
                ("type", "all".to_string()),
                ("sort", "full_name".to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .map_err(|source| ListError::Request { page, source })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(ListError::Status { page, status, body });
        }

        response
            .json()
            .map_err(|source| ListError::Decode { page, source })
    }
}

/// Headers sent with every API request. `Authorization` only when a token is configured.
fn default_headers(credentials: Option<&Credentials>) -> Result<HeaderMap, ListError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    headers.insert(
        "X-GitHub-Api-Version",
        HeaderValue::from_static(GITHUB_API_VERSION),
    );

    if let Some(credentials) = credentials {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", credentials.token()))
            .map_err(|_| ListError::InvalidToken)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}
