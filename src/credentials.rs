//! Access token handling.
//!
//! The token is injected into remote URLs only for the duration of a clone or
//! fetch. Anything that is printed goes through [`redact_userinfo`] first.

use crate::constants::{CREDENTIAL_USER, TOKEN_ENV};
use std::fmt;
use url::Url;

/// An access token for the hosting service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    /// Returns `None` for an empty token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self { token })
        }
    }

    /// Reads the token from `GH_TOKEN`. Unset or empty means unauthenticated access.
    pub fn from_env() -> Option<Self> {
        std::env::var(TOKEN_ENV).ok().and_then(Self::new)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Embeds the token into an http(s) URL.
    ///
    /// Returns `None` when the URL cannot carry credentials (local paths,
    /// ssh, unparsable input); callers then use the plain URL as-is.
    #[must_use]
    pub fn authenticated_url(&self, url: &str) -> Option<String> {
        let mut parsed = Url::parse(url).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        parsed.set_username(CREDENTIAL_USER).ok()?;
        parsed.set_password(Some(&self.token)).ok()?;
        Some(parsed.into())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Removes `user:password@` from every `scheme://` URL found in `text`.
pub fn redact_userinfo(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find("://") {
        let (head, tail) = rest.split_at(idx + 3);
        out.push_str(head);

        let authority_end = tail
            .find(|c: char| c == '/' || c == '?' || c == '#' || c.is_whitespace())
            .unwrap_or(tail.len());
        let authority = &tail[..authority_end];

        match authority.rfind('@') {
            Some(at) => {
                out.push_str("***@");
                out.push_str(&authority[at + 1..]);
            }
            None => out.push_str(authority),
        }
        rest = &tail[authority_end..];
    }

    out.push_str(rest);
    out
}
