//! Repository source normalization
//!
//! Maps a repository URL to the short identifier used for display and
//! install commands: `owner/repo` for github.com, the URL itself elsewhere.

use reqwest::Url;

use crate::error::{Result, ScoutError};

/// The code-hosting host that gets `owner/repo` shorthand.
pub const DOMINANT_HOST: &str = "github.com";

/// Owner/repository pair on the dominant host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// `owner/repo` shorthand
    pub fn shorthand(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Whether the URL points at the dominant host.
///
/// Unparsable input is simply not a GitHub URL.
pub fn is_github_url(url: &str) -> bool {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(is_dominant_host))
        .unwrap_or(false)
}

fn is_dominant_host(host: &str) -> bool {
    host.eq_ignore_ascii_case(DOMINANT_HOST) || host.eq_ignore_ascii_case("www.github.com")
}

fn parse(url: &str) -> Result<Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ScoutError::InvalidSource {
            url: url.to_string(),
            reason: "empty URL".to_string(),
        });
    }

    let parsed = Url::parse(trimmed).map_err(|e| ScoutError::InvalidSource {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if parsed.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(ScoutError::InvalidSource {
            url: url.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(parsed)
}

/// Extract `owner/repo` from a github.com URL.
///
/// Trailing slash is stripped first, then a trailing `.git`.
pub fn parse_github_repo(url: &str) -> Result<RepoRef> {
    let parsed = parse(url)?;
    let host = parsed.host_str().unwrap_or_default();
    if !is_dominant_host(host) {
        return Err(ScoutError::UnsupportedHost {
            url: url.to_string(),
        });
    }

    let path = parsed.path().trim_start_matches('/');
    let path = path.strip_suffix('/').unwrap_or(path);
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some(owner), Some(repo)) => Ok(RepoRef {
            owner: owner.to_string(),
            repo: repo.to_string(),
        }),
        _ => Err(ScoutError::InvalidSource {
            url: url.to_string(),
            reason: "expected https://github.com/<owner>/<repo>".to_string(),
        }),
    }
}

/// Canonical source identifier for a repository URL.
///
/// `owner/repo` on github.com; any other host is returned unchanged.
pub fn derive_source(url: &str) -> Result<String> {
    let parsed = parse(url)?;
    let host = parsed.host_str().unwrap_or_default();
    if is_dominant_host(host) {
        parse_github_repo(url).map(|r| r.shorthand())
    } else {
        Ok(url.to_string())
    }
}
