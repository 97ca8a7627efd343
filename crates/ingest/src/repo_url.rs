//! Repository URL recognition and canonicalization.
//!
//! Browse URLs of the two supported providers are rewritten to their
//! `.git`-suffixed canonical form and the branch segment is lifted out.
//! SSH-style and direct `.git` URLs pass through unchanged; anything
//! else is rejected before any network or filesystem activity.

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHost {
    GitHub,
    GitLab,
}

impl GitHost {
    pub const fn domain(self) -> &'static str {
        match self {
            GitHost::GitHub => "github.com",
            GitHost::GitLab => "gitlab.com",
        }
    }

    fn from_domain(domain: &str) -> Option<Self> {
        match domain {
            "github.com" => Some(GitHost::GitHub),
            "gitlab.com" => Some(GitHost::GitLab),
            _ => None,
        }
    }
}

/// Owner/repo coordinates on a recognized hosting provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRef {
    pub host: GitHost,
    pub owner: String,
    pub repo: String,
}

/// A validated repository reference.
///
/// `url` is always fetchable as a git URL: the `.git`-suffixed canonical
/// form for recognized browse URLs, the raw input otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    pub url: String,
    pub provider: Option<ProviderRef>,
    pub branch: Option<String>,
}

impl RepoUrl {
    /// Parse a raw repository reference.
    ///
    /// Returns `InvalidUrl` when the input matches none of the
    /// recognized forms.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IngestError::InvalidUrl("empty URL".to_string()));
        }

        if let Some(rest) = raw.strip_prefix("git@") {
            return parse_ssh(raw, rest);
        }

        if let Some((host, path)) = split_https(raw) {
            if let Some(host) = GitHost::from_domain(host) {
                return parse_browse(host, path);
            }
        }

        // Any other https/git/ssh URL with a `.git` path is treated as a
        // generic git URL: validity check only, no canonicalization.
        if raw.ends_with(".git") && raw.contains("://") && raw.splitn(4, '/').count() == 4 {
            return Ok(RepoUrl {
                url: raw.to_string(),
                provider: None,
                branch: None,
            });
        }

        Err(IngestError::InvalidUrl(raw.to_string()))
    }
}

/// `git@host:owner/repo.git`
fn parse_ssh(raw: &str, rest: &str) -> Result<RepoUrl> {
    let Some((domain, path)) = rest.split_once(':') else {
        return Err(IngestError::InvalidUrl(raw.to_string()));
    };
    let (owner, repo) = match path.split_once('/') {
        Some((o, r)) if !o.is_empty() && !r.is_empty() && !r.contains('/') => (o, r),
        _ => return Err(IngestError::InvalidUrl(raw.to_string())),
    };
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if domain.is_empty() || repo.is_empty() {
        return Err(IngestError::InvalidUrl(raw.to_string()));
    }

    let provider = GitHost::from_domain(domain).map(|host| ProviderRef {
        host,
        owner: owner.to_string(),
        repo: repo.to_string(),
    });

    Ok(RepoUrl {
        url: raw.to_string(),
        provider,
        branch: None,
    })
}

/// Strip an `https://` (or `http://`) scheme and optional `www.`,
/// returning `(domain, path)`.
fn split_https(raw: &str) -> Option<(&str, &str)> {
    let rest = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))?;
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let (domain, path) = rest.split_once('/')?;
    Some((domain, path.trim_end_matches('/')))
}

/// `<owner>/<repo>[.git]`, `<owner>/<repo>/tree/<branch>` (GitHub) or
/// `<owner>/<repo>/-/tree/<branch>` (GitLab).
fn parse_browse(host: GitHost, path: &str) -> Result<RepoUrl> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return Err(IngestError::InvalidUrl(format!(
            "https://{}/{path}",
            host.domain()
        )));
    }

    let owner = segments[0];
    let repo = segments[1].strip_suffix(".git").unwrap_or(segments[1]);
    if owner.is_empty() || repo.is_empty() {
        return Err(IngestError::InvalidUrl(format!(
            "https://{}/{path}",
            host.domain()
        )));
    }

    let branch = match (host, segments.get(2), segments.get(3), segments.get(4)) {
        (_, None, _, _) => None,
        (GitHost::GitHub, Some(&"tree"), Some(branch), _) => Some((*branch).to_string()),
        (GitHost::GitLab, Some(&"-"), Some(&"tree"), Some(branch)) => Some((*branch).to_string()),
        _ => None,
    };

    Ok(RepoUrl {
        url: format!("https://{}/{owner}/{repo}.git", host.domain()),
        provider: Some(ProviderRef {
            host,
            owner: owner.to_string(),
            repo: repo.to_string(),
        }),
        branch,
    })
}
