//! Archive acquisition and extraction.
//!
//! The branch archive is streamed to disk chunk by chunk (never
//! buffered whole), unpacked into a scratch subdirectory, and the
//! provider's synthetic `<repo>-<branch>` wrapper folder is stripped by
//! hoisting its children to the workspace root. The archive file and
//! the scratch directory are removed regardless of outcome.

use crate::disk;
use crate::error::{IngestError, Result};
use crate::limits;
use crate::repo_url::{GitHost, ProviderRef, RepoUrl};
use crate::workdir::{Workdir, WorkdirManager};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const USER_AGENT: &str = concat!("repotext/", env!("CARGO_PKG_VERSION"));

/// Subset of the provider metadata response we care about. Both GitHub
/// and GitLab expose the field under the same name.
#[derive(Debug, Deserialize)]
struct RepoMetadata {
    default_branch: String,
}

pub struct ArchiveFetcher {
    client: reqwest::Client,
}

impl ArchiveFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| IngestError::Download(err.to_string()))?;
        Ok(Self { client })
    }

    /// Populate `workdir` with the repository tree at the requested (or
    /// default) branch.
    pub async fn populate(
        &self,
        repo: &RepoUrl,
        manager: &WorkdirManager,
        workdir: &Workdir,
    ) -> Result<()> {
        let provider = repo
            .provider
            .as_ref()
            .ok_or_else(|| IngestError::UnsupportedHost(repo.url.clone()))?;

        let branch = match &repo.branch {
            Some(branch) => branch.clone(),
            None => self.default_branch(provider).await?,
        };
        log::info!(
            "fetching {}/{} at branch {branch}",
            provider.owner,
            provider.repo
        );

        let archive_path = manager.archive_path();
        let outcome = match self.download(&archive_url(provider, &branch), &archive_path).await {
            Ok(()) => unpack_into(&archive_path, workdir.path()).await,
            Err(err) => Err(err),
        };

        if let Err(err) = tokio::fs::remove_file(&archive_path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::warn!("could not remove archive {}: {err}", archive_path.display());
            }
        }
        outcome
    }

    async fn default_branch(&self, provider: &ProviderRef) -> Result<String> {
        let url = metadata_url(provider);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| IngestError::LookupFailed(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::LookupFailed(format!("{url} returned {status}")));
        }
        let metadata: RepoMetadata = response
            .json()
            .await
            .map_err(|err| IngestError::LookupFailed(err.to_string()))?;
        Ok(metadata.default_branch)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| IngestError::Download(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Download(format!("{url} returned {status}")));
        }

        let cap = limits::max_archive_bytes();
        if let Some(declared) = response.content_length() {
            check_declared_size(declared, cap)?;
            let volume = dest.parent().unwrap_or(dest);
            if !disk::has_enough_space(volume, declared) {
                return Err(IngestError::InsufficientDiskSpace { needed: declared });
            }
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) => return Err(IngestError::Download(err.to_string())),
            };
            written += chunk.len() as u64;
            // The declared length is advisory; re-check against what
            // actually arrives.
            if written > cap {
                return Err(IngestError::DownloadTooLarge {
                    declared: written,
                    cap,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        log::debug!("downloaded {written} bytes to {}", dest.display());
        Ok(())
    }
}

fn metadata_url(provider: &ProviderRef) -> String {
    match provider.host {
        GitHost::GitHub => format!(
            "https://api.github.com/repos/{}/{}",
            provider.owner, provider.repo
        ),
        GitHost::GitLab => format!(
            "https://gitlab.com/api/v4/projects/{}%2F{}",
            provider.owner, provider.repo
        ),
    }
}

fn archive_url(provider: &ProviderRef, branch: &str) -> String {
    match provider.host {
        GitHost::GitHub => format!(
            "https://github.com/{}/{}/archive/refs/heads/{branch}.tar.gz",
            provider.owner, provider.repo
        ),
        GitHost::GitLab => format!(
            "https://gitlab.com/{}/{}/-/archive/{branch}/{}-{branch}.tar.gz",
            provider.owner, provider.repo, provider.repo
        ),
    }
}

fn check_declared_size(declared: u64, cap: u64) -> Result<()> {
    if declared > cap {
        return Err(IngestError::DownloadTooLarge { declared, cap });
    }
    Ok(())
}

/// Unpack the tarball into a scratch subdirectory, then hoist the
/// single top-level folder's contents to the workspace root.
async fn unpack_into(archive_path: &Path, workspace_root: &Path) -> Result<()> {
    let scratch = workspace_root.join(".repotext-unpack");
    tokio::fs::create_dir_all(&scratch).await?;

    let outcome = unpack_and_hoist(archive_path.to_path_buf(), scratch.clone(), workspace_root.to_path_buf()).await;

    if let Err(err) = tokio::fs::remove_dir_all(&scratch).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            log::warn!("could not remove scratch dir {}: {err}", scratch.display());
        }
    }
    outcome
}

async fn unpack_and_hoist(
    archive_path: PathBuf,
    scratch: PathBuf,
    workspace_root: PathBuf,
) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&archive_path)?;
        let decoder = flate2::read::GzDecoder::new(file);
        let mut archive = tar::Archive::new(decoder);
        archive
            .unpack(&scratch)
            .map_err(|err| IngestError::Extraction(err.to_string()))?;
        hoist_wrapper(&scratch, &workspace_root)
    })
    .await
    .map_err(|err| IngestError::Extraction(format!("unpack task failed: {err}")))?
}

/// Provider archives wrap everything in one `<repo>-<branch>` folder;
/// move its children up so the workspace root is the repository root.
fn hoist_wrapper(scratch: &Path, workspace_root: &Path) -> Result<()> {
    let mut top_level = std::fs::read_dir(scratch)?.collect::<std::io::Result<Vec<_>>>()?;
    let wrapper = match (top_level.len(), top_level.pop()) {
        (1, Some(entry)) if entry.path().is_dir() => entry.path(),
        _ => {
            return Err(IngestError::Extraction(format!(
                "unexpected archive layout under {}",
                scratch.display()
            )))
        }
    };

    for child in std::fs::read_dir(&wrapper)? {
        let child = child?;
        let dest = workspace_root.join(child.file_name());
        std::fs::rename(child.path(), dest)?;
    }
    Ok(())
}
