//! Per-request scratch directory lifecycle.
//!
//! The manager owns an injected root and naming prefixes so tests can
//! point it at their own directory instead of the real system temp
//! location. Every name carries a random suffix; no locking is needed
//! between concurrent requests.

use crate::disk;
use crate::error::{IngestError, Result};
use crate::limits::{MIN_FREE_BYTES, STALE_WORKDIR_SECS};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_DIR_PREFIX: &str = "repotext-ws-";
const DEFAULT_ARCHIVE_PREFIX: &str = "repotext-archive-";

/// A uniquely named scratch directory owned by one in-flight request.
#[derive(Debug)]
pub struct Workdir {
    path: PathBuf,
}

impl Workdir {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct WorkdirManager {
    root: PathBuf,
    dir_prefix: String,
    archive_prefix: String,
}

impl WorkdirManager {
    pub fn new(
        root: impl Into<PathBuf>,
        dir_prefix: impl Into<String>,
        archive_prefix: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            dir_prefix: dir_prefix.into(),
            archive_prefix: archive_prefix.into(),
        }
    }

    /// Manager over the system temporary-storage location.
    pub fn system() -> Self {
        Self::new(std::env::temp_dir(), DEFAULT_DIR_PREFIX, DEFAULT_ARCHIVE_PREFIX)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh workspace directory.
    ///
    /// Reaps abandoned entries from prior runs first, then verifies the
    /// scratch volume has headroom before touching anything else.
    pub fn allocate(&self) -> Result<Workdir> {
        self.sweep(Some(Duration::from_secs(STALE_WORKDIR_SECS)));

        std::fs::create_dir_all(&self.root)?;
        if !disk::has_enough_space(&self.root, MIN_FREE_BYTES) {
            return Err(IngestError::InsufficientDiskSpace {
                needed: MIN_FREE_BYTES,
            });
        }

        let path = self.root.join(format!("{}{}", self.dir_prefix, Uuid::new_v4()));
        std::fs::create_dir(&path)?;
        log::debug!("allocated workspace {}", path.display());
        Ok(Workdir { path })
    }

    /// Uniquely named path for a downloaded archive, next to the
    /// workspace directories so the same sweep covers both.
    pub fn archive_path(&self) -> PathBuf {
        self.root
            .join(format!("{}{}.tar.gz", self.archive_prefix, Uuid::new_v4()))
    }

    /// Remove a workspace and everything in it.
    ///
    /// Failures are logged, never returned: cleanup must not mask the
    /// result already determined by the pipeline.
    pub fn release(&self, workdir: &Workdir) {
        if let Err(err) = std::fs::remove_dir_all(&workdir.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::warn!("could not release {}: {err}", workdir.path.display());
            }
        }
    }

    /// Remove every prefix-matching entry regardless of age. Emergency
    /// path for abandoned requests (e.g. the timeout backstop).
    pub fn sweep_all(&self) {
        self.sweep(None);
    }

    fn sweep(&self, older_than: Option<Duration>) {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("could not sweep {}: {err}", self.root.display());
                }
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(&self.dir_prefix) && !name.starts_with(&self.archive_prefix) {
                continue;
            }
            if let Some(min_age) = older_than {
                if !Self::older_than(&entry, min_age) {
                    continue;
                }
            }

            let path = entry.path();
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => log::info!("swept {}", path.display()),
                Err(err) => log::warn!("could not sweep {}: {err}", path.display()),
            }
        }
    }

    fn older_than(entry: &std::fs::DirEntry, min_age: Duration) -> bool {
        entry
            .metadata()
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age >= min_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manager(root: &Path) -> WorkdirManager {
        WorkdirManager::new(root, "test-ws-", "test-archive-")
    }

    #[test]
    fn allocations_never_collide() {
        let temp = tempdir().expect("tempdir");
        let manager = manager(temp.path());
        let first = manager.allocate().expect("first");
        let second = manager.allocate().expect("second");

        assert_ne!(first.path(), second.path());
        assert!(first.path().is_dir());
        assert!(second.path().is_dir());

        manager.release(&first);
        assert!(!first.path().exists());
        assert!(second.path().is_dir());
        manager.release(&second);
    }

    #[test]
    fn release_of_missing_workspace_is_silent() {
        let temp = tempdir().expect("tempdir");
        let manager = manager(temp.path());
        let workdir = manager.allocate().expect("allocate");
        manager.release(&workdir);
        // Second release must not error or panic.
        manager.release(&workdir);
    }

    #[test]
    fn sweep_all_removes_prefixed_entries_only() {
        let temp = tempdir().expect("tempdir");
        let manager = manager(temp.path());
        let workdir = manager.allocate().expect("allocate");
        std::fs::write(manager.archive_path(), b"tar").expect("archive");
        std::fs::write(temp.path().join("unrelated.txt"), b"keep").expect("unrelated");

        manager.sweep_all();

        assert!(!workdir.path().exists());
        assert!(temp.path().join("unrelated.txt").exists());
        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .expect("read_dir")
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("test-"))
            .collect();
        assert!(leftovers.is_empty(), "prefixed entries survived the sweep");
    }

    #[test]
    fn fresh_entries_survive_the_stale_sweep() {
        let temp = tempdir().expect("tempdir");
        let manager = manager(temp.path());
        let first = manager.allocate().expect("first");
        // A second allocation sweeps stale entries; the fresh one stays.
        let second = manager.allocate().expect("second");
        assert!(first.path().is_dir());
        manager.release(&first);
        manager.release(&second);
    }

    #[test]
    fn sweeping_a_missing_root_is_harmless() {
        let temp = tempdir().expect("tempdir");
        let manager = manager(&temp.path().join("never-created"));
        manager.sweep_all();
    }
}
