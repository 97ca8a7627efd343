//! End-to-end ingestion: normalize → allocate → fetch → render +
//! extract → release.

use crate::content::extract_content;
use crate::error::Result;
use crate::fetch::ArchiveFetcher;
use crate::filter::PathFilter;
use crate::repo_url::RepoUrl;
use crate::tree::render_tree;
use crate::workdir::WorkdirManager;

/// The two views produced for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutput {
    pub tree: String,
    pub content: String,
}

pub struct Ingestor {
    fetcher: ArchiveFetcher,
    workdirs: WorkdirManager,
}

impl Ingestor {
    /// Ingestor over the system temporary-storage location.
    pub fn new() -> Result<Self> {
        Self::with_workdirs(WorkdirManager::system())
    }

    /// Ingestor with an injected workspace manager (tests point this at
    /// their own scratch root).
    pub fn with_workdirs(workdirs: WorkdirManager) -> Result<Self> {
        Ok(Self {
            fetcher: ArchiveFetcher::new()?,
            workdirs,
        })
    }

    pub fn workdirs(&self) -> &WorkdirManager {
        &self.workdirs
    }

    /// Run the whole pipeline for one repository reference.
    ///
    /// URL validation happens before any resource allocation; the
    /// workspace is released on success and on every error path.
    pub async fn ingest(&self, raw_url: &str, extra_patterns: &[String]) -> Result<IngestOutput> {
        self.ingest_ref(&RepoUrl::parse(raw_url)?, extra_patterns).await
    }

    /// Same as [`ingest`](Self::ingest) for an already-parsed reference
    /// (the transport layer pre-checks URLs to reject them early).
    pub async fn ingest_ref(
        &self,
        repo: &RepoUrl,
        extra_patterns: &[String],
    ) -> Result<IngestOutput> {
        let workdir = self.workdirs.allocate()?;
        let outcome = self.run_in_workspace(repo, extra_patterns, &workdir).await;
        self.workdirs.release(&workdir);
        outcome
    }

    async fn run_in_workspace(
        &self,
        repo: &RepoUrl,
        extra_patterns: &[String],
        workdir: &crate::workdir::Workdir,
    ) -> Result<IngestOutput> {
        self.fetcher.populate(repo, &self.workdirs, workdir).await?;

        // Both views share one filter so they cannot diverge.
        let filter = PathFilter::build(workdir.path(), extra_patterns);
        let tree = render_tree(workdir.path(), &filter);
        let content = extract_content(workdir.path(), &filter)?;
        log::info!(
            "ingested {}: {} tree bytes, {} content bytes",
            repo.url,
            tree.len(),
            content.len()
        );
        Ok(IngestOutput { tree, content })
    }
}
