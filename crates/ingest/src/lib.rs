//! # repotext-ingest
//!
//! Fetches a remote repository branch as an archive and turns it into a
//! normalized text digest for language-model consumption.
//!
//! ## Pipeline
//!
//! ```text
//! Repository URL
//!     │
//!     ├──> URL Normalizer (canonical .git URL + branch)
//!     │
//!     ├──> Workspace Manager (uniquely named scratch dir)
//!     │
//!     ├──> Archive Fetcher (stream + size caps + unpack)
//!     │
//!     └──> Ignore Engine ──> { Tree Renderer, Content Extractor }
//!                                  └─> tree + content strings
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use repotext_ingest::Ingestor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ingestor = Ingestor::new()?;
//!     let output = ingestor
//!         .ingest("https://github.com/acme/widgets/tree/main", &[])
//!         .await?;
//!
//!     println!("{}", output.tree);
//!     Ok(())
//! }
//! ```

mod content;
mod disk;
mod error;
mod fetch;
mod filter;
mod limits;
mod pipeline;
mod repo_url;
mod supervisor;
mod tree;
mod workdir;

pub use content::extract_content;
pub use disk::{available_space, has_enough_space};
pub use error::{IngestError, Result};
pub use fetch::ArchiveFetcher;
pub use filter::PathFilter;
pub use limits::{max_archive_bytes, BINARY_PROBE_BYTES, MAX_ARCHIVE_BYTES, MIN_FREE_BYTES};
pub use pipeline::{IngestOutput, Ingestor};
pub use repo_url::{GitHost, ProviderRef, RepoUrl};
pub use supervisor::{RequestState, RequestSupervisor};
pub use tree::render_tree;
pub use workdir::{Workdir, WorkdirManager};
