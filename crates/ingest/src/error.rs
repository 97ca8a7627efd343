use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("invalid repository URL: {0}")]
    InvalidUrl(String),

    #[error("insufficient disk space: {needed} bytes needed")]
    InsufficientDiskSpace { needed: u64 },

    #[error("unsupported host for branch lookup: {0}")]
    UnsupportedHost(String),

    #[error("branch lookup failed: {0}")]
    LookupFailed(String),

    #[error("archive too large: {declared} bytes declared, cap is {cap}")]
    DownloadTooLarge { declared: u64, cap: u64 },

    #[error("download failed: {0}")]
    Download(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("workspace missing: {0}")]
    WorkspaceMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
