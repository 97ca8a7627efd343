//! Resource limits for a single ingestion request.

/// Hard cap on the declared size of a repository archive.
pub const MAX_ARCHIVE_BYTES: u64 = 1024 * 1024 * 1024; // 1 GiB

/// Minimum free space required on the scratch volume before a workspace
/// is allocated.
pub const MIN_FREE_BYTES: u64 = 1024 * 1024 * 1024; // 1 GiB

/// How many leading bytes of a file are probed for NUL when deciding
/// whether it is binary.
pub const BINARY_PROBE_BYTES: usize = 512;

/// Workspaces older than this are reaped on the next allocation.
pub const STALE_WORKDIR_SECS: u64 = 24 * 60 * 60;

const ENV_MAX_ARCHIVE_BYTES: &str = "REPOTEXT_MAX_ARCHIVE_BYTES";

fn parse_archive_cap(raw: Option<&str>, default_value: u64) -> u64 {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default_value)
        .min(MAX_ARCHIVE_BYTES)
}

/// Archive size cap, overridable (downwards only) via
/// `REPOTEXT_MAX_ARCHIVE_BYTES`.
pub fn max_archive_bytes() -> u64 {
    let raw = std::env::var(ENV_MAX_ARCHIVE_BYTES).ok();
    parse_archive_cap(raw.as_deref(), MAX_ARCHIVE_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_archive_cap_defaults_and_clamps() {
        assert_eq!(parse_archive_cap(None, MAX_ARCHIVE_BYTES), MAX_ARCHIVE_BYTES);
        assert_eq!(parse_archive_cap(Some(""), MAX_ARCHIVE_BYTES), MAX_ARCHIVE_BYTES);
        assert_eq!(parse_archive_cap(Some("  "), MAX_ARCHIVE_BYTES), MAX_ARCHIVE_BYTES);
        assert_eq!(parse_archive_cap(Some("abc"), MAX_ARCHIVE_BYTES), MAX_ARCHIVE_BYTES);
        assert_eq!(parse_archive_cap(Some("0"), MAX_ARCHIVE_BYTES), MAX_ARCHIVE_BYTES);
        assert_eq!(parse_archive_cap(Some("1048576"), MAX_ARCHIVE_BYTES), 1_048_576);
        assert_eq!(
            parse_archive_cap(Some("99999999999999"), MAX_ARCHIVE_BYTES),
            MAX_ARCHIVE_BYTES
        );
        assert_eq!(parse_archive_cap(Some(" 4096 "), MAX_ARCHIVE_BYTES), 4096);
    }
}
