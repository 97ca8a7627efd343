//! Text content aggregation across the workspace.

use crate::error::{IngestError, Result};
use crate::filter::PathFilter;
use crate::limits::BINARY_PROBE_BYTES;
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;

/// Concatenate every non-ignored, non-binary, readable file under the
/// workspace as `File: <relativePath>` sections separated by blank
/// lines.
///
/// Individual file failures are logged and skipped; only a missing
/// workspace root fails the whole operation.
pub fn extract_content(workspace_root: &Path, filter: &PathFilter) -> Result<String> {
    if !workspace_root.is_dir() {
        return Err(IngestError::WorkspaceMissing(
            workspace_root.display().to_string(),
        ));
    }

    let mut sections = Vec::new();
    for entry in WalkDir::new(workspace_root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let rel = path.strip_prefix(workspace_root).unwrap_or(path);
        if filter.is_excluded(rel, false) {
            continue;
        }

        if is_probably_binary(path) {
            log::debug!("skipping binary file {}", rel.display());
            continue;
        }

        match std::fs::read_to_string(path) {
            Ok(text) => {
                sections.push(format!("File: {}\n{text}\n", rel.display()));
            }
            Err(err) => {
                log::warn!("skipping unreadable file {}: {err}", rel.display());
            }
        }
    }

    Ok(sections.join("\n"))
}

/// A file is treated as binary when any of its first 512 bytes is NUL.
///
/// A failed probe falls through to the content read; the read itself
/// decides whether the file is usable.
fn is_probably_binary(path: &Path) -> bool {
    let mut file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };
    let mut probe = [0u8; BINARY_PROBE_BYTES];
    let mut filled = 0;
    while filled < probe.len() {
        match file.read(&mut probe[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return false,
        }
    }
    probe[..filled].contains(&0)
}
