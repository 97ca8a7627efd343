//! Free-space checks for the scratch volume.

use std::path::Path;

/// Available bytes on the volume holding `path`.
///
/// A failed query reports zero so callers fail closed instead of
/// starting work they cannot finish.
pub fn available_space(path: &Path) -> u64 {
    match fs2::available_space(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("could not query free space for {}: {err}", path.display());
            0
        }
    }
}

/// Whether the volume holding `path` can take `required` bytes.
///
/// Requires twice the requested amount: the archive and its extracted
/// copy exist on disk at the same time.
pub fn has_enough_space(path: &Path, required: u64) -> bool {
    let available = available_space(path);
    let needed = required.saturating_mul(2);
    if available < needed {
        log::warn!(
            "insufficient space at {}: {available} available, {needed} needed",
            path.display()
        );
        return false;
    }
    true
}
