//! Deterministic directory-tree rendering.

use crate::filter::PathFilter;
use std::io;
use std::path::Path;

/// Render the workspace as an indented tree.
///
/// Rendering is best-effort relative to content extraction: any error
/// (unreadable directory, vanished entry) degrades to an empty string
/// instead of failing the request.
pub fn render_tree(workspace_root: &Path, filter: &PathFilter) -> String {
    let mut out = String::new();
    if let Err(err) = render_dir(workspace_root, workspace_root, "", filter, &mut out) {
        log::warn!("tree rendering degraded for {}: {err}", workspace_root.display());
        return String::new();
    }
    out
}

fn render_dir(
    dir: &Path,
    root: &Path,
    prefix: &str,
    filter: &PathFilter,
    out: &mut String,
) -> io::Result<()> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_dir = entry.file_type()?.is_dir();
        let rel = path.strip_prefix(root).unwrap_or(&path);
        if filter.is_excluded(rel, is_dir) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, path, is_dir));
    }

    // Directories first, then case-insensitive lexicographic within
    // each group. Stable inputs give byte-identical output.
    entries.sort_by(|a, b| {
        b.2.cmp(&a.2)
            .then_with(|| a.0.to_lowercase().cmp(&b.0.to_lowercase()))
            .then_with(|| a.0.cmp(&b.0))
    });

    let count = entries.len();
    for (index, (name, path, is_dir)) in entries.into_iter().enumerate() {
        let last = index + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&name);
        if is_dir {
            out.push('/');
        }
        out.push('\n');

        if is_dir {
            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            render_dir(&path, root, &child_prefix, filter, out)?;
        }
    }
    Ok(())
}
