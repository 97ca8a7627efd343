//! Layered path-exclusion rules.
//!
//! Three pattern layers are composed for one request: built-in defaults,
//! the repository's own `.gitignore`, and caller-supplied globs. A path
//! excluded by any layer stays excluded; a negation in a later layer
//! cannot re-include what an earlier layer dropped. Within a layer the
//! full gitignore semantics (anchoring, `**`, `!` negation) apply.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Always-on exclusions: VCS metadata, package-manager lock files,
/// debug logs.
const DEFAULT_PATTERNS: &[&str] = &[
    ".git/",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Cargo.lock",
    "poetry.lock",
    "Pipfile.lock",
    "Gemfile.lock",
    "composer.lock",
    "npm-debug.log*",
    "yarn-debug.log*",
    "yarn-error.log*",
];

/// Exclusion predicate over workspace-root-relative paths, shared by the
/// tree renderer and the content extractor for a single request.
pub struct PathFilter {
    layers: Vec<Gitignore>,
}

impl PathFilter {
    /// Compose the three layers for a workspace.
    ///
    /// Unbuildable patterns are logged and skipped; a filter is always
    /// produced so a malformed repository `.gitignore` cannot abort the
    /// request.
    pub fn build(workspace_root: &Path, extra_patterns: &[String]) -> Self {
        let mut layers = Vec::with_capacity(3);

        let mut defaults = GitignoreBuilder::new(workspace_root);
        add_lines(&mut defaults, DEFAULT_PATTERNS.iter().copied());
        layers.push(finish_layer(defaults, "defaults"));

        let gitignore_path = workspace_root.join(".gitignore");
        if gitignore_path.is_file() {
            let mut repo = GitignoreBuilder::new(workspace_root);
            if let Some(err) = repo.add(&gitignore_path) {
                log::warn!("unreadable .gitignore at {}: {err}", gitignore_path.display());
            }
            layers.push(finish_layer(repo, ".gitignore"));
        }

        if !extra_patterns.is_empty() {
            let mut caller = GitignoreBuilder::new(workspace_root);
            add_lines(&mut caller, extra_patterns.iter().map(String::as_str));
            layers.push(finish_layer(caller, "caller patterns"));
        }

        Self { layers }
    }

    /// Whether `rel_path` (relative to the workspace root) is excluded.
    pub fn is_excluded(&self, rel_path: &Path, is_dir: bool) -> bool {
        self.layers
            .iter()
            .any(|layer| layer.matched_path_or_any_parents(rel_path, is_dir).is_ignore())
    }
}

fn add_lines<'a>(builder: &mut GitignoreBuilder, lines: impl Iterator<Item = &'a str>) {
    for line in lines {
        if let Err(err) = builder.add_line(None, line) {
            log::warn!("skipping unparsable ignore pattern {line:?}: {err}");
        }
    }
}

fn finish_layer(builder: GitignoreBuilder, label: &str) -> Gitignore {
    match builder.build() {
        Ok(layer) => layer,
        Err(err) => {
            log::warn!("could not build {label} ignore layer: {err}");
            Gitignore::empty()
        }
    }
}
