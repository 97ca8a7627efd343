//! The local half of the pipeline (ignore rules → tree + content) over
//! a fixture workspace, exactly as it runs after an archive has been
//! extracted.

use repotext_ingest::{extract_content, render_tree, PathFilter};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Workspace with a text file, a markdown file, and a binary with
/// embedded NUL bytes.
fn fixture_workspace() -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    fs::write(temp.path().join("main.go"), "package main\n\nfunc main() {}\n")
        .expect("write main.go");
    fs::write(temp.path().join("notes.md"), "# notes\n").expect("write notes.md");
    fs::write(temp.path().join("logo.png"), b"\x89PNG\r\n\x00\x00\x00\rIHDR")
        .expect("write logo.png");
    temp
}

#[test]
fn tree_lists_binaries_but_content_skips_them() {
    let temp = fixture_workspace();
    let filter = PathFilter::build(temp.path(), &[]);

    let tree = render_tree(temp.path(), &filter);
    assert!(tree.contains("main.go"));
    assert!(tree.contains("notes.md"));
    assert!(tree.contains("logo.png"));

    let content = extract_content(temp.path(), &filter).expect("extract");
    assert!(content.contains("File: main.go"));
    assert!(content.contains("func main() {}"));
    assert!(content.contains("File: notes.md"));
    assert!(!content.contains("logo.png"));
}

#[test]
fn caller_patterns_exclude_from_both_views() {
    let temp = fixture_workspace();
    let filter = PathFilter::build(temp.path(), &["**/*.md".to_string()]);

    let tree = render_tree(temp.path(), &filter);
    let content = extract_content(temp.path(), &filter).expect("extract");

    // Excluded even though no .gitignore mentions markdown.
    assert!(!tree.contains("notes.md"));
    assert!(!content.contains("notes.md"));
    assert!(tree.contains("main.go"));
    assert!(content.contains("File: main.go"));
}

#[test]
fn both_views_share_one_filter_and_stay_consistent() {
    let temp = TempDir::new().expect("tempdir");
    let src = temp.path().join("src");
    fs::create_dir(&src).expect("mkdir src");
    fs::write(src.join("lib.rs"), "pub fn hello() {}\n").expect("write lib.rs");
    fs::write(temp.path().join("debug.out"), "noise\n").expect("write debug.out");
    fs::write(temp.path().join(".gitignore"), "*.out\n").expect("write .gitignore");

    let filter = PathFilter::build(temp.path(), &[]);
    let tree = render_tree(temp.path(), &filter);
    let content = extract_content(temp.path(), &filter).expect("extract");

    for view in [&tree, &content] {
        assert!(!view.contains("debug.out"), "gitignored file leaked into a view");
        assert!(view.contains("lib.rs"));
    }
}

#[test]
fn deep_nesting_renders_and_extracts() {
    let temp = TempDir::new().expect("tempdir");
    let deep = temp.path().join("a").join("b").join("c");
    fs::create_dir_all(&deep).expect("mkdirs");
    fs::write(deep.join("leaf.txt"), "leaf\n").expect("write leaf");

    let filter = PathFilter::build(temp.path(), &[]);
    let tree = render_tree(temp.path(), &filter);
    let expected = "\
└── a/
    └── b/
        └── c/
            └── leaf.txt
";
    assert_eq!(tree, expected);

    let content = extract_content(temp.path(), &filter).expect("extract");
    assert!(content.contains(&format!("File: {}", Path::new("a/b/c/leaf.txt").display())));
}
