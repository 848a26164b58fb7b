//! Architecture enforcement tests.
//!
//! All version-control access goes through `src/git/`. The engine and the
//! CLI work with `core::types::Oid` and the `Git` facade only, so the
//! backend can be swapped or faked without touching them.
//!
//! # Test Categories
//!
//! 1. **Backend Import Detection** - Only `src/git/` may use `git2`
//! 2. **Subprocess Detection** - Nothing in `src/` shells out to `git`

use std::fs;
use std::path::{Path, PathBuf};

/// The only directory allowed to touch the git backend.
const GIT_MODULE: &str = "src/git";

fn source_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(source_files(&path));
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    files.sort();
    files
}

fn crate_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Lines of `content` that are code, not comments.
fn code_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .map(|(i, line)| (i + 1, line))
}

// =============================================================================
// Backend Import Detection
// =============================================================================

#[test]
fn only_git_module_uses_git2() {
    let root = crate_root();
    let git_dir = root.join(GIT_MODULE);
    let mut violations = Vec::new();

    for file in source_files(&root.join("src")) {
        if file.starts_with(&git_dir) {
            continue;
        }
        let content = fs::read_to_string(&file).unwrap();
        for (line_no, line) in code_lines(&content) {
            if line.contains("git2::") || line.contains("use git2") {
                violations.push(format!("{}:{}: {}", file.display(), line_no, line.trim()));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "git2 used outside {}:\n{}",
        GIT_MODULE,
        violations.join("\n")
    );
}

// =============================================================================
// Subprocess Detection
// =============================================================================

#[test]
fn no_git_subprocesses() {
    let root = crate_root();
    let mut violations = Vec::new();

    for file in source_files(&root.join("src")) {
        let content = fs::read_to_string(&file).unwrap();
        for (line_no, line) in code_lines(&content) {
            if line.contains("process::Command") || line.contains("Command::new(\"git\")") {
                violations.push(format!("{}:{}: {}", file.display(), line_no, line.trim()));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "subprocess use in src/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn source_tree_is_found() {
    // Guards against the lints above passing vacuously
    let files = source_files(&crate_root().join("src"));
    assert!(files.iter().any(|f| f.ends_with("git/interface.rs")));
    assert!(files.iter().any(|f| f.ends_with("engine/check.rs")));
}
