//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No blocking sleeps or blocking sockets in production code
//! - No `unwrap()`/`expect()` outside tests
//! - The core library logs through `tracing`, never straight to stdout
//!
//! The scanning helpers live here so each rule's test file stays short.

use std::fs;
use std::path::{Path, PathBuf};

/// A rule broken at a specific line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the offending line
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root, resolved from this package's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../.."))
}

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["flipbook/core/src", "flipbook/daemon/src"];

/// Production lines of every `.rs` file under `dir`
///
/// Comments are stripped, and scanning of a file stops at its first
/// `#[cfg(test)]`.
pub fn production_lines(dir: &Path) -> Vec<(PathBuf, usize, String)> {
    let mut out = Vec::new();

    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };

        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("#[cfg(test)]") {
                break;
            }
            if trimmed.starts_with("//") {
                continue;
            }
            let code = trimmed.split(" //").next().unwrap_or(trimmed);
            out.push((path.to_path_buf(), idx + 1, code.to_string()));
        }
    }

    out
}

/// Every production line in `dirs` containing any of `patterns`
pub fn find_violations(dirs: &[&str], patterns: &[&str]) -> Vec<Violation> {
    let root = workspace_root();
    let mut violations = Vec::new();

    for dir in dirs {
        let path = root.join(dir);
        if !path.exists() {
            continue;
        }
        for (path, line, code) in production_lines(&path) {
            if patterns.iter().any(|p| code.contains(p)) {
                violations.push(Violation {
                    path,
                    line,
                    text: code,
                });
            }
        }
    }

    violations
}

/// Panic with a readable report if `violations` is non-empty
pub fn assert_clean(rule: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!(
        "\nFound {} violation(s) of: {rule}\nFix these before merging!",
        violations.len()
    );
}
