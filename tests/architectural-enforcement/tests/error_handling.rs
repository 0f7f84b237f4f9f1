//! Integration Test: Error Handling and Output
//!
//! **Policy**: Production code propagates errors instead of panicking, and the
//! core library reports through `tracing` rather than printing.

use architectural_enforcement::{
    assert_clean, find_violations, production_lines, workspace_root, PRODUCTION_DIRS,
};

#[test]
fn test_no_unwrap_or_expect_in_production_code() {
    let violations = find_violations(PRODUCTION_DIRS, &[".unwrap()", ".expect("]);
    assert_clean("unwrap()/expect() outside tests (propagate with ?)", &violations);
}

#[test]
fn test_core_does_not_print() {
    let violations = find_violations(
        &["flipbook/core/src"],
        &["println!", "eprintln!", "print!(", "dbg!("],
    );
    assert_clean("Printing from flipbook-core (use tracing)", &violations);
}

#[test]
fn test_scanner_sees_production_sources() {
    let lines = production_lines(&workspace_root().join("flipbook/core/src"));
    assert!(
        lines.iter().any(|(_, _, code)| code.contains("pub struct FrameSet")),
        "scanner found no production code; is the workspace layout unchanged?"
    );
}
