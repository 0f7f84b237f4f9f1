//! Integration Test: Async Discipline
//!
//! **Policy**: Production code runs on the tokio runtime and must never block
//! a worker thread. Timers come from `tokio::time`, sockets from `tokio::net`.

use architectural_enforcement::{assert_clean, find_violations, PRODUCTION_DIRS};

#[test]
fn test_no_blocking_sleep_in_production_code() {
    let violations =
        find_violations(PRODUCTION_DIRS, &["std::thread::sleep", "thread::sleep("]);
    assert_clean("Blocking sleep (use tokio::time::sleep)", &violations);
}

#[test]
fn test_no_blocking_sockets_in_production_code() {
    let violations = find_violations(
        PRODUCTION_DIRS,
        &[
            "std::net::TcpListener",
            "std::net::TcpStream",
            "std::net::UdpSocket",
        ],
    );
    assert_clean("Blocking socket (use tokio::net)", &violations);
}

#[test]
fn test_no_blocking_file_io_in_production_code() {
    let violations = find_violations(PRODUCTION_DIRS, &["std::fs::", "use std::fs"]);
    assert_clean("Blocking file I/O", &violations);
}
