//! Integration tests for the process I/O surface
//!
//! These tests spawn the compiled `pipekit-stub` binary as a controllable
//! child process and drive the full request/thread/reap machinery through
//! the public API.

use pipekit::{ProcessStatus, ReadRequest, SpawnConfig, StreamSpec, spawn};
use std::time::{Duration, Instant};

fn stub(scenario: &str) -> SpawnConfig {
    SpawnConfig::new(env!("CARGO_BIN_EXE_pipekit-stub"))
        .arg("--scenario")
        .arg(scenario)
        .stderr(StreamSpec::Null)
}

/// Spin on a condition with a hard deadline so a regression hangs the
/// assertion, not the test runner.
fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_echo_roundtrip_with_exit_code() {
    let config = stub("echo")
        .args(["--exit-code", "7"])
        .stdin(StreamSpec::Pipe);
    let mut process = spawn(config).expect("spawn stub");

    process.write(b"hello\n").expect("write");
    let line = process.read(ReadRequest::Line).expect("read");
    assert_eq!(line, Some(b"hello".to_vec()));

    process.close_input();
    let outcome = process.wait();
    assert_eq!(outcome.exit_code, 7);
    assert_eq!(outcome.stdout, Some(Vec::new()));
}

#[test]
fn test_silent_child_exits_clean() {
    let config = stub("silent").stderr(StreamSpec::Pipe);
    let mut process = spawn(config).expect("spawn stub");

    let outcome = process.wait();
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.stdout, Some(Vec::new()));
    assert_eq!(outcome.stderr, Some(Vec::new()));
    assert!(outcome.success());
}

#[test]
fn test_write_ordering_is_fifo() {
    let config = stub("echo").stdin(StreamSpec::Pipe);
    let mut process = spawn(config).expect("spawn stub");

    for chunk in [b"A".as_slice(), b"B", b"C"] {
        eventually("writer to go idle", || {
            process.write_ready().expect("write_ready")
        });
        process.write(chunk).expect("write");
    }
    process.close_input();

    let outcome = process.wait();
    assert_eq!(outcome.exit_code, 0);
    // The child saw exactly "ABC" at end of input and echoed it back
    assert_eq!(outcome.stdout_string(), "ABC\n");
}

#[test]
fn test_polls_never_block_on_silent_child() {
    let config = stub("hang");
    let mut process = spawn(config).expect("spawn stub");

    let started = Instant::now();
    assert!(!process.read_ready(ReadRequest::Line).expect("read_ready"));
    assert!(process.status().is_running());
    let readiness = process.io_wait(false, true, false);
    assert!(!readiness.finished);
    // One posted request is outstanding, so the reader is not idle
    assert_eq!(readiness.stdout_idle, Some(false));
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "non-blocking polls took too long"
    );

    assert!(process.kill());
    let outcome = process.wait();
    assert_ne!(outcome.exit_code, 0);
}

#[test]
fn test_wait_is_idempotent() {
    let config = stub("split").stderr(StreamSpec::Pipe);
    let mut process = spawn(config).expect("spawn stub");

    let first = process.wait();
    assert_eq!(first.exit_code, 0);
    assert_eq!(first.stdout_string(), "out-1\nout-2\n");
    assert_eq!(first.stderr_string(), "err-1\n");

    let second = process.wait();
    assert_eq!(second.exit_code, first.exit_code);
    assert_eq!(second.stdout, Some(Vec::new()));
    assert_eq!(second.stderr, Some(Vec::new()));
}

#[test]
fn test_token_read_leaves_remainder_buffered() {
    let config = stub("tokens");
    let mut process = spawn(config).expect("spawn stub");

    let token = process.read(ReadRequest::Token).expect("read token");
    assert_eq!(token, Some(b"42".to_vec()));

    // The delimiter and the rest of the line are still buffered
    let line = process.read(ReadRequest::Line).expect("read line");
    assert_eq!(line, Some(b" rest".to_vec()));

    let outcome = process.wait();
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn test_read_number_layered_on_token_mode() {
    let config = stub("tokens");
    let mut process = spawn(config).expect("spawn stub");

    assert_eq!(process.read_number().expect("read number"), Some(42.0));
    // The next token does not parse as a number
    assert_eq!(process.read_number().expect("read number"), None);

    process.wait();
}

#[test]
fn test_lines_iterators() {
    let config = stub("split").stderr(StreamSpec::Pipe);
    let mut process = spawn(config).expect("spawn stub");

    let stdout_lines: Vec<Vec<u8>> = process.lines().collect();
    assert_eq!(stdout_lines, vec![b"out-1".to_vec(), b"out-2".to_vec()]);

    let stderr_lines: Vec<Vec<u8>> = process.lines_err().collect();
    assert_eq!(stderr_lines, vec![b"err-1".to_vec()]);

    let outcome = process.wait();
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn test_poll_driven_read() {
    let config = stub("echo").stdin(StreamSpec::Pipe);
    let mut process = spawn(config).expect("spawn stub");

    assert!(!process.read_ready(ReadRequest::Line).expect("read_ready"));
    process.write(b"ping\n").expect("write");

    // Poll until the background reader gathered the line, then the read
    // completes without blocking
    eventually("line to arrive", || {
        process.read_ready(ReadRequest::Line).expect("read_ready")
    });
    let line = process.read(ReadRequest::Line).expect("read");
    assert_eq!(line, Some(b"ping".to_vec()));

    process.close_input();
    process.wait();
}

#[test]
fn test_uncaptured_channels_error_immediately() {
    let config = stub("silent");
    let mut process = spawn(config).expect("spawn stub");

    // stdin defaults to null, stderr was redirected to null
    assert!(process.write(b"x").is_err());
    assert!(process.write_ready().is_err());
    assert!(process.read_err(ReadRequest::Line).is_err());
    assert!(process.read_err_ready(ReadRequest::All).is_err());

    process.wait();
}

#[test]
fn test_status_transitions_and_late_kill() {
    let config = stub("silent").args(["--exit-code", "5"]);
    let mut process = spawn(config).expect("spawn stub");

    eventually("child to exit", || !process.status().is_running());
    assert_eq!(process.status(), ProcessStatus::Exited(5));
    assert!(!process.status().success());

    // Killing an already-reaped process is a benign no-op
    assert!(!process.kill());

    let outcome = process.wait();
    assert_eq!(outcome.exit_code, 5);
}

#[test]
fn test_io_wait_snapshot() {
    let config = stub("hang").stdin(StreamSpec::Pipe);
    let process = spawn(config).expect("spawn stub");

    let readiness = process.io_wait(true, true, true);
    assert_eq!(readiness.stdin_idle, Some(true));
    assert_eq!(readiness.stdout_idle, Some(true));
    // stderr is not captured; an uncaptured channel reports idle
    assert_eq!(readiness.stderr_idle, Some(true));
    assert!(!readiness.finished);

    assert!(process.kill());
    // Drop performs the implicit drain-and-wait
}

#[test]
fn test_wait_drains_unread_output() {
    let config = stub("tokens");
    let mut process = spawn(config).expect("spawn stub");

    let outcome = process.wait();
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.stdout_string(), "  42 rest\n");
}

#[test]
fn test_env_table_replaces_environment() {
    let config = stub("env").env("PIPEKIT_STUB_VAR", "from-pipekit");
    let mut process = spawn(config).expect("spawn stub");

    let line = process.read(ReadRequest::Line).expect("read");
    assert_eq!(line, Some(b"from-pipekit".to_vec()));

    let outcome = process.wait();
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn test_pre_read_all_then_consume_lines() {
    let config = stub("split").stderr(StreamSpec::Pipe);
    let mut process = spawn(config).expect("spawn stub");

    // Pre-read the whole stream, then consume it with a different format
    eventually("stream to drain", || {
        process.read_ready(ReadRequest::All).expect("read_ready")
    });
    let first = process.read(ReadRequest::Line).expect("read");
    assert_eq!(first, Some(b"out-1".to_vec()));
    let second = process.read(ReadRequest::Line).expect("read");
    assert_eq!(second, Some(b"out-2".to_vec()));
    assert_eq!(process.read(ReadRequest::Line).expect("read"), None);

    let outcome = process.wait();
    assert_eq!(outcome.exit_code, 0);
}
