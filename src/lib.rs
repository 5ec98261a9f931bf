//! pipekit - Non-blocking, format-aware I/O with spawned child processes
//!
//! pipekit launches an external process and gives a single-threaded caller
//! buffered, non-blocking access to its standard streams. Each captured
//! stream is serviced by one dedicated background thread performing the
//! blocking OS I/O; the caller decides cooperatively when to poll and when
//! to block.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pipekit::{spawn, ReadRequest, SpawnConfig, StreamSpec};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SpawnConfig::new("bc")
//!     .stdin(StreamSpec::Pipe)
//!     .stderr(StreamSpec::Null);
//! let mut process = spawn(config)?;
//!
//! process.write(b"2 + 2\n")?;
//! let answer = process.read(ReadRequest::Line)?;
//! assert_eq!(answer.as_deref(), Some(b"4".as_slice()));
//!
//! process.close_input();
//! let outcome = process.wait();
//! assert!(outcome.success());
//! # Ok(())
//! # }
//! ```
//!
//! # Polling instead of blocking
//!
//! Every read is a request with a format — a byte count, a line, a
//! whitespace-delimited token, or the stream remainder. Posting the same
//! request through [`ProcessHandle::read_ready`] never blocks: it returns
//! `false` immediately and lets the background thread gather data, so an
//! event-driven caller can interleave its own work and poll again later.
//! [`ProcessHandle::io_wait`] and [`ProcessHandle::status`] are the
//! matching non-blocking snapshots of writer/reader idleness and child
//! termination.

// ============================================================================
// Stable Public API
// ============================================================================

pub use pipekit_spawn::{
    IoReadiness, Lines, ProcessError, ProcessHandle, ProcessStatus, ReadRequest, SpawnConfig,
    SpawnError, StreamId, StreamSpec, WaitOutcome, spawn,
};

/// Stream capture buffer, exposed for embedders layering their own
/// format scanners on top of the request model.
pub use pipekit_utils::StreamBuffer;

/// Tracing bootstrap for binaries embedding pipekit.
pub use pipekit_utils::logging;
