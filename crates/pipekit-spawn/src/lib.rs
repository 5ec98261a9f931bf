//! Asynchronous child-process I/O
//!
//! Launches an external process and provides non-blocking, buffered,
//! format-aware access to its standard streams from a single-threaded
//! caller. Each captured stream gets one dedicated background thread
//! performing blocking OS I/O; the caller and the threads coordinate purely
//! through shared, lock-protected state plus a condition variable.
//!
//! # Model
//!
//! - [`SpawnConfig`] describes the command, environment, and per-stream
//!   redirections; [`spawn`] launches it and returns a [`ProcessHandle`].
//! - Reads are *requests*: a [`ReadRequest`] names the shape of data the
//!   caller wants (byte count, line, whitespace-delimited token, or the
//!   remainder). Polling with [`ProcessHandle::read_ready`] never blocks;
//!   [`ProcessHandle::read`] blocks only until the posted request is
//!   satisfied.
//! - Writes queue at most one buffer at a time; a background writer flushes
//!   them in order.
//! - Termination is detected by a non-blocking pump over the child's exit
//!   state; [`ProcessHandle::wait`] drains both output streams, closes
//!   input, reaps the child, and joins every thread.

mod channel;
mod reader;
mod shared;
mod watcher;
mod writer;

pub mod config;
pub mod error;
pub mod launcher;
pub mod process;
pub mod request;
pub mod types;

pub use config::{SpawnConfig, StreamSpec};
pub use error::{ProcessError, SpawnError};
pub use launcher::spawn;
pub use process::{Lines, ProcessHandle};
pub use request::ReadRequest;
pub use types::{IoReadiness, ProcessStatus, StreamId, WaitOutcome};
