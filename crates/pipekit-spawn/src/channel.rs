//! Per-stream channel state shared between the caller and stream threads
//!
//! All fields are guarded by the owning handle's single mutex; neither side
//! touches them without holding it.

use crate::request::ReadRequest;
use pipekit_utils::StreamBuffer;

/// Capture state for one output stream (stdout or stderr).
#[derive(Debug, Default)]
pub(crate) struct OutputChannel {
    /// Data read so far and not yet consumed by the caller.
    pub buffer: StreamBuffer,
    /// The outstanding read request, if any. The reader thread only
    /// performs OS reads while one is posted.
    pub request: Option<ReadRequest>,
    /// Set once the stream reached end of stream (or an unrecoverable read
    /// error, folded into the same state). Terminal.
    pub eof: bool,
}

impl OutputChannel {
    /// True if a read with this format would complete without blocking.
    pub fn ready_for(&self, request: ReadRequest) -> bool {
        self.eof || request.satisfied_by(&self.buffer)
    }

    /// True if the reader thread has no unsatisfied request in flight.
    pub fn idle(&self) -> bool {
        self.request.is_none() || self.eof
    }
}

/// Write state for the child's standard input.
///
/// The caller queues at most one buffer; the writer thread takes it,
/// flushes with the lock released, and reports back. `closed` is terminal
/// and doubles as the poisoned state after an unrecoverable write error.
#[derive(Debug, Default)]
pub(crate) struct InputChannel {
    /// Buffer queued for the writer thread and not yet picked up.
    pub pending: Option<Vec<u8>>,
    /// The writer thread took a buffer and has not finished flushing it.
    pub in_flight: bool,
    /// The caller asked to close; the writer thread will close the
    /// descriptor and exit.
    pub close_requested: bool,
    /// Descriptor closed, or the channel was poisoned by a write error.
    pub closed: bool,
}

impl InputChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A write is queued or being flushed.
    pub fn busy(&self) -> bool {
        self.pending.is_some() || self.in_flight
    }

    /// True if a `write` call would not block. A closed channel reports
    /// ready so polling loops terminate; the write itself then reports the
    /// closure.
    pub fn write_ready(&self) -> bool {
        !self.busy()
    }
}
