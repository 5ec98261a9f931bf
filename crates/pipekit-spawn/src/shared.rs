//! Shared state coordinating the caller and the background threads
//!
//! One mutex/condvar pair per process handle guards every mutable field:
//! channel buffers, posted requests, the input queue, and the exit record.
//! The caller and the stream threads communicate only through this state —
//! never by calling across the thread boundary.

use crate::channel::{InputChannel, OutputChannel};
use crate::error::ProcessError;
use crate::request::ReadRequest;
use crate::types::StreamId;
use crate::watcher::ExitWatcher;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Selects one of the captured output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn id(self) -> StreamId {
        match self {
            Self::Stdout => StreamId::Stdout,
            Self::Stderr => StreamId::Stderr,
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Every mutable field of a process handle, guarded by [`Shared::state`].
#[derive(Debug)]
pub(crate) struct ProcessState {
    pub watcher: ExitWatcher,
    pub stdout: Option<OutputChannel>,
    pub stderr: Option<OutputChannel>,
    pub stdin: Option<InputChannel>,
}

impl ProcessState {
    pub fn output(&self, stream: OutputStream) -> Option<&OutputChannel> {
        match stream {
            OutputStream::Stdout => self.stdout.as_ref(),
            OutputStream::Stderr => self.stderr.as_ref(),
        }
    }

    pub fn output_mut(&mut self, stream: OutputStream) -> Option<&mut OutputChannel> {
        match stream {
            OutputStream::Stdout => self.stdout.as_mut(),
            OutputStream::Stderr => self.stderr.as_mut(),
        }
    }
}

/// The lock-protected state plus its condition variable.
#[derive(Debug)]
pub(crate) struct Shared {
    state: Mutex<ProcessState>,
    cond: Condvar,
}

impl Shared {
    pub fn new(state: ProcessState) -> Self {
        Self {
            state: Mutex::new(state),
            cond: Condvar::new(),
        }
    }

    /// Acquire the state lock. A poisoned lock (a panicked background
    /// thread) yields the inner state rather than cascading the panic into
    /// the caller.
    pub fn lock(&self) -> MutexGuard<'_, ProcessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block on the condition variable until the next broadcast.
    pub fn wait<'a>(&self, guard: MutexGuard<'a, ProcessState>) -> MutexGuard<'a, ProcessState> {
        self.cond
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block on the condition variable with an upper bound, for loops that
    /// interleave waiting with a non-blocking pump.
    pub fn wait_timeout<'a>(
        &self,
        guard: MutexGuard<'a, ProcessState>,
        timeout: Duration,
    ) -> MutexGuard<'a, ProcessState> {
        self.cond
            .wait_timeout(guard, timeout)
            .map(|(guard, _)| guard)
            .unwrap_or_else(|err| err.into_inner().0)
    }

    pub fn notify_all(&self) {
        self.cond.notify_all();
    }

    // ========================================================================
    // Caller-side read operations
    // ========================================================================

    /// Non-blocking poll: true if `read` with this format would complete
    /// without blocking. Posts the request to the reader thread when the
    /// buffer cannot satisfy it yet and no request is already outstanding;
    /// polling again while one is outstanding is a no-op.
    pub fn read_ready(
        &self,
        stream: OutputStream,
        request: ReadRequest,
    ) -> Result<bool, ProcessError> {
        let mut state = self.lock();
        let channel = state
            .output_mut(stream)
            .ok_or(ProcessError::ChannelNotOpen { stream: stream.id() })?;
        if channel.ready_for(request) {
            return Ok(true);
        }
        if channel.request.is_none() {
            channel.request = Some(request);
            self.notify_all();
        }
        Ok(false)
    }

    /// Blocking read: suspend until the request is satisfiable (or end of
    /// stream), then consume and return the satisfying prefix. `None` means
    /// no more data.
    pub fn read(
        &self,
        stream: OutputStream,
        request: ReadRequest,
    ) -> Result<Option<Vec<u8>>, ProcessError> {
        let mut state = self.lock();
        loop {
            let channel = state
                .output_mut(stream)
                .ok_or(ProcessError::ChannelNotOpen { stream: stream.id() })?;
            if channel.ready_for(request) {
                let at_eof = channel.eof;
                return Ok(request.take_from(&mut channel.buffer, at_eof));
            }
            if channel.request.is_none() {
                channel.request = Some(request);
                self.notify_all();
            }
            state = self.wait(state);
        }
    }

    /// Post a read-everything request for the final drain, first letting
    /// any outstanding request resolve. No-op once the stream hit end of
    /// stream (or was never captured).
    pub fn post_drain(&self, stream: OutputStream) {
        let mut state = self.lock();
        loop {
            let Some(channel) = state.output_mut(stream) else {
                return;
            };
            if channel.eof {
                return;
            }
            match channel.request {
                None => {
                    channel.request = Some(ReadRequest::All);
                    self.notify_all();
                    return;
                }
                Some(_) => state = self.wait(state),
            }
        }
    }

    /// Wait until the stream's outstanding request resolves (for a drain
    /// request that means end of stream), then take whatever the buffer
    /// holds. `None` if the stream was never captured.
    pub fn take_remainder(&self, stream: OutputStream) -> Option<Vec<u8>> {
        let mut state = self.lock();
        loop {
            let channel = state.output_mut(stream)?;
            if channel.request.is_none() {
                return Some(channel.buffer.take_all());
            }
            state = self.wait(state);
        }
    }

    // ========================================================================
    // Caller-side write operations
    // ========================================================================

    /// Queue one buffer for the writer thread, blocking while a previous
    /// write is still outstanding. Writes are strictly ordered, one at a
    /// time.
    pub fn write(&self, data: &[u8]) -> Result<(), ProcessError> {
        let mut state = self.lock();
        loop {
            let channel = state.stdin.as_mut().ok_or(ProcessError::ChannelNotOpen {
                stream: StreamId::Stdin,
            })?;
            if channel.closed || channel.close_requested {
                return Err(ProcessError::InputClosed);
            }
            if !channel.busy() {
                if !data.is_empty() {
                    channel.pending = Some(data.to_vec());
                    self.notify_all();
                }
                return Ok(());
            }
            state = self.wait(state);
        }
    }

    /// True iff no write is outstanding. Errors only when the stream was
    /// never captured.
    pub fn write_ready(&self) -> Result<bool, ProcessError> {
        let state = self.lock();
        let channel = state.stdin.as_ref().ok_or(ProcessError::ChannelNotOpen {
            stream: StreamId::Stdin,
        })?;
        Ok(channel.write_ready())
    }

    /// Ask the writer thread to flush outstanding work, close the
    /// descriptor, and exit. Waits for an in-flight write first. Benign
    /// no-op when input was never captured or is already closed.
    pub fn request_input_close(&self) {
        let mut state = self.lock();
        loop {
            let Some(channel) = state.stdin.as_mut() else {
                return;
            };
            if channel.closed || channel.close_requested {
                return;
            }
            if !channel.busy() {
                channel.close_requested = true;
                self.notify_all();
                return;
            }
            state = self.wait(state);
        }
    }
}
