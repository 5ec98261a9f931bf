//! Caller-facing process handle
//!
//! All exchange with the child goes through this handle. Polling
//! operations (`read_ready`, `write_ready`, `io_wait`, `status`, `pump`)
//! never block; `read` and `write` suspend the caller exactly while the
//! requested condition is unmet; `wait` suspends until full drain and
//! process exit.

use crate::error::ProcessError;
use crate::request::ReadRequest;
use crate::shared::{OutputStream, ProcessState, Shared};
use crate::types::{IoReadiness, ProcessStatus, WaitOutcome};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

/// Interval between exit polls while blocking on child termination.
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to a spawned child process and its stream threads.
///
/// Dropping the handle performs the equivalent of [`wait`](Self::wait) if
/// it has not run yet, so threads and descriptors are never leaked; a
/// caller that does not want to block in the destructor should `kill` or
/// `wait` explicitly first.
#[derive(Debug)]
pub struct ProcessHandle {
    shared: Arc<Shared>,
    pid: u32,
    stdout_thread: Option<JoinHandle<()>>,
    stderr_thread: Option<JoinHandle<()>>,
    stdin_thread: Option<JoinHandle<()>>,
}

impl ProcessHandle {
    pub(crate) fn new(
        shared: Arc<Shared>,
        pid: u32,
        stdout_thread: Option<JoinHandle<()>>,
        stderr_thread: Option<JoinHandle<()>>,
        stdin_thread: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            shared,
            pid,
            stdout_thread,
            stderr_thread,
            stdin_thread,
        }
    }

    /// OS process id of the child. Useful for diagnostics; anything beyond
    /// printing it is non-portable.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Check whether [`read`](Self::read) with this format would complete
    /// without blocking. Never waits: when the buffered data cannot satisfy
    /// the format yet, the request is posted to the background reader and
    /// `false` comes back immediately. Polling again later is cheap and
    /// does not post a second request.
    ///
    /// The format used here does not have to match the later `read`; a
    /// whole stream can be pre-read with [`ReadRequest::All`] and then
    /// consumed line by line.
    pub fn read_ready(&self, request: ReadRequest) -> Result<bool, ProcessError> {
        self.shared.read_ready(OutputStream::Stdout, request)
    }

    /// [`read_ready`](Self::read_ready) for standard error.
    pub fn read_err_ready(&self, request: ReadRequest) -> Result<bool, ProcessError> {
        self.shared.read_ready(OutputStream::Stderr, request)
    }

    /// Read from the child's standard output, blocking until the request
    /// is satisfiable. `Ok(None)` means the stream has no more data; once
    /// that happens all further reads report the same without engaging the
    /// background thread.
    pub fn read(&self, request: ReadRequest) -> Result<Option<Vec<u8>>, ProcessError> {
        self.shared.read(OutputStream::Stdout, request)
    }

    /// [`read`](Self::read) for standard error.
    pub fn read_err(&self, request: ReadRequest) -> Result<Option<Vec<u8>>, ProcessError> {
        self.shared.read(OutputStream::Stderr, request)
    }

    /// Read a whitespace-delimited token from standard output and parse it
    /// as a number. `Ok(None)` when the stream is exhausted or the token
    /// does not parse; the token is consumed either way.
    pub fn read_number(&self) -> Result<Option<f64>, ProcessError> {
        Ok(parse_token(self.read(ReadRequest::Token)?))
    }

    /// [`read_number`](Self::read_number) for standard error.
    pub fn read_err_number(&self) -> Result<Option<f64>, ProcessError> {
        Ok(parse_token(self.read_err(ReadRequest::Token)?))
    }

    /// Iterator over standard-output lines; yields until no more data.
    #[must_use]
    pub fn lines(&self) -> Lines<'_> {
        Lines {
            handle: self,
            stream: OutputStream::Stdout,
        }
    }

    /// Iterator over standard-error lines; yields until no more data.
    #[must_use]
    pub fn lines_err(&self) -> Lines<'_> {
        Lines {
            handle: self,
            stream: OutputStream::Stderr,
        }
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write to the child's standard input through the background writer.
    ///
    /// Queues at most one buffer: the call blocks while a previous write
    /// is still being flushed, so writes are strictly ordered. Reports
    /// [`ProcessError::InputClosed`] once the channel was closed or
    /// poisoned by a write error.
    pub fn write(&self, data: &[u8]) -> Result<(), ProcessError> {
        self.shared.write(data)
    }

    /// True iff a [`write`](Self::write) call would not block.
    pub fn write_ready(&self) -> Result<bool, ProcessError> {
        self.shared.write_ready()
    }

    /// Flush any outstanding write, close the child's standard input, and
    /// join the writer thread. Many children need this to see end of
    /// input. Benign no-op when input was not captured or already closed.
    pub fn close_input(&mut self) {
        self.shared.request_input_close();
        if let Some(thread) = self.stdin_thread.take() {
            let _ = thread.join();
        }
    }

    // ========================================================================
    // Termination
    // ========================================================================

    /// Advance the exit watcher's non-blocking poll once, so subsequent
    /// `status`/`io_wait` snapshots observe up-to-date termination state.
    /// Never blocks.
    pub fn pump(&self) {
        let mut state = self.shared.lock();
        pump_state(&self.shared, &mut state);
    }

    /// Non-blocking status poll (pumps first).
    #[must_use]
    pub fn status(&self) -> ProcessStatus {
        let mut state = self.shared.lock();
        match pump_state(&self.shared, &mut state) {
            Some(code) => ProcessStatus::Exited(code),
            None => ProcessStatus::Running,
        }
    }

    /// One non-blocking snapshot of readiness across the requested
    /// channels plus termination state (pumps first).
    #[must_use]
    pub fn io_wait(&self, check_in: bool, check_out: bool, check_err: bool) -> IoReadiness {
        let mut state = self.shared.lock();
        let finished = pump_state(&self.shared, &mut state).is_some();
        IoReadiness {
            stdin_idle: check_in
                .then(|| state.stdin.as_ref().is_none_or(|c| c.write_ready()) && !finished),
            stdout_idle: check_out.then(|| state.stdout.as_ref().is_none_or(|c| c.idle())),
            stderr_idle: check_err.then(|| state.stderr.as_ref().is_none_or(|c| c.idle())),
            finished,
        }
    }

    /// Request termination of the child with the default signal (SIGTERM
    /// on Unix). Returns `false` once the child has already been reaped.
    pub fn kill(&self) -> bool {
        self.shared.lock().watcher.kill()
    }

    /// Request termination with an explicit signal number. Returns `false`
    /// for unknown signals or once the child has already been reaped.
    #[cfg(unix)]
    pub fn kill_with(&self, signal: i32) -> bool {
        self.shared.lock().watcher.kill_with(signal)
    }

    /// Wait for process termination and clean up.
    ///
    /// Starts background drains of both captured output streams, flushes
    /// and closes standard input, blocks until the child has been reaped,
    /// then returns the exit code together with whatever remained on the
    /// captured streams. Joins every stream thread. Idempotent: calling
    /// again returns the same exit code with empty remainders.
    pub fn wait(&mut self) -> WaitOutcome {
        // Receive all pending output in the background first
        self.shared.post_drain(OutputStream::Stdout);
        self.shared.post_drain(OutputStream::Stderr);
        // Then flush and close input
        self.close_input();
        // Then block until the child is reaped
        let exit_code = self.wait_for_exit();
        // Finally gather the remaining data and join the readers
        let stdout = self.shared.take_remainder(OutputStream::Stdout);
        let stderr = self.shared.take_remainder(OutputStream::Stderr);
        if let Some(thread) = self.stdout_thread.take() {
            let _ = thread.join();
        }
        if let Some(thread) = self.stderr_thread.take() {
            let _ = thread.join();
        }
        debug!(pid = self.pid, exit_code, "child process waited");
        WaitOutcome {
            exit_code,
            stdout,
            stderr,
        }
    }

    /// Block until the exit watcher has reaped the child, pumping the
    /// non-blocking poll between timed condvar waits.
    fn wait_for_exit(&self) -> i32 {
        let mut state = self.shared.lock();
        loop {
            if let Some(code) = pump_state(&self.shared, &mut state) {
                return code;
            }
            state = self.shared.wait_timeout(state, REAP_POLL_INTERVAL);
        }
    }
}

/// Pump the watcher under the lock, broadcasting when this poll is the one
/// that observed termination.
fn pump_state(shared: &Shared, state: &mut ProcessState) -> Option<i32> {
    let already_known = state.watcher.exit_code().is_some();
    let code = state.watcher.pump();
    if code.is_some() && !already_known {
        shared.notify_all();
    }
    code
}

impl Drop for ProcessHandle {
    /// Implicit drain-and-wait, so no threads or descriptors leak.
    fn drop(&mut self) {
        let _ = self.wait();
    }
}

fn parse_token(token: Option<Vec<u8>>) -> Option<f64> {
    let token = token?;
    std::str::from_utf8(&token).ok()?.parse().ok()
}

/// Iterator yielding successive line reads from one output stream.
///
/// Returned by [`ProcessHandle::lines`] and [`ProcessHandle::lines_err`].
/// Each `next` call blocks like [`ProcessHandle::read`]; iteration ends at
/// end of stream (or immediately if the stream was never captured).
#[derive(Debug)]
pub struct Lines<'a> {
    handle: &'a ProcessHandle,
    stream: OutputStream,
}

impl Iterator for Lines<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        self.handle
            .shared
            .read(self.stream, ReadRequest::Line)
            .ok()
            .flatten()
    }
}
