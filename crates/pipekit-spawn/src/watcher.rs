//! Child termination detection and reaping
//!
//! The watcher owns the OS child handle until the exit status has been
//! collected. Polling is non-blocking; the blocking "wait for exit" form is
//! built by the process handle as a pump-plus-timed-wait loop, so no
//! dedicated watcher thread is needed.

use std::process::{Child, ExitStatus};
use tracing::{debug, warn};

#[derive(Debug)]
pub(crate) struct ExitWatcher {
    /// Present until the child is reaped; dropped at that point so a
    /// reaped process id is never signaled or waited on again.
    child: Option<Child>,
    /// Set exactly once, under the handle lock, by `pump`.
    exit_code: Option<i32>,
}

impl ExitWatcher {
    pub fn new(child: Child) -> Self {
        Self {
            child: Some(child),
            exit_code: None,
        }
    }

    /// Non-blocking poll: reap the child if it has terminated and record
    /// its exit code. Returns the exit code once known.
    pub fn pump(&mut self) -> Option<i32> {
        if self.exit_code.is_none() {
            if let Some(child) = self.child.as_mut() {
                match child.try_wait() {
                    Ok(Some(status)) => {
                        let code = exit_code_of(status);
                        debug!(code, "child process reaped");
                        self.exit_code = Some(code);
                        self.child = None;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(%err, "child status poll failed; treating as terminated");
                        self.exit_code = Some(-1);
                        self.child = None;
                    }
                }
            }
        }
        self.exit_code
    }

    /// The recorded exit code, without polling.
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Request termination with the default signal (SIGTERM on Unix).
    /// Returns false once the child has been reaped.
    pub fn kill(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => {
                #[cfg(unix)]
                {
                    send_signal(child.id(), nix::sys::signal::Signal::SIGTERM)
                }
                #[cfg(not(unix))]
                {
                    child.kill().is_ok()
                }
            }
            None => false,
        }
    }

    /// Request termination with an explicit signal number. Returns false
    /// for unknown signals or once the child has been reaped.
    #[cfg(unix)]
    pub fn kill_with(&mut self, signal: i32) -> bool {
        match self.child.as_ref() {
            Some(child) => match nix::sys::signal::Signal::try_from(signal) {
                Ok(signal) => send_signal(child.id(), signal),
                Err(_) => false,
            },
            None => false,
        }
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: nix::sys::signal::Signal) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let pid = Pid::from_raw(pid as i32);
    kill(pid, signal).is_ok()
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            // Shell convention for signal deaths
            return 128 + signal;
        }
    }
    -1
}
