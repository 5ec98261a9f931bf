//! Shared types for the process I/O surface

use std::fmt;

/// Identifies one of the three standard streams of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamId {
    /// The child's standard input.
    Stdin,
    /// The child's standard output.
    Stdout,
    /// The child's standard error.
    Stderr,
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stdin => "standard input",
            Self::Stdout => "standard output",
            Self::Stderr => "standard error",
        };
        write!(f, "{name}")
    }
}

/// Result of a non-blocking status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// The child has not terminated yet.
    Running,
    /// The child terminated with the given exit code.
    ///
    /// Normal exits report the process exit code. On Unix a signal death
    /// reports `128 + signal`; on other platforms a codeless termination
    /// reports `-1`.
    Exited(i32),
}

impl ProcessStatus {
    /// Check if the child is still running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Get the exit code, if the child has terminated.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Running => None,
            Self::Exited(code) => Some(*code),
        }
    }

    /// Check if the child terminated successfully (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

/// One non-blocking snapshot of I/O readiness across the requested
/// channels plus termination state.
///
/// Per-channel flags are present iff they were requested; a flag is `true`
/// when the corresponding background thread has no work in flight. Channels
/// that were never captured report idle.
#[derive(Debug, Clone, Copy)]
pub struct IoReadiness {
    /// Standard input writer is idle (and the child is still running).
    pub stdin_idle: Option<bool>,
    /// Standard output reader has no unsatisfied request.
    pub stdout_idle: Option<bool>,
    /// Standard error reader has no unsatisfied request.
    pub stderr_idle: Option<bool>,
    /// The child has terminated and been reaped.
    pub finished: bool,
}

/// Everything `wait` gathers: the exit code plus whatever was left on the
/// captured output streams after the final drain.
#[derive(Debug, Clone)]
pub struct WaitOutcome {
    /// Exit code of the child (see [`ProcessStatus::Exited`] for the
    /// signal-death mapping).
    pub exit_code: i32,
    /// Remaining standard output, if that stream was captured.
    pub stdout: Option<Vec<u8>>,
    /// Remaining standard error, if that stream was captured.
    pub stderr: Option<Vec<u8>>,
}

impl WaitOutcome {
    /// Check if the child exited successfully (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get remaining stdout as a UTF-8 string, lossy conversion.
    #[must_use]
    pub fn stdout_string(&self) -> String {
        match &self.stdout {
            Some(bytes) => String::from_utf8_lossy(bytes).to_string(),
            None => String::new(),
        }
    }

    /// Get remaining stderr as a UTF-8 string, lossy conversion.
    #[must_use]
    pub fn stderr_string(&self) -> String {
        match &self.stderr {
            Some(bytes) => String::from_utf8_lossy(bytes).to_string(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_display() {
        assert_eq!(StreamId::Stdin.to_string(), "standard input");
        assert_eq!(StreamId::Stdout.to_string(), "standard output");
        assert_eq!(StreamId::Stderr.to_string(), "standard error");
    }

    #[test]
    fn test_process_status_accessors() {
        assert!(ProcessStatus::Running.is_running());
        assert_eq!(ProcessStatus::Running.code(), None);
        assert!(!ProcessStatus::Running.success());

        let exited = ProcessStatus::Exited(0);
        assert!(!exited.is_running());
        assert_eq!(exited.code(), Some(0));
        assert!(exited.success());

        assert!(!ProcessStatus::Exited(7).success());
    }

    #[test]
    fn test_wait_outcome_strings() {
        let outcome = WaitOutcome {
            exit_code: 0,
            stdout: Some(b"out".to_vec()),
            stderr: None,
        };
        assert!(outcome.success());
        assert_eq!(outcome.stdout_string(), "out");
        assert_eq!(outcome.stderr_string(), "");
    }
}
