//! Error types for spawning and process I/O

use crate::types::StreamId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported synchronously while launching a child process.
///
/// When launching fails no process handle is created and no background
/// threads exist.
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("invalid command line: {reason}")]
    CommandLine { reason: String },

    #[error("no command specified")]
    EmptyCommand,

    #[error("can't open {stream} redirect {}: {reason}", path.display())]
    Redirect {
        stream: StreamId,
        path: PathBuf,
        reason: String,
    },

    #[error("failed to spawn process '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },
}

/// Errors reported by process-handle operations after a successful spawn.
///
/// Background-thread I/O failures never surface here: read errors fold into
/// end-of-stream and write errors poison the input channel, observed as
/// [`ProcessError::InputClosed`] on the next write.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{stream} channel not open")]
    ChannelNotOpen { stream: StreamId },

    #[error("input channel closed")]
    InputClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_messages() {
        let err = SpawnError::SpawnFailed {
            program: "cat".to_string(),
            reason: "no such file".to_string(),
        };
        assert_eq!(err.to_string(), "failed to spawn process 'cat': no such file");

        let err = SpawnError::Redirect {
            stream: StreamId::Stdout,
            path: PathBuf::from("/nope/out.log"),
            reason: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("standard output"));
        assert!(err.to_string().contains("/nope/out.log"));
    }

    #[test]
    fn test_process_error_messages() {
        let err = ProcessError::ChannelNotOpen {
            stream: StreamId::Stderr,
        };
        assert_eq!(err.to_string(), "standard error channel not open");
        assert_eq!(ProcessError::InputClosed.to_string(), "input channel closed");
    }
}
