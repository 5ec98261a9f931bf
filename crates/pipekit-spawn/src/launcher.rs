//! Child process launch and thread wiring
//!
//! Turns a [`SpawnConfig`] into a running [`ProcessHandle`]: applies the
//! per-stream redirections, starts the child, hands each captured pipe half
//! to its dedicated stream thread, and registers the child with the exit
//! watcher.

use crate::channel::{InputChannel, OutputChannel};
use crate::config::{SpawnConfig, StreamSpec};
use crate::error::SpawnError;
use crate::process::ProcessHandle;
use crate::reader::spawn_reader;
use crate::shared::{OutputStream, ProcessState, Shared};
use crate::types::StreamId;
use crate::watcher::ExitWatcher;
use crate::writer::spawn_writer;
use std::fs::OpenOptions;
use std::process::Stdio;
use std::sync::Arc;
use tracing::debug;

/// Launch a child process.
///
/// Returns the handle on success. On failure nothing was created: no
/// process, no threads, no descriptors to release.
pub fn spawn(config: SpawnConfig) -> Result<ProcessHandle, SpawnError> {
    let program = config.program.to_string_lossy().to_string();
    let mut command = config.to_command();

    // Per-spawn descriptor mappings; a StreamSpec::Handle moves its file
    // into the command, so the config is consumed here.
    let SpawnConfig {
        stdin, stdout, stderr, ..
    } = config;
    command.stdin(stdio_for(stdin, StreamId::Stdin)?);
    command.stdout(stdio_for(stdout, StreamId::Stdout)?);
    command.stderr(stdio_for(stderr, StreamId::Stderr)?);

    let mut child = command.spawn().map_err(|err| SpawnError::SpawnFailed {
        program: program.clone(),
        reason: err.to_string(),
    })?;
    let pid = child.id();
    debug!(pid, %program, "spawned child process");

    let stdin_pipe = child.stdin.take();
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let shared = Arc::new(Shared::new(ProcessState {
        watcher: ExitWatcher::new(child),
        stdout: stdout_pipe.as_ref().map(|_| OutputChannel::default()),
        stderr: stderr_pipe.as_ref().map(|_| OutputChannel::default()),
        stdin: stdin_pipe.as_ref().map(|_| InputChannel::new()),
    }));

    let stdout_thread = match stdout_pipe {
        Some(pipe) => Some(
            spawn_reader(Arc::clone(&shared), OutputStream::Stdout, pipe)
                .map_err(|err| thread_error(&shared, &program, &err))?,
        ),
        None => None,
    };
    let stderr_thread = match stderr_pipe {
        Some(pipe) => Some(
            spawn_reader(Arc::clone(&shared), OutputStream::Stderr, pipe)
                .map_err(|err| thread_error(&shared, &program, &err))?,
        ),
        None => None,
    };
    let stdin_thread = match stdin_pipe {
        Some(pipe) => Some(
            spawn_writer(Arc::clone(&shared), pipe)
                .map_err(|err| thread_error(&shared, &program, &err))?,
        ),
        None => None,
    };

    Ok(ProcessHandle::new(
        shared,
        pid,
        stdout_thread,
        stderr_thread,
        stdin_thread,
    ))
}

/// A stream thread failed to start (OS resource exhaustion). The child is
/// already running; terminate it best-effort before reporting.
fn thread_error(shared: &Arc<Shared>, program: &str, err: &std::io::Error) -> SpawnError {
    shared.lock().watcher.kill();
    SpawnError::SpawnFailed {
        program: program.to_string(),
        reason: format!("failed to start stream thread: {err}"),
    }
}

fn stdio_for(spec: StreamSpec, stream: StreamId) -> Result<Stdio, SpawnError> {
    match spec {
        StreamSpec::Inherit => Ok(Stdio::inherit()),
        StreamSpec::Null => Ok(Stdio::null()),
        StreamSpec::Pipe => Ok(Stdio::piped()),
        StreamSpec::Handle(file) => Ok(Stdio::from(file)),
        StreamSpec::File { path, append, binary } => {
            // `binary` only matters on platforms with a text-mode
            // distinction; open flags are identical here.
            let _ = binary;
            let mut options = OpenOptions::new();
            if stream == StreamId::Stdin {
                options.read(true);
            } else if append {
                options.write(true).create(true).append(true);
            } else {
                options.write(true).create(true).truncate(true);
            }
            let file = options.open(&path).map_err(|err| SpawnError::Redirect {
                stream,
                path,
                reason: err.to_string(),
            })?;
            Ok(Stdio::from(file))
        }
    }
}
