//! Background writer for the child's standard input
//!
//! Flushes queued buffers to the input descriptor in order, one at a time.
//! An unrecoverable write error poisons the channel; the close sentinel
//! closes the descriptor and ends the thread. The descriptor closes when
//! the owned pipe half is dropped on thread exit.

use crate::shared::Shared;
use std::io::Write;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, trace};

enum Job {
    Flush(Vec<u8>),
    Close,
}

pub(crate) fn spawn_writer<W>(shared: Arc<Shared>, pipe: W) -> std::io::Result<JoinHandle<()>>
where
    W: Write + Send + 'static,
{
    std::thread::Builder::new()
        .name("pipekit-stdin".to_string())
        .spawn(move || run_writer(&shared, pipe))
}

fn run_writer<W: Write>(shared: &Shared, mut pipe: W) {
    trace!("writer thread started");
    loop {
        let job = {
            let mut state = shared.lock();
            loop {
                let Some(channel) = state.stdin.as_mut() else {
                    return;
                };
                if let Some(buffer) = channel.pending.take() {
                    channel.in_flight = true;
                    break Job::Flush(buffer);
                }
                if channel.close_requested {
                    break Job::Close;
                }
                state = shared.wait(state);
            }
        };

        match job {
            Job::Close => {
                let mut state = shared.lock();
                if let Some(channel) = state.stdin.as_mut() {
                    channel.closed = true;
                }
                shared.notify_all();
                trace!("input closed; writer thread exiting");
                return;
            }
            Job::Flush(buffer) => {
                // write_all retries partial writes and interrupted calls
                let result = pipe.write_all(&buffer).and_then(|()| pipe.flush());
                let mut state = shared.lock();
                if let Some(channel) = state.stdin.as_mut() {
                    channel.in_flight = false;
                    if let Err(err) = result {
                        debug!(%err, "write failed; poisoning input channel");
                        channel.closed = true;
                        shared.notify_all();
                        return;
                    }
                }
                shared.notify_all();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::InputChannel;
    use crate::error::ProcessError;
    use crate::shared::ProcessState;
    use crate::watcher::ExitWatcher;
    use std::sync::Mutex;

    /// Write double appending into shared storage, or failing on demand.
    struct ScriptedSink {
        written: Arc<Mutex<Vec<u8>>>,
        fail: bool,
    }

    impl Write for ScriptedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.fail {
                return Err(std::io::ErrorKind::BrokenPipe.into());
            }
            self.written
                .lock()
                .expect("sink lock")
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn sink_setup(fail: bool) -> (Arc<Shared>, Arc<Mutex<Vec<u8>>>, JoinHandle<()>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = ScriptedSink {
            written: Arc::clone(&written),
            fail,
        };
        let child = std::process::Command::new("sleep")
            .arg("0")
            .spawn()
            .expect("spawn sleep 0");
        let shared = Arc::new(Shared::new(ProcessState {
            watcher: ExitWatcher::new(child),
            stdout: None,
            stderr: None,
            stdin: Some(InputChannel::new()),
        }));
        let handle = spawn_writer(Arc::clone(&shared), sink).expect("spawn writer");
        (shared, written, handle)
    }

    #[test]
    fn test_writes_flush_in_order() {
        let (shared, written, handle) = sink_setup(false);

        shared.write(b"A").unwrap();
        shared.write(b"B").unwrap();
        shared.write(b"C").unwrap();
        shared.request_input_close();
        handle.join().unwrap();

        assert_eq!(written.lock().unwrap().as_slice(), b"ABC");
    }

    #[test]
    fn test_empty_write_is_noop() {
        let (shared, written, handle) = sink_setup(false);

        shared.write(b"").unwrap();
        shared.write(b"data").unwrap();
        shared.request_input_close();
        handle.join().unwrap();

        assert_eq!(written.lock().unwrap().as_slice(), b"data");
    }

    #[test]
    fn test_write_error_poisons_channel() {
        let (shared, written, handle) = sink_setup(true);

        shared.write(b"doomed").unwrap();
        handle.join().unwrap();

        assert!(matches!(
            shared.write(b"more"),
            Err(ProcessError::InputClosed)
        ));
        // A closed channel still reports write-ready so polls terminate
        assert!(shared.write_ready().unwrap());
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let (shared, _written, handle) = sink_setup(false);

        shared.request_input_close();
        shared.request_input_close();
        handle.join().unwrap();
        assert!(matches!(
            shared.write(b"late"),
            Err(ProcessError::InputClosed)
        ));
    }
}
