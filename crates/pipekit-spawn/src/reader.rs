//! Background readers for captured output streams
//!
//! One thread per captured stream. The thread parks until the caller posts
//! a read request, then performs blocking OS reads until the buffered data
//! satisfies it, clears the request, and broadcasts. End of stream (or any
//! unrecoverable read error, folded into the same state) terminates the
//! thread; dropping the owned pipe half closes the descriptor.

use crate::shared::{OutputStream, Shared};
use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, trace};

/// Bytes requested from the OS per blocking read.
const READ_CHUNK: usize = 8192;

pub(crate) fn spawn_reader<R>(
    shared: Arc<Shared>,
    stream: OutputStream,
    pipe: R,
) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    std::thread::Builder::new()
        .name(format!("pipekit-{stream}"))
        .spawn(move || run_reader(&shared, stream, pipe))
}

fn run_reader<R: Read>(shared: &Shared, stream: OutputStream, mut pipe: R) {
    trace!(%stream, "reader thread started");
    loop {
        // Park until a request is posted. A request the buffer already
        // satisfies resolves without touching the OS.
        let request = {
            let mut state = shared.lock();
            loop {
                let Some(channel) = state.output_mut(stream) else {
                    return;
                };
                if let Some(request) = channel.request {
                    if request.satisfied_by(&channel.buffer) {
                        channel.request = None;
                        shared.notify_all();
                    } else {
                        break request;
                    }
                }
                state = shared.wait(state);
            }
        };

        // Blocking reads with the lock released; append and re-check after
        // every chunk.
        let mut chunk = [0u8; READ_CHUNK];
        let at_eof = loop {
            match pipe.read(&mut chunk) {
                Ok(0) => break true,
                Ok(n) => {
                    let mut state = shared.lock();
                    let Some(channel) = state.output_mut(stream) else {
                        return;
                    };
                    channel.buffer.append(&chunk[..n]);
                    if request.satisfied_by(&channel.buffer) {
                        channel.request = None;
                        shared.notify_all();
                        break false;
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(err) => {
                    debug!(%stream, %err, "read failed; treating as end of stream");
                    break true;
                }
            }
        };

        if at_eof {
            let mut state = shared.lock();
            if let Some(channel) = state.output_mut(stream) {
                channel.eof = true;
                channel.request = None;
                shared.notify_all();
            }
            trace!(%stream, "end of stream; reader thread exiting");
            return;
        }
    }
}
