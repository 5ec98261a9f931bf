//! Foundation utilities for pipekit
//!
//! Hosts the pieces shared across the workspace: the stream capture buffer
//! and the tracing bootstrap.

pub mod logging;
pub mod stream_buffer;

pub use stream_buffer::StreamBuffer;
