//! Read-request formats and their buffer predicates
//!
//! A read is posted as a request describing the shape of data wanted; the
//! reader thread keeps issuing blocking OS reads until the buffered data
//! satisfies it. The satisfiability check and the consume step are the same
//! scan, so the thread and the caller always agree on when a request is
//! complete.

use pipekit_utils::StreamBuffer;

/// Format descriptor for a pending read on an output channel.
///
/// At most one request may be outstanding per channel at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRequest {
    /// Up to the given number of bytes.
    Bytes(usize),
    /// A newline-terminated line. The newline is never part of the result
    /// and a single carriage return before it is stripped; at end of stream
    /// the remainder counts as the final line.
    Line,
    /// A whitespace-delimited token: leading whitespace is skipped, the
    /// run of non-whitespace bytes is returned. End of stream terminates an
    /// unfinished trailing token.
    Token,
    /// Everything until end of stream.
    All,
}

impl ReadRequest {
    /// True if the buffered data alone satisfies this request, with no
    /// further OS reads.
    ///
    /// End of stream satisfies every request; callers check that
    /// separately, this predicate only looks at bytes.
    #[must_use]
    pub fn satisfied_by(&self, buffer: &StreamBuffer) -> bool {
        match self {
            Self::Bytes(n) => buffer.len() >= *n,
            Self::Line => buffer.find_byte(b'\n', 0).is_some(),
            Self::Token => complete_token(buffer).is_some(),
            // Only end of stream completes a read-everything request.
            Self::All => false,
        }
    }

    /// Remove and return the prefix satisfying this request.
    ///
    /// Callers invoke this only once the request is satisfiable or the
    /// channel reached end of stream (`at_eof`). Returns `None` when the
    /// buffer holds nothing usable, which callers report as end of stream.
    pub fn take_from(&self, buffer: &mut StreamBuffer, at_eof: bool) -> Option<Vec<u8>> {
        if buffer.is_empty() {
            return None;
        }
        match self {
            Self::Bytes(n) => Some(buffer.consume_prefix(*n)),
            Self::Line => Some(take_line(buffer)),
            Self::Token => take_token(buffer, at_eof),
            Self::All => Some(buffer.take_all()),
        }
    }
}

/// Locate a completed token: the first non-whitespace run that is followed
/// by more data. Returns `(start, end)` byte positions.
///
/// A run still touching the end of the buffer is not complete; more bytes
/// may extend it.
fn complete_token(buffer: &StreamBuffer) -> Option<(usize, usize)> {
    let start = buffer.scan(0, |b| !b.is_ascii_whitespace())?;
    let end = buffer.scan(start, |b| b.is_ascii_whitespace())?;
    Some((start, end))
}

fn take_line(buffer: &mut StreamBuffer) -> Vec<u8> {
    match buffer.find_byte(b'\n', 0) {
        Some(newline) => {
            let mut line = buffer.consume_prefix(newline + 1);
            line.pop(); // the newline itself is never returned
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        }
        None => {
            // End of stream before a newline: the remainder is the line,
            // still minus a trailing carriage return.
            let mut line = buffer.take_all();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        }
    }
}

fn take_token(buffer: &mut StreamBuffer, at_eof: bool) -> Option<Vec<u8>> {
    let (start, end) = match complete_token(buffer) {
        Some(span) => span,
        // End of stream is an implicit token terminator.
        None if at_eof => {
            let start = buffer.scan(0, |b| !b.is_ascii_whitespace())?;
            (start, buffer.len())
        }
        None => return None,
    };
    buffer.consume_prefix(start);
    Some(buffer.consume_prefix(end - start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(data: &[u8]) -> StreamBuffer {
        let mut buffer = StreamBuffer::new();
        buffer.append(data);
        buffer
    }

    // ========================================================================
    // Satisfiability
    // ========================================================================

    #[test]
    fn test_bytes_satisfied_by_exact_count() {
        let buffer = buffer_with(b"abcde");
        assert!(ReadRequest::Bytes(5).satisfied_by(&buffer));
        assert!(ReadRequest::Bytes(3).satisfied_by(&buffer));
        assert!(!ReadRequest::Bytes(6).satisfied_by(&buffer));
    }

    #[test]
    fn test_line_satisfied_by_newline() {
        assert!(ReadRequest::Line.satisfied_by(&buffer_with(b"hi\nrest")));
        assert!(!ReadRequest::Line.satisfied_by(&buffer_with(b"no newline yet")));
    }

    #[test]
    fn test_token_needs_trailing_whitespace() {
        assert!(ReadRequest::Token.satisfied_by(&buffer_with(b"  42 rest")));
        // A run touching the buffer end may still grow
        assert!(!ReadRequest::Token.satisfied_by(&buffer_with(b"  42")));
        assert!(!ReadRequest::Token.satisfied_by(&buffer_with(b"   ")));
    }

    #[test]
    fn test_all_never_satisfied_by_bytes_alone() {
        assert!(!ReadRequest::All.satisfied_by(&buffer_with(b"plenty of data")));
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    #[test]
    fn test_take_line_strips_newline() {
        let mut buffer = buffer_with(b"hello\nworld\n");
        assert_eq!(
            ReadRequest::Line.take_from(&mut buffer, false),
            Some(b"hello".to_vec())
        );
        assert_eq!(
            ReadRequest::Line.take_from(&mut buffer, false),
            Some(b"world".to_vec())
        );
        assert_eq!(ReadRequest::Line.take_from(&mut buffer, true), None);
    }

    #[test]
    fn test_take_line_strips_carriage_return() {
        let mut buffer = buffer_with(b"hello\r\nrest");
        assert_eq!(
            ReadRequest::Line.take_from(&mut buffer, false),
            Some(b"hello".to_vec())
        );
        assert_eq!(buffer.to_string(), "rest");
    }

    #[test]
    fn test_take_line_at_eof_without_newline() {
        let mut buffer = buffer_with(b"partial\r");
        assert_eq!(
            ReadRequest::Line.take_from(&mut buffer, true),
            Some(b"partial".to_vec())
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_take_bytes_clamps_to_available() {
        let mut buffer = buffer_with(b"abc");
        assert_eq!(
            ReadRequest::Bytes(2).take_from(&mut buffer, false),
            Some(b"ab".to_vec())
        );
        assert_eq!(
            ReadRequest::Bytes(10).take_from(&mut buffer, true),
            Some(b"c".to_vec())
        );
    }

    #[test]
    fn test_take_token_leaves_remainder() {
        let mut buffer = buffer_with(b"  42 rest");
        assert_eq!(
            ReadRequest::Token.take_from(&mut buffer, false),
            Some(b"42".to_vec())
        );
        assert_eq!(buffer.to_string(), " rest");
    }

    #[test]
    fn test_take_token_at_eof_is_terminated() {
        let mut buffer = buffer_with(b"  42");
        assert_eq!(
            ReadRequest::Token.take_from(&mut buffer, true),
            Some(b"42".to_vec())
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_take_token_all_whitespace_is_end_of_stream() {
        let mut buffer = buffer_with(b"   \t ");
        assert_eq!(ReadRequest::Token.take_from(&mut buffer, true), None);
    }

    #[test]
    fn test_take_all_drains_buffer() {
        let mut buffer = buffer_with(b"everything left");
        assert_eq!(
            ReadRequest::All.take_from(&mut buffer, true),
            Some(b"everything left".to_vec())
        );
        assert_eq!(ReadRequest::All.take_from(&mut buffer, true), None);
    }

    #[test]
    fn test_empty_buffer_is_end_of_stream_for_every_format() {
        let mut buffer = StreamBuffer::new();
        for request in [
            ReadRequest::Bytes(4),
            ReadRequest::Line,
            ReadRequest::Token,
            ReadRequest::All,
        ] {
            assert_eq!(request.take_from(&mut buffer, true), None);
        }
    }
}
