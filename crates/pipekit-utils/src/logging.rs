//! Logging and observability bootstrap for pipekit
//!
//! Structured logging via tracing; stream threads and the launcher emit
//! events under the `pipekit` target family.

use std::io::IsTerminal;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Check if colored output should be used.
///
/// Returns true only if:
/// - stdout is a terminal (TTY)
/// - NO_COLOR environment variable is not set
#[must_use]
pub fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize tracing subscriber for structured logging.
///
/// Sets up tracing with either compact (default) or verbose format. The
/// verbose format includes targets and span close events, which is what you
/// want when watching the stream threads interleave.
///
/// # Arguments
/// * `verbose` - If true, use verbose format with structured fields
///
/// # Returns
/// Result indicating success or failure of initialization
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("pipekit=debug,info")
            } else {
                EnvFilter::try_new("pipekit=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(true)
                    .with_line_number(false)
                    .with_file(false)
                    .with_ansi(use_color())
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_ansi(use_color())
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent_failure() {
        // The first init in the process wins; later attempts must fail
        // gracefully rather than panic.
        let first = init_tracing(false);
        let second = init_tracing(true);
        assert!(first.is_ok() || second.is_err());
    }
}
