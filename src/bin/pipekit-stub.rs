//! Stub child process for integration testing
//!
//! This binary stands in for an arbitrary external program so the process
//! I/O tests have a controllable counterpart: it can echo its input, emit
//! known payloads on either stream, stay silent, or hang until killed,
//! and it exits with a requested code.

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    let matches = Command::new("pipekit-stub")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stub child process for pipekit testing")
        .arg(
            Arg::new("scenario")
                .long("scenario")
                .value_name("SCENARIO")
                .help("Behavior to simulate (echo, tokens, silent, hang, split, env)")
                .default_value("echo"),
        )
        .arg(
            Arg::new("exit-code")
                .long("exit-code")
                .value_name("N")
                .help("Exit code to terminate with")
                .value_parser(clap::value_parser!(i32))
                .default_value("0"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress the echoed output (echo scenario consumes input only)")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let scenario = matches.get_one::<String>("scenario").expect("has default");
    let exit_code = *matches.get_one::<i32>("exit-code").expect("has default");

    let quiet = matches.get_flag("quiet");

    match scenario.as_str() {
        "tokens" => run_tokens()?,
        "silent" => {}
        "hang" => run_hang(),
        "split" => run_split()?,
        "env" => run_env()?,
        _ => run_echo(quiet)?,
    }

    std::process::exit(exit_code);
}

/// Echo stdin to stdout line by line, flushing after each line so an
/// interactive peer sees responses immediately. A trailing fragment with
/// no newline is echoed with one appended. Ends at end of input.
fn run_echo(quiet: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().split(b'\n') {
        let line = line?;
        if quiet {
            continue;
        }
        stdout.write_all(&line)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
    }
    Ok(())
}

/// Emit a small token payload for format-aware read tests.
fn run_tokens() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(b"  42 rest\n")?;
    stdout.flush()?;
    Ok(())
}

/// Produce nothing and never exit; the test kills this one.
fn run_hang() -> ! {
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

/// Write known payloads to both streams.
fn run_split() -> Result<()> {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    stdout.write_all(b"out-1\nout-2\n")?;
    stdout.flush()?;
    stderr.write_all(b"err-1\n")?;
    stderr.flush()?;
    Ok(())
}

/// Print the value of PIPEKIT_STUB_VAR, or "unset".
fn run_env() -> Result<()> {
    let value = std::env::var("PIPEKIT_STUB_VAR").unwrap_or_else(|_| "unset".to_string());
    let mut stdout = io::stdout();
    stdout.write_all(value.as_bytes())?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(())
}
