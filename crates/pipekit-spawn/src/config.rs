//! Spawn configuration
//!
//! Describes the command, environment, and per-stream redirections of a
//! child process. Redirections are explicit descriptor mappings applied at
//! spawn time; no global descriptor state is ever mutated, so concurrent
//! spawns cannot leak each other's redirections.

use crate::error::SpawnError;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Redirection for one standard stream of the child.
#[derive(Debug)]
pub enum StreamSpec {
    /// Inherit the parent's descriptor.
    Inherit,
    /// Connect to the null device.
    Null,
    /// Capture through a pipe serviced by a background stream thread.
    Pipe,
    /// Open the named file. Output streams append when `append` is set and
    /// truncate otherwise. `binary` only matters on platforms that
    /// distinguish text mode; it is ignored on Unix.
    File {
        path: PathBuf,
        append: bool,
        binary: bool,
    },
    /// Use an already-open descriptor.
    Handle(File),
}

impl StreamSpec {
    /// Redirect to the named file: read mode for input, append mode for
    /// output.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            append: true,
            binary: false,
        }
    }
}

/// Specification for a child process to launch.
///
/// Built with chained methods; consumed by [`spawn`](crate::spawn).
///
/// # Defaults
///
/// Standard input defaults to the null device, standard output to a pipe,
/// and standard error to inheritance — spawning with the defaults captures
/// the child's output and nothing else.
///
/// # Example
///
/// ```rust,no_run
/// use pipekit_spawn::{spawn, SpawnConfig, StreamSpec};
///
/// let config = SpawnConfig::new("sort")
///     .arg("-n")
///     .stdin(StreamSpec::Pipe)
///     .cwd("/tmp");
/// let handle = spawn(config).unwrap();
/// ```
#[derive(Debug)]
pub struct SpawnConfig {
    /// The program to execute.
    pub program: OsString,
    /// Arguments as discrete elements, never a shell string.
    pub args: Vec<OsString>,
    /// Displayed process name override (argv\[0\]). Unix only; ignored
    /// elsewhere.
    pub argv0: Option<OsString>,
    /// Environment for the child. When present it REPLACES the inherited
    /// environment: only the listed variables are set.
    pub env: Option<HashMap<OsString, OsString>>,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Resolve a bare program name through the system search path. When
    /// disabled, a bare name resolves against the working directory.
    pub search_path: bool,
    /// Redirection for the child's standard input.
    pub stdin: StreamSpec,
    /// Redirection for the child's standard output.
    pub stdout: StreamSpec,
    /// Redirection for the child's standard error.
    pub stderr: StreamSpec,
}

impl SpawnConfig {
    /// Create a configuration for the given program with default
    /// redirections.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            argv0: None,
            env: None,
            cwd: None,
            search_path: true,
            stdin: StreamSpec::Null,
            stdout: StreamSpec::Pipe,
            stderr: StreamSpec::Inherit,
        }
    }

    /// Create a configuration by parsing a command line into words.
    ///
    /// Parsing follows shell quoting rules but performs no expansion and
    /// never invokes a shell.
    pub fn shell(command_line: &str) -> Result<Self, SpawnError> {
        let mut words = shell_words::split(command_line)
            .map_err(|err| SpawnError::CommandLine {
                reason: err.to_string(),
            })?;
        if words.is_empty() {
            return Err(SpawnError::EmptyCommand);
        }
        let program = words.remove(0);
        Ok(Self::new(program).args(words))
    }

    /// Add a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Override the displayed process name (argv\[0\]) while executing
    /// `program`. Unix only; ignored elsewhere.
    #[must_use]
    pub fn argv0(mut self, name: impl Into<OsString>) -> Self {
        self.argv0 = Some(name.into());
        self
    }

    /// Set an environment variable for the child. The first call switches
    /// the child to a replacement environment containing only the
    /// variables set here.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set multiple environment variables for the child; same replacement
    /// semantics as [`env`](Self::env).
    #[must_use]
    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let env_map = self.env.get_or_insert_with(HashMap::new);
        for (key, value) in envs {
            env_map.insert(key.into(), value.into());
        }
        self
    }

    /// Set the working directory for the child.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Enable or disable search-path resolution of a bare program name.
    #[must_use]
    pub fn search_path(mut self, search: bool) -> Self {
        self.search_path = search;
        self
    }

    /// Set the redirection for standard input.
    #[must_use]
    pub fn stdin(mut self, spec: StreamSpec) -> Self {
        self.stdin = spec;
        self
    }

    /// Set the redirection for standard output.
    #[must_use]
    pub fn stdout(mut self, spec: StreamSpec) -> Self {
        self.stdout = spec;
        self
    }

    /// Set the redirection for standard error.
    #[must_use]
    pub fn stderr(mut self, spec: StreamSpec) -> Self {
        self.stderr = spec;
        self
    }

    /// Build the `Command` for this configuration: program resolution,
    /// arguments, environment replacement, working directory, and the
    /// argv\[0\] override. Stream redirections are wired by the launcher.
    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(self.resolved_program());
        command.args(&self.args);

        if let Some(env) = &self.env {
            command.env_clear();
            command.envs(env);
        }

        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        #[cfg(unix)]
        if let Some(argv0) = &self.argv0 {
            use std::os::unix::process::CommandExt;
            command.arg0(argv0);
        }

        command
    }

    /// With path search disabled, a bare program name resolves against the
    /// working directory rather than the system search path.
    fn resolved_program(&self) -> OsString {
        if self.search_path {
            return self.program.clone();
        }
        let program = Path::new(&self.program);
        if program.components().count() > 1 || program.is_absolute() {
            self.program.clone()
        } else {
            Path::new(".").join(program).into_os_string()
        }
    }
}
