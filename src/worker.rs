//! Argument handling for the `pg_worker` helper binary.
//!
//! The embedded `PostgreSQL` cluster used by the integration tests cannot run
//! as root, so privileged test runners delegate lifecycle operations to
//! `pg_worker`, which re-executes itself as an unprivileged user. The pure
//! parts of that hand-off live here so they can be unit tested.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Environment marker set on the re-executed worker process.
pub const WORKER_REEXEC_ENV: &str = "PG_WORKER_REEXEC";

/// Lifecycle operation requested from the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOperation {
    /// Install binaries and initialise the data directory.
    Setup,
    /// Start the server and leave it running.
    Start,
    /// Stop a running server.
    Stop,
}

impl LifecycleOperation {
    /// Returns the command-line spelling of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleOperation {
    type Err = WorkerArgsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "setup" => Ok(Self::Setup),
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(WorkerArgsError::UnknownOperation(other.to_owned())),
        }
    }
}

/// Errors raised while reading the worker command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerArgsError {
    /// No operation was given.
    #[error("missing operation argument")]
    MissingOperation,
    /// The operation is not one of `setup`, `start`, or `stop`.
    #[error("unknown operation '{0}'; expected setup, start, or stop")]
    UnknownOperation(String),
    /// No payload path was given.
    #[error("missing config path argument")]
    MissingConfigPath,
    /// More arguments than expected were given.
    #[error("unexpected extra argument: {0}")]
    UnexpectedArgument(String),
}

/// Parsed `pg_worker <operation> <config-path>` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInvocation {
    /// Requested lifecycle operation.
    pub operation: LifecycleOperation,
    /// Path to the JSON worker payload.
    pub config_path: String,
}

/// Parses the worker arguments, excluding the program name.
///
/// # Errors
///
/// Returns [`WorkerArgsError`] when an argument is missing, unknown, or
/// superfluous.
pub fn parse_worker_args<I>(args: I) -> Result<WorkerInvocation, WorkerArgsError>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let operation = args
        .next()
        .ok_or(WorkerArgsError::MissingOperation)?
        .parse::<LifecycleOperation>()?;
    let config_path = args.next().ok_or(WorkerArgsError::MissingConfigPath)?;
    if let Some(extra) = args.next() {
        return Err(WorkerArgsError::UnexpectedArgument(extra));
    }
    Ok(WorkerInvocation {
        operation,
        config_path,
    })
}

/// Escapes a value for safe inclusion in a POSIX shell command.
///
/// Wraps the value in single quotes and spells embedded quotes as `'\''`.
#[must_use]
pub fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

/// Builds the `sh -c` command that re-executes the worker with the
/// re-exec marker set.
#[must_use]
pub fn reexec_shell_command(exe: &str, args: &[&str]) -> String {
    let mut command = format!("{WORKER_REEXEC_ENV}=1 exec {}", shell_escape(exe));
    for arg in args {
        command.push(' ');
        command.push_str(&shell_escape(arg));
    }
    command
}
