//! Adapters for the external executables the stages shell out to.
//!
//! - `nm`: symbol-table listing for the size report.
//! - `gcovr`: coverage aggregation, reports, and the threshold gate.
//!
//! Both go through [`run_tool`], which bounds each invocation by an optional
//! timeout and kills the child when it is exceeded.

pub mod gcovr;
pub mod nm;

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

pub use gcovr::GcovrTool;
pub use nm::NmSymbolLister;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("No program configured for {0}")]
    EmptyCommand(&'static str),
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed while waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} did not finish within {timeout:?} and was killed")]
    TimedOut { program: String, timeout: Duration },
}

/// Exit information and (optionally) captured stdout of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout; empty when stdout was inherited.
    pub stdout: String,
}

impl ToolRun {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Where a tool's stdout goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stdout {
    /// Straight to our stdout (the build log).
    Inherit,
    /// Collected into [`ToolRun::stdout`].
    Capture,
    /// Forwarded to our stderr, keeping stdout free for machine-readable output.
    Stderr,
}

/// Run `argv` (program followed by its leading arguments) with `args` appended.
pub fn run_tool(
    argv: &[String],
    args: &[String],
    stdout: Stdout,
    timeout: Option<Duration>,
    label: &'static str,
) -> Result<ToolRun, ToolError> {
    let (program, prefix) = argv.split_first().ok_or(ToolError::EmptyCommand(label))?;

    let mut cmd = Command::new(program);
    cmd.args(prefix).args(args).stdin(Stdio::null());
    match stdout {
        Stdout::Inherit => cmd.stdout(Stdio::inherit()),
        Stdout::Capture => cmd.stdout(Stdio::piped()),
        Stdout::Stderr => cmd.stdout(Stdio::from(std::io::stderr())),
    };

    tracing::debug!(program = %program, ?args, "spawning {label}");
    let mut child = cmd
        .spawn()
        .map_err(|source| ToolError::Spawn { program: program.clone(), source })?;

    // Drain stdout on a separate thread so a chatty tool cannot block on a full pipe.
    let reader_label = program.clone();
    let reader = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(err) = out.read_to_end(&mut buf) {
                tracing::warn!(
                    program = %reader_label,
                    error = %err,
                    captured = buf.len(),
                    "failed reading tool stdout; output may be truncated"
                );
            }
            buf
        })
    });

    let status = match timeout {
        None => child.wait().map_err(|source| ToolError::Wait { program: program.clone(), source })?,
        Some(limit) => {
            let started = Instant::now();
            loop {
                match child.try_wait() {
                    Ok(Some(status)) => break status,
                    Ok(None) if started.elapsed() >= limit => {
                        let _ = child.kill();
                        let _ = child.wait();
                        // The reader thread is left detached; a grandchild may still hold the pipe.
                        tracing::warn!(program = %program, ?limit, "{label} timed out");
                        return Err(ToolError::TimedOut { program: program.clone(), timeout: limit });
                    }
                    Ok(None) => thread::sleep(POLL_INTERVAL),
                    Err(source) => {
                        return Err(ToolError::Wait { program: program.clone(), source });
                    }
                }
            }
        }
    };

    let stdout = reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();

    tracing::debug!(program = %program, code = ?status.code(), "{label} exited");
    Ok(ToolRun { exit_code: status.code(), stdout })
}

/// Render a threshold the way the tools expect it on the command line (`80`, `72.5`).
pub(crate) fn format_percent(value: f64) -> String {
    format!("{value}")
}
