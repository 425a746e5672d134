//! Subprocess harness: launch a scenario's simulator command, capture its
//! standard output, and hand interrupts through to the child.
//!
//! The child's stdout is drained concurrently with the wait so a chatty
//! simulation never blocks on a full pipe; evaluation happens only after
//! the process has terminated. A Ctrl-C during the wait is forwarded to the
//! child as an interrupt, the child is awaited, and the condition surfaces
//! to the caller so the remaining scenarios are skipped.

use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

/// Failures that escape a scenario run as control flow.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The simulator could not be launched at all.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// I/O failure while capturing output.
    #[error("io while capturing simulator output: {0}")]
    Io(#[from] std::io::Error),
    /// The user interrupted the run; the child has already been awaited.
    #[error("interrupted")]
    Interrupted,
}

/// Captured result of one completed simulator run.
#[derive(Debug)]
pub struct Capture {
    /// Full standard output, decoded lossily as UTF-8.
    pub output: String,
    pub status: ExitStatus,
}

#[cfg(unix)]
fn forward_interrupt(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    if let Some(pid) = child.id() {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGINT);
    }
}

#[cfg(not(unix))]
fn forward_interrupt(child: &mut Child) {
    let _ = child.start_kill();
}

/// Run one scenario command to completion and capture its stdout.
pub async fn capture_output(command: &[String]) -> Result<Capture, HarnessError> {
    let Some((program, args)) = command.split_first() else {
        return Err(HarnessError::Spawn {
            program: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };

    tracing::debug!(%program, ?args, "launching simulator");
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|source| HarnessError::Spawn {
            program: program.clone(),
            source,
        })?;

    // stdout is piped above, so take() always yields a handle.
    let mut stdout = match child.stdout.take() {
        Some(stdout) => stdout,
        None => {
            return Err(HarnessError::Io(std::io::Error::other(
                "child stdout unavailable",
            )))
        }
    };
    let reader = tokio::task::spawn(async move {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf).await;
        buf
    });

    let status = tokio::select! {
        status = child.wait() => status?,
        _ = tokio::signal::ctrl_c() => {
            forward_interrupt(&mut child);
            let _ = child.wait().await;
            reader.abort();
            return Err(HarnessError::Interrupted);
        }
    };

    let buf = reader.await.unwrap_or_default();
    Ok(Capture {
        output: String::from_utf8_lossy(&buf).into_owned(),
        status,
    })
}
