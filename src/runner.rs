//! Command runner: spawns external EDA tools and reports their outcome.
//!
//! Blocking invocations go through [`run`] (or [`run_streamed`] when the
//! caller wants a liveness tick for a spinner). Interactive invocations are
//! spawned with [`spawn_interactive`] and wrapped into a session by
//! [`crate::session::SessionManager`]. The waveform viewer is launched with
//! [`spawn_detached`] and never tracked.
//!
//! A non-zero exit code is returned as data in [`CommandResult`]; only a
//! failure to launch the process at all (missing executable, permission
//! denied) surfaces as [`VerikitError::Launch`].

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use crate::error::{Result, VerikitError};
use crate::invocation::{CaptureMode, CommandResult, Invocation};

/// Interval between liveness ticks while a streamed invocation runs.
const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn launch_error(invocation: &Invocation, source: std::io::Error) -> VerikitError {
    VerikitError::Launch {
        program: invocation.program().to_string(),
        source,
    }
}

fn base_command(invocation: &Invocation) -> Command {
    let mut cmd = Command::new(invocation.program());
    cmd.args(invocation.arg_list());
    cmd.current_dir(invocation.cwd());
    cmd
}

fn exit_code(status: std::process::ExitStatus) -> i32 {
    // Terminated-by-signal has no code; report -1 so callers still see failure.
    status.code().unwrap_or(-1)
}

/// Runs a blocking invocation to completion.
///
/// `Silent` suppresses all output, `Streamed` captures stderr only (with no
/// liveness tick; use [`run_streamed`] for that), `Captured` captures both
/// streams. `Interactive` invocations are rejected here; they must go
/// through [`spawn_interactive`].
pub fn run(invocation: &Invocation) -> Result<CommandResult> {
    match invocation.mode() {
        CaptureMode::Silent => {
            let status = base_command(invocation)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map_err(|e| launch_error(invocation, e))?;
            Ok(CommandResult {
                exit_code: exit_code(status),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
        CaptureMode::Streamed => run_streamed(invocation, || {}),
        CaptureMode::Interactive => Err(VerikitError::Session(
            "interactive invocations must be spawned, not run to completion".into(),
        )),
        CaptureMode::Captured => {
            let output = base_command(invocation)
                .stdin(Stdio::null())
                .output()
                .map_err(|e| launch_error(invocation, e))?;
            Ok(CommandResult {
                exit_code: exit_code(output.status),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }
}

/// Runs a streamed invocation, calling `on_tick` roughly every 100 ms while
/// the process is still alive so the caller can render a liveness indicator
/// without seeing content. Stdout is discarded; stderr is captured.
pub fn run_streamed(invocation: &Invocation, mut on_tick: impl FnMut()) -> Result<CommandResult> {
    let mut child = base_command(invocation)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| launch_error(invocation, e))?;

    // Drain stderr on a thread so the pipe never fills and blocks the child.
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| VerikitError::Session("stderr pipe was not captured".into()))?;
    let stderr_reader = thread::spawn(move || {
        let mut buf = String::new();
        let _ = stderr_pipe.read_to_string(&mut buf);
        buf
    });

    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                on_tick();
                thread::sleep(STREAM_POLL_INTERVAL);
            }
        }
    };

    let stderr = stderr_reader.join().unwrap_or_default();
    Ok(CommandResult {
        exit_code: exit_code(status),
        stdout: String::new(),
        stderr,
    })
}

/// Spawns an interactive invocation with stdin, stdout and stderr piped,
/// returning immediately with the live child handle.
pub fn spawn_interactive(invocation: &Invocation) -> Result<Child> {
    base_command(invocation)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| launch_error(invocation, e))
}

/// Fire-and-forget spawn for tools whose lifecycle we do not track (the
/// waveform viewer). No handle is retained and no output is captured.
pub fn spawn_detached(invocation: &Invocation) -> Result<()> {
    base_command(invocation)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| launch_error(invocation, e))?;
    Ok(())
}
