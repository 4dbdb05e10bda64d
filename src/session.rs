//! Interactive session manager.
//!
//! Owns the single live child process (a running simulation). The state
//! machine is IDLE → RUNNING → IDLE: `start` fails with `AlreadyRunning`
//! while a session exists, `send_line` fails with `NoActiveSession` while
//! idle. The child handle lives in a shared slot so pipelines running on
//! background threads can start sessions and `terminate` can be called from
//! the UI while readers are mid-stream.
//!
//! Output never reaches the caller directly: two reader threads push the
//! process's stdout and stderr lines to the relay, and a monitor thread
//! reaps the child after both streams close, pushing one final sentinel
//! line with the exit code.

use std::io::Write;
use std::process::{Child, ChildStdin};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::{Result, VerikitError};
use crate::invocation::Invocation;
use crate::relay::{spawn_line_reader, RelaySender};
use crate::runner;

#[derive(Clone, Default)]
pub struct SessionManager {
    child: Arc<Mutex<Option<Child>>>,
    stdin: Arc<Mutex<Option<ChildStdin>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a session process occupies the slot.
    pub fn is_running(&self) -> bool {
        self.child
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Starts an interactive session for `invocation`.
    ///
    /// Fails with [`VerikitError::AlreadyRunning`] if a session is live; a
    /// second simulation never silently replaces the first.
    pub fn start(&self, invocation: &Invocation, relay: &RelaySender) -> Result<()> {
        let mut slot = self
            .child
            .lock()
            .map_err(|e| VerikitError::Session(format!("session lock poisoned: {e}")))?;
        if slot.is_some() {
            return Err(VerikitError::AlreadyRunning);
        }

        let mut child = runner::spawn_interactive(invocation)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VerikitError::Session("stdout pipe was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| VerikitError::Session("stderr pipe was not captured".into()))?;
        let stdin_pipe = child
            .stdin
            .take()
            .ok_or_else(|| VerikitError::Session("stdin pipe was not captured".into()))?;

        let out_reader = spawn_line_reader(stdout, relay.clone());
        let err_reader = spawn_line_reader(stderr, relay.clone());

        *slot = Some(child);
        drop(slot);
        if let Ok(mut stdin_slot) = self.stdin.lock() {
            *stdin_slot = Some(stdin_pipe);
        }

        // Monitor: once both streams hit EOF, reap the child and push the
        // exit sentinel so the log always shows how the session ended.
        let child_slot = Arc::clone(&self.child);
        let stdin_slot = Arc::clone(&self.stdin);
        let sender = relay.clone();
        thread::spawn(move || {
            let _ = out_reader.join();
            let _ = err_reader.join();
            if let Ok(mut guard) = stdin_slot.lock() {
                guard.take();
            }
            let reaped = child_slot.lock().ok().and_then(|mut guard| guard.take());
            match reaped {
                Some(mut child) => match child.wait() {
                    Ok(status) => sender.push(format!(
                        "[simulation exited with code {}]",
                        status.code().unwrap_or(-1)
                    )),
                    Err(e) => sender.push(format!("[simulation wait failed: {e}]")),
                },
                // terminate() already took and reaped the child
                None => sender.push("[simulation terminated]".to_string()),
            }
        });

        Ok(())
    }

    /// Writes `text` plus a newline to the live session's stdin and flushes
    /// immediately so the simulation sees it without buffering delay.
    pub fn send_line(&self, text: &str) -> Result<()> {
        let mut guard = self
            .stdin
            .lock()
            .map_err(|e| VerikitError::Session(format!("stdin lock poisoned: {e}")))?;
        let stdin = guard.as_mut().ok_or(VerikitError::NoActiveSession)?;
        writeln!(stdin, "{text}")
            .map_err(|e| VerikitError::Session(format!("failed to write to simulation: {e}")))?;
        stdin
            .flush()
            .map_err(|e| VerikitError::Session(format!("failed to flush simulation stdin: {e}")))?;
        Ok(())
    }

    /// Kills the live session, if any, and forces the state back to IDLE.
    ///
    /// Returns `Ok(true)` if a process was killed, `Ok(false)` if the
    /// manager was already idle. Safe to call repeatedly.
    pub fn terminate(&self) -> Result<bool> {
        let mut guard = self
            .child
            .lock()
            .map_err(|e| VerikitError::Session(format!("session lock poisoned: {e}")))?;
        if let Some(mut child) = guard.take() {
            if let Err(e) = child.kill() {
                // The process may have exited between take() and kill().
                if e.kind() != std::io::ErrorKind::InvalidInput {
                    return Err(VerikitError::Session(format!(
                        "failed to kill simulation: {e}"
                    )));
                }
            }
            // Reap to avoid a zombie; the monitor thread will find the slot
            // empty and push the terminated sentinel.
            let _ = child.wait();
            if let Ok(mut stdin_guard) = self.stdin.lock() {
                stdin_guard.take();
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
