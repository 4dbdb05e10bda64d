//! External-process launch requests.
//!
//! An [`Invocation`] describes a single external tool launch: the command
//! tokens, the working directory it runs in, and how its stdio is captured.
//! Invocations are immutable once built and consumed by [`crate::runner`].

use std::path::{Path, PathBuf};

/// How an invocation's stdio is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Suppress all output; only the exit code is reported. Used for
    /// non-critical setup commands where failure is tolerated.
    Silent,
    /// Discard stdout, capture stderr, block until completion. The runner
    /// exposes a coarse liveness tick so the caller can render a spinner.
    Streamed,
    /// Capture both stdout and stderr, block until completion. Used for
    /// shell commands submitted through the embedded terminal.
    Captured,
    /// Pipe stdin/stdout/stderr and return immediately with a live handle.
    /// Used for the running simulation; see [`crate::session`].
    Interactive,
}

/// A single external-process launch request.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
    mode: CaptureMode,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>, mode: CaptureMode) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            mode,
        }
    }

    /// Builds an invocation that runs `line` through the user's shell,
    /// capturing both streams. This is how terminal input is executed.
    pub fn shell(line: &str, cwd: impl Into<PathBuf>) -> Self {
        Self::new("sh", cwd, CaptureMode::Captured)
            .arg("-c")
            .arg(line)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Renders the command line for logging (verbose echo).
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// The outcome of a blocking invocation.
///
/// A non-zero exit code is data, not an error: pipelines decide whether to
/// fail fast. Only process-launch failure is reported as
/// [`crate::VerikitError::Launch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_tokens() {
        let inv = Invocation::new("iverilog", "/tmp", CaptureMode::Streamed)
            .arg("-o")
            .arg("design_sim")
            .args(["counter.v", "alu.v"]);
        assert_eq!(inv.program(), "iverilog");
        assert_eq!(inv.arg_list(), ["-o", "design_sim", "counter.v", "alu.v"]);
        assert_eq!(inv.cwd(), Path::new("/tmp"));
        assert_eq!(inv.mode(), CaptureMode::Streamed);
    }

    #[test]
    fn shell_invocation_wraps_line() {
        let inv = Invocation::shell("ls -la", "/tmp");
        assert_eq!(inv.program(), "sh");
        assert_eq!(inv.arg_list(), ["-c", "ls -la"]);
        assert_eq!(inv.mode(), CaptureMode::Captured);
    }

    #[test]
    fn command_line_quotes_spaced_args() {
        let inv = Invocation::new("yosys", "/tmp", CaptureMode::Streamed)
            .arg("-p")
            .arg("read_verilog top.v; proc; opt");
        assert_eq!(
            inv.command_line(),
            "yosys -p \"read_verilog top.v; proc; opt\""
        );
    }

    #[test]
    fn command_result_success_is_zero_exit() {
        let ok = CommandResult {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        let failed = CommandResult {
            exit_code: 2,
            stdout: String::new(),
            stderr: "syntax error".into(),
        };
        assert!(ok.success());
        assert!(!failed.success());
    }
}
