//! Tool pipeline coordinator.
//!
//! Sequences the multi-stage external toolchains behind each user action:
//! compile → simulate, synthesize → render → rasterize, waveform viewing and
//! artifact cleanup. Stages fail fast; every failure is recovered here and
//! turned into exactly one tagged log line through the caller's sink, never
//! an unhandled fault. A non-zero exit, a launch failure and an
//! exited-clean-but-produced-nothing tool are reported as three distinct
//! conditions.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ToolConfig;
use crate::error::VerikitError;
use crate::invocation::{CaptureMode, CommandResult, Invocation};
use crate::relay::RelaySender;
use crate::runner;
use crate::session::SessionManager;
use crate::workspace::WorkspaceState;

pub struct PipelineCoordinator<'a> {
    config: &'a ToolConfig,
    verbose: bool,
}

impl<'a> PipelineCoordinator<'a> {
    pub fn new(config: &'a ToolConfig) -> Self {
        Self {
            config,
            verbose: false,
        }
    }

    /// Echo each invocation's command line into the log before running it.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn echo<F: FnMut(&str)>(&self, invocation: &Invocation, log: &mut F) {
        if self.verbose {
            log(&format!("$ {}", invocation.command_line()));
        }
    }

    /// Runs a blocking stage, logging launch failures under `tag`.
    /// Returns `None` when the stage could not even start.
    fn run_stage<F: FnMut(&str)>(
        &self,
        tag: &str,
        invocation: &Invocation,
        log: &mut F,
    ) -> Option<CommandResult> {
        self.echo(invocation, log);
        match runner::run(invocation) {
            Ok(result) => Some(result),
            Err(e) => {
                log(&format!("[{tag}] {e}"));
                None
            }
        }
    }

    fn report_failure<F: FnMut(&str)>(tag: &str, result: &CommandResult, log: &mut F) {
        log(&format!("[{tag}] failed (exit {})", result.exit_code));
        for line in result.stderr.lines() {
            log(line);
        }
    }

    /// Compile-then-simulate. On compile failure the captured stderr is
    /// reported and the simulate stage never runs. On success the compiled
    /// binary is started as the interactive session; the caller's terminal
    /// should switch to forward mode once the session is live.
    pub fn simulate<F: FnMut(&str)>(
        &self,
        sources: &[PathBuf],
        workspace: &WorkspaceState,
        sessions: &SessionManager,
        relay: &RelaySender,
        mut log: F,
    ) {
        if sources.is_empty() {
            log(&format!("[compile] {}", VerikitError::NoWorkingFile));
            return;
        }

        let compile = Invocation::new(
            &self.config.compiler,
            workspace.cwd(),
            CaptureMode::Streamed,
        )
        .arg("-o")
        .arg(&self.config.sim_binary)
        .args(sources.iter().map(|p| p.to_string_lossy().to_string()));

        let Some(result) = self.run_stage("compile", &compile, &mut log) else {
            return;
        };
        if !result.success() {
            Self::report_failure("compile", &result, &mut log);
            return;
        }

        log(&format!(
            "[compile] ok, starting ./{}",
            self.config.sim_binary
        ));
        let run_sim = Invocation::new(
            format!("./{}", self.config.sim_binary),
            workspace.cwd(),
            CaptureMode::Interactive,
        );
        self.echo(&run_sim, &mut log);
        if let Err(e) = sessions.start(&run_sim, relay) {
            log(&format!("[sim] {e}"));
        }
    }

    /// Synthesize → graph-export → rasterize. Returns the schematic image
    /// path on success so the caller can hand it to the viewer.
    pub fn schematic<F: FnMut(&str)>(
        &self,
        workspace: &WorkspaceState,
        mut log: F,
    ) -> Option<PathBuf> {
        let sources = match workspace.design_sources(&self.config.testbench_prefix) {
            Ok(sources) => sources,
            Err(e) => {
                log(&format!("[schematic] {e}"));
                return None;
            }
        };
        if sources.is_empty() {
            log("[schematic] no design files to synthesize (testbenches are excluded)");
            return None;
        }

        let synth = Invocation::new(
            &self.config.synthesizer,
            workspace.cwd(),
            CaptureMode::Streamed,
        )
        .arg("-p")
        .arg(self.config.synth_script(&sources));
        let result = self.run_stage("schematic", &synth, &mut log)?;
        if !result.success() {
            Self::report_failure("schematic", &result, &mut log);
            return None;
        }

        // Exit 0 with no graph file is a distinct failure from a non-zero
        // exit: the tool ran but produced nothing.
        let graph = workspace.cwd().join(&self.config.graph_file);
        if !graph.exists() {
            log(&format!(
                "[schematic] synthesis: {}",
                VerikitError::MissingArtifact(graph)
            ));
            return None;
        }

        let rasterize = Invocation::new(
            &self.config.rasterizer,
            workspace.cwd(),
            CaptureMode::Streamed,
        )
        .arg("-Tpng")
        .arg(&self.config.graph_file)
        .arg("-o")
        .arg(&self.config.image_file);
        let result = self.run_stage("schematic", &rasterize, &mut log)?;
        if !result.success() {
            Self::report_failure("schematic", &result, &mut log);
            return None;
        }

        let image = workspace.cwd().join(&self.config.image_file);
        if !image.exists() {
            log(&format!(
                "[schematic] renderer: {}",
                VerikitError::MissingArtifact(image)
            ));
            return None;
        }

        log(&format!("[schematic] wrote {}", image.display()));
        Some(image)
    }

    /// Opens the most recent trace in the waveform viewer, detached: the
    /// viewer is never tracked as a session and produces no relayed output.
    pub fn waveform<F: FnMut(&str)>(&self, workspace: &WorkspaceState, mut log: F) {
        let trace = match workspace.latest_trace(&self.config.trace_extension) {
            Ok(trace) => trace,
            Err(e) => {
                log(&format!("[waveform] {e}"));
                return;
            }
        };
        let Some(trace) = trace else {
            log(&format!(
                "[waveform] no .{} trace files in {}",
                self.config.trace_extension,
                workspace.cwd().display()
            ));
            return;
        };

        let view = Invocation::new(
            &self.config.waveform_viewer,
            workspace.cwd(),
            CaptureMode::Silent,
        )
        .arg(trace.to_string_lossy().to_string());
        self.echo(&view, &mut log);
        match runner::spawn_detached(&view) {
            Ok(()) => log(&format!("[waveform] opened {}", trace.display())),
            Err(e) => log(&format!("[waveform] {e}")),
        }
    }

    /// Best-effort deletion of generated artifacts. Per-file failures are
    /// silently aggregated; only the final count is reported.
    pub fn clean<F: FnMut(&str)>(&self, workspace: &WorkspaceState, mut log: F) -> usize {
        let artifacts = match workspace.artifacts(&self.config.cleanup_patterns) {
            Ok(artifacts) => artifacts,
            Err(e) => {
                log(&format!("[clean] {e}"));
                return 0;
            }
        };
        let removed = artifacts
            .iter()
            .filter(|path| fs::remove_file(path).is_ok())
            .count();
        log(&format!("[clean] removed {removed} generated artifacts"));
        removed
    }
}

/// Executes a terminal shell command in `cwd`, relaying captured stdout and
/// stderr line-by-line plus a tagged exit line on failure. Blocking; meant
/// to run on a background thread with results polled off the relay.
pub fn run_shell_command(line: &str, cwd: &Path, relay: &RelaySender) {
    let invocation = Invocation::shell(line, cwd);
    match runner::run(&invocation) {
        Ok(result) => {
            for out in result.stdout.lines() {
                relay.push(out);
            }
            for err in result.stderr.lines() {
                relay.push(err);
            }
            if !result.success() {
                relay.push(format!("[exit {}]", result.exit_code));
            }
        }
        Err(e) => relay.push(format!("[shell] {e}")),
    }
}
