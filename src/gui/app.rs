//! IDE window.
//!
//! The single-threaded UI bridge: owns the working-directory state, the
//! terminal console, the session manager and the consumer half of the relay
//! queue. Every frame it drains the relay into the terminal log and
//! schedules the next repaint at the configured poll interval, so process
//! output appears live without the UI ever blocking on a child process.
//! Blocking tool invocations are spawned onto background threads that write
//! only to the relay.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use eframe::egui::{self, Key, RichText, TextEdit};

use crate::config::ToolConfig;
use crate::console::{Console, Dispatch, TerminalMode};
use crate::error::{Result, VerikitError};
use crate::gui::theme::{self, colors, log_line_color};
use crate::pipeline::{self, PipelineCoordinator};
use crate::relay::{relay_channel, RelayQueue, RelaySender};
use crate::session::SessionManager;
use crate::state::{SessionState, StateManager};
use crate::workspace::{TreeRefresh, WorkspaceState};

/// Default window width in pixels.
const DEFAULT_WIDTH: f32 = 1100.0;

/// Default window height in pixels.
const DEFAULT_HEIGHT: f32 = 720.0;

/// Minimum window size.
const MIN_WIDTH: f32 = 640.0;
const MIN_HEIGHT: f32 = 420.0;

/// Terminal panel height.
const TERMINAL_HEIGHT: f32 = 220.0;

/// File-tree panel width.
const TREE_WIDTH: f32 = 240.0;

/// Terminal log lines kept in memory before the oldest are dropped.
const MAX_LOG_LINES: usize = 5000;

/// Navigation produced by the file-tree panel, applied after rendering.
enum TreeEvent {
    OpenFile(PathBuf),
    EnterDir(PathBuf),
}

pub struct VerikitApp {
    config: ToolConfig,
    workspace: WorkspaceState,
    console: Console,
    sessions: SessionManager,
    relay_rx: RelayQueue,
    relay_tx: RelaySender,
    state: StateManager,

    editor: String,
    current_file: Option<PathBuf>,
    dirty: bool,

    log: Vec<String>,
    input: String,

    /// True while the simulate pipeline runs on a background thread.
    busy: Arc<AtomicBool>,
    /// Previous frame's session state, for the IDLE→RUNNING edge.
    was_running: bool,
    /// Bumped on `cd` so the tree's collapsing state is rebuilt from scratch;
    /// tree-driven navigation leaves it alone.
    tree_generation: u64,

    /// True while the schematic pipeline runs on a background thread.
    schematic_busy: Arc<AtomicBool>,
    /// Image path handed back by a successful schematic run. A failed run
    /// leaves this empty, so a stale image on disk never opens the viewer.
    schematic_result: Arc<Mutex<Option<PathBuf>>>,
    schematic_image: Option<PathBuf>,
    show_schematic: bool,

    verbose: bool,
}

impl VerikitApp {
    pub fn new(project_dir: &Path, verbose: bool) -> Result<Self> {
        let config = ToolConfig::load(project_dir)?;
        let workspace = WorkspaceState::new(project_dir)?;
        let state = StateManager::new(workspace.tree_root());
        let (relay_tx, relay_rx) = relay_channel();

        let mut app = Self {
            console: Console::new(),
            sessions: SessionManager::new(),
            relay_rx,
            relay_tx,
            state,
            editor: String::new(),
            current_file: None,
            dirty: false,
            log: Vec::new(),
            input: String::new(),
            busy: Arc::new(AtomicBool::new(false)),
            was_running: false,
            tree_generation: 0,
            schematic_busy: Arc::new(AtomicBool::new(false)),
            schematic_result: Arc::new(Mutex::new(None)),
            schematic_image: None,
            show_schematic: false,
            verbose,
            config,
            workspace,
        };

        if let Ok(Some(saved)) = app.state.load() {
            app.console = Console::with_history(saved.terminal_history);
            if let Some(rel) = saved.last_file {
                let path = app.workspace.tree_root().join(rel);
                if path.is_file() {
                    app.load_file(&path);
                }
            }
        }

        Ok(app)
    }

    fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        trim_log(&mut self.log);
    }

    fn persist_state(&self) {
        let mut saved = SessionState::new();
        saved.last_file = self.current_file.as_ref().map(|path| {
            path.strip_prefix(self.workspace.tree_root())
                .unwrap_or(path)
                .to_path_buf()
        });
        saved.terminal_history = self.console.history().to_vec();
        let _ = self.state.save(&saved);
    }

    // ------------------------------------------------------------------
    // Editor
    // ------------------------------------------------------------------

    fn load_file(&mut self, path: &Path) {
        match fs::read_to_string(path) {
            Ok(contents) => {
                self.editor = contents;
                self.current_file = Some(path.to_path_buf());
                self.dirty = false;
                self.workspace.open_file(path);
                self.persist_state();
            }
            Err(e) => self.push_log(format!("[editor] cannot open {}: {e}", path.display())),
        }
    }

    /// Persists the editor buffer to disk if a file is associated.
    fn save_current_file(&mut self) -> bool {
        match &self.current_file {
            Some(path) => match fs::write(path, &self.editor) {
                Ok(()) => {
                    self.dirty = false;
                    true
                }
                Err(e) => {
                    let path = path.display().to_string();
                    self.push_log(format!("[editor] cannot save {path}: {e}"));
                    false
                }
            },
            None => {
                self.push_log(format!("[editor] {}", VerikitError::NoWorkingFile));
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Terminal input
    // ------------------------------------------------------------------

    fn submit_input(&mut self) {
        let line = std::mem::take(&mut self.input);
        match self.console.dispatch(&line) {
            Dispatch::Empty => {}
            Dispatch::ChangeDir(target) => {
                self.push_log(format!("> cd {target}"));
                match self.workspace.change_dir(&target) {
                    Ok(TreeRefresh::Full) => {
                        self.tree_generation += 1;
                        let cwd = self.workspace.cwd().display().to_string();
                        self.push_log(format!("[cwd] {cwd}"));
                    }
                    Ok(TreeRefresh::Preserve) => {}
                    Err(e) => self.push_log(format!("[cwd] {e}")),
                }
                self.persist_state();
            }
            Dispatch::Exec(command) => {
                self.push_log(format!("> {command}"));
                let cwd = self.workspace.cwd().to_path_buf();
                let relay = self.relay_tx.clone();
                thread::spawn(move || pipeline::run_shell_command(&command, &cwd, &relay));
                self.persist_state();
            }
            Dispatch::Forward(text) => match self.sessions.send_line(&text) {
                Ok(()) => self.push_log(format!("» {text}")),
                Err(e) => self.push_log(format!("[sim] {e}")),
            },
        }
    }

    // ------------------------------------------------------------------
    // Pipelines
    // ------------------------------------------------------------------

    fn current_sources(&mut self) -> Option<Vec<PathBuf>> {
        match &self.current_file {
            Some(path) => Some(vec![path.clone()]),
            None => {
                self.push_log(format!("[compile] {}", VerikitError::NoWorkingFile));
                None
            }
        }
    }

    fn run_simulation(&mut self) {
        if self.current_file.is_some() && !self.save_current_file() {
            return;
        }
        let Some(sources) = self.current_sources() else {
            return;
        };
        let config = self.config.clone();
        let workspace = self.workspace.clone();
        let sessions = self.sessions.clone();
        let relay = self.relay_tx.clone();
        let busy = Arc::clone(&self.busy);
        let verbose = self.verbose;
        busy.store(true, Ordering::SeqCst);
        thread::spawn(move || {
            let coordinator = PipelineCoordinator::new(&config).with_verbose(verbose);
            coordinator.simulate(&sources, &workspace, &sessions, &relay, |line| {
                relay.push(line)
            });
            busy.store(false, Ordering::SeqCst);
        });
    }

    fn run_schematic(&mut self) {
        if self.current_file.is_some() && !self.save_current_file() {
            return;
        }
        let config = self.config.clone();
        let workspace = self.workspace.clone();
        let relay = self.relay_tx.clone();
        let busy = Arc::clone(&self.schematic_busy);
        let result_slot = Arc::clone(&self.schematic_result);
        let verbose = self.verbose;
        busy.store(true, Ordering::SeqCst);
        thread::spawn(move || {
            let coordinator = PipelineCoordinator::new(&config).with_verbose(verbose);
            let result = coordinator.schematic(&workspace, |line| relay.push(line));
            if let Some(image) = result {
                if let Ok(mut slot) = result_slot.lock() {
                    *slot = Some(image);
                }
            }
            busy.store(false, Ordering::SeqCst);
        });
    }

    fn run_waveform(&mut self) {
        let mut lines = Vec::new();
        PipelineCoordinator::new(&self.config)
            .with_verbose(self.verbose)
            .waveform(&self.workspace, |line| lines.push(line.to_string()));
        for line in lines {
            self.push_log(line);
        }
    }

    fn run_clean(&mut self) {
        let mut lines = Vec::new();
        PipelineCoordinator::new(&self.config).clean(&self.workspace, |line| {
            lines.push(line.to_string())
        });
        for line in lines {
            self.push_log(line);
        }
    }

    fn stop_simulation(&mut self) {
        match self.sessions.terminate() {
            Ok(true) => self.push_log("[sim] terminating session"),
            Ok(false) => self.push_log(format!("[sim] {}", VerikitError::NoActiveSession)),
            Err(e) => self.push_log(format!("[sim] {e}")),
        }
    }

    // ------------------------------------------------------------------
    // Per-frame plumbing
    // ------------------------------------------------------------------

    fn drain_relay(&mut self) {
        for chunk in self.relay_rx.drain_all() {
            self.log.push(chunk);
        }
        trim_log(&mut self.log);
    }

    fn track_session_edge(&mut self) {
        let running = self.sessions.is_running();
        if running && !self.was_running {
            // A pipeline stage started a session: terminal input now goes to
            // the simulation, not the shell.
            self.console.set_mode(TerminalMode::InteractiveForward);
            self.push_log("[sim] session live, terminal forwards input to the simulation");
        }
        self.was_running = running;
    }

    /// Takes the image path a finished schematic run handed back, if any,
    /// and opens the viewer on it. A failed run hands nothing back, so the
    /// viewer never opens on a stale image left by an earlier success.
    fn take_finished_schematic(&mut self) -> Option<PathBuf> {
        let image = self
            .schematic_result
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())?;
        self.schematic_image = Some(image.clone());
        self.show_schematic = true;
        Some(image)
    }

    // ------------------------------------------------------------------
    // Panels
    // ------------------------------------------------------------------

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.save_current_file();
            }
            ui.separator();
            if ui.button("▶ Simulate").clicked() {
                self.run_simulation();
            }
            if ui.button("Schematic").clicked() {
                self.run_schematic();
            }
            if ui.button("Waveform").clicked() {
                self.run_waveform();
            }
            if ui.button("Clean").clicked() {
                self.run_clean();
            }
            ui.separator();
            let stop = egui::Button::new("■ Stop");
            if ui.add_enabled(self.sessions.is_running(), stop).clicked() {
                self.stop_simulation();
            }
            if self.busy.load(Ordering::SeqCst) || self.schematic_busy.load(Ordering::SeqCst) {
                ui.add(egui::Spinner::new());
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let cwd = self.workspace.cwd().display().to_string();
                ui.label(RichText::new(cwd).color(colors::TEXT_DIM).monospace());
            });
        });
    }

    fn show_file_tree(&mut self, ui: &mut egui::Ui) {
        let root = self.workspace.tree_root().to_path_buf();
        let generation = self.tree_generation;
        let current = self.current_file.clone();
        let mut events = Vec::new();

        egui::ScrollArea::vertical().show(ui, |ui| {
            show_dir_contents(ui, &root, generation, current.as_deref(), &mut events);
        });

        for event in events {
            match event {
                TreeEvent::EnterDir(dir) => {
                    self.workspace.enter_directory(&dir);
                }
                TreeEvent::OpenFile(file) => self.load_file(&file),
            }
        }
    }

    fn show_terminal(&mut self, ui: &mut egui::Ui) {
        let log_height = ui.available_height() - 28.0;
        egui::ScrollArea::vertical()
            .max_height(log_height)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &self.log {
                    ui.label(
                        RichText::new(line)
                            .monospace()
                            .color(log_line_color(line)),
                    );
                }
            });

        ui.horizontal(|ui| {
            let mode = self.console.mode();
            let label = format!("[{}]", mode.label());
            if ui
                .button(RichText::new(label).monospace())
                .on_hover_text("Toggle between shell commands and forwarding to the simulation")
                .clicked()
            {
                self.console.toggle_mode();
            }

            let response = ui.add(
                TextEdit::singleline(&mut self.input)
                    .desired_width(f32::INFINITY)
                    .font(egui::TextStyle::Monospace)
                    .hint_text(match mode {
                        TerminalMode::Shell => "shell command ('cd <dir>' changes directory)",
                        TerminalMode::InteractiveForward => "input line for the simulation",
                    }),
            );
            if response.has_focus() {
                if ui.input(|i| i.key_pressed(Key::ArrowUp)) {
                    if let Some(prev) = self.console.previous() {
                        self.input = prev.to_string();
                    }
                } else if ui.input(|i| i.key_pressed(Key::ArrowDown)) {
                    self.input = self.console.next().unwrap_or_default().to_string();
                }
            }
            if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                self.submit_input();
                response.request_focus();
            }
        });
    }

    fn show_editor(&mut self, ui: &mut egui::Ui) {
        let title = match &self.current_file {
            Some(path) => {
                let name = display_name(path);
                if self.dirty {
                    format!("{name} •")
                } else {
                    name
                }
            }
            None => "(no file open)".to_string(),
        };
        ui.label(RichText::new(title).color(colors::TEXT_DIM));
        ui.separator();
        egui::ScrollArea::vertical().show(ui, |ui| {
            let response = ui.add(
                TextEdit::multiline(&mut self.editor)
                    .code_editor()
                    .desired_width(f32::INFINITY)
                    .desired_rows(30),
            );
            if response.changed() {
                self.dirty = true;
            }
        });
    }

    fn show_schematic_window(&mut self, ctx: &egui::Context) {
        let Some(image) = self.schematic_image.clone() else {
            return;
        };
        let mut open = self.show_schematic;
        egui::Window::new("Schematic")
            .open(&mut open)
            .default_size([520.0, 420.0])
            .show(ctx, |ui| {
                egui::ScrollArea::both().show(ui, |ui| {
                    ui.add(egui::Image::from_uri(image_uri(&image)).shrink_to_fit());
                });
            });
        self.show_schematic = open;
    }
}

impl eframe::App for VerikitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_relay();
        self.track_session_edge();
        if let Some(image) = self.take_finished_schematic() {
            ctx.forget_image(&image_uri(&image));
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.show_toolbar(ui));
        egui::TopBottomPanel::bottom("terminal")
            .exact_height(TERMINAL_HEIGHT)
            .show(ctx, |ui| self.show_terminal(ui));
        egui::SidePanel::left("files")
            .default_width(TREE_WIDTH)
            .show(ctx, |ui| self.show_file_tree(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.show_editor(ui));

        self.show_schematic_window(ctx);

        // The relay is poll-driven; keep frames coming at the poll interval
        // even when no input events arrive.
        ctx.request_repaint_after(self.config.poll_interval());
    }
}

/// Renders one directory level of the file tree. Directories are collapsing
/// headers salted with the tree generation, so a `cd` rebuild drops their
/// open state while tree-driven navigation preserves it.
fn show_dir_contents(
    ui: &mut egui::Ui,
    dir: &Path,
    generation: u64,
    current: Option<&Path>,
    events: &mut Vec<TreeEvent>,
) {
    let Ok(entries) = fs::read_dir(dir) else {
        ui.label(RichText::new("(unreadable)").color(colors::TEXT_DIM));
        return;
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| !display_name(p).starts_with('.'))
        .collect();
    paths.sort_by_key(|p| (!p.is_dir(), display_name(p)));

    for path in paths {
        let name = display_name(&path);
        if path.is_dir() {
            let response = egui::CollapsingHeader::new(&name)
                .id_salt((generation, &path))
                .show(ui, |ui| {
                    show_dir_contents(ui, &path, generation, current, events);
                });
            if response.header_response.double_clicked() {
                events.push(TreeEvent::EnterDir(path.clone()));
            }
        } else {
            let selected = current == Some(path.as_path());
            if ui.selectable_label(selected, &name).clicked() {
                events.push(TreeEvent::OpenFile(path.clone()));
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn image_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn trim_log(log: &mut Vec<String>) {
    if log.len() > MAX_LOG_LINES {
        let overflow = log.len() - MAX_LOG_LINES;
        log.drain(..overflow);
    }
}

fn build_viewport() -> egui::ViewportBuilder {
    egui::ViewportBuilder::default()
        .with_inner_size([DEFAULT_WIDTH, DEFAULT_HEIGHT])
        .with_min_inner_size([MIN_WIDTH, MIN_HEIGHT])
        .with_title("verikit")
}

/// Opens the IDE window rooted at `project_dir`.
pub fn run_gui(project_dir: PathBuf, verbose: bool) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: build_viewport(),
        ..Default::default()
    };

    eframe::run_native(
        "verikit",
        options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            theme::init(&cc.egui_ctx);
            let app = VerikitApp::new(&project_dir, verbose)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| VerikitError::Gui(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_log_drops_oldest_lines() {
        let mut log: Vec<String> = (0..MAX_LOG_LINES + 10).map(|i| i.to_string()).collect();
        trim_log(&mut log);
        assert_eq!(log.len(), MAX_LOG_LINES);
        assert_eq!(log[0], "10");
    }

    #[test]
    fn display_name_uses_final_component() {
        assert_eq!(display_name(Path::new("/a/b/counter.v")), "counter.v");
    }

    #[test]
    fn image_uri_is_a_file_url() {
        assert_eq!(
            image_uri(Path::new("/work/schematic.png")),
            "file:///work/schematic.png"
        );
    }

    #[test]
    fn failed_schematic_run_does_not_open_viewer_on_stale_image() {
        let dir = tempfile::tempdir().unwrap();
        // A stale image from an earlier successful run is still on disk.
        fs::write(dir.path().join("schematic.png"), "old png").unwrap();

        let mut app = VerikitApp::new(dir.path(), false).unwrap();
        // A failed run hands nothing back through the result slot.
        assert!(app.take_finished_schematic().is_none());
        assert!(!app.show_schematic);
        assert!(app.schematic_image.is_none());
    }

    #[test]
    fn successful_schematic_result_opens_viewer() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("schematic.png");
        fs::write(&image, "png").unwrap();

        let mut app = VerikitApp::new(dir.path(), false).unwrap();
        *app.schematic_result.lock().unwrap() = Some(image.clone());

        assert_eq!(app.take_finished_schematic(), Some(image.clone()));
        assert!(app.show_schematic);
        assert_eq!(app.schematic_image, Some(image));
        // The result is consumed; the next frame does not re-open anything.
        assert!(app.take_finished_schematic().is_none());
    }

    #[test]
    fn app_restores_saved_session_state() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("top.v"), "module top; endmodule\n").unwrap();
        let manager = StateManager::new(dir.path());
        let mut saved = SessionState::new();
        saved.last_file = Some(PathBuf::from("top.v"));
        saved.terminal_history = vec!["ls".into()];
        manager.save(&saved).unwrap();

        let app = VerikitApp::new(dir.path(), false).unwrap();
        assert!(app.current_file.is_some());
        assert_eq!(app.console.history(), ["ls"]);
        assert_eq!(app.editor, "module top; endmodule\n");
    }
}
