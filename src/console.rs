//! Terminal input dispatch.
//!
//! A submitted line means different things depending on the terminal mode:
//! in shell mode it is either a `cd` pseudo-command or an external command
//! to execute in the working directory; in interactive-forward mode it goes
//! verbatim to the live simulation's stdin. The console only classifies the
//! line; spawning and forwarding stay with the caller, which keeps all
//! process work off this type and makes the dispatch table trivially
//! testable.

/// How terminal input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalMode {
    /// Input lines are shell commands run in the working directory.
    Shell,
    /// Input lines are forwarded to the live simulation session.
    InteractiveForward,
}

impl TerminalMode {
    pub fn label(self) -> &'static str {
        match self {
            TerminalMode::Shell => "shell",
            TerminalMode::InteractiveForward => "sim",
        }
    }
}

/// What a submitted line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Blank input; nothing to do.
    Empty,
    /// `cd <path>` (path may be empty, meaning home).
    ChangeDir(String),
    /// Execute as a shell command in the working directory.
    Exec(String),
    /// Forward verbatim to the live session.
    Forward(String),
}

/// Maximum history entries kept (and persisted).
const HISTORY_LIMIT: usize = 200;

#[derive(Debug, Default)]
pub struct Console {
    mode: TerminalMode,
    history: Vec<String>,
    history_cursor: Option<usize>,
}

impl Default for TerminalMode {
    fn default() -> Self {
        TerminalMode::Shell
    }
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: Vec<String>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> TerminalMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TerminalMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            TerminalMode::Shell => TerminalMode::InteractiveForward,
            TerminalMode::InteractiveForward => TerminalMode::Shell,
        };
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Classifies a submitted line under the current mode and records it in
    /// the history.
    pub fn dispatch(&mut self, line: &str) -> Dispatch {
        let line = line.trim();
        if line.is_empty() {
            return Dispatch::Empty;
        }
        self.remember(line);

        match self.mode {
            TerminalMode::InteractiveForward => Dispatch::Forward(line.to_string()),
            TerminalMode::Shell => {
                if line == "cd" {
                    Dispatch::ChangeDir(String::new())
                } else if let Some(target) = line.strip_prefix("cd ") {
                    Dispatch::ChangeDir(target.trim().to_string())
                } else {
                    Dispatch::Exec(line.to_string())
                }
            }
        }
    }

    fn remember(&mut self, line: &str) {
        if self.history.last().map(String::as_str) != Some(line) {
            self.history.push(line.to_string());
            if self.history.len() > HISTORY_LIMIT {
                let overflow = self.history.len() - HISTORY_LIMIT;
                self.history.drain(..overflow);
            }
        }
        self.history_cursor = None;
    }

    /// Up-arrow recall: walks backwards through the history.
    pub fn previous(&mut self) -> Option<&str> {
        if self.history.is_empty() {
            return None;
        }
        let next = match self.history_cursor {
            None => self.history.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_cursor = Some(next);
        self.history.get(next).map(String::as_str)
    }

    /// Down-arrow: walks forward again; past the newest entry clears recall.
    pub fn next(&mut self) -> Option<&str> {
        let i = self.history_cursor?;
        if i + 1 >= self.history.len() {
            self.history_cursor = None;
            None
        } else {
            self.history_cursor = Some(i + 1);
            self.history.get(i + 1).map(String::as_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_is_empty() {
        let mut console = Console::new();
        assert_eq!(console.dispatch("   "), Dispatch::Empty);
        assert!(console.history().is_empty());
    }

    #[test]
    fn shell_mode_detects_cd() {
        let mut console = Console::new();
        assert_eq!(
            console.dispatch("cd rtl/core"),
            Dispatch::ChangeDir("rtl/core".into())
        );
        assert_eq!(console.dispatch("cd"), Dispatch::ChangeDir(String::new()));
        // `cdr` is not a cd.
        assert_eq!(console.dispatch("cdr"), Dispatch::Exec("cdr".into()));
    }

    #[test]
    fn shell_mode_executes_other_lines() {
        let mut console = Console::new();
        assert_eq!(
            console.dispatch("iverilog -o sim tb_counter.v"),
            Dispatch::Exec("iverilog -o sim tb_counter.v".into())
        );
    }

    #[test]
    fn forward_mode_passes_lines_verbatim() {
        let mut console = Console::new();
        console.set_mode(TerminalMode::InteractiveForward);
        // Even a cd-looking line is forwarded, not interpreted.
        assert_eq!(console.dispatch("cd rtl"), Dispatch::Forward("cd rtl".into()));
    }

    #[test]
    fn toggle_flips_between_modes() {
        let mut console = Console::new();
        assert_eq!(console.mode(), TerminalMode::Shell);
        console.toggle_mode();
        assert_eq!(console.mode(), TerminalMode::InteractiveForward);
        console.toggle_mode();
        assert_eq!(console.mode(), TerminalMode::Shell);
    }

    #[test]
    fn history_recall_walks_both_directions() {
        let mut console = Console::new();
        console.dispatch("ls");
        console.dispatch("make");
        assert_eq!(console.previous(), Some("make"));
        assert_eq!(console.previous(), Some("ls"));
        assert_eq!(console.previous(), Some("ls"));
        assert_eq!(console.next(), Some("make"));
        assert_eq!(console.next(), None);
    }

    #[test]
    fn history_skips_consecutive_duplicates_and_caps() {
        let mut console = Console::new();
        console.dispatch("ls");
        console.dispatch("ls");
        assert_eq!(console.history().len(), 1);
        for i in 0..300 {
            console.dispatch(&format!("cmd {i}"));
        }
        assert_eq!(console.history().len(), HISTORY_LIMIT);
        assert_eq!(console.history().last().unwrap(), "cmd 299");
    }
}
