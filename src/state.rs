//! Persisted editor-session state.
//!
//! A small JSON file under the project's `.verikit/` directory remembering
//! the last opened file and the terminal history, so reopening the IDE in a
//! project picks up where the user left off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PROJECT_DIR_NAME;
use crate::error::{Result, VerikitError};

const STATE_FILE: &str = "state.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// File last open in the editor, relative to the project root when
    /// possible so the state survives a moved checkout.
    pub last_file: Option<PathBuf>,
    /// Terminal input history, oldest first.
    #[serde(default)]
    pub terminal_history: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            last_file: None,
            terminal_history: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads and saves [`SessionState`] for one project directory.
pub struct StateManager {
    root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            root: project_root.into(),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR_NAME).join(STATE_FILE)
    }

    /// Returns the saved state, or `None` if this project has none yet.
    pub fn load(&self) -> Result<Option<SessionState>> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let state = serde_json::from_str(&contents)
            .map_err(|e| VerikitError::State(format!("{}: {e}", path.display())))?;
        Ok(Some(state))
    }

    pub fn save(&self, state: &SessionState) -> Result<()> {
        let path = self.state_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(state)?;
        fs::write(&path, contents)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.state_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_returns_none_for_fresh_project() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StateManager::new(dir.path());
        assert!(manager.load().unwrap().is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StateManager::new(dir.path());

        let mut state = SessionState::new();
        state.last_file = Some(PathBuf::from("rtl/counter.v"));
        state.terminal_history = vec!["ls".into(), "cd rtl".into()];
        manager.save(&state).unwrap();

        let loaded = manager.load().unwrap().unwrap();
        assert_eq!(loaded.last_file, Some(PathBuf::from("rtl/counter.v")));
        assert_eq!(loaded.terminal_history, ["ls", "cd rtl"]);
    }

    #[test]
    fn corrupt_state_is_a_state_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StateManager::new(dir.path());
        fs::create_dir_all(dir.path().join(PROJECT_DIR_NAME)).unwrap();
        fs::write(manager.state_path(), "{not json").unwrap();
        assert!(matches!(manager.load(), Err(VerikitError::State(_))));
    }

    #[test]
    fn clear_removes_the_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StateManager::new(dir.path());
        manager.save(&SessionState::new()).unwrap();
        assert!(manager.state_path().exists());
        manager.clear().unwrap();
        assert!(!manager.state_path().exists());
        manager.clear().unwrap();
    }
}
