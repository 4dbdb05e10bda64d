//! Working-directory state shared by the file browser, the terminal and
//! every tool invocation.
//!
//! There is exactly one authoritative current directory. Tree-driven
//! navigation (double-clicking a directory, opening a file) moves only the
//! working directory and leaves the visible tree alone, so the node the user
//! just opened stays expanded. A shell `cd` moves the tree root as well and
//! signals a full rebuild, since the tree must reflect an arbitrary new
//! root. The asymmetry is deliberate.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Result, VerikitError};

/// What the file tree must do after a navigation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeRefresh {
    /// Keep the current tree; only the working directory moved.
    Preserve,
    /// Rebuild from the new root, dropping expansion state.
    Full,
}

#[derive(Debug, Clone)]
pub struct WorkspaceState {
    tree_root: PathBuf,
    cwd: PathBuf,
}

impl WorkspaceState {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let root = root.canonicalize()?;
        if !root.is_dir() {
            return Err(VerikitError::NotADirectory(root));
        }
        Ok(Self {
            cwd: root.clone(),
            tree_root: root,
        })
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn tree_root(&self) -> &Path {
        &self.tree_root
    }

    /// Directory double-clicked or expanded in the tree: the working
    /// directory follows, the tree stays put.
    pub fn enter_directory(&mut self, dir: &Path) -> TreeRefresh {
        self.cwd = dir.to_path_buf();
        TreeRefresh::Preserve
    }

    /// File opened in the editor: the working directory becomes its parent.
    pub fn open_file(&mut self, file: &Path) -> TreeRefresh {
        if let Some(parent) = file.parent() {
            self.cwd = parent.to_path_buf();
        }
        TreeRefresh::Preserve
    }

    /// Shell `cd`: resolves `target` (empty or `~` means home) against the
    /// current directory and moves both the working directory and the tree
    /// root to it.
    pub fn change_dir(&mut self, target: &str) -> Result<TreeRefresh> {
        let target = target.trim();
        let candidate = if target.is_empty() || target == "~" {
            dirs::home_dir().ok_or_else(|| VerikitError::Config("no home directory".into()))?
        } else if let Some(rest) = target.strip_prefix("~/") {
            dirs::home_dir()
                .ok_or_else(|| VerikitError::Config("no home directory".into()))?
                .join(rest)
        } else {
            self.cwd.join(target)
        };
        let resolved = candidate
            .canonicalize()
            .map_err(|_| VerikitError::NotADirectory(candidate.clone()))?;
        if !resolved.is_dir() {
            return Err(VerikitError::NotADirectory(resolved));
        }
        self.cwd = resolved.clone();
        self.tree_root = resolved;
        Ok(TreeRefresh::Full)
    }

    /// Verilog sources in the working directory, sorted by name so tool
    /// command lines are deterministic.
    pub fn verilog_sources(&self) -> Result<Vec<PathBuf>> {
        let mut sources: Vec<PathBuf> = fs::read_dir(&self.cwd)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_verilog_source(path))
            .collect();
        sources.sort();
        Ok(sources)
    }

    /// Synthesizable sources: Verilog files whose name does not carry the
    /// testbench prefix.
    pub fn design_sources(&self, testbench_prefix: &str) -> Result<Vec<PathBuf>> {
        Ok(self
            .verilog_sources()?
            .into_iter()
            .filter(|path| {
                file_name(path).is_some_and(|name| !name.starts_with(testbench_prefix))
            })
            .collect())
    }

    /// The most recently modified trace file in the working directory, ties
    /// broken by name so the choice is deterministic.
    pub fn latest_trace(&self, trace_extension: &str) -> Result<Option<PathBuf>> {
        let mut best: Option<(SystemTime, PathBuf)> = None;
        for entry in fs::read_dir(&self.cwd)? {
            let entry = entry?;
            let path = entry.path();
            let is_trace = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(trace_extension));
            if !is_trace || !path.is_file() {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            let candidate = (modified, path);
            if best.as_ref().is_none_or(|b| candidate > *b) {
                best = Some(candidate);
            }
        }
        Ok(best.map(|(_, path)| path))
    }

    /// Files in the working directory matching any of the generated-artifact
    /// patterns.
    pub fn artifacts(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
        let mut matches: Vec<PathBuf> = fs::read_dir(&self.cwd)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && file_name(path)
                        .is_some_and(|name| patterns.iter().any(|p| matches_pattern(name, p)))
            })
            .collect();
        matches.sort();
        Ok(matches)
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn is_verilog_source(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("v") || ext.eq_ignore_ascii_case("sv"))
}

/// Matches a file name against an artifact pattern: `*.ext` matches by
/// extension, anything else matches the exact name.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(ext) => Path::new(name)
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(ext)),
        None => name == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "module m; endmodule\n").unwrap();
        path
    }

    fn set_mtime_secs_ago(path: &Path, secs: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn tree_navigation_moves_cwd_but_not_root() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("rtl");
        fs::create_dir(&sub).unwrap();

        let mut ws = WorkspaceState::new(dir.path()).unwrap();
        let root = ws.tree_root().to_path_buf();
        assert_eq!(ws.enter_directory(&sub), TreeRefresh::Preserve);
        assert_eq!(ws.cwd(), sub.as_path());
        assert_eq!(ws.tree_root(), root.as_path());
    }

    #[test]
    fn opening_a_file_reparents_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("rtl");
        fs::create_dir(&sub).unwrap();
        let file = touch(&sub, "counter.v");

        let mut ws = WorkspaceState::new(dir.path()).unwrap();
        assert_eq!(ws.open_file(&file), TreeRefresh::Preserve);
        assert_eq!(ws.cwd(), sub.as_path());
    }

    #[test]
    fn cd_moves_both_and_requests_full_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("rtl");
        fs::create_dir(&sub).unwrap();

        let mut ws = WorkspaceState::new(dir.path()).unwrap();
        assert_eq!(ws.change_dir("rtl").unwrap(), TreeRefresh::Full);
        assert_eq!(ws.cwd(), ws.tree_root());
        assert!(ws.cwd().ends_with("rtl"));
    }

    #[test]
    fn cd_to_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = WorkspaceState::new(dir.path()).unwrap();
        assert!(matches!(
            ws.change_dir("no-such-dir"),
            Err(VerikitError::NotADirectory(_))
        ));
        // State is untouched on failure.
        assert_eq!(ws.cwd(), ws.tree_root());
    }

    #[test]
    fn design_sources_exclude_testbench_prefix() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "alu.v");
        touch(dir.path(), "tb_alu.v");
        touch(dir.path(), "top.sv");
        touch(dir.path(), "notes.txt");

        let ws = WorkspaceState::new(dir.path()).unwrap();
        let sources = ws.design_sources("tb_").unwrap();
        let names: Vec<_> = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["alu.v", "top.sv"]);
    }

    #[test]
    fn latest_trace_picks_newest_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let old = touch(dir.path(), "old.vcd");
        let mid = touch(dir.path(), "mid.vcd");
        let new = touch(dir.path(), "new.vcd");
        set_mtime_secs_ago(&old, 300);
        set_mtime_secs_ago(&mid, 200);
        set_mtime_secs_ago(&new, 100);

        let ws = WorkspaceState::new(dir.path()).unwrap();
        assert_eq!(ws.latest_trace("vcd").unwrap().unwrap(), new);
    }

    #[test]
    fn latest_trace_is_none_without_traces() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "design.v");
        let ws = WorkspaceState::new(dir.path()).unwrap();
        assert!(ws.latest_trace("vcd").unwrap().is_none());
    }

    #[test]
    fn artifact_patterns_match_names_and_extensions() {
        assert!(matches_pattern("design_sim", "design_sim"));
        assert!(matches_pattern("dump.vcd", "*.vcd"));
        assert!(!matches_pattern("dump.vcd.bak", "*.vcd"));
        assert!(!matches_pattern("schematic.png", "schematic.dot"));
    }

    #[test]
    fn artifacts_lists_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "design_sim");
        touch(dir.path(), "dump.vcd");
        touch(dir.path(), "keep.v");

        let ws = WorkspaceState::new(dir.path()).unwrap();
        let found = ws
            .artifacts(&["design_sim".into(), "*.vcd".into()])
            .unwrap();
        assert_eq!(found.len(), 2);
    }
}
