//! Tool configuration.
//!
//! Names of the external EDA executables and the fixed artifact naming
//! convention the pipelines rely on to find each stage's output. Loaded from
//! `~/.config/verikit/config.toml`, overridden by a project-local
//! `.verikit/config.toml` when present. Every field has a serde default so
//! partial config files work.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, VerikitError};

/// The base config directory name under ~/.config/
const CONFIG_DIR_NAME: &str = "verikit";

/// Project-local dot-directory (also holds state.json).
pub const PROJECT_DIR_NAME: &str = ".verikit";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Verilog compiler executable.
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// Synthesis tool executable (scripted via `-p`).
    #[serde(default = "default_synthesizer")]
    pub synthesizer: String,

    /// Graph-layout renderer executable.
    #[serde(default = "default_rasterizer")]
    pub rasterizer: String,

    /// Waveform viewer executable (launched detached).
    #[serde(default = "default_waveform_viewer")]
    pub waveform_viewer: String,

    /// Basename of the compiled simulation binary.
    #[serde(default = "default_sim_binary")]
    pub sim_binary: String,

    /// Basename of the synthesized graph description.
    #[serde(default = "default_graph_file")]
    pub graph_file: String,

    /// Basename of the rasterized schematic image.
    #[serde(default = "default_image_file")]
    pub image_file: String,

    /// Extension of simulation trace files (without the dot).
    #[serde(default = "default_trace_extension")]
    pub trace_extension: String,

    /// File-name prefix marking testbenches, excluded from synthesis.
    #[serde(default = "default_testbench_prefix")]
    pub testbench_prefix: String,

    /// Generated-artifact patterns removed by the cleanup action.
    #[serde(default = "default_cleanup_patterns")]
    pub cleanup_patterns: Vec<String>,

    /// Relay-queue poll interval for the UI, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_compiler() -> String {
    "iverilog".into()
}

fn default_synthesizer() -> String {
    "yosys".into()
}

fn default_rasterizer() -> String {
    "dot".into()
}

fn default_waveform_viewer() -> String {
    "gtkwave".into()
}

fn default_sim_binary() -> String {
    "design_sim".into()
}

fn default_graph_file() -> String {
    "schematic.dot".into()
}

fn default_image_file() -> String {
    "schematic.png".into()
}

fn default_trace_extension() -> String {
    "vcd".into()
}

fn default_testbench_prefix() -> String {
    "tb_".into()
}

fn default_cleanup_patterns() -> Vec<String> {
    vec![
        default_sim_binary(),
        default_graph_file(),
        default_image_file(),
        "*.vcd".into(),
    ]
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            synthesizer: default_synthesizer(),
            rasterizer: default_rasterizer(),
            waveform_viewer: default_waveform_viewer(),
            sim_binary: default_sim_binary(),
            graph_file: default_graph_file(),
            image_file: default_image_file(),
            trace_extension: default_trace_extension(),
            testbench_prefix: default_testbench_prefix(),
            cleanup_patterns: default_cleanup_patterns(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ToolConfig {
    /// UI relay poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The yosys script for the synthesize-to-graph stage:
    /// read → process → optimize → graph export.
    pub fn synth_script(&self, sources: &[PathBuf]) -> String {
        let files: Vec<&str> = sources
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        let prefix = self
            .graph_file
            .strip_suffix(".dot")
            .unwrap_or(&self.graph_file);
        format!(
            "read_verilog {}; proc; opt; show -format dot -prefix {}",
            files.join(" "),
            prefix
        )
    }

    /// Loads the effective config for a project directory: project-local
    /// file first, then the global file, then built-in defaults.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let project = project_config_path(project_dir);
        if project.exists() {
            return Self::from_file(&project);
        }
        if let Some(global) = global_config_path() {
            if global.exists() {
                return Self::from_file(&global);
            }
        }
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| VerikitError::Config(format!("{}: {e}", path.display())))
    }

    /// Writes the config as TOML to the project-local location.
    pub fn save_project(&self, project_dir: &Path) -> Result<()> {
        let path = project_config_path(project_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| VerikitError::Config(format!("failed to serialize config: {e}")))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

/// `~/.config/verikit/config.toml`, if a config dir exists on this system.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE))
}

/// `<project>/.verikit/config.toml`
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_DIR_NAME).join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_standard_toolchain() {
        let config = ToolConfig::default();
        assert_eq!(config.compiler, "iverilog");
        assert_eq!(config.synthesizer, "yosys");
        assert_eq!(config.rasterizer, "dot");
        assert_eq!(config.waveform_viewer, "gtkwave");
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert!(config.cleanup_patterns.contains(&"*.vcd".to_string()));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: ToolConfig = toml::from_str("compiler = \"iverilog-12\"").unwrap();
        assert_eq!(config.compiler, "iverilog-12");
        assert_eq!(config.synthesizer, "yosys");
        assert_eq!(config.testbench_prefix, "tb_");
    }

    #[test]
    fn synth_script_names_sources_and_prefix() {
        let config = ToolConfig::default();
        let script = config.synth_script(&[PathBuf::from("/w/alu.v"), PathBuf::from("/w/top.v")]);
        assert_eq!(
            script,
            "read_verilog alu.v top.v; proc; opt; show -format dot -prefix schematic"
        );
    }

    #[test]
    fn project_config_overrides_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ToolConfig::default();
        config.compiler = "verilator".into();
        config.save_project(dir.path()).unwrap();

        let loaded = ToolConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.compiler, "verilator");
        assert_eq!(loaded.synthesizer, "yosys");
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_config_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "compiler = [not toml").unwrap();
        assert!(matches!(
            ToolConfig::load(dir.path()),
            Err(VerikitError::Config(_))
        ));
    }
}
