//! Native GUI for verikit.
//!
//! The IDE window is built with eframe/egui: a file tree, a code editor, an
//! embedded terminal and a schematic viewer wired to the orchestration core.

pub mod app;
pub mod theme;

pub use app::run_gui;
