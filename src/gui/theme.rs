//! Theme for the IDE window.
//!
//! A dark editor-style palette applied once at startup. Panels, the editor
//! and the terminal all inherit from these visuals; the terminal log adds
//! per-line colors for tagged error lines.

use eframe::egui::{self, Color32, FontFamily, FontId, TextStyle, Visuals};

/// Semantic colors used across the IDE.
pub mod colors {
    use super::Color32;

    /// Window and panel background.
    pub const BACKGROUND: Color32 = Color32::from_rgb(24, 26, 31);

    /// Editor and terminal background, slightly darker than panels.
    pub const SURFACE: Color32 = Color32::from_rgb(18, 20, 24);

    /// Default foreground text.
    pub const TEXT: Color32 = Color32::from_rgb(205, 209, 217);

    /// Subdued text (cwd display, mode label).
    pub const TEXT_DIM: Color32 = Color32::from_rgb(130, 137, 149);

    /// Tagged failure lines in the terminal log.
    pub const ERROR: Color32 = Color32::from_rgb(224, 108, 117);

    /// Session/sentinel lines in the terminal log.
    pub const ACCENT: Color32 = Color32::from_rgb(97, 175, 239);
}

/// Applies the IDE visuals and text styles to the context. Call once from
/// the eframe creation closure.
pub fn init(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();
    visuals.panel_fill = colors::BACKGROUND;
    visuals.window_fill = colors::BACKGROUND;
    visuals.extreme_bg_color = colors::SURFACE;
    visuals.override_text_color = Some(colors::TEXT);
    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style
        .text_styles
        .insert(TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace));
    style
        .text_styles
        .insert(TextStyle::Body, FontId::new(13.0, FontFamily::Proportional));
    ctx.set_style(style);
}

/// Color for one terminal log line, based on its tag.
pub fn log_line_color(line: &str) -> Color32 {
    if line.contains("failed") || line.starts_with("[exit") || line.contains("error") {
        colors::ERROR
    } else if line.starts_with('[') {
        colors::ACCENT
    } else {
        colors::TEXT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_lines_are_highlighted() {
        assert_eq!(log_line_color("[compile] failed (exit 1)"), colors::ERROR);
        assert_eq!(log_line_color("[exit 2]"), colors::ERROR);
        assert_eq!(
            log_line_color("[simulation exited with code 0]"),
            colors::ACCENT
        );
        assert_eq!(log_line_color("plain output"), colors::TEXT);
    }
}
