pub mod markdown;
pub mod widgets;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};
use std::time::Instant;

pub fn render(frame: &mut Frame, app: &mut App, now: Instant) {
    // Width available for text is total width - 2 (for borders)
    let available_width = frame.area().width.saturating_sub(2).max(1) as usize;

    let input_lines = if app.input_buffer.is_empty() {
        1
    } else {
        app.input_buffer.chars().count().div_ceil(available_width)
    };

    // Clamp lines: Min 1, Max a third of the screen
    let max_lines = (frame.area().height as usize / 3).saturating_sub(2).max(1);
    let actual_lines = input_lines.clamp(1, max_lines);

    #[allow(clippy::cast_possible_truncation)]
    let input_height = (actual_lines + 2) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),            // Feature and language selectors
            Constraint::Min(0),               // Output pane
            Constraint::Length(1),            // Status line
            Constraint::Length(1),            // Image preview
            Constraint::Length(3),            // Image path field
            Constraint::Length(input_height), // Prompt field
            Constraint::Length(1),            // Bottom keymap bar
        ])
        .split(frame.area());

    widgets::render_selectors(frame, app, chunks[0]);
    widgets::render_output(frame, app, chunks[1], now);
    widgets::render_status_bar(frame, app, chunks[2]);
    widgets::render_image_preview(frame, app, chunks[3]);
    widgets::render_image_field(frame, app, chunks[4]);
    widgets::render_input_field(frame, app, chunks[5]);
    widgets::render_bottom_bar(frame, app, chunks[6]);

    if app.show_help {
        widgets::render_help_window(frame, frame.area());
    }
}
