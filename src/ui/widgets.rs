use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::Instant;

use crate::app::{error_text, App, Focus, GenerationState, Output};

pub fn render_help_window(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            "StudyMate - Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("General:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Ctrl+H        - Show/hide this help"),
        Line::from("  Ctrl+Q        - Quit application"),
        Line::from("  Ctrl+C        - Quit application (press twice)"),
        Line::from(""),
        Line::from(Span::styled("Prompt:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Enter         - Generate (or attach, in the image field)"),
        Line::from("  Ctrl+F / B    - Next / previous feature"),
        Line::from("  Ctrl+L        - Next language"),
        Line::from("  Tab           - Switch prompt / image field"),
        Line::from("  Ctrl+X        - Remove attached image"),
        Line::from("  Esc           - Cancel generation"),
        Line::from(""),
        Line::from(Span::styled("Output:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Ctrl+Y        - Copy response"),
        Line::from("  Up/Down       - Scroll"),
        Line::from("  PgUp/PgDn     - Scroll"),
        Line::from("  Home/End      - Jump to start/end"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    let popup_width = 62;
    let popup_height = 25;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width.min(area.width),
        height: popup_height.min(area.height),
    };

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help_paragraph, popup_area);
}

pub fn render_selectors(frame: &mut Frame, app: &App, area: Rect) {
    let highlight = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let label = Style::default().fg(Color::DarkGray);

    let line = Line::from(vec![
        Span::styled(" Feature: ", label),
        Span::styled(format!("‹ {} ›", app.feature.label()), highlight),
        Span::styled("   Language: ", label),
        Span::styled(format!("‹ {} ›", app.language()), highlight),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn output_lines(app: &App) -> Vec<Line<'static>> {
    match &app.output {
        Output::Placeholder(text) => vec![Line::from(Span::styled(
            text.clone(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))],
        Output::Response => app.view.lines().to_vec(),
        Output::Error(message) => vec![Line::from(Span::styled(
            error_text(message),
            Style::default().fg(Color::Red),
        ))],
    }
}

pub fn render_output(frame: &mut Frame, app: &mut App, area: Rect, now: Instant) {
    let lines = output_lines(app);

    // Account for wrapping to find the true visual height
    let available_width = area.width.saturating_sub(2).max(1) as usize;
    let total_visual_lines: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(available_width).max(1))
        .sum();

    let visible_height = area.height.saturating_sub(2) as usize;
    let max_scroll = total_visual_lines.saturating_sub(visible_height);
    let actual_scroll = app.scroll_offset.min(max_scroll);

    // Sync the clamped scroll back to the app state
    if app.scroll_offset != actual_scroll {
        app.scroll_offset = actual_scroll;
    }

    let copy_label = app.copy_label(now);
    let copy_style = if copy_label == crate::app::COPIED_LABEL {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title_top(Line::from(" Response "))
        .title_top(
            Line::from(Span::styled(format!(" {copy_label} (Ctrl+Y) "), copy_style))
                .right_aligned(),
        );

    let output = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(output, area);
}

pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (state_text, color) = match &app.state {
        GenerationState::Idle => ("", Color::Green),
        GenerationState::Waiting => ("[Generating...] ", Color::Yellow),
        GenerationState::Streaming => ("[Streaming] ", Color::Cyan),
        GenerationState::Errored(_) => ("[Error] ", Color::Red),
    };

    let mut spans = vec![Span::styled(
        state_text,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(message) = &app.status_message {
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::Yellow)));
    }
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        app.model.clone(),
        Style::default().fg(Color::DarkGray),
    ));

    let status = Paragraph::new(Line::from(spans)).alignment(Alignment::Right);
    frame.render_widget(status, area);
}

pub fn render_image_preview(frame: &mut Frame, app: &App, area: Rect) {
    let label = Style::default().fg(Color::DarkGray);

    let mut spans = vec![Span::styled(" Image: ", label)];
    match &app.image {
        Some(image) => {
            spans.push(Span::styled(image.describe(), Style::default().fg(Color::Magenta)));
            spans.push(Span::styled("  (Ctrl+X to remove)", label));
        }
        None => spans.push(Span::styled("none", label)),
    }

    if app.image_loading {
        spans.push(Span::styled("  Loading image...", Style::default().fg(Color::Yellow)));
    }
    if let Some(error) = &app.image_error {
        spans.push(Span::styled(format!("  {error}"), Style::default().fg(Color::Red)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn field_block(title: &'static str, focused: bool) -> Block<'static> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border))
}

fn field_paragraph<'a>(value: &'a str, placeholder: &'a str, focused: bool) -> Paragraph<'a> {
    let (text, style) = if value.is_empty() {
        (placeholder, Style::default().fg(Color::Gray))
    } else if focused {
        (value, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    } else {
        (value, Style::default().fg(Color::White))
    };
    Paragraph::new(text).style(style).wrap(Wrap { trim: false })
}

pub fn render_image_field(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::ImagePath;
    let field = field_paragraph(
        &app.image_input,
        "Path to an image (or a data: URL), Enter to attach",
        focused,
    )
    .block(field_block(" Image ", focused));

    frame.render_widget(field, area);
}

pub fn render_input_field(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Prompt;
    let field = field_paragraph(&app.input_buffer, "Type your question or text...", focused)
        .block(field_block(" Prompt ", focused));

    frame.render_widget(field, area);
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            "Enter: Generate | Ctrl+F: Feature | Ctrl+L: Language | Ctrl+Y: Copy | Ctrl+H: Help",
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style);

    frame.render_widget(bar, area);
}
