// Markdown rendering for the output pane

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::render::RenderSink;

const CODE_RULE: &str = "──────────────────────────────────────────";

/// The rendered output pane: styled lines plus their visible text.
#[derive(Debug, Clone, Default)]
pub struct MarkdownView {
    lines: Vec<Line<'static>>,
    plain_text: String,
}

impl MarkdownView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    /// What a reader sees, without markup. This is what gets copied.
    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.plain_text.clear();
    }
}

impl RenderSink for MarkdownView {
    fn render(&mut self, markdown: &str) {
        let document = render_document(markdown);
        self.plain_text = document.text.join("\n");
        self.lines = document.lines;
    }
}

/// Styled lines for the terminal, and the text they carry without decoration.
///
/// Code fence rules and the code indent only appear in `lines`.
#[derive(Debug, Default)]
pub struct Document {
    pub lines: Vec<Line<'static>>,
    pub text: Vec<String>,
}

impl Document {
    fn push(&mut self, line: Line<'static>, text: String) {
        self.lines.push(line);
        self.text.push(text);
    }

    fn push_decoration(&mut self, line: Line<'static>) {
        self.lines.push(line);
    }
}

fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

/// Render a whole Markdown document, tracking fenced code blocks across lines.
pub fn render_document(markdown: &str) -> Document {
    let mut document = Document::default();
    let mut in_code_block = false;

    for content_line in markdown.lines() {
        if is_code_fence(content_line) {
            if in_code_block {
                document.push_decoration(Line::from(Span::styled(
                    format!("└{CODE_RULE}"),
                    Style::default().fg(Color::DarkGray),
                )));
            } else {
                let code_lang = extract_code_language(content_line);
                let lang_display = code_lang.as_deref().unwrap_or("code");
                document.push_decoration(Line::from(Span::styled(
                    format!("┌─ {lang_display} {CODE_RULE}"),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            in_code_block = !in_code_block;
        } else if in_code_block {
            document.push(
                Line::from(Span::styled(
                    format!("  {content_line}"),
                    Style::default().fg(Color::Green),
                )),
                content_line.to_string(),
            );
        } else if is_table_row(content_line) {
            // Table separators are just visual noise in a terminal
            if !is_table_separator(content_line) {
                let line = render_table_row(content_line);
                let text = line_text(&line).trim_start().to_string();
                document.push(line, text);
            }
        } else {
            let line = render_markdown_line(content_line);
            let text = line_text(&line);
            document.push(line, text);
        }
    }

    document
}

/// Check if a line is a markdown table row
pub fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.matches('|').count() >= 2
}

/// Check if a line is a table separator (|---|---|)
pub fn is_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.starts_with('|') || !trimmed.ends_with('|') {
        return false;
    }

    trimmed.contains('-') && trimmed.chars().all(|c| matches!(c, '|' | '-' | ' ' | ':'))
}

fn render_table_row(line: &str) -> Line<'static> {
    let content = line.trim().trim_start_matches('|').trim_end_matches('|');
    let cells: Vec<&str> = content.split('|').map(str::trim).collect();

    Line::from(Span::styled(
        format!("  {}", cells.join(" | ")),
        Style::default().fg(Color::Cyan),
    ))
}

/// Split an ordered list marker ("12. ") off the front of a line.
fn ordered_list_item(line: &str) -> Option<(&str, &str)> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    Some((&line[..digits], rest))
}

/// Inline styling: **bold**, *italic* and `code`.
fn render_inline(text: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut current_text = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();

                let mut bold_text = String::new();
                let mut found_close = false;
                while let Some(ch) = chars.next() {
                    if ch == '*' && chars.peek() == Some(&'*') {
                        chars.next();
                        found_close = true;
                        break;
                    }
                    bold_text.push(ch);
                }

                if found_close {
                    flush(&mut spans, &mut current_text);
                    spans.push(Span::styled(
                        bold_text,
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ));
                } else {
                    current_text.push_str("**");
                    current_text.push_str(&bold_text);
                }
            }
            '*' if chars.peek().is_some_and(|c| !c.is_whitespace()) => {
                let mut italic_text = String::new();
                let mut found_close = false;
                for ch in chars.by_ref() {
                    if ch == '*' {
                        found_close = true;
                        break;
                    }
                    italic_text.push(ch);
                }

                if found_close {
                    flush(&mut spans, &mut current_text);
                    spans.push(Span::styled(
                        italic_text,
                        Style::default().add_modifier(Modifier::ITALIC),
                    ));
                } else {
                    current_text.push('*');
                    current_text.push_str(&italic_text);
                }
            }
            '`' => {
                let mut code_text = String::new();
                let mut found_close = false;
                for ch in chars.by_ref() {
                    if ch == '`' {
                        found_close = true;
                        break;
                    }
                    code_text.push(ch);
                }

                if found_close {
                    flush(&mut spans, &mut current_text);
                    spans.push(Span::styled(code_text, Style::default().fg(Color::Magenta)));
                } else {
                    current_text.push('`');
                    current_text.push_str(&code_text);
                }
            }
            _ => current_text.push(ch),
        }
    }

    flush(&mut spans, &mut current_text);
    spans
}

fn flush(spans: &mut Vec<Span<'static>>, text: &mut String) {
    if !text.is_empty() {
        spans.push(Span::raw(std::mem::take(text)));
    }
}

/// Render a single line of markdown outside code blocks.
fn render_markdown_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    if trimmed.starts_with('#') {
        let level = trimmed.chars().take_while(|&c| c == '#').count();
        let header_text = trimmed[level..].trim();
        let color = match level {
            1 => Color::Yellow,
            2 => Color::Cyan,
            _ => Color::Blue,
        };
        return Line::from(Span::styled(
            header_text.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    if let Some(rest) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        let mut spans = vec![Span::styled(
            format!("{indent}• "),
            Style::default().fg(Color::Cyan),
        )];
        spans.extend(render_inline(rest.trim()));
        return Line::from(spans);
    }

    if let Some((number, rest)) = ordered_list_item(trimmed) {
        let mut spans = vec![Span::styled(
            format!("{indent}{number}. "),
            Style::default().fg(Color::Cyan),
        )];
        spans.extend(render_inline(rest.trim()));
        return Line::from(spans);
    }

    if let Some(quote) = trimmed.strip_prefix('>') {
        let mut spans = vec![Span::styled("│ ", Style::default().fg(Color::DarkGray))];
        spans.extend(render_inline(quote.trim_start()));
        return Line::from(spans);
    }

    let spans = render_inline(line);
    if spans.is_empty() {
        Line::from("")
    } else {
        Line::from(spans)
    }
}

/// Detect if a line is a code block fence
pub fn is_code_fence(line: &str) -> bool {
    line.trim().starts_with("```")
}

/// Extract language from code fence
pub fn extract_code_language(line: &str) -> Option<String> {
    line.trim()
        .strip_prefix("```")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(ToString::to_string)
}
