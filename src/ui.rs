use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, InputMode, LineInput};
use crate::session::{Role, UploadState};

const UPLOAD_CAP_LABEL: &str = "PDF only, max 10 MB";

/// Turn `**bold**` and `` `code` `` spans of an answer line into styled spans.
/// Unclosed markers are kept as literal text.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let next_bold = rest.find("**");
        let next_code = rest.find('`');

        let (start, marker, style) = match (next_bold, next_code) {
            (Some(b), Some(c)) if c < b => (c, "`", Style::default().fg(Color::Green)),
            (Some(b), _) => (b, "**", Style::default().add_modifier(Modifier::BOLD)),
            (None, Some(c)) => (c, "`", Style::default().fg(Color::Green)),
            (None, None) => break,
        };

        let after_open = &rest[start + marker.len()..];
        let Some(len) = after_open.find(marker).filter(|&len| len > 0) else {
            // No closing marker: emit everything up to and including the
            // opener literally and keep scanning after it.
            spans.push(Span::raw(rest[..start + marker.len()].to_string()));
            rest = after_open;
            continue;
        };

        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        spans.push(Span::styled(after_open[..len].to_string(), style));
        rest = &after_open[len + marker.len()..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // header, upload status, transcript, question input, footer
    let [header_area, status_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_upload_status(app, frame, status_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.input_mode == InputMode::FilePrompt {
        render_file_prompt(app, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" DocFlow - AI Document Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_upload_status(app: &App, frame: &mut Frame, area: Rect) {
    let upload = app.session.upload();

    let (label, color) = match upload.state {
        UploadState::Idle => ("NO DOCUMENT", Color::DarkGray),
        UploadState::Uploading => ("UPLOADING", Color::Yellow),
        UploadState::Success => ("READY", Color::Green),
        UploadState::Error => ("ERROR", Color::Red),
    };

    let message = match (&upload.message, upload.state) {
        (Some(msg), UploadState::Uploading) => {
            // Animated ellipsis replaces the static one
            let base = msg.trim_end_matches('.');
            format!("{}{}", base, ".".repeat((app.animation_frame as usize) + 1))
        }
        (Some(msg), _) => msg.clone(),
        (None, _) => "Press u to choose a PDF, or drop one onto the terminal".to_string(),
    };

    let title = match app.session.document() {
        Some(doc) => format!(" Document: {} ", doc.name),
        None => " Document ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_bottom(Line::from(format!(" {} ", UPLOAD_CAP_LABEL)).right_aligned());

    let line = Line::from(vec![
        Span::styled(format!(" {} ", label), Style::default().bg(color).fg(Color::Black).bold()),
        Span::raw(" "),
        Span::styled(message, Style::default().fg(color)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);
    // Inner size minus borders, used for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Chat ({}) ", app.backend.base_url()));

    let transcript = app.session.transcript();
    let awaiting = app.session.is_awaiting_answer();

    let chat_text = if transcript.is_empty() && !awaiting {
        Text::from(Span::styled(
            "Upload a PDF, then ask something about your document...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in transcript {
            let stamp = msg.created_at.format("%H:%M").to_string();
            let (who, color) = match msg.role {
                Role::User => ("You:", Color::Cyan),
                Role::Assistant => ("AI:", Color::Yellow),
            };
            lines.push(Line::from(vec![
                Span::styled(who, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {}", stamp), Style::default().fg(Color::DarkGray)),
            ]));

            match msg.role {
                Role::User => {
                    for line in msg.content.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                Role::Assistant => {
                    for line in msg.content.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
            }
            lines.push(Line::default());
        }

        if awaiting {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Visible slice of a field plus the cursor column inside it, scrolling
/// horizontally so the cursor stays in view.
fn visible_field(input: &LineInput, inner_width: usize) -> (String, u16) {
    let scroll_offset = if inner_width == 0 || input.cursor < inner_width {
        0
    } else {
        input.cursor - inner_width + 1
    };

    let visible: String = input
        .text
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    (visible, (input.cursor - scroll_offset) as u16)
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.session.can_ask();
    let editing = app.input_mode == InputMode::Editing;

    let border_color = if editing {
        Color::Yellow
    } else if enabled {
        Color::White
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask ");

    let inner_width = area.width.saturating_sub(2) as usize;

    if !enabled {
        let placeholder = Paragraph::new("Upload a PDF to start asking")
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    if app.query.text.is_empty() && !editing {
        let hint = Paragraph::new("Ask something about your document... (press i)")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let (visible, cursor_x) = visible_field(&app.query, inner_width);
    let input = Paragraph::new(visible)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" ASK ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        InputMode::FilePrompt => (" FILE ", Style::default().bg(Color::Magenta).fg(Color::White)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = match app.input_mode {
        InputMode::Normal => &[
            (" u ", " upload "),
            (" i ", " ask "),
            (" j/k ", " scroll "),
            (" g/G ", " top/bottom "),
            (" q ", " quit "),
        ],
        InputMode::Editing => &[(" Enter ", " send "), (" Esc ", " stop typing ")],
        InputMode::FilePrompt => &[(" Enter ", " upload "), (" Esc ", " cancel ")],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)];
    for (key, label) in pairs {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    if let Some(notice) = &app.notice {
        spans.push(Span::styled(
            format!("  {}", notice),
            Style::default().bg(Color::Black).fg(Color::Yellow),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_file_prompt(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 70.min(area.width.saturating_sub(4));
    let popup_height = 7;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Upload PDF ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Path to a PDF file. Enter to upload, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let (visible, cursor_x) = visible_field(&app.path, inner.width as usize);
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan)),
        input_area,
    );
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    let status = Paragraph::new(UPLOAD_CAP_LABEL).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, Rect::new(inner.x, inner.y + 4, inner.width, 1));
}
