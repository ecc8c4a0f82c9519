use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode};
use crate::document::path_from_drop;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::InputClosed => app.should_quit = true,
        AppEvent::UploadFinished(doc, result) => app.on_upload_finished(doc, result),
        AppEvent::AnswerReceived(result) => app.on_answer(result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    app.notice = None;

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
        InputMode::FilePrompt => handle_file_prompt(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        KeyCode::Char('u') | KeyCode::Char('o') => app.open_file_prompt(),
        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Tab => app.begin_editing(),

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit_query(),
        KeyCode::Backspace => app.query.backspace(),
        KeyCode::Delete => app.query.delete(),
        KeyCode::Left => app.query.left(),
        KeyCode::Right => app.query.right(),
        KeyCode::Home => app.query.home(),
        KeyCode::End => app.query.end(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::Char(c) => app.query.insert(c),
        _ => {}
    }
}

fn handle_file_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_file_prompt(),
        KeyCode::Enter => {
            if !app.path.text.trim().is_empty() {
                let path = path_from_drop(&app.path.text);
                app.start_upload(path);
            }
        }
        KeyCode::Backspace => app.path.backspace(),
        KeyCode::Delete => app.path.delete(),
        KeyCode::Left => app.path.left(),
        KeyCode::Right => app.path.right(),
        KeyCode::Home => app.path.home(),
        KeyCode::End => app.path.end(),
        KeyCode::Char(c) => app.path.insert(c),
        _ => {}
    }
}

/// Terminals deliver a dropped file as a paste of its path.
fn handle_paste(app: &mut App, text: &str) {
    match app.input_mode {
        InputMode::Editing => app.query.insert_str(text),
        InputMode::FilePrompt => {
            app.path.clear();
            app.path.insert_str(path_from_drop(text).to_string_lossy().as_ref());
        }
        InputMode::Normal => {
            let path = path_from_drop(text);
            if path.is_file() {
                app.start_upload(path);
            } else {
                app.notice = Some(format!("Ignored drop: {} is not a file", path.display()));
            }
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let over_chat = app
        .chat_area
        .map(|area| point_in_rect(mouse.column, mouse.row, area))
        .unwrap_or(false);
    if !over_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            for _ in 0..3 {
                app.scroll_down();
            }
        }
        MouseEventKind::ScrollUp => {
            for _ in 0..3 {
                app.scroll_up();
            }
        }
        _ => {}
    }
}
