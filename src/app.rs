use std::path::{Path, PathBuf};

use ratatui::layout::Rect;

use crate::backend::{BackendClient, UploadReceipt};
use crate::document::SelectedDocument;
use crate::error::Result as DocflowResult;
use crate::session::{ChatSession, UploadState};
use crate::tui::{AppEvent, EventSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing a question.
    Editing,
    /// Typing a path in the file prompt popup.
    FilePrompt,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text field with a character-based cursor.
#[derive(Debug, Clone, Default)]
pub struct LineInput {
    pub text: String,
    pub cursor: usize,
}

impl LineInput {
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars().filter(|c| !c.is_control()) {
            self.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    pub session: ChatSession,
    pub backend: BackendClient,
    events: EventSender,

    pub query: LineInput,
    pub path: LineInput,

    /// One-line hint shown in the footer until the next key press.
    pub notice: Option<String>,

    // Transcript scrolling, sizes are refreshed on every render
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_area: Option<Rect>,

    // 0-2 for ellipsis animation
    pub animation_frame: u8,

    /// Directory the file prompt starts in; follows the last upload.
    pub start_dir: Option<PathBuf>,
}

impl App {
    pub fn new(backend: BackendClient, events: EventSender, start_dir: Option<PathBuf>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            session: ChatSession::new(),
            backend,
            events,
            query: LineInput::default(),
            path: LineInput::default(),
            notice: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            animation_frame: 0,
            start_dir,
        }
    }

    pub fn open_file_prompt(&mut self) {
        let prefill = self
            .start_dir
            .as_ref()
            .map(|dir| {
                let mut s = dir.display().to_string();
                if !s.ends_with(std::path::MAIN_SEPARATOR) {
                    s.push(std::path::MAIN_SEPARATOR);
                }
                s
            })
            .unwrap_or_default();
        self.path.set(prefill);
        self.input_mode = InputMode::FilePrompt;
    }

    pub fn close_file_prompt(&mut self) {
        self.path.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Validate the file and, if it is a PDF, upload it in the background.
    /// Rejected files never reach the backend.
    pub fn start_upload(&mut self, path: impl AsRef<Path>) {
        self.input_mode = InputMode::Normal;
        self.path.clear();

        let Ok(doc) = self.session.select_document(path.as_ref()) else {
            return;
        };

        let backend = self.backend.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.upload(&doc).await;
            let _ = events.send(AppEvent::UploadFinished(doc, result));
        });
    }

    pub fn on_upload_finished(&mut self, doc: SelectedDocument, result: DocflowResult<UploadReceipt>) {
        let succeeded = result.is_ok();
        self.session.finish_upload(&doc, result);

        if succeeded {
            if let Some(dir) = doc.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                self.start_dir = Some(dir.to_path_buf());
            }
        }
        self.scroll_chat_to_bottom();
    }

    /// Enter question editing; only allowed once a document is indexed.
    pub fn begin_editing(&mut self) {
        if self.session.can_ask() {
            self.input_mode = InputMode::Editing;
        } else {
            self.notice = Some(match self.session.upload_state() {
                UploadState::Uploading => "Wait for the upload to finish".to_string(),
                _ => "Upload a PDF first (press u)".to_string(),
            });
        }
    }

    /// Send the typed question. The user turn shows up and the input clears
    /// right away; the answer arrives later as an [`AppEvent::AnswerReceived`].
    pub fn submit_query(&mut self) {
        let Some(question) = self.session.submit_question(&self.query.text) else {
            return;
        };
        self.query.clear();
        self.scroll_chat_to_bottom();

        let backend = self.backend.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.ask(&question).await;
            let _ = events.send(AppEvent::AnswerReceived(result));
        });
    }

    pub fn on_answer(&mut self, result: DocflowResult<String>) {
        self.session.finish_ask(result);
        self.scroll_chat_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_awaiting_answer() || self.session.upload_state() == UploadState::Uploading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half = (self.chat_height / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_add(half).min(self.max_scroll());
    }

    pub fn scroll_half_page_up(&mut self) {
        let half = (self.chat_height / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_sub(half);
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        // Fall back to a sane size before the first render
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.transcript_lines().saturating_sub(visible_height)
    }

    /// Rendered height of the transcript, including the thinking indicator.
    /// Saturates at `u16::MAX`, the furthest ratatui can scroll.
    pub fn transcript_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };

        let mut total_lines: usize = 0;
        for msg in self.session.transcript() {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "AI:")
            for line in msg.content.lines() {
                let rows = line.chars().count().div_ceil(wrap_width).max(1);
                total_lines = total_lines.saturating_add(rows);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.session.is_awaiting_answer() {
            total_lines = total_lines.saturating_add(2); // "AI:" + "Thinking..."
        }

        u16::try_from(total_lines).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(BackendClient::new("http://127.0.0.1:9"), tx, None), rx)
    }

    #[test]
    fn test_line_input_handles_multibyte() {
        let mut input = LineInput::default();
        input.insert_str("héllo");
        input.left();
        input.left();
        input.backspace();
        assert_eq!(input.text, "hélo");
        input.home();
        input.delete();
        assert_eq!(input.text, "élo");
        input.end();
        input.insert('!');
        assert_eq!(input.text, "élo!");
    }

    #[test]
    fn test_insert_str_drops_newlines() {
        let mut input = LineInput::default();
        input.insert_str("two\nlines");
        assert_eq!(input.text, "twolines");
    }

    #[test]
    fn test_file_prompt_prefills_start_dir() {
        let (mut app, _rx) = app();
        app.start_dir = Some(PathBuf::from("/papers"));
        app.open_file_prompt();
        assert_eq!(app.input_mode, InputMode::FilePrompt);
        assert_eq!(app.path.text, format!("/papers{}", std::path::MAIN_SEPARATOR));
    }

    #[tokio::test]
    async fn test_rejected_upload_sends_nothing() {
        let (mut app, mut rx) = app();
        app.start_upload("slides.pptx");

        assert_eq!(app.session.upload_state(), UploadState::Error);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported_back() {
        let (mut app, mut rx) = app();
        app.start_upload("/no/such/report.pdf");
        assert_eq!(app.session.upload_state(), UploadState::Uploading);

        let event = rx.recv().await.unwrap();
        let AppEvent::UploadFinished(doc, result) = event else {
            panic!("unexpected event: {event:?}");
        };
        assert_eq!(doc.name, "report.pdf");
        app.on_upload_finished(doc, result);
        assert_eq!(app.session.upload_state(), UploadState::Error);
    }

    #[test]
    fn test_begin_editing_requires_upload() {
        let (mut app, _rx) = app();
        app.begin_editing();
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.notice.is_some());
    }

    #[test]
    fn test_successful_upload_moves_start_dir() {
        let (mut app, _rx) = app();
        let doc = app.session.select_document("/home/me/papers/report.pdf").unwrap();
        app.on_upload_finished(doc, Ok(UploadReceipt { status: None, chunks: 4 }));
        assert_eq!(app.start_dir, Some(PathBuf::from("/home/me/papers")));
    }

    #[test]
    fn test_start_dir_follows_uploaded_document() {
        let (mut app, _rx) = app();
        let first = app.session.select_document("/home/me/papers/a.pdf").unwrap();
        app.session.select_document("/tmp/b.pdf").unwrap();

        app.on_upload_finished(first, Ok(UploadReceipt { status: None, chunks: 1 }));
        assert_eq!(app.start_dir, Some(PathBuf::from("/home/me/papers")));
    }

    #[test]
    fn test_huge_answer_saturates_line_count() {
        let (mut app, _rx) = app();
        app.chat_height = 10;
        app.chat_width = 40;
        let doc = app.session.select_document("report.pdf").unwrap();
        app.on_upload_finished(doc, Ok(UploadReceipt { status: None, chunks: 1 }));
        app.session.submit_question("q").unwrap();

        app.on_answer(Ok("line\n".repeat(70_000)));

        assert_eq!(app.transcript_lines(), u16::MAX);
        assert_eq!(app.chat_scroll, u16::MAX - 10);
        app.scroll_down();
        assert_eq!(app.chat_scroll, u16::MAX - 10);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let (mut app, _rx) = app();
        app.chat_height = 10;
        app.chat_width = 40;
        app.scroll_down();
        assert_eq!(app.chat_scroll, 0);
        app.scroll_up();
        assert_eq!(app.chat_scroll, 0);
    }
}
