//! UI-agnostic chat session state
//!
//! [`ChatSession`] owns the upload state, the selected document and the
//! transcript. Every change goes through one of its methods; the TUI and the
//! CLI both drive the same transitions and only differ in how they run the
//! network calls in between.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::backend::UploadReceipt;
use crate::document::SelectedDocument;
use crate::error::Result;

pub const NOT_PDF_MESSAGE: &str = "Please select a PDF file.";
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Make sure the backend is running.";
pub const ASK_FAILED_MESSAGE: &str = "Error: Failed to get response from server";
pub const EMPTY_ANSWER_MESSAGE: &str = "Error: No response from server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
    Success,
    Error,
}

/// Upload progress plus whatever the status line should say about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadStatus {
    pub state: UploadState,
    pub message: Option<String>,
    pub chunks: Option<u64>,
}

/// A chat message in the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Local>,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Local::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ChatSession {
    upload: UploadStatus,
    document: Option<SelectedDocument>,
    transcript: Vec<Message>,
    awaiting_answer: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload(&self) -> &UploadStatus {
        &self.upload
    }

    pub fn upload_state(&self) -> UploadState {
        self.upload.state
    }

    pub fn document(&self) -> Option<&SelectedDocument> {
        self.document.as_ref()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn is_awaiting_answer(&self) -> bool {
        self.awaiting_answer
    }

    pub fn can_ask(&self) -> bool {
        self.upload.state == UploadState::Success
    }

    /// Pick a file for upload.
    ///
    /// A non-PDF selection moves to `Error` and returns the validation error;
    /// the caller must not contact the backend. Otherwise the document
    /// replaces any previous one, the state moves to `Uploading` and the
    /// returned document is what the caller should send.
    pub fn select_document(&mut self, path: impl Into<std::path::PathBuf>) -> Result<SelectedDocument> {
        match SelectedDocument::pdf(path) {
            Ok(doc) => {
                tracing::debug!(file = %doc.name, "document selected");
                self.upload = UploadStatus {
                    state: UploadState::Uploading,
                    message: Some(format!("Uploading {}...", doc.name)),
                    chunks: None,
                };
                self.document = Some(doc.clone());
                Ok(doc)
            }
            Err(err) => {
                tracing::info!(error = %err, "rejected non-PDF selection");
                self.upload = UploadStatus {
                    state: UploadState::Error,
                    message: Some(NOT_PDF_MESSAGE.to_string()),
                    chunks: None,
                };
                Err(err)
            }
        }
    }

    /// Apply the outcome of the upload request for `uploaded`. Labels come
    /// from the document the response belongs to, which is not necessarily
    /// the current selection.
    pub fn finish_upload(&mut self, uploaded: &SelectedDocument, outcome: Result<UploadReceipt>) {
        let name = &uploaded.name;

        match outcome {
            Ok(receipt) => {
                self.upload = UploadStatus {
                    state: UploadState::Success,
                    message: Some(format!("{} uploaded. {} chunks indexed.", name, receipt.chunks)),
                    chunks: Some(receipt.chunks),
                };
                self.transcript.push(Message::new(
                    Role::Assistant,
                    format!("I've read **{}**. Ask me anything about it.", name),
                ));
            }
            Err(err) => {
                tracing::warn!(file = %name, error = %err, "upload failed");
                self.upload = UploadStatus {
                    state: UploadState::Error,
                    message: Some(UPLOAD_FAILED_MESSAGE.to_string()),
                    chunks: None,
                };
            }
        }
    }

    /// Record a question and return the text to send, or `None` if asking is
    /// not allowed right now. The user turn is appended before any answer
    /// exists. Whitespace only decides emptiness; the question is kept and
    /// sent exactly as typed.
    pub fn submit_question(&mut self, input: &str) -> Option<String> {
        if input.trim().is_empty() || !self.can_ask() {
            return None;
        }

        self.transcript.push(Message::new(Role::User, input));
        self.awaiting_answer = true;
        Some(input.to_string())
    }

    /// Apply the outcome of an ask request. Answers are appended in the
    /// order they arrive.
    pub fn finish_ask(&mut self, outcome: Result<String>) {
        let content = match outcome {
            Ok(answer) if answer.trim().is_empty() => EMPTY_ANSWER_MESSAGE.to_string(),
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(error = %err, "ask failed");
                ASK_FAILED_MESSAGE.to_string()
            }
        };
        self.transcript.push(Message::new(Role::Assistant, content));
        self.awaiting_answer = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocflowError;
    use reqwest::StatusCode;

    fn receipt(chunks: u64) -> UploadReceipt {
        UploadReceipt {
            status: Some("ok".to_string()),
            chunks,
        }
    }

    fn network_error() -> DocflowError {
        DocflowError::Status {
            url: "http://127.0.0.1:8000/ask".to_string(),
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        }
    }

    fn ready_session() -> ChatSession {
        let mut session = ChatSession::new();
        let doc = session.select_document("report.pdf").unwrap();
        session.finish_upload(&doc, Ok(receipt(12)));
        session
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = ChatSession::new();
        assert_eq!(session.upload_state(), UploadState::Idle);
        assert!(session.transcript().is_empty());
        assert!(!session.can_ask());
    }

    #[test]
    fn test_non_pdf_selection_sets_error() {
        let mut session = ChatSession::new();
        let result = session.select_document("photo.png");

        assert!(result.is_err());
        assert_eq!(session.upload_state(), UploadState::Error);
        assert_eq!(session.upload().message.as_deref(), Some(NOT_PDF_MESSAGE));
        assert!(session.document().is_none());
    }

    #[test]
    fn test_upload_success_transitions() {
        let mut session = ChatSession::new();
        assert_eq!(session.upload_state(), UploadState::Idle);

        let doc = session.select_document("report.pdf").unwrap();
        assert_eq!(session.upload_state(), UploadState::Uploading);
        assert!(!session.can_ask());

        session.finish_upload(&doc, Ok(receipt(12)));
        assert_eq!(session.upload_state(), UploadState::Success);
        assert_eq!(session.upload().chunks, Some(12));
        assert!(session
            .upload()
            .message
            .as_deref()
            .unwrap()
            .ends_with("12 chunks indexed."));
        assert!(session.can_ask());
    }

    #[test]
    fn test_upload_success_seeds_greeting() {
        let session = ready_session();
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, Role::Assistant);
        assert!(transcript[0].content.contains("report.pdf"));
    }

    #[test]
    fn test_upload_failure_sets_fixed_message() {
        let mut session = ChatSession::new();
        let doc = session.select_document("report.pdf").unwrap();
        session.finish_upload(&doc, Err(network_error()));

        assert_eq!(session.upload_state(), UploadState::Error);
        assert_eq!(session.upload().message.as_deref(), Some(UPLOAD_FAILED_MESSAGE));
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_new_selection_replaces_document() {
        let mut session = ready_session();
        session.select_document("other.pdf").unwrap();

        assert_eq!(session.document().unwrap().name, "other.pdf");
        assert_eq!(session.upload_state(), UploadState::Uploading);
        // Transcript survives a re-upload.
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn test_late_upload_response_keeps_its_own_name() {
        let mut session = ChatSession::new();
        let first = session.select_document("a.pdf").unwrap();
        let _second = session.select_document("b.pdf").unwrap();

        // a.pdf's response arrives after b.pdf was picked.
        session.finish_upload(&first, Ok(receipt(3)));

        assert_eq!(
            session.upload().message.as_deref(),
            Some("a.pdf uploaded. 3 chunks indexed.")
        );
        assert!(session.transcript()[0].content.contains("**a.pdf**"));
        assert!(!session.transcript()[0].content.contains("b.pdf"));
    }

    #[test]
    fn test_ask_before_upload_is_ignored() {
        let mut session = ChatSession::new();
        assert_eq!(session.submit_question("What is this?"), None);
        assert!(session.transcript().is_empty());
        assert!(!session.is_awaiting_answer());
    }

    #[test]
    fn test_ask_while_uploading_is_ignored() {
        let mut session = ChatSession::new();
        session.select_document("report.pdf").unwrap();
        assert_eq!(session.submit_question("What is this?"), None);
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_question_is_sent_as_typed() {
        let mut session = ready_session();

        let question = session.submit_question("  indented\n  code ").unwrap();
        assert_eq!(question, "  indented\n  code ");
        assert_eq!(session.transcript().last().unwrap().content, "  indented\n  code ");
    }

    #[test]
    fn test_blank_question_is_ignored() {
        let mut session = ready_session();
        assert_eq!(session.submit_question("   \t"), None);
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn test_ask_appends_user_then_assistant() {
        let mut session = ready_session();

        let question = session.submit_question("Summarize this document").unwrap();
        assert_eq!(question, "Summarize this document");
        assert!(session.is_awaiting_answer());
        assert_eq!(session.transcript().last().unwrap().role, Role::User);

        session.finish_ask(Ok("This document is about X.".to_string()));
        assert!(!session.is_awaiting_answer());

        let turns = &session.transcript()[1..];
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "Summarize this document");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].content, "This document is about X.");
    }

    #[test]
    fn test_failed_ask_appends_fallback() {
        let mut session = ready_session();
        session.submit_question("Anything?").unwrap();
        session.finish_ask(Err(network_error()));

        let last = session.transcript().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, ASK_FAILED_MESSAGE);
        assert!(!session.is_awaiting_answer());
        assert_eq!(session.transcript().len(), 3);
    }

    #[test]
    fn test_empty_answer_appends_placeholder() {
        let mut session = ready_session();
        session.submit_question("Anything?").unwrap();
        session.finish_ask(Ok(String::new()));
        assert_eq!(session.transcript().last().unwrap().content, EMPTY_ANSWER_MESSAGE);
    }

    #[test]
    fn test_overlapping_asks_append_in_arrival_order() {
        let mut session = ready_session();
        session.submit_question("first").unwrap();
        session.submit_question("second").unwrap();

        session.finish_ask(Ok("answer to second".to_string()));
        // The flag is cleared by whichever reply lands first.
        assert!(!session.is_awaiting_answer());
        session.finish_ask(Ok("answer to first".to_string()));

        let contents: Vec<&str> = session.transcript()[1..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec!["first", "second", "answer to second", "answer to first"]
        );
    }
}
