//! DocFlow is a terminal client for a document Q&A backend: upload a PDF,
//! then chat with it.
//!
//! - [`session`] holds the upload state and transcript and every transition
//!   between them.
//! - [`backend`] talks to the `/upload` and `/ask` endpoints.
//! - [`app`], [`handler`], [`ui`] and [`tui`] make up the interactive
//!   terminal front end.

pub mod app;
pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod handler;
pub mod logging;
pub mod session;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use backend::{BackendClient, UploadReceipt};
pub use config::Config;
pub use document::SelectedDocument;
pub use error::{DocflowError, ErrorKind};
pub use session::{ChatSession, Message, Role, UploadState};
