//! Errors raised by the client.
//!
//! Every failure falls into one of two buckets the UI cares about:
//! [`ErrorKind::Validation`] (handled locally, shown inline) and
//! [`ErrorKind::Network`] (anything that went wrong talking to the backend).

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocflowError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
}

#[derive(Debug, Error)]
pub enum DocflowError {
    /// Declared type of the selected file is not PDF.
    #[error("{name} is not a PDF (declared type: {mime})")]
    NotPdf { name: String, mime: String },

    #[error("could not read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl DocflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocflowError::NotPdf { .. } => ErrorKind::Validation,
            DocflowError::ReadFile { .. }
            | DocflowError::Transport { .. }
            | DocflowError::Status { .. }
            | DocflowError::Decode { .. } => ErrorKind::Network,
        }
    }
}
