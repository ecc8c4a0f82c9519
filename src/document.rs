//! The document the user picked for upload.

use std::path::{Path, PathBuf};

use crate::error::{DocflowError, Result};

pub const PDF_MIME: &str = "application/pdf";

/// A file reference chosen by the user. Only the declared type is checked;
/// the bytes are read when the upload starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedDocument {
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
}

impl SelectedDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = declared_mime(&path).to_string();
        Self { path, name, mime }
    }

    /// Build a selection and reject it unless its declared type is PDF.
    pub fn pdf(path: impl Into<PathBuf>) -> Result<Self> {
        let doc = Self::new(path);
        if !doc.is_pdf() {
            return Err(DocflowError::NotPdf {
                name: doc.name,
                mime: doc.mime,
            });
        }
        Ok(doc)
    }

    pub fn is_pdf(&self) -> bool {
        self.mime.contains("pdf")
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| DocflowError::ReadFile {
                path: self.path.clone(),
                source,
            })
    }
}

/// Map a file extension to the MIME type a file picker would report.
pub fn declared_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => PDF_MIME,
        "txt" | "text" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Turn whatever a terminal pastes on file drop into a path.
///
/// Terminals differ: some quote the path, some escape spaces, some send a
/// `file://` URI.
pub fn path_from_drop(text: &str) -> PathBuf {
    let trimmed = text.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);
    let without_scheme = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    PathBuf::from(without_scheme.replace("\\ ", " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extension_is_accepted() {
        let doc = SelectedDocument::pdf("/tmp/report.pdf").unwrap();
        assert_eq!(doc.name, "report.pdf");
        assert_eq!(doc.mime, PDF_MIME);
    }

    #[test]
    fn test_uppercase_extension_is_accepted() {
        assert!(SelectedDocument::pdf("/tmp/SCAN.PDF").is_ok());
    }

    #[test]
    fn test_non_pdf_is_rejected() {
        let err = SelectedDocument::pdf("notes.txt").unwrap_err();
        match err {
            DocflowError::NotPdf { name, mime } => {
                assert_eq!(name, "notes.txt");
                assert_eq!(mime, "text/plain");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_extension_is_rejected() {
        assert!(SelectedDocument::pdf("README").is_err());
    }

    #[test]
    fn test_path_from_drop() {
        assert_eq!(path_from_drop("'/tmp/a b.pdf'\n"), PathBuf::from("/tmp/a b.pdf"));
        assert_eq!(path_from_drop("/tmp/a\\ b.pdf"), PathBuf::from("/tmp/a b.pdf"));
        assert_eq!(path_from_drop("file:///tmp/x.pdf"), PathBuf::from("/tmp/x.pdf"));
    }

    #[tokio::test]
    async fn test_read_reports_missing_file() {
        let doc = SelectedDocument::new("/definitely/not/here.pdf");
        let err = doc.read().await.unwrap_err();
        assert!(matches!(err, DocflowError::ReadFile { .. }));
    }

    #[tokio::test]
    async fn test_read_returns_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4\n").unwrap();

        let doc = SelectedDocument::pdf(&path).unwrap();
        assert_eq!(doc.read().await.unwrap(), b"%PDF-1.4\n");
    }
}
