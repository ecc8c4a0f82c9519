use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::document::{SelectedDocument, PDF_MIME};
use crate::error::{DocflowError, Result};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Body of a successful `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub status: Option<String>,
    pub chunks: u64,
}

#[derive(Deserialize)]
struct AskResponse {
    #[serde(default)]
    answer: String,
}

/// Client for the document ingestion / question answering service.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send the document as multipart field `file`.
    pub async fn upload(&self, doc: &SelectedDocument) -> Result<UploadReceipt> {
        let url = format!("{}/upload", self.base_url);
        let bytes = doc.read().await?;

        tracing::info!(file = %doc.name, bytes = bytes.len(), %url, "uploading document");

        let part = Part::bytes(bytes)
            .file_name(doc.name.clone())
            .mime_str(PDF_MIME)
            .map_err(|source| DocflowError::Transport {
                url: url.clone(),
                source,
            })?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| DocflowError::Transport {
                url: url.clone(),
                source,
            })?;

        let response = ensure_success(&url, response).await?;
        let receipt: UploadReceipt = response
            .json()
            .await
            .map_err(|source| DocflowError::Decode { url, source })?;

        tracing::info!(file = %doc.name, chunks = receipt.chunks, "document indexed");
        Ok(receipt)
    }

    /// Ask a question about the uploaded document. The question goes in the
    /// `query` URL parameter.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let url = format!("{}/ask", self.base_url);

        tracing::debug!(%url, chars = question.chars().count(), "asking backend");

        let response = self
            .client
            .post(&url)
            .query(&[("query", question)])
            .send()
            .await
            .map_err(|source| DocflowError::Transport {
                url: url.clone(),
                source,
            })?;

        let response = ensure_success(&url, response).await?;
        let body: AskResponse = response
            .json()
            .await
            .map_err(|source| DocflowError::Decode { url, source })?;

        Ok(body.answer)
    }
}

async fn ensure_success(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%url, %status, "backend request failed");
    Err(DocflowError::Status {
        url: url.to_string(),
        status,
        body,
    })
}
