use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::RelayError;

/// The backend's classification of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadVerdict {
    /// 200 with `status: "processed"`.
    Processed,
    /// 200 with `status: "duplicate"`; `file_key` names the stored copy.
    Duplicate { file_key: String },
    /// Non-200 response; body passed through verbatim, no JSON parsing.
    Rejected { status: u16, body: String },
    /// 200 with a payload we do not recognize.
    Unexpected(Value),
}

/// Seam between the conversation logic and the remote backend. One upload
/// attempt per call, no retries: callers decide whether to re-invoke (the
/// overwrite retry is a fresh, explicit call).
#[async_trait]
pub trait UploadBackend: Send + Sync {
    async fn upload(
        &self,
        path: &Path,
        file_name: &str,
        overwrite: bool,
    ) -> Result<UploadVerdict, RelayError>;
}

/// HTTP client for the file-processing backend.
pub struct BackendClient {
    http: reqwest::Client,
    endpoint: Url,
    source_tag: String,
}

impl BackendClient {
    /// The timeout is generous so large files on slow backends make it
    /// through; a timeout surfaces as a transport error, never a retry.
    pub fn new(endpoint: Url, source_tag: String, timeout: Duration) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            source_tag,
        })
    }
}

#[async_trait]
impl UploadBackend for BackendClient {
    async fn upload(
        &self,
        path: &Path,
        file_name: &str,
        overwrite: bool,
    ) -> Result<UploadVerdict, RelayError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| RelayError::Staging(format!("read {}: {}", path.display(), err)))?;

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("source", self.source_tag.clone());
        if overwrite {
            form = form.text("overwrite", "true");
        }

        debug!(file = %file_name, overwrite, endpoint = %self.endpoint, "uploading to backend");
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Ok(UploadVerdict::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        Ok(interpret_payload(payload))
    }
}

#[derive(Debug, Deserialize, Default)]
struct VerdictEnvelope {
    status: Option<String>,
    file_key: Option<String>,
}

/// Map a 200 payload onto a verdict. Anything that is not a well-formed
/// processed/duplicate envelope is preserved verbatim as `Unexpected`.
fn interpret_payload(payload: Value) -> UploadVerdict {
    let envelope: VerdictEnvelope =
        serde_json::from_value(payload.clone()).unwrap_or_default();

    match (envelope.status.as_deref(), envelope.file_key) {
        (Some("processed"), _) => UploadVerdict::Processed,
        (Some("duplicate"), Some(file_key)) => UploadVerdict::Duplicate { file_key },
        _ => UploadVerdict::Unexpected(payload),
    }
}
