//! Artifact upload stage.

use super::Stage;
use crate::context::RunContext;
use crate::core::{FailureCause, StageOutcome};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::{debug, info};

/// Default environment variable holding the upload token.
pub const DEFAULT_TOKEN_ENV: &str = "ZIPLINE_TOKEN";

/// Uploads one artifact file to an HTTP endpoint as multipart form data.
///
/// The authorization token is read from an environment variable at
/// execution time, so the credential never appears in a manifest or a
/// log line. A missing token, an unreadable artifact, and a non-2xx
/// response are all stage failures.
#[derive(Debug, Clone)]
pub struct UploadStage {
    name: String,
    url: String,
    file: PathBuf,
    token_env: String,
    field_name: String,
    client: reqwest::Client,
}

impl UploadStage {
    /// Creates a stage that uploads `file` to `url`.
    ///
    /// The token is read from [`DEFAULT_TOKEN_ENV`] unless overridden.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            file: file.into(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            field_name: "file".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Sets the environment variable to read the token from.
    #[must_use]
    pub fn with_token_env(mut self, token_env: impl Into<String>) -> Self {
        self.token_env = token_env.into();
        self
    }

    /// Sets the multipart field name (default `file`).
    #[must_use]
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Replaces the HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn artifact_name(&self) -> String {
        self.file
            .file_name()
            .map_or_else(|| "artifact".to_string(), |n| n.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl Stage for UploadStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &RunContext) -> StageOutcome {
        let token = match std::env::var(&self.token_env) {
            Ok(token) if !token.is_empty() => token,
            _ => {
                return StageOutcome::fail_message(format!(
                    "environment variable '{}' is not set",
                    self.token_env
                ))
            }
        };

        let bytes = match tokio::fs::read(&self.file).await {
            Ok(bytes) => bytes,
            Err(err) => {
                return StageOutcome::fail_message(format!(
                    "cannot read artifact '{}': {err}",
                    self.file.display()
                ))
            }
        };

        let size = bytes.len();
        let digest = hex::encode(Sha256::digest(&bytes));
        debug!(file = %self.file.display(), size, %digest, "artifact ready");

        let part = Part::bytes(bytes).file_name(self.artifact_name());
        let form = Form::new().part(self.field_name.clone(), part);

        let response = match self
            .client
            .post(&self.url)
            .header(reqwest::header::AUTHORIZATION, token)
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return StageOutcome::fail_message(format!("upload request failed: {err}"))
            }
        };

        let status = response.status();
        if status.is_success() {
            info!(url = %self.url, %status, "artifact uploaded");
            StageOutcome::ok()
                .with_entry("status", json!(status.as_u16()))
                .with_entry("sha256", json!(digest))
                .with_entry("bytes", json!(size))
        } else {
            StageOutcome::fail(FailureCause::Error(format!(
                "upload rejected with status {status}"
            )))
        }
    }
}
