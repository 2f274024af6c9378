//! OpenAI-compatible completion and transcription client

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

use super::sse::token_stream;
use super::{CompletionService, TokenStream};
use crate::error::{RelayError, Result};
use crate::types::messages::CompletionRequest;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used for speech-to-text
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Client for the chat-completions and audio-transcriptions endpoints
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenAiClient {
    /// Create a client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Fail with the response body when the status is not a success
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RelayError::completion(format!("HTTP {status}: {body}")))
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl CompletionService for OpenAiClient {
    async fn stream_chat(&self, request: CompletionRequest) -> Result<TokenStream> {
        let url = format!("{}/chat/completions", self.base_url);
        log::debug!(
            "Opening completion stream: model={}, history={} message(s)",
            request.model,
            request.messages.len()
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(token_stream(response.bytes_stream()))
    }

    async fn transcribe(&self, audio: Vec<u8>, file_name: &str, language: &str) -> Result<String> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file = Part::bytes(audio).file_name(file_name.to_string());
        let form = Form::new()
            .part("file", file)
            .text("model", TRANSCRIPTION_MODEL)
            .text("language", language.to_string());

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RelayError::transcription(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::transcription(format!("HTTP {status}: {body}")));
        }

        let parsed: TranscriptionResponse = response.json().await?;
        Ok(parsed.text)
    }
}
