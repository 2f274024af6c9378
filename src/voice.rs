//! Voice message pipeline
//!
//! Downloads a voice attachment into a transient local file and turns it
//! into text. The file is a [`TempPath`]: it is removed when transcription
//! finishes, whatever the outcome, and also if the path is dropped unused.

use std::sync::Arc;
use tempfile::TempPath;

use crate::completion::CompletionService;
use crate::error::Result;
use crate::platform::MessagingPlatform;
use crate::types::identifiers::FileId;

/// Voice download and transcription
pub struct VoicePipeline<P, C> {
    platform: Arc<P>,
    completion: Arc<C>,
    language: String,
}

impl<P, C> Clone for VoicePipeline<P, C> {
    fn clone(&self) -> Self {
        Self {
            platform: Arc::clone(&self.platform),
            completion: Arc::clone(&self.completion),
            language: self.language.clone(),
        }
    }
}

impl<P: MessagingPlatform, C: CompletionService> VoicePipeline<P, C> {
    /// Create a pipeline transcribing into `language`
    pub fn new(platform: Arc<P>, completion: Arc<C>, language: impl Into<String>) -> Self {
        Self {
            platform,
            completion,
            language: language.into(),
        }
    }

    /// Download a remote attachment into a uniquely named transient file
    ///
    /// # Errors
    /// Returns error if the file cannot be resolved, downloaded or written
    pub async fn fetch_attachment(&self, file: &FileId) -> Result<TempPath> {
        log::info!("Downloading voice message with file_id: {}", file.as_str());

        let url = self.platform.resolve_file(file).await?;
        let bytes = self.platform.download_file(&url).await?;

        let path = tempfile::Builder::new()
            .prefix("voice_")
            .suffix(".oga")
            .tempfile()?
            .into_temp_path();
        tokio::fs::write(&path, &bytes).await?;

        log::info!("Voice message saved to temporary file: {}", path.display());
        Ok(path)
    }

    /// Transcribe a local audio file, removing it afterwards
    ///
    /// # Errors
    /// Returns error if the file cannot be read or the service call fails
    pub async fn transcribe(&self, audio: TempPath) -> Result<String> {
        log::info!("Starting audio transcription for file: {}", audio.display());

        let result = self.transcribe_file(&audio).await;

        if let Err(e) = audio.close() {
            log::warn!("Failed to remove temporary audio file: {e}");
        }

        if result.is_ok() {
            log::info!("Audio transcription completed successfully");
        }
        result
    }

    /// Download and transcribe in one step
    ///
    /// # Errors
    /// Returns error if either stage fails
    pub async fn process(&self, file: &FileId) -> Result<String> {
        let audio = self.fetch_attachment(file).await?;
        self.transcribe(audio).await
    }

    async fn transcribe_file(&self, audio: &TempPath) -> Result<String> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("voice.oga")
            .to_string();

        self.completion
            .transcribe(bytes, &file_name, &self.language)
            .await
    }
}
