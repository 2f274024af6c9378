//! Completion service seam
//!
//! Defines the streaming-completion and transcription interface together
//! with its OpenAI-compatible implementation.

pub mod openai;
pub mod sse;

use futures::stream::BoxStream;
use std::future::Future;

use crate::error::Result;
use crate::types::messages::CompletionRequest;

/// Incremental text chunks of one generation
///
/// `None` is the normal end of the stream; an `Err` item is an abnormal
/// end. Dropping the stream closes the underlying connection.
pub type TokenStream = BoxStream<'static, Result<String>>;

/// Completion and transcription service client
pub trait CompletionService: Send + Sync + 'static {
    /// Start a streamed chat completion
    ///
    /// # Errors
    /// Returns error if the stream cannot be opened
    fn stream_chat(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<TokenStream>> + Send;

    /// Transcribe an audio recording
    ///
    /// # Arguments
    /// * `audio` - Raw audio bytes
    /// * `file_name` - Name hinting the audio container format
    /// * `language` - Target language code
    ///
    /// # Errors
    /// Returns error if the service call fails
    fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        language: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

pub use openai::OpenAiClient;
