//! Server-sent-event decoding for streamed chat completions
//!
//! Lines are split on raw bytes so a multi-byte character cut across two
//! network chunks is decoded only once it is complete.

use futures::{Stream, StreamExt};
use serde::Deserialize;

use super::TokenStream;
use crate::error::{RelayError, Result};

/// Meaning of one SSE line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// A content increment
    Token(String),
    /// The `[DONE]` terminator
    Done,
    /// Anything carrying no content (comments, blank lines, role-only deltas)
    Skip,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    message: String,
}

/// Decode a single SSE line
///
/// # Errors
/// Returns error if a `data:` payload is not a valid completion chunk or
/// reports a service error
pub fn parse_line(line: &str) -> Result<SseLine> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let payload = payload.trim();

    if payload.is_empty() {
        return Ok(SseLine::Skip);
    }
    if payload == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(payload)?;
    if let Some(error) = chunk.error {
        return Err(RelayError::completion(error.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map_or(SseLine::Skip, SseLine::Token))
}

/// Turn a raw SSE byte stream into a stream of content increments
///
/// The token stream ends at `[DONE]` or when the body ends; transport or
/// decode failures end it with an `Err` item.
pub fn token_stream<S, B, E>(body: S) -> TokenStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<RelayError> + Send,
{
    async_stream::try_stream! {
        let mut body = Box::pin(body);
        let mut buffer: Vec<u8> = Vec::new();

        'body: while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(Into::<RelayError>::into)?;
            buffer.extend_from_slice(chunk.as_ref());

            while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=newline).collect();
                let line = String::from_utf8_lossy(&raw);
                match parse_line(line.trim_end_matches(['\n', '\r']))? {
                    SseLine::Token(token) => yield token,
                    SseLine::Done => break 'body,
                    SseLine::Skip => {}
                }
            }
        }
    }
    .boxed()
}
