//! Rich-to-plain formatting fallback
//!
//! Partially streamed text often has unbalanced markup that the platform
//! refuses to render. Every formatted send or edit is tried as Markdown
//! first and repeated immediately as plain text when that fails.

use std::future::Future;

use crate::backoff::retry_with_backoff;
use crate::error::Result;
use crate::types::updates::ParseMode;

/// Run `operation` as Markdown, falling back to plain text on failure
///
/// Each formatting attempt goes through [`retry_with_backoff`] so flood
/// control is absorbed before the fallback is considered.
///
/// # Errors
/// Returns the plain-text attempt's error when both attempts fail
pub async fn with_format_fallback<T, F, Fut>(mut operation: F, max_attempts: u32) -> Result<T>
where
    F: FnMut(ParseMode) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match retry_with_backoff(|| operation(ParseMode::Markdown), max_attempts).await {
        Ok(value) => Ok(value),
        Err(e) => {
            log::debug!("Markdown rejected, retrying as plain text: {e}");
            retry_with_backoff(|| operation(ParseMode::Plain), max_attempts).await
        }
    }
}
