//! Retry executor for rate-limited messaging calls
//!
//! The messaging platform signals flood control through error text such as
//! `Too Many Requests: retry after 5`. [`retry_with_backoff`] retries only
//! those failures, sleeping for the server-suggested delay when one is
//! present and doubling the delay after every wait.

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{RelayError, Result};

/// Delay used until the server suggests one
pub const INITIAL_DELAY: Duration = Duration::from_secs(1);

static RETRY_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"retry after (\d+)").expect("retry-after pattern is valid"));

/// Extract the server-suggested wait from an error message
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use chat_relay::backoff::retry_after;
///
/// assert_eq!(
///     retry_after("Too Many Requests: retry after 7"),
///     Some(Duration::from_secs(7))
/// );
/// assert_eq!(retry_after("Bad Request: chat not found"), None);
/// ```
#[must_use]
pub fn retry_after(message: &str) -> Option<Duration> {
    RETRY_AFTER
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|secs| secs.as_str().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Run `operation` until it succeeds, retrying flood-control failures
///
/// Errors that are not flood-control signals are returned unchanged after
/// the first attempt. Flood-control failures sleep for the suggested delay
/// (or the previous delay when none is given), double it, and try again
/// until `max_attempts` calls have been made.
///
/// # Errors
/// Returns the first non-rate-limit error verbatim, or
/// [`RelayError::MaxRetriesExceeded`] once the attempt budget is spent.
pub async fn retry_with_backoff<T, F, Fut>(mut operation: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = INITIAL_DELAY;

    for attempt in 1..=max_attempts {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_rate_limited() => return Err(err),
            Err(err) => err,
        };

        if attempt == max_attempts {
            return Err(RelayError::max_retries(max_attempts, &err));
        }

        if let Some(hint) = retry_after(&err.to_string()) {
            delay = hint;
        }

        log::warn!(
            "Flood control hit, waiting {delay:?} before retry {attempt}/{max_attempts}"
        );
        tokio::time::sleep(delay).await;
        delay = delay.saturating_mul(2);
    }

    Err(RelayError::MaxRetriesExceeded {
        attempts: max_attempts,
        last_error: "no attempts were made".to_string(),
    })
}
