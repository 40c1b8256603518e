// src/api/retry.rs
//! Rate-limit retry and error classification around upstream calls.

use crate::error::{AppError, NotionApiError};
use std::future::Future;
use std::time::Duration;

/// How rate-limited calls are retried.
///
/// Upstream tells us how long to wait through `Retry-After`; the policy only
/// decides how many times we are willing to listen. `None` means forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    pub max_retries: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self { max_retries: None }
    }

    pub fn capped(max_retries: u32) -> Self {
        Self {
            max_retries: Some(max_retries),
        }
    }

    fn allows(&self, retries_so_far: u32) -> bool {
        self.max_retries.map_or(true, |max| retries_so_far < max)
    }
}

/// Parses a `Retry-After` value given in seconds.
///
/// Fractional seconds are accepted. Negative, non-finite, out-of-range and
/// HTTP-date values are rejected.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}

/// Runs `operation`, retrying it after rate-limit responses and classifying
/// every other failure.
///
/// Each retry re-invokes `operation`, so the call is repeated with the same
/// arguments it captured.
pub async fn with_rate_limit_retry<T, F, Fut>(
    policy: RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, NotionApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut retries = 0u32;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(AppError::NotionService {
                code,
                message,
                retry_after,
                ..
            }) if code.is_rate_limited() => {
                let Some(wait) = retry_after.as_deref().and_then(parse_retry_after) else {
                    log::warn!(
                        "{} rate limited without a usable Retry-After ({:?})",
                        operation_name,
                        retry_after
                    );
                    return Err(NotionApiError::NotHandled(format!(
                        "rate limited without retry-after: {}",
                        message
                    )));
                };

                if !policy.allows(retries) {
                    log::warn!(
                        "{} still rate limited after {} retries, giving up",
                        operation_name,
                        retries
                    );
                    return Err(NotionApiError::NotHandled(format!(
                        "rate limited after {} retries: {}",
                        retries, message
                    )));
                }

                retries += 1;
                log::warn!(
                    "{} rate limited, retrying in {:.1}s (retry {})",
                    operation_name,
                    wait.as_secs_f64(),
                    retries
                );
                tokio::time::sleep(wait).await;
            }
            Err(other) => {
                let classified = NotionApiError::from(other);
                log::warn!("{} failed: {}", operation_name, classified);
                return Err(classified);
            }
        }
    }
}
