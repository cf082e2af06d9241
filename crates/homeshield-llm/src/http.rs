//! Shared HTTP plumbing for hosted providers: status mapping and back-off

use homeshield_domain::UpstreamError;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Map a non-success HTTP status to an upstream error
pub(crate) fn classify_status(status: StatusCode, body: &str, what: &str) -> UpstreamError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited(format!("{}: {}", what, body)),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            UpstreamError::Configuration(format!("{} rejected credentials (HTTP {})", what, status))
        }
        StatusCode::NOT_FOUND => UpstreamError::NotFound(what.to_string()),
        _ => UpstreamError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

/// Run `op`, retrying only on rate limiting with exponential back-off
/// (1s, 2s, 4s, ...) for at most `max_attempts` attempts
pub(crate) async fn with_backoff<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match op().await {
            Err(e) if e.is_rate_limited() && attempts < max_attempts => {
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!("Rate limited (attempt {}/{}), retrying in {:?}", attempts, max_attempts, delay);
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}
