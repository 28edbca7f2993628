//! Bounded retry with exponential back-off and jitter for marketplace fetches.
//!
//! Only network failures are retried. A non-2xx answer is a completed
//! exchange and goes to the classifier untouched, so a persistent anti-bot
//! block costs one request per cycle rather than a retry storm.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound for a single back-off sleep.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Whether another attempt could plausibly succeed.
fn worth_retrying(err: &ScraperError) -> bool {
    let ScraperError::Http(e) = err else {
        return false;
    };
    e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
}

/// Nominal delay before retry number `retry` (1-based), before jitter.
fn nominal_delay(base_ms: u64, retry: u32) -> Duration {
    let exponent = retry.saturating_sub(1).min(10);
    Duration::from_millis(base_ms.saturating_mul(1 << exponent)).min(MAX_DELAY)
}

/// Scales `delay` by a random factor in `0.75..1.25`.
fn jittered(delay: Duration) -> Duration {
    delay.mul_f64(0.75 + rand::random::<f64>() * 0.5)
}

/// Runs `attempt`, retrying network failures up to `max_retries` extra times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut attempt: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut retries = 0;
    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retries == max_retries || !worth_retrying(&err) {
            return Err(err);
        }
        retries += 1;
        let delay = jittered(nominal_delay(backoff_base_ms, retries));
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "marketplace fetch failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
