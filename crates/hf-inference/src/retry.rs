//! Bounded retry with exponential backoff for single API calls.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Runs `op` up to 3 times, sleeping 2s, then 4s (doubling, capped at 30s)
/// between attempts. Returns the first success or the last error.
pub(crate) async fn with_backoff<T, F, Fut>(op_name: &str, op: F) -> Result<T, anyhow::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, anyhow::Error>>,
{
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..=MAX_ATTEMPTS {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(
                    op = op_name,
                    attempt,
                    backoff_secs = backoff.as_secs(),
                    error = %e,
                    "inference call failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(e) => {
                warn!(op = op_name, attempt, error = %e, "inference call failed, giving up");
                return Err(e);
            }
        }
    }

    unreachable!("retry loop returns on last attempt")
}
