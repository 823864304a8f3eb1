//! SQLite retry logic with exponential backoff.
//!
//! Writes can hit SQLITE_BUSY (code 5) or SQLITE_LOCKED (code 6) when several
//! requests touch the database at once. Bulk operations such as rescoring a
//! tenant's leads wrap each statement in [`with_retry`].

use std::future::Future;
use std::time::Duration;

use sqlx::Error as SqlxError;

/// Configuration for SQLite retry behavior.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (caps the exponential growth).
    pub max_delay_ms: u64,
    /// Jitter factor (0.0 to 1.0) to add randomness to delays.
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 50,
            max_delay_ms: 2000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
            jitter_factor: 0.2,
        }
    }

    /// Delay before retry number `attempt` (0-based), with jitter.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        let capped_delay = base_delay.min(self.max_delay_ms);

        let jitter_range = (capped_delay as f64 * self.jitter_factor) as u64;
        let jitter = if jitter_range > 0 {
            // Sub-second clock noise is enough to spread concurrent retries
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos() as u64;
            now % jitter_range
        } else {
            0
        };

        Duration::from_millis(capped_delay + jitter)
    }
}

/// Check if an error is a transient SQLite error that should be retried.
///
/// Retryable codes: 5 (SQLITE_BUSY), 6 (SQLITE_LOCKED) and their extended
/// variants such as 261 (SQLITE_BUSY_RECOVERY) or 517 (SQLITE_BUSY_SNAPSHOT).
pub fn is_retryable_error(e: &SqlxError) -> bool {
    let SqlxError::Database(db_err) = e else {
        return false;
    };
    let Some(code) = db_err.code() else {
        return false;
    };
    match code.as_ref().parse::<u32>() {
        Ok(code_num) => matches!(code_num & 0xFF, 5 | 6),
        Err(_) => false,
    }
}

/// Execute a database operation with exponential backoff retry.
///
/// # Example
/// ```ignore
/// use db::retry::{RetryConfig, with_retry};
///
/// let lead = with_retry(&RetryConfig::default(), "lead.set_score", || {
///     Lead::set_score(&pool, org_id, lead_id, 72)
/// })
/// .await?;
/// ```
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
) -> Result<T, SqlxError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SqlxError>>,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::debug!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) if is_retryable_error(&e) && attempt < config.max_retries => {
                let delay = config.calculate_delay(attempt);

                tracing::warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = ?e,
                    "Transient SQLite error, retrying with backoff"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt > 0 {
                    tracing::error!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        error = ?e,
                        "Database operation failed after all retries"
                    );
                }
                return Err(e);
            }
        }
    }
}
