//! Deadline wrapper for calls that leave the process.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::AppError;
use crate::result::AppResult;

/// Run `fut` with a deadline.
///
/// An elapsed deadline becomes [`ErrorKind::Timeout`](crate::ErrorKind::Timeout),
/// which the HTTP layer reports as a server error.
pub async fn with_timeout<T, F>(operation: &'static str, limit: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "External call timed out"
            );
            Err(AppError::timeout(format!(
                "{operation} did not complete within {}ms",
                limit.as_millis()
            )))
        }
    }
}
