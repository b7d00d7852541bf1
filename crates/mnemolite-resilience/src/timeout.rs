//! Named, context-tagged timeouts.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
#[error("operation '{operation}' timed out after {duration:?}")]
pub struct TimeoutError {
    pub operation: String,
    pub duration: Duration,
    pub context: HashMap<String, String>,
}

/// Runs `fut` with a deadline, tagging a timeout with `operation`'s name and
/// `context` so callers can log which repository/batch/query it belonged to.
pub async fn with_timeout<Fut, T>(
    operation: impl Into<String>,
    duration: Duration,
    context: HashMap<String, String>,
    fut: Fut,
) -> Result<T, TimeoutError>
where
    Fut: Future<Output = T>,
{
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| TimeoutError {
            operation: operation.into(),
            duration,
            context,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn times_out_when_exceeded() {
        let result = with_timeout(
            "slow_op",
            Duration::from_millis(5),
            HashMap::new(),
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                42
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().operation, "slow_op");
    }

    #[tokio::test]
    async fn returns_value_when_within_deadline() {
        let result = with_timeout("fast_op", Duration::from_secs(5), HashMap::new(), async { 7 }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
