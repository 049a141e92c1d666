//! Bounded waits around blocking leaf calls
//!
//! Every call that leaves the process (LLM, classifier, STT, TTS) or waits on
//! audio hardware goes through [`bounded`], so a stuck service aborts the
//! turn instead of hanging it.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::{Error, Result};

/// Run `fut` with a deadline
///
/// Dropping the inner future on expiry cancels any in-flight request it owns.
///
/// # Errors
///
/// Returns [`Error::Timeout`] if the deadline elapses, otherwise whatever
/// `fut` resolves to
pub async fn bounded<T, F>(operation: &'static str, after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, ?after, "deadline elapsed");
            Err(Error::Timeout { operation, after })
        }
    }
}

/// Run a blocking closure on the blocking pool with a deadline
///
/// The closure keeps running in the background if the deadline elapses, so
/// closures passed here must bound their own work as well (the capture loop
/// checks its own listen limit).
///
/// # Errors
///
/// Returns [`Error::Timeout`] on expiry, [`Error::Audio`] if the task panicked,
/// otherwise the closure's result
pub async fn bounded_blocking<T, F>(operation: &'static str, after: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    bounded(operation, after, async move {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| Error::Audio(format!("{operation} task failed: {e}")))?
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_result() {
        let value = bounded("fast", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn reports_timeout_with_operation_name() {
        let err = bounded("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(err.is_timeout());
        assert!(err.to_string().starts_with("slow timed out"));
    }

    #[tokio::test]
    async fn inner_errors_are_not_rewritten() {
        let err = bounded::<(), _>("failing", Duration::from_secs(1), async {
            Err(Error::Stt("boom".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Stt(ref m) if m == "boom"));
    }

    #[tokio::test]
    async fn blocking_closure_result_is_returned() {
        let value = bounded_blocking("blocking", Duration::from_secs(1), || Ok(21 * 2))
            .await
            .unwrap();
        assert_eq!(value, 42);
    }
}
