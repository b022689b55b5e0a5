//! Worker deadlines
//!
//! Runs an operation as an isolated worker task and terminates it when the
//! deadline passes. The worker's value is propagated on success; expiry
//! surfaces [`KitbagError::Timeout`], distinct from the worker's own
//! failures ([`KitbagError::Worker`]).

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::KitbagError;

/// Default deadline for callers without a better number
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `future` as a named worker task, aborting it if `limit` elapses
pub async fn run_with_timeout<T, F>(
    name: &str,
    limit: Duration,
    future: F,
) -> Result<T, KitbagError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let start = Instant::now();
    let worker = tokio::spawn(future);
    let abort = worker.abort_handle();

    match tokio::time::timeout(limit, worker).await {
        Ok(Ok(value)) => {
            debug!(
                name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "worker finished"
            );
            Ok(value)
        }
        Ok(Err(join_err)) => Err(KitbagError::Worker {
            name: name.to_string(),
            details: join_err.to_string(),
        }),
        Err(_) => {
            abort.abort();
            warn!(name, limit_secs = limit.as_secs(), "worker deadline exceeded");
            Err(KitbagError::Timeout {
                name: name.to_string(),
                limit,
            })
        }
    }
}

/// Blocking-closure variant, run on the blocking pool.
///
/// A blocking worker that outlives the deadline is detached, not killed;
/// it keeps its thread until the closure returns on its own.
pub async fn run_blocking_with_timeout<T, F>(
    name: &str,
    limit: Duration,
    work: F,
) -> Result<T, KitbagError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let start = Instant::now();
    let worker = tokio::task::spawn_blocking(work);

    match tokio::time::timeout(limit, worker).await {
        Ok(Ok(value)) => {
            debug!(
                name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "worker finished"
            );
            Ok(value)
        }
        Ok(Err(join_err)) => Err(KitbagError::Worker {
            name: name.to_string(),
            details: join_err.to_string(),
        }),
        Err(_) => {
            warn!(name, limit_secs = limit.as_secs(), "worker deadline exceeded");
            Err(KitbagError::Timeout {
                name: name.to_string(),
                limit,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fast_worker_returns_its_value() {
        let value = run_with_timeout("fast", DEFAULT_TIMEOUT, async { 41 + 1 })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_worker_times_out() {
        let err = run_with_timeout("stuck", Duration::from_secs(2), std::future::pending::<()>())
            .await
            .unwrap_err();
        match err {
            KitbagError::Timeout { name, limit } => {
                assert_eq!(name, "stuck");
                assert_eq!(limit, Duration::from_secs(2));
            }
            other => panic!("expected Timeout, got {other}"),
        }
    }

    #[tokio::test]
    async fn panicking_worker_surfaces_a_worker_error() {
        let err = run_with_timeout("doomed", DEFAULT_TIMEOUT, async {
            panic!("worker blew up");
        })
        .await
        .unwrap_err();
        assert!(matches!(err, KitbagError::Worker { .. }));
    }

    #[tokio::test]
    async fn blocking_worker_returns_its_value() {
        let value = run_blocking_with_timeout("sum", DEFAULT_TIMEOUT, || {
            (1u64..=10).sum::<u64>()
        })
        .await
        .unwrap();
        assert_eq!(value, 55);
    }

    #[tokio::test]
    async fn timeout_error_is_distinct_from_worker_failure() {
        let timeout = KitbagError::Timeout {
            name: "w".to_string(),
            limit: Duration::from_secs(1),
        };
        let failure = KitbagError::Worker {
            name: "w".to_string(),
            details: "died".to_string(),
        };
        assert_ne!(timeout.to_string(), failure.to_string());
    }
}
