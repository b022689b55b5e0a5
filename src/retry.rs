//! Retry with exponential backoff
//!
//! Re-runs a fallible async operation, sleeping `base^(attempt - 1)` seconds
//! (capped by `expLimit`) between attempts:
//! - [`RetryPolicy`] - serde config: `maxAttempts`, `base`, `expLimit`
//! - [`Retrier`] - adds skip-classification and an exit callback

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::KitbagError;

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Cap on attempts; `None` retries forever
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Exponential backoff base, in seconds
    #[serde(default = "default_base")]
    pub base: u32,

    /// Cap on the wait between attempts, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_limit: Option<u64>,
}

fn default_base() -> u32 {
    2
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            base: default_base(),
            exp_limit: None,
        }
    }
}

impl RetryPolicy {
    /// Retry forever with the default base
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Give up after `max_attempts` attempts
    pub fn limited(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            ..Self::default()
        }
    }

    /// Set the backoff base
    pub fn base(mut self, base: u32) -> Self {
        self.base = base;
        self
    }

    /// Cap the wait between attempts at `secs` seconds
    pub fn exp_limit(mut self, secs: u64) -> Self {
        self.exp_limit = Some(secs);
        self
    }

    /// Wait after the given 1-based attempt: `min(base^(attempt-1), expLimit)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let wait = u64::from(self.base).saturating_pow(attempt.saturating_sub(1));
        Duration::from_secs(self.exp_limit.map_or(wait, |limit| wait.min(limit)))
    }

    fn validate(&self) -> Result<(), KitbagError> {
        if self.max_attempts == Some(0) {
            return Err(KitbagError::InvalidPolicy(
                "maxAttempts must be greater than 0 or absent".to_string(),
            ));
        }
        Ok(())
    }
}

type SkipFn<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;
type ExitFn<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Drives an operation under a [`RetryPolicy`]
pub struct Retrier<E> {
    policy: RetryPolicy,
    skip_when: Option<SkipFn<E>>,
    on_exit: Option<ExitFn<E>>,
    raise_after_exit: bool,
}

impl<E: Display> Retrier<E> {
    /// Rejects a policy whose `maxAttempts` is zero
    pub fn new(policy: RetryPolicy) -> Result<Self, KitbagError> {
        policy.validate()?;
        Ok(Self {
            policy,
            skip_when: None,
            on_exit: None,
            raise_after_exit: false,
        })
    }

    /// Errors matching `pred` bypass retry and exit immediately
    pub fn skip_when(mut self, pred: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.skip_when = Some(Box::new(pred));
        self
    }

    /// Handler invoked with the terminal error when attempts run out or a
    /// skip-classified error occurs. Unless [`raise_after_exit`] is set, the
    /// handler consumes the failure and [`run`] returns `Ok(None)`.
    ///
    /// [`raise_after_exit`]: Retrier::raise_after_exit
    /// [`run`]: Retrier::run
    pub fn on_exit(mut self, handler: impl Fn(&E) + Send + Sync + 'static) -> Self {
        self.on_exit = Some(Box::new(handler));
        self
    }

    /// Return the terminal error even after the exit handler ran
    pub fn raise_after_exit(mut self, raise: bool) -> Self {
        self.raise_after_exit = raise;
        self
    }

    /// Run `op` until it succeeds or the policy gives up.
    ///
    /// `op` receives the 1-based attempt number. Returns `Ok(Some(value))`
    /// on success, `Err(e)` when the terminal failure propagates, and
    /// `Ok(None)` when the exit handler consumed it.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<Option<T>, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 1;
        loop {
            debug!(attempt, max_attempts = ?self.policy.max_attempts, "trying operation");
            match op(attempt).await {
                Ok(value) => {
                    debug!(attempt, "operation succeeded");
                    return Ok(Some(value));
                }
                Err(err) => {
                    let skip = self.skip_when.as_ref().is_some_and(|pred| pred(&err));
                    let exhausted = self.policy.max_attempts.is_some_and(|max| attempt >= max);

                    if exhausted || skip {
                        warn!(attempt, error = %err, skip, "unable to process operation, giving up");
                        if let Some(handler) = &self.on_exit {
                            handler(&err);
                            if self.raise_after_exit {
                                return Err(err);
                            }
                            return Ok(None);
                        }
                        return Err(err);
                    }

                    let wait = self.policy.delay(attempt);
                    warn!(
                        attempt,
                        error = %err,
                        wait_secs = wait.as_secs(),
                        "operation failed, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
