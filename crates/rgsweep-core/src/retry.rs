//! Bounded retry with an ordered fallback chain
//!
//! A removal is expressed as a list of [`Technique`]s. The first one is
//! retried on transient errors with exponential backoff; a rejection that
//! retrying cannot fix moves on to the next technique. Every client call
//! counts as one attempt, and the technique that settled the outcome is
//! recorded on it.

use crate::outcome::RemovalOutcome;
use futures_util::future::BoxFuture;
use rgsweep_cloud::CloudError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum attempts per technique
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,

    /// Backoff multiplier (1.0 gives a fixed schedule)
    pub backoff_multiplier: f64,

    /// Bound on a single client call
    pub operation_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            operation_timeout: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Fixed delay between attempts
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(32) as i32;
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let delay = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

/// A named way of performing one removal
pub struct Technique<'a> {
    name: &'static str,
    run: Box<dyn Fn() -> BoxFuture<'a, rgsweep_cloud::Result<()>> + Send + Sync + 'a>,
}

impl<'a> Technique<'a> {
    pub fn new<F, Fut>(name: &'static str, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'a,
        Fut: Future<Output = rgsweep_cloud::Result<()>> + Send + 'a,
    {
        Self {
            name,
            run: Box::new(move || Box::pin(f())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Runs techniques under a retry policy
pub struct RetryFallbackController<'a> {
    policy: &'a RetryPolicy,
    cancel: &'a CancellationToken,
}

impl<'a> RetryFallbackController<'a> {
    pub fn new(policy: &'a RetryPolicy, cancel: &'a CancellationToken) -> Self {
        Self { policy, cancel }
    }

    /// Execute one logical removal of `resource_id`
    ///
    /// Success is `Removed`; a not-found answer from any technique is
    /// `NotFound`. Permission errors fail immediately, transient errors are
    /// retried up to `max_attempts` per technique, and everything else falls
    /// through to the next technique. Cancellation during a backoff sleep
    /// ends the removal as failed without another call.
    pub async fn execute(&self, resource_id: &str, techniques: &[Technique<'_>]) -> RemovalOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0u32;
        let mut last_error: Option<(String, &'static str)> = None;

        for (position, technique) in techniques.iter().enumerate() {
            if position > 0 {
                if self.cancel.is_cancelled() {
                    return RemovalOutcome::failed(resource_id, "cancelled")
                        .with_attempts(attempts);
                }
                debug!(
                    resource = resource_id,
                    strategy = technique.name,
                    "falling back to next technique"
                );
            }

            let mut tries = 0u32;
            loop {
                attempts += 1;
                tries += 1;

                let result =
                    match tokio::time::timeout(self.policy.operation_timeout, (technique.run)())
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(CloudError::Timeout(format!(
                            "{} did not finish within {:?}",
                            technique.name, self.policy.operation_timeout
                        ))),
                    };

                let error = match result {
                    Ok(()) => {
                        return RemovalOutcome::removed(resource_id)
                            .with_attempts(attempts)
                            .with_technique(technique.name);
                    }
                    Err(e) if e.is_not_found() => {
                        return RemovalOutcome::not_found(resource_id)
                            .with_attempts(attempts)
                            .with_technique(technique.name);
                    }
                    Err(e) if e.is_permanent() => {
                        return RemovalOutcome::failed(resource_id, e.to_string())
                            .with_attempts(attempts)
                            .with_technique(technique.name);
                    }
                    Err(e) => e,
                };

                if !error.is_transient() || tries >= max_attempts {
                    debug!(
                        resource = resource_id,
                        strategy = technique.name,
                        attempt = tries,
                        error = %error,
                        "technique gave up"
                    );
                    last_error = Some((error.to_string(), technique.name));
                    break;
                }

                let delay = self.policy.delay_for(tries);
                debug!(
                    resource = resource_id,
                    strategy = technique.name,
                    attempt = tries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient error, backing off"
                );
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        return RemovalOutcome::failed(resource_id, "cancelled")
                            .with_attempts(attempts)
                            .with_technique(technique.name);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        match last_error {
            Some((reason, technique)) => RemovalOutcome::failed(resource_id, reason)
                .with_attempts(attempts)
                .with_technique(technique),
            None => RemovalOutcome::failed(resource_id, "no removal technique available"),
        }
    }

    /// Run a read-only call, retrying transient errors
    ///
    /// Reads have no fallback chain. Any other error comes back unchanged,
    /// as does the last transient one after `max_attempts` calls or when
    /// cancellation interrupts the backoff.
    pub async fn fetch<T, F, Fut>(&self, what: &str, call: F) -> rgsweep_cloud::Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = rgsweep_cloud::Result<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut tries = 0u32;
        loop {
            tries += 1;
            let result = match tokio::time::timeout(self.policy.operation_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(CloudError::Timeout(format!(
                    "{} did not finish within {:?}",
                    what, self.policy.operation_timeout
                ))),
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() || tries >= max_attempts => return Err(e),
                Err(e) => e,
            };

            let delay = self.policy.delay_for(tries);
            debug!(
                call = what,
                attempt = tries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "transient read error, backing off"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(error),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::RemovalStatus;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            operation_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(10), Duration::from_secs(30));

        let fixed = RetryPolicy::fixed(4, Duration::from_millis(250));
        assert_eq!(fixed.delay_for(1), fixed.delay_for(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflicts_then_success() {
        let policy = quick();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let techniques = [Technique::new("delete", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                Err(CloudError::Conflict("409".into()))
            } else {
                Ok(())
            }
        })];

        let outcome = RetryFallbackController::new(&policy, &cancel)
            .execute("/r", &techniques)
            .await;
        assert_eq!(outcome.status, RemovalStatus::Removed);
        assert_eq!(outcome.attempts_made, 4);
        assert_eq!(outcome.strategy_used.as_deref(), Some("delete"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shape_mismatch_walks_the_chain() {
        let policy = quick();
        let cancel = CancellationToken::new();
        let techniques = [
            Technique::new("typed", || async {
                Err(CloudError::ShapeMismatch("unrecognized arguments".into()))
            }),
            Technique::new("rest", || async { Err(CloudError::Api("500".into())) }),
            Technique::new("by-id", || async { Ok(()) }),
        ];

        let outcome = RetryFallbackController::new(&policy, &cancel)
            .execute("/r", &techniques)
            .await;
        assert_eq!(outcome.status, RemovalStatus::Removed);
        assert_eq!(outcome.attempts_made, 3);
        assert_eq!(outcome.strategy_used.as_deref(), Some("by-id"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_is_not_retried() {
        let policy = quick();
        let cancel = CancellationToken::new();
        let techniques = [
            Technique::new("delete", || async {
                Err(CloudError::PermissionDenied("AuthorizationFailed".into()))
            }),
            Technique::new("rest", || async { Ok(()) }),
        ];

        let outcome = RetryFallbackController::new(&policy, &cancel)
            .execute("/r", &techniques)
            .await;
        assert!(outcome.status.is_failed());
        assert_eq!(outcome.attempts_made, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_counts_as_done() {
        let policy = quick();
        let cancel = CancellationToken::new();
        let techniques = [Technique::new("delete", || async {
            Err(CloudError::NotFound("gone".into()))
        })];

        let outcome = RetryFallbackController::new(&policy, &cancel)
            .execute("/r", &techniques)
            .await;
        assert_eq!(outcome.status, RemovalStatus::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let mut policy = quick();
        policy.max_attempts = 2;
        let cancel = CancellationToken::new();
        let techniques = [Technique::new("delete", || std::future::pending())];

        let outcome = RetryFallbackController::new(&policy, &cancel)
            .execute("/r", &techniques)
            .await;
        match outcome.status {
            RemovalStatus::Failed(reason) => assert!(reason.contains("Timeout")),
            other => panic!("unexpected status: {:?}", other),
        }
        assert_eq!(outcome.attempts_made, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_transient_reads() {
        let policy = quick();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let listed = RetryFallbackController::new(&policy, &cancel)
            .fetch("list", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(CloudError::Throttled("429".into()))
                } else {
                    Ok(vec!["/a", "/b"])
                }
            })
            .await;
        assert_eq!(listed.unwrap(), vec!["/a", "/b"]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_returns_permanent_errors_at_once() {
        let policy = quick();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let listed: rgsweep_cloud::Result<Vec<String>> =
            RetryFallbackController::new(&policy, &cancel)
                .fetch("list", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(CloudError::PermissionDenied("AuthorizationFailed".into()))
                })
                .await;
        assert!(matches!(listed, Err(CloudError::PermissionDenied(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let throttled: rgsweep_cloud::Result<()> = RetryFallbackController::new(&policy, &cancel)
            .fetch("list", || async { Err(CloudError::Throttled("429".into())) })
            .await;
        assert!(matches!(throttled, Err(CloudError::Throttled(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_backoff() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
            ..quick()
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let techniques = [Technique::new("delete", || async {
            Err(CloudError::Throttled("429".into()))
        })];

        let outcome = RetryFallbackController::new(&policy, &cancel)
            .execute("/r", &techniques)
            .await;
        assert_eq!(outcome.status, RemovalStatus::Failed("cancelled".into()));
        assert_eq!(outcome.attempts_made, 1);
    }
}
