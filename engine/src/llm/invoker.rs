//! Model invoker: timeout and bounded retry around one provider
//!
//! The orchestrator never talks to a provider directly. Each model step goes
//! through the invoker, which enforces a per-call timeout and retries
//! transient transport failures (rate limits, network errors, timeouts,
//! 5xx) with exponential backoff. Retries are transparent to the caller;
//! an exhausted budget surfaces as `EngineError::ModelUnavailable`.
//! Permanent failures (authentication, malformed request) are never retried.

use super::{CompletionTurn, LLMError, LLMProvider, Message, ToolDefinition};
use sdk::errors::EngineError;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries (0 = no retries, fail on first error)
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Backoff multiplier
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given retry count and default pacing.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    ///
    /// Applies a deterministic jitter factor so simultaneous runs don't
    /// hammer the provider on the same beat.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        let jitter_factor = match attempt % 4 {
            0 => 0.75,
            1 => 0.90,
            2 => 0.60,
            _ => 0.85,
        };
        Duration::from_secs_f64(capped * jitter_factor)
    }
}

/// Wraps a single provider with timeout and retry handling.
pub struct ModelInvoker {
    provider: Box<dyn LLMProvider>,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl ModelInvoker {
    pub fn new(
        provider: Box<dyn LLMProvider>,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            request_timeout,
            retry,
        }
    }

    /// Name of the wrapped provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Whether the wrapped provider looks usable.
    pub async fn check_health(&self) -> bool {
        self.provider.check_health().await
    }

    /// Produce exactly one assistant turn from the full history.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ModelUnavailable` once the retry budget is
    /// exhausted or a permanent transport failure occurs.
    pub async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<CompletionTurn, EngineError> {
        let mut attempt: u32 = 0;

        loop {
            debug!(
                provider = self.provider.name(),
                attempt,
                messages = messages.len(),
                "invoking model"
            );

            let result = timeout(
                self.request_timeout,
                self.provider.generate(messages, tools),
            )
            .await;

            let error = match result {
                Ok(Ok(turn)) => return Ok(turn),
                Ok(Err(e)) => e,
                Err(_) => LLMError::Timeout,
            };

            if !error.is_transient() || attempt >= self.retry.max_retries {
                warn!(
                    provider = self.provider.name(),
                    attempt,
                    error = %error,
                    "model call failed"
                );
                return Err(EngineError::ModelUnavailable(error.to_string()));
            }

            let delay = self.retry.delay_for_attempt(attempt);
            warn!(
                provider = self.provider.name(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "transient model failure, retrying"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyProvider {
        calls: Arc<AtomicU32>,
        fail_first: u32,
        error_kind: fn() -> LLMError,
    }

    #[async_trait]
    impl LLMProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn generate(
            &self,
            _messages: &[Message],
            _tools: &[ToolDefinition],
        ) -> crate::llm::Result<CompletionTurn> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err((self.error_kind)())
            } else {
                Ok(CompletionTurn::final_answer("recovered"))
            }
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_transient_failures_retried_until_success() {
        let provider = FlakyProvider {
            calls: Arc::new(AtomicU32::new(0)),
            fail_first: 2,
            error_kind: || LLMError::RateLimitExceeded,
        };

        let invoker = ModelInvoker::new(
            Box::new(provider),
            Duration::from_secs(5),
            fast_policy(2),
        );

        let turn = invoker.complete(&[Message::user("hi")], &[]).await.unwrap();
        assert_eq!(turn.content, "recovered");
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_as_model_unavailable() {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = FlakyProvider {
            calls: Arc::clone(&calls),
            fail_first: u32::MAX,
            error_kind: || LLMError::NetworkError("connection refused".to_string()),
        };

        let invoker = ModelInvoker::new(
            Box::new(provider),
            Duration::from_secs(5),
            fast_policy(2),
        );

        let err = invoker
            .complete(&[Message::user("hi")], &[])
            .await
            .expect_err("retries should exhaust");
        assert!(matches!(err, EngineError::ModelUnavailable(_)));

        // Initial attempt plus two retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failures_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = FlakyProvider {
            calls: Arc::clone(&calls),
            fail_first: u32::MAX,
            error_kind: || LLMError::AuthenticationFailed("bad key".to_string()),
        };

        let invoker = ModelInvoker::new(
            Box::new(provider),
            Duration::from_secs(5),
            fast_policy(5),
        );

        let err = invoker
            .complete(&[Message::user("hi")], &[])
            .await
            .expect_err("auth failures are permanent");
        assert!(matches!(err, EngineError::ModelUnavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_increases_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        };

        let d0 = policy.delay_for_attempt(0);
        let d1 = policy.delay_for_attempt(1);
        assert!(d1 > d0, "d1={d1:?} should be > d0={d0:?}");

        // Far attempts stay at or below the cap
        assert!(policy.delay_for_attempt(10) <= Duration::from_secs(2));
    }
}
