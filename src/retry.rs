//! Transient-failure retry wrapper.
//!
//! Every provider call in the crate goes through [`with_retry`]. The loop is
//! explicit and carries (attempts remaining, current backoff) rather than
//! recursing; the last error propagates unchanged so callers can still
//! inspect the original failure signal.

use crate::config::ReliabilityConfig;
use std::future::Future;
use std::time::Duration;

/// Backoff schedule: multiplicative growth from an initial delay up to a cap.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub backoff_factor: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 20,
            initial_backoff: Duration::from_millis(1_000),
            backoff_factor: 1.5,
            max_backoff: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &ReliabilityConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            backoff_factor: config.backoff_factor,
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Backoff for the retry after one that waited `current`.
    #[must_use]
    pub fn next_backoff(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff_factor).min(self.max_backoff)
    }
}

/// Classifies errors as transient (worth retrying) or fatal. Marker
/// substrings come from config so provider wording changes never touch the
/// retry logic itself.
#[derive(Debug, Clone)]
pub struct RetryClassifier {
    markers: Vec<String>,
}

impl Default for RetryClassifier {
    fn default() -> Self {
        Self::from_config(&ReliabilityConfig::default())
    }
}

impl RetryClassifier {
    #[must_use]
    pub fn new(markers: &[String]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_ascii_lowercase()).collect(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ReliabilityConfig) -> Self {
        Self::new(&config.retryable_markers)
    }

    /// Retryable: HTTP 429/503 (and 408) however they surface, 5xx from a
    /// typed reqwest status, or any configured marker substring in the error
    /// text. Everything else is fatal and propagates immediately.
    #[must_use]
    pub fn is_retryable(&self, err: &anyhow::Error) -> bool {
        if let Some(reqwest_err) = err.downcast_ref::<reqwest::Error>()
            && let Some(status) = reqwest_err.status()
        {
            let code = status.as_u16();
            return code == 429 || code == 408 || status.is_server_error();
        }

        let msg = err.to_string().to_ascii_lowercase();

        // Scan for status codes embedded in stringified errors.
        for word in msg.split(|c: char| !c.is_ascii_digit()) {
            if let Ok(code) = word.parse::<u16>()
                && matches!(code, 429 | 503 | 408)
            {
                return true;
            }
        }

        self.markers.iter().any(|marker| msg.contains(marker))
    }
}

/// Run `op`, retrying transient failures per `policy`. Emits one warning per
/// retry with the attempt count and the delay about to be taken.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    classifier: &RetryClassifier,
    label: &str,
    mut op: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempts_remaining = policy.max_retries;
    let mut current_backoff = policy.initial_backoff;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempts_remaining == 0 || !classifier.is_retryable(&err) {
                    return Err(err);
                }
                let attempt = policy.max_retries - attempts_remaining + 1;
                tracing::warn!(
                    label,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(current_backoff.as_millis()).unwrap_or(u64::MAX),
                    "transient provider failure, retrying: {err}"
                );
                tokio::time::sleep(current_backoff).await;
                current_backoff = policy.next_backoff(current_backoff);
                attempts_remaining -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            backoff_factor: 1.5,
            max_backoff: Duration::from_millis(4),
        }
    }

    #[test]
    fn backoff_grows_by_half_and_caps_at_ten_seconds() {
        let policy = RetryPolicy::default();
        let mut delay = policy.initial_backoff;
        assert_eq!(delay.as_millis(), 1_000);
        delay = policy.next_backoff(delay);
        assert_eq!(delay.as_millis(), 1_500);
        delay = policy.next_backoff(delay);
        assert_eq!(delay.as_millis(), 2_250);
        delay = policy.next_backoff(delay);
        assert_eq!(delay.as_millis(), 3_375);

        for _ in 0..10 {
            delay = policy.next_backoff(delay);
        }
        assert_eq!(delay.as_millis(), 10_000);
    }

    #[test]
    fn classifier_flags_rate_limit_signals() {
        let classifier = RetryClassifier::default();
        assert!(classifier.is_retryable(&anyhow::anyhow!("429 Too Many Requests")));
        assert!(classifier.is_retryable(&anyhow::anyhow!("503 Service Unavailable")));
        assert!(classifier.is_retryable(&anyhow::anyhow!("RESOURCE_EXHAUSTED: quota")));
        assert!(classifier.is_retryable(&anyhow::anyhow!("You have hit a rate limit")));
    }

    #[test]
    fn classifier_treats_client_rejections_as_fatal() {
        let classifier = RetryClassifier::default();
        assert!(!classifier.is_retryable(&anyhow::anyhow!("400 Bad Request: malformed")));
        assert!(!classifier.is_retryable(&anyhow::anyhow!("content policy violation")));
        assert!(!classifier.is_retryable(&anyhow::anyhow!("401 Unauthorized")));
    }

    #[test]
    fn classifier_markers_come_from_config() {
        let classifier = RetryClassifier::new(&["model is warming up".to_string()]);
        assert!(classifier.is_retryable(&anyhow::anyhow!("Model Is Warming Up, hold on")));
        assert!(!classifier.is_retryable(&anyhow::anyhow!("quota exceeded")));
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let result = with_retry(&fast_policy(3), &RetryClassifier::default(), "test", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>("ok")
            }
        })
        .await
        .unwrap();
        assert_eq!(result, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_then_recovers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let result = with_retry(&fast_policy(5), &RetryClassifier::default(), "test", move || {
            let counter = Arc::clone(&counter);
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    anyhow::bail!("429 Too Many Requests");
                }
                Ok("recovered")
            }
        })
        .await
        .unwrap();
        assert_eq!(result, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_propagate_on_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let err = with_retry(
            &fast_policy(5),
            &RetryClassifier::default(),
            "test",
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(anyhow::anyhow!("400 Bad Request: unsupported combination"))
                }
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("400 Bad Request"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_propagates_last_error_unchanged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let err = with_retry(
            &fast_policy(2),
            &RetryClassifier::default(),
            "test",
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Err::<(), _>(anyhow::anyhow!("503 Service Unavailable (attempt {attempt})"))
                }
            },
        )
        .await
        .unwrap_err();
        // 1 initial + 2 retries; the final attempt's error comes back as-is.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            err.to_string(),
            "503 Service Unavailable (attempt 3)"
        );
    }

    #[tokio::test]
    async fn zero_budget_never_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let err = with_retry(
            &fast_policy(0),
            &RetryClassifier::default(),
            "test",
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(anyhow::anyhow!("429 Too Many Requests"))
                }
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("429"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
