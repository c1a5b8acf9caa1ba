//! Long-running operation polling.
//!
//! Video generation submits a job and then drives it to completion: bounded
//! retry per status query, unbounded wait across queries (unless a ceiling is
//! configured). Transient network failures during polling must not abort an
//! otherwise-successful job, so every status query goes through the retry
//! wrapper too.

use crate::config::Config;
use crate::error::{MediaError, ProviderError, SmithError};
use crate::provider::MediaProvider;
use crate::retry::{RetryClassifier, RetryPolicy, with_retry};
use std::time::Duration;
use tokio::time::Instant;

/// Provider-issued token for an in-flight job plus its observed state.
/// Lives only for the duration of one video-generation call.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    pub name: String,
    pub done: bool,
    pub video_uri: Option<String>,
    pub failure: Option<String>,
}

/// Drives a submitted operation to a terminal outcome and fetches the
/// artifact bytes.
pub struct OperationPoller {
    pub interval: Duration,
    pub ceiling: Option<Duration>,
    pub policy: RetryPolicy,
    pub classifier: RetryClassifier,
}

impl OperationPoller {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: Duration::from_secs(config.video.poll_interval_secs),
            ceiling: config.video.max_poll_secs.map(Duration::from_secs),
            policy: RetryPolicy::from_config(&config.reliability),
            classifier: RetryClassifier::from_config(&config.reliability),
        }
    }

    /// Poll until the handle reports completion, then download the artifact
    /// with the same credential the provider was created with.
    pub async fn run(
        &self,
        provider: &dyn MediaProvider,
        mut handle: OperationHandle,
    ) -> crate::error::Result<Vec<u8>> {
        let started = Instant::now();

        while !handle.done {
            if let Some(ceiling) = self.ceiling
                && started.elapsed() >= ceiling
            {
                return Err(ProviderError::PollCeiling {
                    operation: handle.name,
                    ceiling_secs: ceiling.as_secs(),
                }
                .into());
            }

            tracing::debug!(operation = %handle.name, "operation pending, waiting before next poll");
            tokio::time::sleep(self.interval).await;

            let name = handle.name.clone();
            handle = with_retry(&self.policy, &self.classifier, "poll_operation", || {
                provider.poll_operation(&name)
            })
            .await
            .map_err(SmithError::Other)?;
        }

        if let Some(failure) = handle.failure {
            return Err(ProviderError::OperationFailed {
                operation: handle.name,
                message: failure,
            }
            .into());
        }

        let uri = handle.video_uri.ok_or(MediaError::NoVideoUri)?;
        tracing::debug!(operation = %handle.name, "operation complete, downloading artifact");

        with_retry(&self.policy, &self.classifier, "download_artifact", || {
            provider.download(&uri)
        })
        .await
        .map_err(|e| MediaError::Download(e.to_string()).into())
    }
}
