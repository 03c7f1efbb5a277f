//! Polling engine for asynchronous image jobs.

use reelforge_core::ImageResult;
use reelforge_error::{PipelineError, PipelineErrorKind, ReelforgeResult};
use reelforge_interface::ImageGenerator;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Poll cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before each poll
    pub interval: Duration,
    /// Polls before giving up
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// Poll `job_id` until the provider reports completion or failure.
///
/// A poll that errors is logged and does not end the loop; it still consumes
/// one attempt. Exhausting the budget yields `PollTimeout`. Nothing is
/// persisted here; callers store the final outcome.
#[instrument(skip(client, config), fields(provider = %client.provider_name()))]
pub async fn poll_until_complete(
    client: &dyn ImageGenerator,
    job_id: &str,
    config: &PollConfig,
) -> ReelforgeResult<ImageResult> {
    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;

        let result = match client.poll(job_id).await {
            Ok(result) => result,
            Err(e) => {
                warn!(attempt, error = %e, "Poll failed, continuing");
                continue;
            }
        };

        if result.completed {
            if result.image_url.as_deref().is_some_and(|u| !u.is_empty()) {
                info!(attempt, "Image job completed");
                return Ok(result);
            }
            return Err(PipelineError::new(PipelineErrorKind::ProviderJobFailed(
                "job completed without an image URL".to_string(),
            ))
            .into());
        }

        if let Some(error) = result.failure() {
            warn!(attempt, error, "Image job failed");
            return Err(
                PipelineError::new(PipelineErrorKind::ProviderJobFailed(error.to_string())).into(),
            );
        }

        debug!(attempt, "Image job still running");
    }

    Err(PipelineError::new(PipelineErrorKind::PollTimeout {
        attempts: config.max_attempts,
    })
    .into())
}
