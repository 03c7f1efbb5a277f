use async_trait::async_trait;
use reelforge_core::{GenerationOptions, ImageResult};
use reelforge_error::{
    PipelineErrorKind, ProviderError, ProviderErrorKind, ReelforgeErrorKind, ReelforgeResult,
};
use reelforge_interface::ImageGenerator;
use reelforge_tasks::{PollConfig, poll_until_complete};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted poll responses; `None` entries simulate a transport error.
struct ScriptedJob {
    polls: Mutex<VecDeque<Option<ImageResult>>>,
    calls: Arc<Mutex<u32>>,
}

impl ScriptedJob {
    fn new(polls: Vec<Option<ImageResult>>) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedJob {
    async fn generate(&self, _: &str, _: &GenerationOptions) -> ReelforgeResult<ImageResult> {
        Ok(ImageResult::pending("job-1"))
    }

    async fn poll(&self, _: &str) -> ReelforgeResult<ImageResult> {
        *self.calls.lock().unwrap() += 1;
        match self.polls.lock().unwrap().pop_front() {
            Some(Some(result)) => Ok(result),
            Some(None) => Err(ProviderError::new(ProviderErrorKind::Request("reset".into())).into()),
            None => Ok(ImageResult::default()),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

fn fast(max_attempts: u32) -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(1),
        max_attempts,
    }
}

#[tokio::test]
async fn transient_poll_errors_do_not_abort() {
    let job = ScriptedJob::new(vec![
        None,
        Some(ImageResult::default()),
        None,
        Some(ImageResult::ready("https://cdn/img.png", 1024, 1024)),
    ]);
    let result = poll_until_complete(&job, "job-1", &fast(10)).await.unwrap();
    assert_eq!(result.image_url.as_deref(), Some("https://cdn/img.png"));
    assert_eq!(job.calls(), 4);
}

#[tokio::test]
async fn provider_failure_stops_polling() {
    let job = ScriptedJob::new(vec![
        Some(ImageResult::default()),
        Some(ImageResult::failed("nsfw content")),
    ]);
    let err = poll_until_complete(&job, "job-1", &fast(10)).await.unwrap_err();
    match err.kind() {
        ReelforgeErrorKind::Pipeline(e) => assert_eq!(
            e.kind,
            PipelineErrorKind::ProviderJobFailed("nsfw content".to_string())
        ),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(job.calls(), 2);
}

#[tokio::test]
async fn budget_exhaustion_times_out_after_exact_attempts() {
    let job = ScriptedJob::new(vec![]);
    let err = poll_until_complete(&job, "job-1", &fast(7)).await.unwrap_err();
    match err.kind() {
        ReelforgeErrorKind::Pipeline(e) => {
            assert_eq!(e.kind, PipelineErrorKind::PollTimeout { attempts: 7 });
            assert!(e.kind.to_string().starts_with("timeout: image generation took too long"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(job.calls(), 7);
}

#[tokio::test]
async fn blank_error_is_not_a_failure() {
    let job = ScriptedJob::new(vec![
        Some(ImageResult::failed("  ")),
        Some(ImageResult::ready("https://cdn/ok.png", 0, 0)),
    ]);
    let result = poll_until_complete(&job, "job-1", &fast(5)).await.unwrap();
    assert!(result.completed);
}
