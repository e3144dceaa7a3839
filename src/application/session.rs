use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::{stream::BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{
        models::{STATUS_COMPLETED, STATUS_ERROR},
        ApiClient, StatusResponse,
    },
    domain::{
        model::DEFAULT_TITLE, progress, AppError, DownloadJob, DownloadRecord, DownloadRequest,
        JobStatus,
    },
};

/// The two calls a session makes against the remote service.
#[async_trait]
pub trait JobService: Send + Sync {
    async fn submit(&self, request: &DownloadRequest) -> Result<String, AppError>;
    async fn status(&self, job_id: &str) -> Result<StatusResponse, AppError>;
}

#[async_trait]
impl JobService for ApiClient {
    async fn submit(&self, request: &DownloadRequest) -> Result<String, AppError> {
        Ok(ApiClient::submit(self, request).await?)
    }

    async fn status(&self, job_id: &str) -> Result<StatusResponse, AppError> {
        Ok(ApiClient::status(self, job_id).await?)
    }
}

/// Source of the delay between two status requests.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// What a running session reports, in the order it happened.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Submitted { job_id: String },
    Progress { percent: u8, text: String },
    Completed(DownloadRecord),
    Failed(AppError),
}

/// Drives one job from submission to its terminal status.
///
/// No attempt cap and no deadline: the loop stops on `completed`, `error`,
/// a failed request or the cancellation token.
pub struct DownloadSession {
    service: Arc<dyn JobService>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

enum SessionState {
    Submitting(DownloadRequest),
    Polling { job: DownloadJob, wait: bool },
    Finished,
}

impl DownloadSession {
    pub fn new(service: Arc<dyn JobService>, clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        Self {
            service,
            clock,
            poll_interval,
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the session. The stream ends right after its single terminal event.
    pub fn run(self, request: DownloadRequest) -> BoxStream<'static, SessionEvent> {
        futures::stream::unfold(
            (self, SessionState::Submitting(request)),
            |(session, state)| async move {
                let (event, next) = match state {
                    SessionState::Submitting(request) => session.submit(request).await,
                    SessionState::Polling { job, wait } => session.poll(job, wait).await,
                    SessionState::Finished => return None,
                };
                Some((event, (session, next)))
            },
        )
        .boxed()
    }

    async fn submit(&self, request: DownloadRequest) -> (SessionEvent, SessionState) {
        tracing::info!("Submitting {} download: {}", request.platform_id, request.url);

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AppError::Cancelled),
            result = self.service.submit(&request) => result,
        };

        match result {
            Ok(job_id) => {
                tracing::info!("Job {} accepted", job_id);
                let job = DownloadJob::new(job_id.clone(), request);
                (
                    SessionEvent::Submitted { job_id },
                    SessionState::Polling { job, wait: false },
                )
            }
            Err(e) => {
                tracing::warn!("Submission failed: {}", e);
                (SessionEvent::Failed(e), SessionState::Finished)
            }
        }
    }

    async fn poll(&self, mut job: DownloadJob, wait: bool) -> (SessionEvent, SessionState) {
        if wait {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Self::fail(job, AppError::Cancelled),
                _ = self.clock.sleep(self.poll_interval) => {}
            }
        }

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AppError::Cancelled),
            result = self.service.status(&job.id) => result,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => return Self::fail(job, e),
        };

        match response.status.as_str() {
            STATUS_COMPLETED => {
                job.status = JobStatus::Completed;
                job.progress_percent = 100;
                tracing::info!("Job {} {:?}", job.id, job.status);
                let record = Self::into_record(job, response);
                (SessionEvent::Completed(record), SessionState::Finished)
            }
            STATUS_ERROR => {
                let detail = response
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string());
                Self::fail(job, AppError::Protocol(detail))
            }
            _ => {
                job.progress_percent = progress::estimate(&response.status);
                job.last_status_text = response.status;
                tracing::debug!(
                    "Job {} at {}%: {}",
                    job.id,
                    job.progress_percent,
                    job.last_status_text
                );
                let event = SessionEvent::Progress {
                    percent: job.progress_percent,
                    text: job.last_status_text.clone(),
                };
                (event, SessionState::Polling { job, wait: true })
            }
        }
    }

    fn fail(mut job: DownloadJob, error: AppError) -> (SessionEvent, SessionState) {
        job.status = JobStatus::Failed;
        job.progress_percent = 0;
        tracing::warn!("Job {} {:?}: {}", job.id, job.status, error);
        (SessionEvent::Failed(error), SessionState::Finished)
    }

    fn into_record(job: DownloadJob, response: StatusResponse) -> DownloadRecord {
        DownloadRecord {
            title: response
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            platform_id: job.request.platform_id,
            source_url: job.request.url,
            output_path: response.output_path,
            files: response.files.unwrap_or_default(),
            completed_at: Utc::now(),
        }
    }
}
