use chrono::{DateTime, Utc};

pub const DEFAULT_TITLE: &str = "Downloaded Media";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub platform_id: String,
}

/// Where the UI's single visible download currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

impl DownloadPhase {
    pub fn is_busy(self) -> bool {
        matches!(self, DownloadPhase::Submitting | DownloadPhase::Polling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Polling,
    Completed,
    Failed,
}

/// A job the service accepted. Lives only as long as the loop polling it.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub id: String,
    pub request: DownloadRequest,
    pub status: JobStatus,
    pub last_status_text: String,
    pub progress_percent: u8,
}

impl DownloadJob {
    pub fn new(id: String, request: DownloadRequest) -> Self {
        Self {
            id,
            request,
            status: JobStatus::Polling,
            last_status_text: String::new(),
            progress_percent: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRecord {
    pub title: String,
    pub platform_id: String,
    pub source_url: String,
    pub output_path: Option<String>,
    pub files: Vec<String>,
    pub completed_at: DateTime<Utc>,
}
