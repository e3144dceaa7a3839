use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_ERROR: &str = "error";

/// Body of `POST /download`
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest<'a> {
    pub url: &'a str,
    pub platform: &'a str,
}

/// Response from `POST /download`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub download_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response from `GET /status/{download_id}`
///
/// `status` is either one of the two terminal literals or free text
/// describing what the server is doing right now.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
impl StatusResponse {
    pub fn progress(text: &str) -> Self {
        Self {
            status: text.to_string(),
            ..Default::default()
        }
    }
}

const API_URL_ENV: &str = "MAXTH_API_URL";
const POLL_INTERVAL_ENV: &str = "MAXTH_POLL_INTERVAL_MS";

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub poll_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            poll_interval: Duration::from_millis(1000),
        }
    }
}

impl ApiConfig {
    /// Defaults, overridden by `MAXTH_API_URL` and `MAXTH_POLL_INTERVAL_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base_url) = lookup(API_URL_ENV) {
            match url::Url::parse(&base_url) {
                Ok(_) => config.base_url = base_url,
                Err(e) => tracing::warn!("Ignoring {}={:?}: {}", API_URL_ENV, base_url, e),
            }
        }

        if let Some(raw) = lookup(POLL_INTERVAL_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
                _ => tracing::warn!("Ignoring {}={:?}: expected a positive integer", POLL_INTERVAL_ENV, raw),
            }
        }

        config
    }
}
