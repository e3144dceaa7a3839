use futures::Stream;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use super::models::{ApiConfig, StatusResponse, SubmitRequest, SubmitResponse};
use crate::domain::{AppError, DownloadRequest};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    HttpStatus(StatusCode),

    #[error("Empty response")]
    EmptyResponse,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// The service answered with its own `error` field.
    #[error("{0}")]
    ApiError(String),

    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RequestError(_) | ApiError::HttpStatus(_) | ApiError::InvalidUrl(_) => {
                AppError::Transport(err.to_string())
            }
            ApiError::EmptyResponse | ApiError::InvalidResponse(_) | ApiError::ApiError(_) => {
                AppError::Protocol(err.to_string())
            }
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Builds `{base_url}/{segments...}`, percent-encoding every segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.config.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Non-2xx, an empty body and malformed JSON are all failures here.
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status));
        }

        let text = response.text().await?;
        if text.is_empty() {
            return Err(ApiError::EmptyResponse);
        }

        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))
    }

    /// `POST /download`, returns the job id the service issued.
    pub async fn submit(&self, request: &DownloadRequest) -> Result<String> {
        let url = self.endpoint(&["download"])?;
        let response = self
            .http
            .post(url)
            .json(&SubmitRequest {
                url: &request.url,
                platform: &request.platform_id,
            })
            .send()
            .await?;

        let json: SubmitResponse = Self::read_json(response).await?;

        if let Some(error) = json.error.filter(|e| !e.is_empty()) {
            return Err(ApiError::ApiError(error));
        }

        json.download_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("missing download_id".to_string()))
    }

    /// `GET /status/{download_id}`
    pub async fn status(&self, download_id: &str) -> Result<StatusResponse> {
        let url = self.endpoint(&["status", download_id])?;
        let response = self.http.get(url).send().await?;
        Self::read_json(response).await
    }

    /// Link to a delivered file, `GET /download-file/{platform}/{filename}`.
    pub fn file_url(&self, platform_id: &str, filename: &str) -> Result<Url> {
        self.endpoint(&["download-file", platform_id, filename])
    }

    /// Download file with progress stream
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        download_url: Url,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self.http.get(download_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status));
        }

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::RequestError);

        Ok((total_size, stream))
    }
}
