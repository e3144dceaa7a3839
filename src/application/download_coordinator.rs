use std::path::PathBuf;
use std::sync::Arc;

use futures::{stream::BoxStream, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use super::session::{Clock, DownloadSession, JobService, SessionEvent, TokioClock};
use crate::{
    api::ApiClient,
    domain::{AppError, PlatformRegistry},
    utils::sanitize_filename,
};

/// Progress of saving one delivered file to the user's disk.
#[derive(Debug, Clone)]
pub enum FileEvent {
    Progress(f32),
    Completed(PathBuf),
    Failed(AppError),
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ApiClient,
    service: Arc<dyn JobService>,
    clock: Arc<dyn Clock>,
    registry: &'static PlatformRegistry,
}

impl DownloadCoordinator {
    pub fn new(api_client: ApiClient) -> Self {
        Self {
            service: Arc::new(api_client.clone()),
            api_client,
            clock: Arc::new(TokioClock),
            registry: PlatformRegistry::builtin(),
        }
    }

    #[cfg(test)]
    fn with_service(api_client: ApiClient, service: Arc<dyn JobService>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api_client,
            service,
            clock,
            registry: PlatformRegistry::builtin(),
        }
    }

    /// Validates the input and, only if it passes, starts a session for it.
    ///
    /// Validation runs before anything touches the network, so a rejected URL
    /// never produces a job.
    pub fn start_download(
        &self,
        url: &str,
        platform_id: &str,
    ) -> Result<(CancellationToken, BoxStream<'static, SessionEvent>), AppError> {
        let request = self.registry.validate_request(url, platform_id)?;

        let session = DownloadSession::new(
            self.service.clone(),
            self.clock.clone(),
            self.api_client.config().poll_interval,
        );
        let token = session.cancellation_token();
        Ok((token, session.run(request)))
    }

    pub async fn choose_save_path(&self, filename: String) -> Option<PathBuf> {
        let suggested = sanitize_filename(&filename);
        rfd::AsyncFileDialog::new()
            .set_file_name(&suggested)
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Streams `GET /download-file/{platform}/{filename}` into `path`.
    ///
    /// `path` is only created once the service has answered with a 2xx, and
    /// is removed again if the transfer fails part way.
    pub fn save_file_stream(
        &self,
        platform_id: String,
        filename: String,
        path: PathBuf,
    ) -> BoxStream<'static, FileEvent> {
        let client = self.api_client.clone();
        futures::stream::unfold(
            SaveState::Connecting {
                client,
                platform_id,
                filename,
                path,
            },
            |state| async move {
                match state {
                    SaveState::Connecting {
                        client,
                        platform_id,
                        filename,
                        path,
                    } => {
                        let opened = open_transfer(&client, &platform_id, &filename, path).await;
                        match opened {
                            Ok(transfer) => {
                                Some((FileEvent::Progress(0.0), SaveState::Receiving(transfer)))
                            }
                            Err(e) => {
                                tracing::warn!("Could not start saving {}: {}", filename, e);
                                Some((FileEvent::Failed(e), SaveState::Done))
                            }
                        }
                    }
                    SaveState::Receiving(mut transfer) => match transfer.advance().await {
                        Ok(Some(fraction)) => {
                            Some((FileEvent::Progress(fraction), SaveState::Receiving(transfer)))
                        }
                        Ok(None) => {
                            Some((FileEvent::Completed(transfer.path), SaveState::Done))
                        }
                        Err(e) => {
                            let event = transfer.discard(e).await;
                            Some((event, SaveState::Done))
                        }
                    },
                    SaveState::Done => None,
                }
            },
        )
        .boxed()
    }
}

async fn open_transfer(
    client: &ApiClient,
    platform_id: &str,
    filename: &str,
    path: PathBuf,
) -> Result<FileTransfer, AppError> {
    let url = client.file_url(platform_id, filename)?;
    let (total, body) = client.download_file_stream(url).await?;

    let file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| AppError::Io(format!("Failed to create file: {}", e)))?;

    tracing::info!("Saving {} to {}", filename, path.display());
    Ok(FileTransfer {
        file,
        body: body.boxed(),
        received: 0,
        total,
        path,
    })
}

enum SaveState {
    Connecting {
        client: ApiClient,
        platform_id: String,
        filename: String,
        path: PathBuf,
    },
    Receiving(FileTransfer),
    Done,
}

/// A response body being copied into a freshly created file.
struct FileTransfer {
    file: tokio::fs::File,
    body: BoxStream<'static, crate::api::Result<bytes::Bytes>>,
    received: u64,
    total: Option<u64>,
    path: PathBuf,
}

impl FileTransfer {
    /// Writes the next chunk. `Ok(None)` once the body is exhausted and the
    /// file has been flushed to disk.
    async fn advance(&mut self) -> Result<Option<f32>, AppError> {
        let Some(chunk) = self.body.next().await else {
            self.file
                .sync_all()
                .await
                .map_err(|e| AppError::Io(format!("Failed to sync file: {}", e)))?;
            return Ok(None);
        };

        let chunk = chunk?;
        self.file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Io(format!("Write error: {}", e)))?;
        self.received += chunk.len() as u64;

        Ok(Some(match self.total {
            Some(total) if total > 0 => self.received as f32 / total as f32,
            _ => 0.0,
        }))
    }

    /// Drops the partial file and reports `reason`.
    async fn discard(self, reason: AppError) -> FileEvent {
        let Self { file, path, .. } = self;
        drop(file);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Could not remove partial file {}: {}", path.display(), e);
        }
        FileEvent::Failed(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiConfig, StatusResponse};
    use crate::application::session::testing::{InstantClock, ScriptedService};
    use crate::application::SessionContext;
    use crate::domain::ValidationError;
    use mockito::Server;

    fn coordinator(service: Arc<ScriptedService>) -> DownloadCoordinator {
        DownloadCoordinator::with_service(
            ApiClient::new(ApiConfig::default()),
            service,
            Arc::new(InstantClock::default()),
        )
    }

    #[tokio::test]
    async fn test_end_to_end_acknowledgement_flow() {
        let service = Arc::new(ScriptedService::new(
            Ok("42".to_string()),
            vec![
                Ok(StatusResponse::progress("Fetching track info...")),
                Ok(StatusResponse {
                    status: "completed".to_string(),
                    title: Some("Song".to_string()),
                    files: Some(vec!["song.mp3".to_string()]),
                    ..Default::default()
                }),
            ],
        ));
        let mut context = SessionContext::default();

        let (_token, events) = coordinator(service.clone())
            .start_download("https://youtu.be/abc", "youtube-audio")
            .unwrap();
        let events: Vec<_> = events.collect().await;

        assert!(matches!(&events[1], SessionEvent::Progress { percent: 20, .. }));
        for event in events {
            if let SessionEvent::Completed(record) = event {
                context.record_completed(record);
            }
        }

        assert_eq!(context.history().len(), 1);
        assert_eq!(context.total_file_count(), 1);
        assert!(context.warning_visible());

        context.acknowledge("song.mp3");
        assert!(!context.warning_visible());
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_call() {
        let service = Arc::new(ScriptedService::new(Ok("1".to_string()), vec![]));

        let result = coordinator(service.clone())
            .start_download("https://example.com/not-a-track", "spotify");

        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::PatternMismatch))
        ));
        assert_eq!(service.submits(), 0);
        assert_eq!(service.polls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_url_never_reaches_server() {
        let mut server = Server::new_async().await;
        let submit = server
            .mock("POST", "/download")
            .expect(0)
            .create_async()
            .await;
        let coordinator = DownloadCoordinator::new(ApiClient::new(ApiConfig {
            base_url: server.url(),
            ..Default::default()
        }));

        assert!(coordinator.start_download("youtu.be", "tiktok").is_err());
        assert!(coordinator.start_download("", "tiktok").is_err());
        submit.assert_async().await;
    }

    #[tokio::test]
    async fn test_save_file_stream_writes_bytes() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/download-file/spotify/Artist%20-%20Song.mp3")
            .with_status(200)
            .with_body("ID3-bytes")
            .create_async()
            .await;
        let coordinator = DownloadCoordinator::new(ApiClient::new(ApiConfig {
            base_url: server.url(),
            ..Default::default()
        }));

        let path = std::env::temp_dir().join(format!(
            "maxth-save-test-{}.mp3",
            std::process::id()
        ));
        let events: Vec<_> = coordinator
            .save_file_stream(
                "spotify".to_string(),
                "Artist - Song.mp3".to_string(),
                path.clone(),
            )
            .collect()
            .await;

        assert!(matches!(events.last(), Some(FileEvent::Completed(p)) if *p == path));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"ID3-bytes");
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_save_file_stream_reports_missing_file() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/download-file/spotify/gone.mp3")
            .with_status(404)
            .with_body(r#"{"error":"File not found"}"#)
            .create_async()
            .await;
        let coordinator = DownloadCoordinator::new(ApiClient::new(ApiConfig {
            base_url: server.url(),
            ..Default::default()
        }));

        let path = std::env::temp_dir().join(format!(
            "maxth-missing-test-{}.mp3",
            std::process::id()
        ));
        let events: Vec<_> = coordinator
            .save_file_stream("spotify".to_string(), "gone.mp3".to_string(), path.clone())
            .collect()
            .await;

        assert!(matches!(
            events.last(),
            Some(FileEvent::Failed(AppError::Transport(msg))) if msg.contains("404")
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_file() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/download-file/tiktok/clip.mp4")
            .with_status(200)
            .with_body("video-bytes")
            .create_async()
            .await;
        let coordinator = DownloadCoordinator::new(ApiClient::new(ApiConfig {
            base_url: server.url(),
            ..Default::default()
        }));

        let path = std::env::temp_dir()
            .join(format!("maxth-no-such-dir-{}", std::process::id()))
            .join("clip.mp4");
        let events: Vec<_> = coordinator
            .save_file_stream("tiktok".to_string(), "clip.mp4".to_string(), path.clone())
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], FileEvent::Failed(AppError::Io(_))));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_broken_body_removes_partial_file() {
        let path = std::env::temp_dir().join(format!(
            "maxth-partial-test-{}.mp3",
            std::process::id()
        ));
        let body = futures::stream::iter(vec![
            Ok(bytes::Bytes::from_static(b"ID3")),
            Err(crate::api::client::ApiError::HttpStatus(
                reqwest::StatusCode::BAD_GATEWAY,
            )),
        ]);
        let mut transfer = FileTransfer {
            file: tokio::fs::File::create(&path).await.unwrap(),
            body: body.boxed(),
            received: 0,
            total: Some(6),
            path: path.clone(),
        };

        assert_eq!(transfer.advance().await.unwrap(), Some(0.5));
        let err = transfer.advance().await.unwrap_err();
        assert!(path.exists());

        let event = transfer.discard(err).await;
        assert!(matches!(event, FileEvent::Failed(AppError::Transport(msg)) if msg.contains("502")));
        assert!(!path.exists());
    }
}
