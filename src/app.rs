use crate::api::{ApiClient, ApiConfig};
use crate::application::{DownloadCoordinator, FileEvent, SessionContext, SessionEvent};
use crate::domain::ExitDecision;
use crate::ui::{DownloadMessage, DownloadView};
use futures::StreamExt;
use iced::{window, Subscription, Task};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
    context: SessionContext,
    // Token of the job currently shown in the progress area
    active_session: Option<CancellationToken>,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new(ApiConfig::from_env())
    }
}

impl DownloadApp {
    pub fn new(config: ApiConfig) -> Self {
        tracing::info!("Using download service at {}", config.base_url);
        let coordinator = DownloadCoordinator::new(ApiClient::new(config));

        Self {
            view: DownloadView::default(),
            coordinator,
            context: SessionContext::default(),
            active_session: None,
        }
    }

    fn start_download(&mut self) -> Task<Message> {
        match self
            .coordinator
            .start_download(&self.view.url, self.view.platform.id)
        {
            Ok((token, events)) => {
                self.active_session = Some(token);
                self.view.start_progress();
                Task::stream(events.map(Message::Session))
            }
            Err(e) => {
                tracing::warn!("Rejected submission: {}", e);
                self.view.status_message = e.to_string();
                Task::none()
            }
        }
    }

    fn shutdown(&mut self) -> Task<Message> {
        if let Some(token) = self.active_session.take() {
            token.cancel();
        }
        iced::exit()
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Events of the running download session, in order
    Session(SessionEvent),
    SaveLocationChosen {
        platform_id: String,
        filename: String,
        path: Option<PathBuf>,
    },
    FileTransfer {
        filename: String,
        event: FileEvent,
    },
    CloseRequested(window::Id),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::DownloadPressed if !app.view.phase.is_busy() => {
                    return app.start_download();
                }
                DownloadMessage::FilePressed {
                    platform_id,
                    filename,
                } => {
                    let coordinator = app.coordinator.clone();
                    return Task::perform(
                        async move {
                            let path = coordinator.choose_save_path(filename.clone()).await;
                            (platform_id, filename, path)
                        },
                        |(platform_id, filename, path)| Message::SaveLocationChosen {
                            platform_id,
                            filename,
                            path,
                        },
                    );
                }
                DownloadMessage::ConfirmExit => {
                    tracing::info!("Closing with unsaved files");
                    return app.shutdown();
                }
                _ => {}
            }
        }
        Message::Session(event) => match event {
            SessionEvent::Submitted { job_id } => {
                tracing::debug!("Polling job {}", job_id);
            }
            SessionEvent::Progress { percent, text } => {
                app.view.set_progress(percent, text);
            }
            SessionEvent::Completed(record) => {
                app.active_session = None;
                app.context.record_completed(record);
                app.view.finish();
            }
            SessionEvent::Failed(e) => {
                app.active_session = None;
                app.view.fail(e.failure_message());
            }
        },
        Message::SaveLocationChosen {
            platform_id,
            filename,
            path,
        } => match path {
            Some(path) => {
                app.view.save_status = format!("Saving {}...", filename);
                let events = app
                    .coordinator
                    .save_file_stream(platform_id, filename.clone(), path);
                return Task::stream(events.map(move |event| Message::FileTransfer {
                    filename: filename.clone(),
                    event,
                }));
            }
            None => {
                // User cancelled dialog
                app.view.save_status = format!("Save of {} cancelled", filename);
            }
        },
        Message::FileTransfer { filename, event } => match event {
            FileEvent::Progress(progress) => {
                app.view.save_status =
                    format!("Saving {}: {:.0}%", filename, progress * 100.0);
            }
            FileEvent::Completed(path) => {
                app.context.acknowledge(&filename);
                app.view.save_status = format!("Saved: {}", path.display());
            }
            FileEvent::Failed(e) => {
                tracing::warn!("Saving {} failed: {}", filename, e);
                app.view.save_status = format!("Failed to save {}: {}", filename, e);
            }
        },
        Message::CloseRequested(_id) => match app.context.on_exit_attempt() {
            ExitDecision::Proceed => return app.shutdown(),
            ExitDecision::Intercept => {
                tracing::info!("Close intercepted, unsaved files remain");
                app.view.exit_prompt = true;
            }
        },
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view(&app.context).map(Message::UiMessage)
}

pub fn subscription(_app: &DownloadApp) -> Subscription<Message> {
    window::close_requests().map(Message::CloseRequested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppError, DownloadPhase, DownloadRecord};
    use chrono::Utc;

    fn completed(files: &[&str]) -> Message {
        Message::Session(SessionEvent::Completed(DownloadRecord {
            title: "Song".to_string(),
            platform_id: "youtube-audio".to_string(),
            source_url: "https://youtu.be/abc".to_string(),
            output_path: None,
            files: files.iter().map(|f| f.to_string()).collect(),
            completed_at: Utc::now(),
        }))
    }

    #[test]
    fn test_close_is_intercepted_until_files_are_saved() {
        let mut app = DownloadApp::new(ApiConfig::default());
        app.view.url = "https://youtu.be/abc".to_string();

        let _ = update(&mut app, completed(&["song.mp3"]));
        assert_eq!(app.view.phase, DownloadPhase::Completed);
        assert!(app.view.url.is_empty());
        assert!(app.context.warning_visible());

        let _ = update(&mut app, Message::CloseRequested(window::Id::unique()));
        assert!(app.view.exit_prompt);

        let _ = update(&mut app, Message::UiMessage(DownloadMessage::CancelExit));
        assert!(!app.view.exit_prompt);

        let _ = update(
            &mut app,
            Message::FileTransfer {
                filename: "song.mp3".to_string(),
                event: FileEvent::Completed(PathBuf::from("/tmp/song.mp3")),
            },
        );
        assert!(!app.context.warning_visible());

        let _ = update(&mut app, Message::CloseRequested(window::Id::unique()));
        assert!(!app.view.exit_prompt);
    }

    #[test]
    fn test_only_a_finished_save_acknowledges() {
        let mut app = DownloadApp::new(ApiConfig::default());
        let _ = update(&mut app, completed(&["song.mp3"]));
        let _ = update(
            &mut app,
            Message::UiMessage(DownloadMessage::FilePressed {
                platform_id: "youtube-audio".to_string(),
                filename: "song.mp3".to_string(),
            }),
        );
        assert!(!app.context.is_acknowledged("song.mp3"));

        let _ = update(
            &mut app,
            Message::SaveLocationChosen {
                platform_id: "youtube-audio".to_string(),
                filename: "song.mp3".to_string(),
                path: None,
            },
        );
        assert!(app.context.warning_visible());

        let _ = update(
            &mut app,
            Message::FileTransfer {
                filename: "song.mp3".to_string(),
                event: FileEvent::Failed(AppError::Transport("HTTP 404 Not Found".to_string())),
            },
        );
        assert!(app.context.warning_visible());
        assert!(app.view.save_status.contains("HTTP 404"));
    }

    #[test]
    fn test_invalid_url_is_reported_without_starting() {
        let mut app = DownloadApp::new(ApiConfig::default());
        app.view.url = "https://youtu.be/abc".to_string();

        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));
        assert_eq!(app.view.status_message, "Invalid URL for selected platform");
        assert_eq!(app.view.phase, DownloadPhase::Idle);
        assert!(app.active_session.is_none());
    }

    #[test]
    fn test_service_error_resets_progress() {
        let mut app = DownloadApp::new(ApiConfig::default());
        app.view.start_progress();
        let _ = update(
            &mut app,
            Message::Session(SessionEvent::Progress {
                percent: 70,
                text: "Downloading audio...".to_string(),
            }),
        );
        assert_eq!(app.view.progress_percent, 70);

        let _ = update(
            &mut app,
            Message::Session(SessionEvent::Failed(AppError::Protocol(
                "rate limited".to_string(),
            ))),
        );
        assert_eq!(app.view.phase, DownloadPhase::Failed);
        assert_eq!(app.view.progress_percent, 0);
        assert!(app.view.progress_text.contains("rate limited"));
    }
}
