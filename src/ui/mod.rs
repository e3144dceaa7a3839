use chrono::Utc;
use iced::{
    widget::{
        button, column, container, pick_list, progress_bar, row, scrollable, text, text_input,
        Column, Space,
    },
    Color, Element, Length,
};

use crate::{
    application::SessionContext,
    domain::{
        guard::{BANNER_WARNING, EXIT_WARNING},
        DownloadPhase, DownloadRecord, PlatformDescriptor, PlatformRegistry,
    },
    utils::{file_count_label, format_relative_time},
};

const ERROR_COLOR: Color = Color::from_rgb(0.86, 0.15, 0.15);
const SUCCESS_COLOR: Color = Color::from_rgb(0.09, 0.64, 0.29);
const MUTED_COLOR: Color = Color::from_rgb(0.39, 0.45, 0.55);

/// Main view state
pub struct DownloadView {
    pub url: String,
    pub platform: &'static PlatformDescriptor,
    pub phase: DownloadPhase,
    pub progress_percent: u8,
    pub progress_text: String,
    pub show_progress: bool,
    pub banner_dismissed: bool,
    pub exit_prompt: bool,
    pub status_message: String,
    pub save_status: String,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            url: String::new(),
            platform: PlatformRegistry::builtin().default_platform(),
            phase: DownloadPhase::Idle,
            progress_percent: 0,
            progress_text: String::new(),
            show_progress: false,
            banner_dismissed: false,
            exit_prompt: false,
            status_message: String::new(),
            save_status: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    PlatformSelected(&'static PlatformDescriptor),
    DownloadPressed,
    FilePressed { platform_id: String, filename: String },
    DismissWarning,
    ConfirmExit,
    CancelExit,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.url = url;
                self.hide_progress();
            }
            DownloadMessage::PlatformSelected(platform) => {
                self.platform = platform;
                self.hide_progress();
            }
            DownloadMessage::DismissWarning => {
                self.banner_dismissed = true;
            }
            DownloadMessage::CancelExit => {
                self.exit_prompt = false;
            }
            DownloadMessage::DownloadPressed
            | DownloadMessage::FilePressed { .. }
            | DownloadMessage::ConfirmExit => {
                // Will be handled by the app
            }
        }
    }

    pub fn start_progress(&mut self) {
        self.phase = DownloadPhase::Submitting;
        self.show_progress = true;
        self.progress_percent = 0;
        self.progress_text = "Starting download...".to_string();
        self.status_message.clear();
    }

    pub fn set_progress(&mut self, percent: u8, text: String) {
        self.phase = DownloadPhase::Polling;
        self.progress_percent = percent;
        self.progress_text = text;
    }

    pub fn finish(&mut self) {
        self.phase = DownloadPhase::Completed;
        self.progress_percent = 100;
        self.progress_text = "Download completed!".to_string();
        self.url.clear();
        self.banner_dismissed = false;
    }

    pub fn fail(&mut self, message: String) {
        self.phase = DownloadPhase::Failed;
        self.progress_percent = 0;
        self.progress_text = message;
    }

    fn hide_progress(&mut self) {
        if !self.phase.is_busy() {
            self.show_progress = false;
        }
    }

    pub fn view<'a>(&'a self, context: &'a SessionContext) -> Element<'a, DownloadMessage> {
        let platforms: Vec<&'static PlatformDescriptor> =
            PlatformRegistry::builtin().all().collect();

        let busy = self.phase.is_busy();
        let download_button = button(if busy { "Downloading..." } else { "Download" })
            .on_press_maybe((!busy).then_some(DownloadMessage::DownloadPressed))
            .padding([10, 20]);

        let mut url_input = text_input(self.platform.placeholder, &self.url).padding(10);
        if !busy {
            url_input = url_input
                .on_input(DownloadMessage::UrlChanged)
                .on_submit(DownloadMessage::DownloadPressed);
        }

        let mut content = Column::new().padding(20).spacing(10);

        if context.warning_visible() && !self.banner_dismissed {
            content = content.push(
                container(
                    row![
                        text(BANNER_WARNING).size(14).width(Length::Fill),
                        button("×").on_press(DownloadMessage::DismissWarning),
                    ]
                    .spacing(10),
                )
                .padding(10)
                .style(container::rounded_box),
            );
        }

        if self.exit_prompt {
            content = content.push(
                container(
                    row![
                        text(EXIT_WARNING).size(14).color(ERROR_COLOR).width(Length::Fill),
                        button("Quit anyway").on_press(DownloadMessage::ConfirmExit),
                        button("Stay").on_press(DownloadMessage::CancelExit),
                    ]
                    .spacing(10),
                )
                .padding(10)
                .style(container::rounded_box),
            );
        }

        content = content
            .push(text("Maxth Downloader").size(32))
            .push(Space::new().height(Length::Fixed(10.0)))
            .push(
                row![
                    text("Platform:").size(16),
                    pick_list(
                        platforms,
                        Some(self.platform),
                        DownloadMessage::PlatformSelected
                    ),
                ]
                .spacing(10),
            )
            .push(url_input)
            .push(download_button);

        if !self.status_message.is_empty() {
            content = content.push(text(&self.status_message).size(14).color(ERROR_COLOR));
        }

        if self.show_progress {
            let color = match self.phase {
                DownloadPhase::Failed => Some(ERROR_COLOR),
                DownloadPhase::Completed => Some(SUCCESS_COLOR),
                _ => None,
            };
            let mut progress_text = text(&self.progress_text).size(14);
            if let Some(color) = color {
                progress_text = progress_text.color(color);
            }

            content = content
                .push(progress_bar(0.0..=100.0, self.progress_percent as f32))
                .push(progress_text)
                .push(
                    text("Download speed depends on your network connection and server load")
                        .size(12)
                        .color(MUTED_COLOR),
                );
        }

        if !self.save_status.is_empty() {
            content = content.push(text(&self.save_status).size(13).color(MUTED_COLOR));
        }

        content = content
            .push(Space::new().height(Length::Fixed(20.0)))
            .push(
                row![
                    text("Recent downloads").size(20).width(Length::Fill),
                    text(if context.is_fully_acknowledged() {
                        format!("{} · all saved", file_count_label(context.total_file_count()))
                    } else {
                        file_count_label(context.total_file_count())
                    })
                    .size(14),
                ]
                .spacing(10),
            )
            .push(scrollable(history_list(context)).height(Length::Fill));

        content.into()
    }
}

fn history_list(context: &SessionContext) -> Element<'_, DownloadMessage> {
    if context.history().is_empty() {
        return container(text("No downloads yet").color(MUTED_COLOR))
            .padding(40)
            .center_x(Length::Fill)
            .into();
    }

    let now = Utc::now();
    context
        .history()
        .records()
        .fold(Column::new().spacing(12), |list, record| {
            list.push(history_item(context, record, now))
        })
        .into()
}

fn history_item<'a>(
    context: &'a SessionContext,
    record: &'a DownloadRecord,
    now: chrono::DateTime<Utc>,
) -> Element<'a, DownloadMessage> {
    let files = record.files.iter().fold(Column::new().spacing(4), |files, file| {
        let label = if context.is_acknowledged(file) {
            format!("✓ {}", file)
        } else {
            file.clone()
        };
        files.push(
            button(text(label).size(13))
                .on_press(DownloadMessage::FilePressed {
                    platform_id: record.platform_id.clone(),
                    filename: file.clone(),
                })
                .style(button::text),
        )
    });

    container(
        row![
            column![
                text(&record.title).size(16),
                text(&record.platform_id).size(12).color(MUTED_COLOR),
                files,
            ]
            .spacing(4)
            .width(Length::Fill),
            text(format_relative_time(record.completed_at, now))
                .size(12)
                .color(MUTED_COLOR),
        ]
        .spacing(10),
    )
    .padding(10)
    .style(container::rounded_box)
    .into()
}
