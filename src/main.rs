mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use iced::window;

fn main() -> iced::Result {
    tracing_subscriber::fmt::init();

    let icon_data = include_bytes!("../assets/icon.png");

    let icon = match image::load_from_memory(icon_data) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            window::icon::from_rgba(rgba.into_raw(), width, height).ok()
        }
        Err(e) => {
            tracing::warn!("Failed to load window icon: {}", e);
            None
        }
    };

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("Maxth Downloader")
        .subscription(app::subscription)
        .window(window::Settings {
            icon,
            // Close requests go through the unsaved-files guard first
            exit_on_close_request: false,
            ..Default::default()
        })
        .run()
}
