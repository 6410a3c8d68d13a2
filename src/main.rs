mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use iced::{window, Size};

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("MP3 Page Downloader")
        .window(window::Settings {
            size: Size::new(800.0, 700.0),
            ..Default::default()
        })
        .run()
}
