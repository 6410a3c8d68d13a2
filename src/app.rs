use crate::api::{ApiClient, ApiConfig};
use crate::application::DownloadCoordinator;
use crate::domain::{AppError, DownloadEvent, Link};
use crate::ui::{DownloadMessage, DownloadView};
use crate::utils::{is_valid_url, validate_folder_name};
use futures::StreamExt;
use iced::Task;
use log::info;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
    // Token of the batch in flight, if any
    cancel_token: Option<CancellationToken>,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadApp {
    pub fn new() -> Self {
        let api_client = ApiClient::new(ApiConfig::default());

        Self {
            view: DownloadView::default(),
            coordinator: DownloadCoordinator::new(api_client),
            cancel_token: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Links found on the page, or why the page could not be read
    LinksListed(Result<Vec<Link>, AppError>),
    FolderChosen(Option<PathBuf>),
    Download(DownloadEvent),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::ListPressed if !app.view.is_busy() => {
                    if !is_valid_url(&app.view.page_url) {
                        app.view.show_error(&AppError::InvalidUrl);
                        return Task::none();
                    }

                    app.view.is_listing = true;
                    app.view.error_message = None;
                    app.view.status_message = "Listing files...".to_string();

                    let coordinator = app.coordinator.clone();
                    let page_url = app.view.page_url.clone();

                    // iced Task::perform runs in the background tokio executor
                    return Task::perform(
                        async move { coordinator.list_links(page_url).await },
                        Message::LinksListed,
                    );
                }
                DownloadMessage::BrowsePressed if !app.view.is_busy() => {
                    let coordinator = app.coordinator.clone();
                    return Task::perform(
                        async move { coordinator.choose_folder().await },
                        Message::FolderChosen,
                    );
                }
                DownloadMessage::DownloadPressed => {
                    if app.view.is_downloading {
                        if let Some(token) = &app.cancel_token {
                            info!("Cancelling download");
                            token.cancel();
                        }
                        app.view.is_cancelling = true;
                        app.view.status_message = "Cancelling...".to_string();
                        return Task::none();
                    }

                    if app.view.is_listing || app.view.links.is_empty() {
                        return Task::none();
                    }

                    let folder = match validate_folder_name(&app.view.folder_name) {
                        Ok(folder) => folder,
                        Err(e) => {
                            app.view.show_error(&e);
                            return Task::none();
                        }
                    };

                    let token = CancellationToken::new();
                    app.cancel_token = Some(token.clone());
                    app.view.start_batch();

                    let events = app
                        .coordinator
                        .download_stream(app.view.links.clone(), folder, token)
                        .map(Message::Download);

                    return Task::stream(events);
                }
                _ => {}
            }
        }
        Message::LinksListed(result) => {
            app.view.show_links(result);
        }
        Message::FolderChosen(Some(path)) => {
            app.view.folder_name = path.display().to_string();
        }
        Message::FolderChosen(None) => {}
        Message::Download(event) => {
            app.view.apply_event(&event);
            if let DownloadEvent::Finished(_) = event {
                app.cancel_token = None;
            }
        }
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}
