use std::collections::HashMap;

use iced::{
    widget::{button, column, progress_bar, row, scrollable, text, text_input, Column, Space},
    Alignment, Element, Length,
};

use crate::domain::{target_file_name, AppError, DownloadEvent, Link, LinkStatus};

/// Main view state
pub struct DownloadView {
    pub page_url: String,
    pub folder_name: String,
    pub links: Vec<Link>,
    /// Render-only snapshot, rebuilt from download events
    pub statuses: HashMap<Link, LinkStatus>,
    pub error_message: Option<String>,
    pub status_message: String,
    pub is_listing: bool,
    pub is_downloading: bool,
    pub is_cancelling: bool,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            page_url: String::new(),
            folder_name: String::new(),
            links: Vec::new(),
            statuses: HashMap::new(),
            error_message: None,
            status_message: "Enter the link of a page with .mp3 files".to_string(),
            is_listing: false,
            is_downloading: false,
            is_cancelling: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    PageUrlChanged(String),
    FolderNameChanged(String),
    BrowsePressed,
    ListPressed,
    DownloadPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::PageUrlChanged(url) => {
                self.page_url = url;
            }
            DownloadMessage::FolderNameChanged(name) => {
                self.folder_name = name;
            }
            DownloadMessage::BrowsePressed
            | DownloadMessage::ListPressed
            | DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.is_listing || self.is_downloading
    }

    pub fn show_error(&mut self, error: &AppError) {
        self.error_message = Some(error.to_string());
    }

    /// Replace the listed links with the outcome of a page scrape
    pub fn show_links(&mut self, result: Result<Vec<Link>, AppError>) {
        self.is_listing = false;
        self.statuses.clear();

        match result {
            Ok(links) => {
                self.error_message = None;
                self.status_message = if links.is_empty() {
                    "No .mp3 links found on this page".to_string()
                } else {
                    format!("Found {} files", links.len())
                };
                self.statuses = links
                    .iter()
                    .map(|link| (link.clone(), LinkStatus::Pending))
                    .collect();
                self.links = links;
            }
            Err(e) => {
                self.links.clear();
                self.status_message = "Could not list the files".to_string();
                self.show_error(&e);
            }
        }
    }

    pub fn start_batch(&mut self) {
        self.is_downloading = true;
        self.is_cancelling = false;
        self.error_message = None;
        self.status_message = "Downloading...".to_string();
        for status in self.statuses.values_mut() {
            *status = LinkStatus::Pending;
        }
    }

    /// Fold one download event into the view
    pub fn apply_event(&mut self, event: &DownloadEvent) {
        match event {
            DownloadEvent::Started { link, path } => {
                self.statuses
                    .insert(link.clone(), LinkStatus::Downloading(0.0));
                self.status_message = format!("Downloading to: {}", path.display());
            }
            DownloadEvent::Progress { link, fraction } => {
                self.statuses
                    .insert(link.clone(), LinkStatus::Downloading(*fraction));
            }
            DownloadEvent::Completed { link, path } => {
                self.statuses.insert(link.clone(), LinkStatus::Done);
                self.status_message = format!("Saved: {}", path.display());
            }
            DownloadEvent::Failed { link, error } => {
                self.statuses
                    .insert(link.clone(), LinkStatus::Failed(error.to_string()));
            }
            DownloadEvent::Cancelled => {
                self.status_message = "Download cancelled".to_string();
            }
            DownloadEvent::Aborted(error) => {
                self.show_error(error);
            }
            DownloadEvent::Finished(summary) => {
                self.is_downloading = false;
                self.is_cancelling = false;
                let mut message = format!("Downloaded {} files", summary.completed.len());
                if !summary.failed.is_empty() {
                    message.push_str(&format!(", {} failed", summary.failed.len()));
                }
                if summary.cancelled {
                    message.push_str(" (cancelled)");
                }
                self.status_message = message;
            }
        }
    }

    fn link_row<'a>(&'a self, link: &'a Link) -> Element<'a, DownloadMessage> {
        let status = self
            .statuses
            .get(link)
            .cloned()
            .unwrap_or(LinkStatus::Pending);
        let label = match &status {
            LinkStatus::Pending => String::new(),
            LinkStatus::Downloading(fraction) => format!("{:.0}%", fraction * 100.0),
            LinkStatus::Done => "done".to_string(),
            LinkStatus::Failed(_) => "failed".to_string(),
        };
        let label = match &status {
            LinkStatus::Failed(_) => text(label).style(text::danger),
            _ => text(label),
        };

        row![
            text(target_file_name(link)).width(Length::FillPortion(2)),
            progress_bar(0.0..=1.0, status.fraction()),
            label.width(Length::Fixed(60.0)),
        ]
        .spacing(8)
        .align_y(Alignment::Center)
        .into()
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let busy = self.is_busy();

        let list: Element<'_, DownloadMessage> = match &self.error_message {
            Some(error) => text(error).style(text::danger).into(),
            None => scrollable(
                Column::with_children(self.links.iter().map(|link| self.link_row(link)))
                    .spacing(4),
            )
            .height(Length::Fixed(300.0))
            .into(),
        };

        let download_label = if self.is_downloading {
            "Cancel Download"
        } else {
            "Download Book"
        };
        let can_toggle = if self.is_downloading {
            !self.is_cancelling
        } else {
            !self.is_listing && !self.links.is_empty()
        };

        column![
            text("MP3 Page Downloader").size(32),
            Space::new().height(Length::Fixed(20.0)),
            text_input("Link of the book to download...", &self.page_url)
                .on_input(DownloadMessage::PageUrlChanged)
                .padding(10),
            row![
                text_input("Folder name...", &self.folder_name)
                    .on_input(DownloadMessage::FolderNameChanged)
                    .padding(10),
                button("Browse...")
                    .on_press_maybe((!busy).then_some(DownloadMessage::BrowsePressed))
                    .padding([10, 20]),
                button("List the files to Download")
                    .on_press_maybe((!busy).then_some(DownloadMessage::ListPressed))
                    .padding([10, 20]),
            ]
            .spacing(10),
            list,
            text(&self.status_message).size(14),
            Space::new().height(Length::Fixed(10.0)),
            button(download_label)
                .on_press_maybe(can_toggle.then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20]),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
