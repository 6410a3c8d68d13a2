use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use futures::{stream::BoxStream, StreamExt};
use log::{error, info, warn};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::{
    api::ApiClient,
    domain::{target_path, AppError, BatchSummary, DownloadEvent, Link},
    utils::is_valid_url,
};

#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ApiClient,
}

impl DownloadCoordinator {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    /// List the audio links of a page.
    ///
    /// `Ok` with an empty list means the page had no matching links, a page
    /// that could not be fetched is an `Err`.
    pub async fn list_links(&self, page_url: String) -> Result<Vec<Link>, AppError> {
        if !is_valid_url(&page_url) {
            return Err(AppError::InvalidUrl);
        }

        self.api_client
            .list_links(page_url.trim())
            .await
            .map_err(|e| {
                error!("Failed to list links of {}: {}", page_url, e);
                AppError::Fetch(e.to_string())
            })
    }

    pub async fn choose_folder(&self) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_title("Folder to save the files in")
            .pick_folder()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Download `links` one after another into `folder`, reporting each step
    /// as a [`DownloadEvent`]. The last event is always `Finished`.
    ///
    /// A failed file is reported and skipped. Cancelling `token` stops the
    /// batch before the next chunk is written; the partial file stays on disk.
    pub fn download_stream(
        &self,
        links: Vec<Link>,
        folder: PathBuf,
        token: CancellationToken,
    ) -> BoxStream<'static, DownloadEvent> {
        let run = BatchRun {
            client: self.api_client.clone(),
            folder,
            links: links.into(),
            token,
            summary: BatchSummary::default(),
            outbox: VecDeque::new(),
            phase: Phase::Prepare,
        };

        futures::stream::unfold(run, |mut run| async move {
            loop {
                if let Some(event) = run.outbox.pop_front() {
                    return Some((event, run));
                }
                if !run.step().await {
                    return None;
                }
            }
        })
        .boxed()
    }

    /// Run a whole batch, handing every event to `on_event`.
    ///
    /// Callback form of [`DownloadCoordinator::download_stream`] for callers
    /// that do not consume a stream; the shell uses the stream directly.
    #[allow(dead_code)]
    pub async fn download(
        &self,
        links: Vec<Link>,
        folder: PathBuf,
        token: CancellationToken,
        mut on_event: impl FnMut(&DownloadEvent),
    ) -> BatchSummary {
        let mut events = self.download_stream(links, folder, token);
        let mut summary = BatchSummary::default();

        while let Some(event) = events.next().await {
            on_event(&event);
            if let DownloadEvent::Finished(done) = event {
                summary = done;
            }
        }

        summary
    }
}

struct BatchRun {
    client: ApiClient,
    folder: PathBuf,
    links: VecDeque<Link>,
    token: CancellationToken,
    summary: BatchSummary,
    outbox: VecDeque<DownloadEvent>,
    phase: Phase,
}

enum Phase {
    Prepare,
    NextLink,
    Downloading(ActiveFile),
    Finishing,
    Done,
}

struct ActiveFile {
    link: Link,
    path: PathBuf,
    file: tokio::fs::File,
    stream: BoxStream<'static, crate::api::Result<bytes::Bytes>>,
    downloaded: u64,
    total: Option<u64>,
    fraction: f32,
}

impl ActiveFile {
    /// Flush what was written so far. The partial file stays on disk.
    async fn close_partial(&mut self) {
        if let Err(e) = self.file.flush().await {
            warn!("Failed to flush {}: {}", self.path.display(), e);
        }
    }
}

impl BatchRun {
    /// Advance by one unit of work. Returns `false` once the batch is over.
    async fn step(&mut self) -> bool {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Prepare => {
                self.phase = if self.links.is_empty() {
                    Phase::Finishing
                } else if let Err(e) = ensure_folder(&self.folder).await {
                    error!("Cannot create {}: {}", self.folder.display(), e);
                    self.outbox.push_back(DownloadEvent::Aborted(e));
                    Phase::Finishing
                } else {
                    Phase::NextLink
                };
            }
            Phase::NextLink => {
                if self.token.is_cancelled() {
                    self.cancel();
                    return true;
                }

                let Some(link) = self.links.pop_front() else {
                    self.phase = Phase::Finishing;
                    return true;
                };

                let path = target_path(&self.folder, &link);
                info!("Downloading {} to {}", link, path.display());

                let response = tokio::select! {
                    biased;
                    _ = self.token.cancelled() => None,
                    response = self.client.download_file_stream(&link) => Some(response),
                };

                let (total, stream) = match response {
                    None => {
                        info!("Cancelled while waiting for {}", link);
                        self.cancel();
                        return true;
                    }
                    Some(Err(e)) => {
                        self.fail(link, AppError::Fetch(e.to_string()));
                        self.phase = Phase::NextLink;
                        return true;
                    }
                    Some(Ok(response)) => response,
                };

                // Creating the target truncates it, so never do it once cancelled
                if self.token.is_cancelled() {
                    self.cancel();
                    return true;
                }

                match tokio::fs::File::create(&path).await {
                    Ok(file) => {
                        self.outbox.push_back(DownloadEvent::Started {
                            link: link.clone(),
                            path: path.clone(),
                        });
                        self.phase = Phase::Downloading(ActiveFile {
                            link,
                            path,
                            file,
                            stream,
                            downloaded: 0,
                            total,
                            fraction: 0.0,
                        });
                    }
                    Err(e) => {
                        self.fail(
                            link,
                            AppError::Filesystem(format!("Failed to create file: {}", e)),
                        );
                        self.phase = Phase::NextLink;
                    }
                }
            }
            Phase::Downloading(mut active) => {
                let next = tokio::select! {
                    biased;
                    _ = self.token.cancelled() => None,
                    chunk = active.stream.next() => Some(chunk),
                };

                match next {
                    None => {
                        active.close_partial().await;
                        info!("Cancelled while downloading {}", active.link);
                        self.cancel();
                    }
                    Some(Some(Ok(chunk))) => {
                        if self.token.is_cancelled() {
                            active.close_partial().await;
                            self.cancel();
                            return true;
                        }

                        if let Err(e) = active.file.write_all(&chunk).await {
                            active.close_partial().await;
                            self.fail(
                                active.link,
                                AppError::Filesystem(format!("Write error: {}", e)),
                            );
                            self.phase = Phase::NextLink;
                            return true;
                        }

                        active.downloaded += chunk.len() as u64;
                        active.fraction =
                            active.fraction.max(fraction(active.downloaded, active.total));

                        self.outbox.push_back(DownloadEvent::Progress {
                            link: active.link.clone(),
                            fraction: active.fraction,
                        });
                        self.phase = Phase::Downloading(active);
                    }
                    Some(Some(Err(e))) => {
                        active.close_partial().await;
                        self.fail(active.link, AppError::Fetch(e.to_string()));
                        self.phase = Phase::NextLink;
                    }
                    Some(None) => {
                        if let Err(e) = active.file.sync_all().await {
                            self.fail(
                                active.link,
                                AppError::Filesystem(format!("Failed to sync file: {}", e)),
                            );
                            self.phase = Phase::NextLink;
                            return true;
                        }

                        if active.fraction < 1.0 {
                            self.outbox.push_back(DownloadEvent::Progress {
                                link: active.link.clone(),
                                fraction: 1.0,
                            });
                        }

                        info!(
                            "Saved {} ({} bytes)",
                            active.path.display(),
                            active.downloaded
                        );
                        self.summary.completed.push(active.path.clone());
                        self.outbox.push_back(DownloadEvent::Completed {
                            link: active.link,
                            path: active.path,
                        });
                        self.phase = Phase::NextLink;
                    }
                }
            }
            Phase::Finishing => {
                self.outbox
                    .push_back(DownloadEvent::Finished(self.summary.clone()));
            }
            Phase::Done => return false,
        }

        true
    }

    fn fail(&mut self, link: Link, error: AppError) {
        warn!("Failed to download {}: {}", link, error);
        self.summary.failed.push((link.clone(), error.clone()));
        self.outbox.push_back(DownloadEvent::Failed { link, error });
    }

    fn cancel(&mut self) {
        self.summary.cancelled = true;
        self.outbox.push_back(DownloadEvent::Cancelled);
        self.phase = Phase::Finishing;
    }
}

/// Create the destination folder if it is missing. Parents are not created.
async fn ensure_folder(folder: &Path) -> Result<(), AppError> {
    match tokio::fs::metadata(folder).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(AppError::Filesystem(format!(
            "{} exists and is not a folder",
            folder.display()
        ))),
        Err(_) => tokio::fs::create_dir(folder)
            .await
            .map_err(|e| AppError::Filesystem(format!("Failed to create folder: {}", e))),
    }
}

/// Share of the body received so far. Unknown or zero lengths report 0.0.
fn fraction(downloaded: u64, total: Option<u64>) -> f32 {
    match total {
        Some(total) if total > 0 => (downloaded as f64 / total as f64).min(1.0) as f32,
        _ => 0.0,
    }
}
