use std::path::{Path, PathBuf};

use super::AppError;

/// URL of one remote audio file, as listed on the page
pub type Link = String;

/// File name a link is saved under: `<Parent_dir>_<last segment>`.
///
/// The parent segment has `%20` replaced by `_`, is lower-cased and then gets
/// its first letter capitalized. The last segment is kept verbatim, so the
/// same link always maps to the same file and re-running overwrites it.
pub fn target_file_name(link: &str) -> String {
    let segments: Vec<&str> = link.split('/').collect();
    let parent = if segments.len() >= 2 {
        segments[segments.len() - 2]
    } else {
        ""
    };
    let last = segments.last().copied().unwrap_or_default();

    format!("{}_{}", capitalize(&parent.replace("%20", "_").to_lowercase()), last)
}

pub fn target_path(folder: &Path, link: &str) -> PathBuf {
    folder.join(target_file_name(link))
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Everything a batch download reports, in the order it happens
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Started { link: Link, path: PathBuf },
    /// Fraction of the file received, 0.0 to 1.0
    Progress { link: Link, fraction: f32 },
    Completed { link: Link, path: PathBuf },
    Failed { link: Link, error: AppError },
    Cancelled,
    /// The batch could not start at all
    Aborted(AppError),
    Finished(BatchSummary),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub completed: Vec<PathBuf>,
    pub failed: Vec<(Link, AppError)>,
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkStatus {
    Pending,
    Downloading(f32),
    Done,
    Failed(String),
}

impl LinkStatus {
    pub fn fraction(&self) -> f32 {
        match self {
            LinkStatus::Pending => 0.0,
            LinkStatus::Downloading(fraction) => *fraction,
            LinkStatus::Done => 1.0,
            LinkStatus::Failed(_) => 0.0,
        }
    }
}
