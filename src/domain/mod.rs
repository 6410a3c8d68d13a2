pub mod error;
pub mod model;

pub use error::AppError;
pub use model::{target_file_name, target_path, BatchSummary, DownloadEvent, Link, LinkStatus};
