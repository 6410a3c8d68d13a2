use std::time::Duration;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub user_agent: String,
    /// Only hrefs ending with this literal are listed
    pub link_suffix: String,
    pub connect_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("mp3-page-downloader/", env!("CARGO_PKG_VERSION")).to_string(),
            link_suffix: ".mp3".to_string(),
            connect_timeout: Duration::from_secs(15),
        }
    }
}
