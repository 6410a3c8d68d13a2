use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use log::{debug, info, warn};
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

use super::models::ApiConfig;
use crate::utils::resolve_link;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Server returned error: {0}")]
    StatusError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self { config, http }
    }

    /// Fetch the raw HTML of a page
    pub async fn fetch_page(&self, page_url: &str) -> Result<String> {
        let response = self
            .http
            .get(page_url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ApiError::StatusError(format!("Page request failed: {}", e)))?;

        Ok(response.text().await?)
    }

    /// Collect the `href` of every anchor ending with the configured suffix,
    /// in document order. Duplicates are kept.
    pub fn extract_links(&self, html: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let document = Html::parse_document(html);
        let links = document
            .select(&selector)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter(|href| href.ends_with(self.config.link_suffix.as_str()))
            .map(String::from)
            .collect();

        links
    }

    /// Fetch a page and list its matching links, resolved against the page URL
    pub async fn list_links(&self, page_url: &str) -> Result<Vec<String>> {
        let base = Url::parse(page_url)?;
        let html = self.fetch_page(page_url).await?;

        let links: Vec<String> = self
            .extract_links(&html)
            .into_iter()
            .filter_map(|href| {
                let resolved = resolve_link(&base, &href);
                if resolved.is_none() {
                    debug!("Skipping unresolvable link: {}", href);
                }
                resolved
            })
            .collect();

        info!("Found {} links on {}", links.len(), page_url);
        Ok(links)
    }

    /// Download file with progress stream
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        download_url: &str,
    ) -> Result<(Option<u64>, BoxStream<'static, Result<bytes::Bytes>>)> {
        let response = self
            .http
            .get(download_url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ApiError::StatusError(format!("Download request failed: {}", e)))?;

        let total_size = response.content_length();
        let stream = response
            .bytes_stream()
            .map_err(ApiError::RequestError)
            .boxed();

        Ok((total_size, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
            <a href="https://example.com/book/Chapter%201.mp3">One</a>
            <a href="https://example.com/book/cover.jpg">Cover</a>
            <a href="https://example.com/book/Chapter%202.mp3">Two</a>
            <a href="https://example.com/book/notes.MP3">Shouting</a>
            <p><a href="https://example.com/book/Chapter%203.mp3">Three</a></p>
        </body></html>
    "#;

    #[test]
    fn test_extract_links() {
        let client = ApiClient::new(ApiConfig::default());
        let links = client.extract_links(FIXTURE);
        assert_eq!(
            links,
            vec![
                "https://example.com/book/Chapter%201.mp3",
                "https://example.com/book/Chapter%202.mp3",
                "https://example.com/book/Chapter%203.mp3",
            ]
        );
    }

    #[test]
    fn test_extract_links_without_matches() {
        let client = ApiClient::new(ApiConfig::default());
        assert!(client.extract_links("<a href='/a.ogg'>x</a><a>no href</a>").is_empty());
        assert!(client.extract_links("<<<not html at all").is_empty());
    }

    #[tokio::test]
    async fn test_list_links_resolves_relative_hrefs() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", "/books/alice/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<a href="ch1.mp3">1</a><a href="https://cdn.example.com/ch2.mp3">2</a>"#)
            .create_async()
            .await;

        let client = ApiClient::new(ApiConfig::default());
        let page_url = format!("{}/books/alice/", server.url());
        let links = client.list_links(&page_url).await.unwrap();

        page.assert_async().await;
        assert_eq!(
            links,
            vec![
                format!("{}/books/alice/ch1.mp3", server.url()),
                "https://cdn.example.com/ch2.mp3".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_page_reports_http_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = ApiClient::new(ApiConfig::default());
        let result = client.fetch_page(&format!("{}/missing", server.url())).await;
        assert!(matches!(result, Err(ApiError::StatusError(_))));
    }
}
