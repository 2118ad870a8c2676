// src/fetch/client.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::fetch::render::PageRenderer;
use crate::fetch::tables::extract_tables;
use crate::utils::domain::host_of;
use crate::utils::error::FetchError;

// Many bank sites reject obvious bots, so look like a desktop browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
const PAGE_TIMEOUT_SECS: u64 = 30;

/// Source of serialized table text for a page.
///
/// `Ok(vec![])` means the page was retrieved but has no detectable table;
/// `Err` means it could not be retrieved at all. The pipeline treats both as
/// an unsuccessful URL.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn fetch_tables(&self, url: &str) -> Result<Vec<String>, FetchError>;
}

/// Fetches pages over HTTP and serializes their tables, falling back to a
/// headless render when the static page has no table or is refused.
pub struct WebTableSource {
    client: reqwest::Client,
    renderer: Option<Box<dyn PageRenderer>>,
}

impl WebTableSource {
    pub fn new(renderer: Option<Box<dyn PageRenderer>>) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_page_client()?,
            renderer,
        })
    }

    async fn render_tables(
        &self,
        renderer: &dyn PageRenderer,
        url: &str,
        host: &str,
    ) -> Result<Vec<String>, FetchError> {
        let html = renderer.render(url).await?;
        extract_tables(&html, host)
    }
}

/// Creates a reqwest client configured like a regular browser session.
fn build_page_client() -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));

    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(PAGE_TIMEOUT_SECS))
        .build()
}

#[async_trait]
impl TableSource for WebTableSource {
    async fn fetch_tables(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let host = host_of(url).unwrap_or_default();
        tracing::info!("Downloading page: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            tracing::warn!("HTTP error status: {} for URL: {}", status, url);
            return match self.renderer.as_deref() {
                Some(renderer) => self.render_tables(renderer, url, &host).await,
                None => Err(FetchError::Http(status)),
            };
        }

        let body = response.text().await?;
        tracing::debug!("Downloaded {} bytes from {}", body.len(), url);

        let tables = extract_tables(&body, &host)?;
        if !tables.is_empty() {
            return Ok(tables);
        }

        match self.renderer.as_deref() {
            Some(renderer) => {
                tracing::debug!("No table in static HTML for {}, trying render", url);
                self.render_tables(renderer, url, &host).await
            }
            None => Ok(tables),
        }
    }
}
