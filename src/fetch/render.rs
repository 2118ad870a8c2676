// src/fetch/render.rs
use async_trait::async_trait;

use crate::utils::error::FetchError;

pub const DEFAULT_RENDER_WAIT_SECS: u64 = 10;

/// Renders a page in a real browser and returns the resulting HTML.
/// Used when the plain HTTP fetch yields no table (script-built pages).
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, FetchError>;
}

#[cfg(feature = "headless")]
pub use chrome::ChromeRenderer;

#[cfg(feature = "headless")]
mod chrome {
    use std::ffi::OsStr;
    use std::time::Duration;

    use async_trait::async_trait;
    use headless_chrome::{Browser, LaunchOptions};

    use super::PageRenderer;
    use crate::utils::error::FetchError;

    /// Headless Chrome renderer. Each call launches its own browser and waits
    /// at most `wait` for a `table` element before giving up.
    pub struct ChromeRenderer {
        wait: Duration,
    }

    impl ChromeRenderer {
        pub fn new(wait: Duration) -> Self {
            Self { wait }
        }
    }

    #[async_trait]
    impl PageRenderer for ChromeRenderer {
        async fn render(&self, url: &str) -> Result<String, FetchError> {
            let url = url.to_string();
            let wait = self.wait;
            tracing::info!("Falling back to headless render for {}", url);

            tokio::task::spawn_blocking(move || render_blocking(&url, wait))
                .await
                .map_err(|e| FetchError::Join(e.to_string()))?
        }
    }

    fn render_blocking(url: &str, wait: Duration) -> Result<String, FetchError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .args(vec![OsStr::new("--disable-dev-shm-usage")])
            .build()
            .map_err(|e| FetchError::Render(format!("Invalid browser options: {}", e)))?;

        let browser = Browser::new(options)
            .map_err(|e| FetchError::Render(format!("Failed to launch browser: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| FetchError::Render(format!("Failed to create new browser tab: {}", e)))?;

        tab.navigate_to(url)
            .map_err(|e| FetchError::Render(format!("Failed to navigate to {}: {}", url, e)))?;
        tab.wait_for_element_with_custom_timeout("table", wait)
            .map_err(|e| {
                tracing::warn!("No table appeared on {} within {:?}", url, wait);
                FetchError::Render(format!("No table within {:?}: {}", wait, e))
            })?;

        let html = tab
            .get_content()
            .map_err(|e| FetchError::Render(format!("Failed to get page content: {}", e)))?;
        tracing::debug!("Rendered {} bytes from {}", html.len(), url);
        Ok(html)
    }
}
