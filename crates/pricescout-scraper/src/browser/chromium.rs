//! Chromium engine via chromiumoxide.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::{BrowserEngine, BrowserLauncher, BrowserPage};
use crate::error::ScraperError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches headless Chromium, optionally from an explicit binary path.
pub struct ChromiumLauncher {
    chrome_path: Option<PathBuf>,
    user_agent: String,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(chrome_path: Option<PathBuf>, user_agent: String) -> Self {
        Self {
            chrome_path,
            user_agent,
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserEngine>, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--lang=pt-BR")
            .arg(format!("--user-agent={}", self.user_agent));
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| ScraperError::Browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to launch Chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "chromium handler event error");
                }
            }
        });

        tracing::debug!("headless Chromium launched");
        Ok(Arc::new(ChromiumBrowser {
            browser: Mutex::new(browser),
            handler_task,
        }))
    }
}

pub struct ChromiumBrowser {
    browser: Mutex<Browser>,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl BrowserEngine for ChromiumBrowser {
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, ScraperError> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to open page: {e}")))?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn shutdown(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::debug!(error = %e, "browser close failed");
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "browser process wait failed");
        }
        self.handler_task.abort();
    }
}

pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScraperError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ScraperError::Browser(format!(
                "navigation to {url} failed: {e}"
            ))),
            Err(_) => Err(ScraperError::Timeout {
                url: url.to_owned(),
                secs: timeout.as_secs(),
            }),
        }
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, ScraperError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, ScraperError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScraperError::Browser(format!("script evaluation failed: {e}")))?;
        result
            .into_value()
            .map_err(|e| ScraperError::Browser(format!("script result not JSON: {e}")))
    }

    async fn content(&self) -> Result<String, ScraperError> {
        self.page
            .content()
            .await
            .map_err(|e| ScraperError::Browser(format!("failed to read page HTML: {e}")))
    }

    async fn close(self: Box<Self>) {
        let ChromiumPage { page } = *self;
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "page close failed");
        }
    }
}
