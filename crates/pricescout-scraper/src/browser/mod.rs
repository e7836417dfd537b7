//! Headless-browser tier.
//!
//! [`BrowserEngine`] and [`BrowserPage`] abstract over the browser
//! (Chromium via chromiumoxide in production, fakes in tests). A
//! [`LazyBrowser`] launches the engine on first use and is shared by every
//! browser-tier adapter of a query; each adapter opens its own page.

pub mod adapter;
pub mod chromium;
pub mod recipe;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::ScraperError;

pub use adapter::BrowserAdapter;
pub use recipe::PageRecipe;

/// Default wait for the result list to appear after navigation.
pub const ELEMENT_WAIT_SECS: u64 = 15;

/// A running browser that can open pages.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, ScraperError>;

    /// Closes the browser. Safe to call more than once.
    async fn shutdown(&self);
}

/// A single tab.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScraperError>;

    /// Waits until `selector` matches; `Ok(false)` when `timeout` elapses first.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, ScraperError>;

    /// Evaluates `script` in the page and returns its JSON result.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, ScraperError>;

    /// Full HTML of the current document.
    async fn content(&self) -> Result<String, ScraperError>;

    /// Releases the tab. Errors are logged, never returned.
    async fn close(self: Box<Self>);
}

/// Starts a browser engine.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn BrowserEngine>, ScraperError>;
}

#[derive(Debug, Clone, Copy)]
pub struct BrowserTimeouts {
    pub navigation: Duration,
    pub element_wait: Duration,
}

impl BrowserTimeouts {
    #[must_use]
    pub fn with_navigation_secs(secs: u64) -> Self {
        Self {
            navigation: Duration::from_secs(secs),
            element_wait: Duration::from_secs(ELEMENT_WAIT_SECS),
        }
    }
}

impl Default for BrowserTimeouts {
    fn default() -> Self {
        Self::with_navigation_secs(30)
    }
}

/// Launches the browser at most once per query; a failed launch is
/// remembered so the second source does not pay for it again.
///
/// [`LazyBrowser::shutdown`] empties the slot, so the next query launches a
/// fresh engine.
pub struct LazyBrowser {
    launcher: Arc<dyn BrowserLauncher>,
    engine: Mutex<Option<Result<Arc<dyn BrowserEngine>, String>>>,
}

impl LazyBrowser {
    #[must_use]
    pub fn new(launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            launcher,
            engine: Mutex::new(None),
        }
    }

    /// Returns the shared engine, launching it on first call.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if the launch failed, now or earlier
    /// in the same query.
    pub async fn engine(&self) -> Result<Arc<dyn BrowserEngine>, ScraperError> {
        let mut slot = self.engine.lock().await;
        let state = match slot.take() {
            Some(state) => state,
            None => {
                tracing::debug!("launching headless browser");
                self.launcher.launch().await.map_err(|e| e.to_string())
            }
        };

        let result = match &state {
            Ok(engine) => Ok(Arc::clone(engine)),
            Err(reason) => Err(ScraperError::Browser(format!("launch failed: {reason}"))),
        };
        *slot = Some(state);
        result
    }

    pub async fn is_launched(&self) -> bool {
        matches!(*self.engine.lock().await, Some(Ok(_)))
    }

    /// Shuts the engine down if it was launched and forgets it, along with
    /// any remembered launch failure.
    pub async fn shutdown(&self) {
        let taken = self.engine.lock().await.take();
        if let Some(Ok(engine)) = taken {
            engine.shutdown().await;
        }
    }
}
