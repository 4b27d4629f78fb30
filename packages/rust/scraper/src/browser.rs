//! Browser capability: a narrow page-driving trait plus the chromiumoxide
//! implementation.
//!
//! Extraction logic only ever sees [`BrowserPage`], so it can run against a
//! scripted fake in tests. [`ChromeBrowser`] owns the real chromium process
//! and the CDP event loop.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tracing::{debug, warn};

use shopmirror_shared::{Result, ScrapeConfig, ShopMirrorError};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The browser operations the extraction pipeline depends on.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate to a URL and wait for the load to settle.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Evaluate a script in the page and return its JSON value.
    /// `undefined` results come back as `Value::Null`.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Read one attribute from every element matching a CSS selector.
    /// Elements without the attribute are omitted.
    async fn attribute_of_all(&self, selector: &str, attribute: &str) -> Result<Vec<String>>;

    /// The current rendered page markup.
    async fn content(&self) -> Result<String>;
}

// ---------------------------------------------------------------------------
// ChromeBrowser
// ---------------------------------------------------------------------------

/// A launched chromium instance driving [`ChromePage`]s.
pub struct ChromeBrowser {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
}

impl ChromeBrowser {
    /// Launch chromium according to the scrape config.
    pub async fn launch(config: &ScrapeConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(1200, 800)
            .args(vec!["--no-sandbox", "--disable-setuid-sandbox"]);
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(ShopMirrorError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ShopMirrorError::Browser(format!("launch failed: {e}")))?;

        // The CDP handler must be polled for the browser connection to make
        // progress; it runs until the browser goes away.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!(headless = config.headless, "chromium launched");
        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a fresh page.
    pub async fn new_page(&self) -> Result<ChromePage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ShopMirrorError::Browser(format!("new page: {e}")))?;
        Ok(ChromePage { page })
    }

    /// Close the browser and stop the CDP event loop.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        self.handler_task.abort();
    }
}

/// A single chromium tab implementing [`BrowserPage`].
pub struct ChromePage {
    page: Page,
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ShopMirrorError::Browser(format!("{url}: {e}")))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ShopMirrorError::Browser(format!("{url}: navigation: {e}")))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ShopMirrorError::Browser(format!("evaluate: {e}")))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn attribute_of_all(&self, selector: &str, attribute: &str) -> Result<Vec<String>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| ShopMirrorError::Browser(format!("find {selector}: {e}")))?;

        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match element.attribute(attribute).await {
                Ok(Some(value)) => values.push(value),
                Ok(None) => {}
                Err(e) => warn!(selector, attribute, error = %e, "attribute read failed"),
            }
        }
        Ok(values)
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| ShopMirrorError::Browser(format!("content: {e}")))
    }
}
