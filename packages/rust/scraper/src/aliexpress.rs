//! AliExpress page extraction: listing pages and product pages.
//!
//! Listing pages lazy-load on scroll, so extraction drives the page past its
//! own growing height before collecting product links. Product pages expose
//! their full state through the global `runParams` object; the rendered
//! description lives on a separate sub-page linked from that state.

use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use shopmirror_shared::{MarketplaceProduct, Result, ScrapeConfig, ShopMirrorError};

use crate::browser::BrowserPage;
use crate::normalize::{description_body, normalize};
use crate::raw::RawState;

/// CSS class the site currently uses for product anchors on listing pages.
const PRODUCT_LINK_SELECTOR: &str = "a._3t7zg";

/// Product ids are embedded in hrefs as `item/<digits>.html`.
const PRODUCT_ID_PATTERN: &str = r"item/(\d+)\.html";

/// Page-driving scraper for AliExpress category and product pages.
pub struct AliExpressScraper<P: BrowserPage> {
    page: P,
    config: ScrapeConfig,
}

impl<P: BrowserPage> AliExpressScraper<P> {
    pub fn new(page: P, config: ScrapeConfig) -> Self {
        Self { page, config }
    }

    /// Collect the product ids reachable from a category's listing page.
    ///
    /// Hrefs that don't carry a product id are silently dropped.
    #[instrument(skip(self))]
    pub async fn listing_product_ids(
        &self,
        category_id: i64,
        category_name: &str,
    ) -> Result<Vec<i64>> {
        let url =
            format!("https://www.aliexpress.com/category/{category_id}/{category_name}.html");
        self.page.goto(&url).await?;
        self.scroll_to_end().await?;

        let hrefs = self
            .page
            .attribute_of_all(PRODUCT_LINK_SELECTOR, "href")
            .await?;

        let re = Regex::new(PRODUCT_ID_PATTERN).expect("static regex");
        let ids: Vec<i64> = hrefs
            .iter()
            .filter_map(|href| re.captures(href))
            .filter_map(|caps| caps[1].parse().ok())
            .collect();

        info!(
            category_id,
            anchors = hrefs.len(),
            products = ids.len(),
            "listing extracted"
        );
        Ok(ids)
    }

    /// Extract and normalize a single product.
    #[instrument(skip(self))]
    pub async fn product(&self, product_id: i64) -> Result<MarketplaceProduct> {
        let url = format!("https://www.aliexpress.com/item/{product_id}.html");
        self.page.goto(&url).await?;

        let run_params = self.page.evaluate("() => runParams").await?;
        let data = run_params
            .get("data")
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| {
                ShopMirrorError::extraction(format!("{url}: runParams has no data member"))
            })?;
        let state = RawState::new(data);

        // The description is rendered on its own sub-page; capture the
        // rendered markup, not the raw payload. The payload sometimes hands
        // out protocol-relative URLs, so resolve against the product page.
        let description_url = state
            .str_at(&["descriptionModule", "descriptionUrl"])
            .map(|raw| resolve_against(&url, raw))
            .unwrap_or_default();
        let description = if description_url.is_empty() {
            debug!(product_id, "no description url in payload");
            String::new()
        } else {
            self.page.goto(&description_url).await?;
            description_body(&self.page.content().await?)
        };

        Ok(normalize(product_id, &state, &description_url, &description))
    }

    /// Scroll until the accumulated distance exceeds the last observed page
    /// height. The height is re-read after every step because the page grows
    /// as content lazy-loads; `max_scroll_steps` bounds a page that never
    /// stops growing.
    async fn scroll_to_end(&self) -> Result<()> {
        let mut page_height = self.page_height().await?;
        let mut scrolled: i64 = 0;
        let mut steps: u32 = 0;

        while scrolled <= page_height {
            self.page
                .evaluate(&format!(
                    "() => window.scrollBy(0, {})",
                    self.config.scroll_distance_px
                ))
                .await?;

            page_height = self.page_height().await?;
            scrolled += self.config.scroll_distance_px;
            steps += 1;

            if steps >= self.config.max_scroll_steps {
                warn!(steps, page_height, "scroll step bound reached before page settled");
                break;
            }

            tokio::time::sleep(Duration::from_millis(self.config.scroll_pause_ms)).await;
        }

        debug!(steps, page_height, "listing scroll finished");
        Ok(())
    }

    async fn page_height(&self) -> Result<i64> {
        Ok(self
            .page
            .evaluate("() => document.body.scrollHeight")
            .await?
            .as_i64()
            .unwrap_or(0))
    }
}

/// Resolve a possibly-relative URL against a base, falling back to the raw
/// string when either side fails to parse.
fn resolve_against(base: &str, raw: &str) -> String {
    match url::Url::parse(base).and_then(|b| b.join(raw)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => raw.to_string(),
    }
}
