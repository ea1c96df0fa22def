use tracing::debug;

use crate::app::{PipelineError, Result};
use crate::config::SiteConfig;
use crate::scraper::{BrowserSession, ContentExtractor, ScraperConfig};

/// Loads the listing page and waits until its lazily rendered posts exist.
pub struct PageFetcher {
    site: SiteConfig,
    config: ScraperConfig,
}

impl PageFetcher {
    pub fn new(site: SiteConfig, config: ScraperConfig) -> Self {
        Self { site, config }
    }

    /// Rendered HTML of the listing at `url`.
    pub async fn fetch(&self, session: &dyn BrowserSession, url: &str) -> Result<String> {
        session.navigate(url).await?;

        let timeout = self.config.listing_timeout();
        if !session.wait_for(&self.site.listing_marker, timeout).await? {
            return Err(PipelineError::Timeout {
                selector: self.site.listing_marker.clone(),
                secs: timeout.as_secs(),
            });
        }
        debug!("Listing marker {} present", self.site.listing_marker);

        session
            .execute_script(&ContentExtractor::scroll_script(0.8))
            .await?;
        tokio::time::sleep(self.config.scroll_pause()).await;
        session
            .execute_script(&ContentExtractor::scroll_script(1.0))
            .await?;

        let timeout = self.config.items_timeout();
        if !session.wait_for(&self.site.content_item, timeout).await? {
            return Err(PipelineError::Timeout {
                selector: self.site.content_item.clone(),
                secs: timeout.as_secs(),
            });
        }

        session.html().await
    }
}
