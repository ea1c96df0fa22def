use tracing::{debug, warn};

use crate::app::{PipelineError, Result};
use crate::config::SiteConfig;
use crate::scraper::{BrowserSession, ContentExtractor, ScraperConfig};

/// Reads the body text of individual posts.
pub struct DetailFetcher {
    extractor: ContentExtractor,
    config: ScraperConfig,
}

impl DetailFetcher {
    pub fn new(site: &SiteConfig, config: ScraperConfig) -> Result<Self> {
        Ok(Self {
            extractor: ContentExtractor::new(site.detail_content_selector.clone())?,
            config,
        })
    }

    /// Body text of the post at `link`, or `None` when it could not be read.
    ///
    /// Failures are logged and never propagate; the caller keeps the record
    /// with empty content.
    pub async fn fetch(&self, session: &dyn BrowserSession, link: &str) -> Option<String> {
        match self.try_fetch(session, link).await {
            Ok(content) => {
                debug!("Read {} chars from {}", content.chars().count(), link);
                Some(content)
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    async fn try_fetch(&self, session: &dyn BrowserSession, link: &str) -> Result<String> {
        let detail_error = |reason: String| PipelineError::DetailFetch {
            url: link.to_string(),
            reason,
        };

        session
            .navigate(link)
            .await
            .map_err(|e| detail_error(e.to_string()))?;
        tokio::time::sleep(self.config.detail_settle()).await;

        let html = session
            .html()
            .await
            .map_err(|e| detail_error(e.to_string()))?;
        self.extractor
            .detail_text(&html)
            .map_err(|e| detail_error(e.to_string()))
    }

    /// Pause observed between two post pages.
    pub async fn pause(&self) {
        tokio::time::sleep(self.config.detail_pause()).await;
    }
}
