//! Browser-driven fetching of the listing and of individual posts.
//!
//! # Architecture
//!
//! ```text
//! SessionFactory → BrowserSession → PageFetcher  → listing HTML
//!                                 → DetailFetcher → post body
//! ```
//!
//! The session traits are the seam between crawl logic and the browser
//! driver; [`ChromeSession`] drives a real Chrome through chromiumoxide.
//!
//! # Usage
//!
//! ```rust,ignore
//! use threadcast::scraper::{ChromeSessionFactory, PageFetcher, ScraperConfig, SessionFactory};
//!
//! let factory = ChromeSessionFactory::new(ScraperConfig::default());
//! let mut session = factory.open().await?;
//! let html = PageFetcher::new(site, config).fetch(session.as_ref(), url).await;
//! session.close().await?;
//! ```

mod chrome;
mod config;
mod detail;
mod extractor;
mod listing;
pub mod user_agent;

pub use chrome::{ChromeSession, ChromeSessionFactory};
pub use config::ScraperConfig;
pub use detail::DetailFetcher;
pub use extractor::ContentExtractor;
pub use listing::PageFetcher;

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::app::Result;

/// A live page in a browser, driven one step at a time.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url` in the session's page.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Whether `selector` matches at least one element right now.
    async fn has_element(&self, selector: &str) -> Result<bool>;

    /// Run a script for its side effects.
    async fn execute_script(&self, script: &str) -> Result<()>;

    /// Current HTML of the page.
    async fn html(&self) -> Result<String>;

    /// Tear the session down. Calling it twice is harmless.
    async fn close(&mut self) -> Result<()>;

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(250)
    }

    /// Block until `selector` is present or `timeout` elapses.
    ///
    /// Returns `Ok(false)` on timeout.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.has_element(selector).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.poll_interval()).await;
        }
    }
}

/// Opens browser sessions; one session serves a whole cycle.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>>;
}
