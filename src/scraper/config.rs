use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the browser session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Accept invalid TLS certificates (default: true)
    pub ignore_certificate_errors: bool,

    /// Browser request timeout for a single navigation in seconds (default: 60)
    pub page_load_timeout_secs: u64,

    /// How long to wait for the listing marker in seconds (default: 30)
    pub listing_timeout_secs: u64,

    /// How long to wait for content items after scrolling in seconds (default: 20)
    pub items_timeout_secs: u64,

    /// Pause between the two scroll steps in milliseconds (default: 1000)
    pub scroll_pause_ms: u64,

    /// Settle delay after opening a post page in milliseconds (default: 2000)
    pub detail_settle_ms: u64,

    /// Pause between two post pages in milliseconds (default: 1000)
    pub detail_pause_ms: u64,

    /// Polling period while waiting for a selector in milliseconds (default: 250)
    pub poll_interval_ms: u64,

    /// User agents to pick from at random for each session.
    /// An empty list falls back to the built-in pool.
    pub user_agents: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            ignore_certificate_errors: true,
            page_load_timeout_secs: 60,
            listing_timeout_secs: 30,
            items_timeout_secs: 20,
            scroll_pause_ms: 1000,
            detail_settle_ms: 2000,
            detail_pause_ms: 1000,
            poll_interval_ms: 250,
            user_agents: Vec::new(),
        }
    }
}

impl ScraperConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn items_timeout(&self) -> Duration {
        Duration::from_secs(self.items_timeout_secs)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn detail_settle(&self) -> Duration {
        Duration::from_millis(self.detail_settle_ms)
    }

    pub fn detail_pause(&self) -> Duration {
        Duration::from_millis(self.detail_pause_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// A config with every pause zeroed, for driving stub sessions.
    pub fn immediate() -> Self {
        Self {
            scroll_pause_ms: 0,
            detail_settle_ms: 0,
            detail_pause_ms: 0,
            poll_interval_ms: 1,
            ..Default::default()
        }
    }
}
