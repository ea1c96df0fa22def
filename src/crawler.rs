//! One crawl cycle: pre-flight, listing, parse, post bodies, with retries.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::app::{PipelineError, Result};
use crate::config::Config;
use crate::domain::{CycleOutcome, Record, RecordOutcome};
use crate::fetcher::{preflight, Fetcher, PreflightConfig};
use crate::parser::ListingParser;
use crate::scraper::{BrowserSession, DetailFetcher, PageFetcher, SessionFactory};

/// How often a failing cycle is attempted again.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Attempt N is followed by a pause of N × `backoff`
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

struct Harvest {
    records: Vec<Record>,
    skipped: usize,
    missing_content: usize,
}

pub struct Crawler {
    sessions: Arc<dyn SessionFactory>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    preflight: PreflightConfig,
    pages: PageFetcher,
    parser: ListingParser,
    details: DetailFetcher,
    retry: RetryPolicy,
}

impl Crawler {
    pub fn new(
        config: &Config,
        sessions: Arc<dyn SessionFactory>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Self> {
        Ok(Self {
            sessions,
            fetcher,
            preflight: config.preflight.clone(),
            pages: PageFetcher::new(config.site.clone(), config.browser.clone()),
            parser: ListingParser::new(config.site.clone())?,
            details: DetailFetcher::new(&config.site, config.browser.clone())?,
            retry: config.schedule.retry_policy(),
        })
    }

    /// Run one cycle against `url`.
    ///
    /// Never fails: when every attempt errors the outcome is
    /// [`CycleOutcome::Failed`] and carries no records. The browser session
    /// opened for the cycle is closed on every path.
    pub async fn run_cycle(&self, url: &str) -> CycleOutcome {
        let attempts = self.retry.attempts.max(1);
        let mut session: Option<Box<dyn BrowserSession>> = None;
        let mut last_error = String::new();
        let mut made = 0;

        for attempt in 1..=attempts {
            made = attempt;
            match self.attempt(&mut session, url).await {
                Ok(harvest) => {
                    close_session(&mut session).await;
                    return CycleOutcome::Completed {
                        records: harvest.records,
                        skipped: harvest.skipped,
                        missing_content: harvest.missing_content,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e.to_string();

                    if matches!(e, PipelineError::Browser(_)) {
                        // The page may be unusable; start the next attempt fresh.
                        close_session(&mut session).await;
                    }
                    if !e.is_retryable() {
                        break;
                    }
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    }
                }
            }
        }

        close_session(&mut session).await;
        error!("Crawl of {} failed after {} attempts", url, made);
        CycleOutcome::Failed {
            attempts: made,
            last_error,
        }
    }

    async fn attempt(
        &self,
        session: &mut Option<Box<dyn BrowserSession>>,
        url: &str,
    ) -> Result<Harvest> {
        preflight(self.fetcher.as_ref(), url, &self.preflight).await?;

        if session.is_none() {
            *session = Some(self.sessions.open().await?);
        }
        let Some(session) = session.as_deref() else {
            return Err(PipelineError::Browser("no browser session".to_string()));
        };

        let html = self.pages.fetch(session, url).await?;

        let mut records = Vec::new();
        let mut skipped = 0;
        for outcome in self.parser.parse(&html) {
            match outcome {
                RecordOutcome::Kept(record) => records.push(record),
                RecordOutcome::Skipped { index, reason } => {
                    warn!("Skipping listing entry {}: {}", index, reason);
                    skipped += 1;
                }
            }
        }
        info!("Found {} posts on the listing ({} skipped)", records.len(), skipped);

        let mut missing_content = 0;
        for record in &mut records {
            debug!("Processing: {}", record.link);
            match self.details.fetch(session, &record.link).await {
                Some(content) => record.content = content,
                None => missing_content += 1,
            }
            self.details.pause().await;
        }

        Ok(Harvest {
            records,
            skipped,
            missing_content,
        })
    }
}

async fn close_session(session: &mut Option<Box<dyn BrowserSession>>) {
    if let Some(mut s) = session.take() {
        if let Err(e) = s.close().await {
            warn!("Failed to close browser session: {}", e);
        }
    }
}
