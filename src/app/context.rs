use std::path::PathBuf;
use std::sync::Arc;

use crate::accumulator::Accumulator;
use crate::app::error::{PipelineError, Result};
use crate::config::Config;
use crate::crawler::Crawler;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::scraper::{ChromeSessionFactory, SessionFactory};
use crate::store::CsvStore;

/// Wires the configured stages together.
pub struct AppContext {
    pub config: Config,
    pub store: CsvStore,
    pub crawler: Crawler,
    pub accumulator: Accumulator,
}

impl AppContext {
    /// Context backed by a real Chrome and a reqwest client.
    pub fn new(config: Config) -> Result<Self> {
        let sessions: Arc<dyn SessionFactory> =
            Arc::new(ChromeSessionFactory::new(config.browser.clone()));
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(config.preflight.timeout())?);
        Self::with_parts(config, sessions, fetcher)
    }

    /// Context with caller-supplied browser and HTTP collaborators.
    pub fn with_parts(
        config: Config,
        sessions: Arc<dyn SessionFactory>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Self> {
        let store = CsvStore::new(Self::store_path(&config)?);
        let crawler = Crawler::new(&config, sessions, fetcher)?;
        let accumulator =
            Accumulator::new(config.filter.clone()).with_retention(config.store.max_rows);

        Ok(Self {
            config,
            store,
            crawler,
            accumulator,
        })
    }

    pub fn store_path(config: &Config) -> Result<PathBuf> {
        match &config.store.path {
            Some(p) => Ok(p.clone()),
            None => Self::default_data_path("posts.csv"),
        }
    }

    pub fn processed_path(config: &Config) -> Result<PathBuf> {
        match &config.store.processed_path {
            Some(p) => Ok(p.clone()),
            None => Self::default_data_path("posts_processed.csv"),
        }
    }

    pub fn narration_dir(config: &Config) -> Result<PathBuf> {
        match &config.store.narration_dir {
            Some(p) => Ok(p.clone()),
            None => Self::default_data_path("narration"),
        }
    }

    fn default_data_path(name: &str) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| PipelineError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("threadcast");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join(name))
    }
}
