//! Configuration management.
//!
//! Configuration is read from `~/.config/threadcast/config.toml` at startup,
//! or from the path given with `--config`. If the file doesn't exist, a
//! default configuration with comments is created.

pub mod site;

pub use site::SiteConfig;

use crate::accumulator::FilterConfig;
use crate::daemon::ScheduleConfig;
use crate::fetcher::PreflightConfig;
use crate::rewrite::RewriteConfig;
use crate::scraper::ScraperConfig;
use crate::store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub browser: ScraperConfig,
    pub preflight: PreflightConfig,
    pub schedule: ScheduleConfig,
    pub filter: FilterConfig,
    pub store: StoreConfig,
    pub rewrite: RewriteConfig,
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`.
    ///
    /// A missing file at the default path is created with commented
    /// defaults. Missing fields in the file use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            if path.is_some() {
                return Err(ConfigError::Io {
                    path: config_path,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                });
            }
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: config_path,
                source,
            },
            other => other,
        })
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no stage can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("site.listing_url", &self.site.listing_url),
            ("site.origin", &self.site.origin),
            ("rewrite.endpoint", &self.rewrite.endpoint),
        ] {
            url::Url::parse(value).map_err(|e| ConfigError::Invalid {
                field: name,
                reason: format!("{:?} is not a URL: {}", value, e),
            })?;
        }

        if self.schedule.retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "schedule.retry_attempts",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.preflight.attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "preflight.attempts",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.schedule.interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "schedule.interval_secs",
                reason: "must be positive".to_string(),
            });
        }

        Ok(())
    }

    /// Get the default config file path: `~/.config/threadcast/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("threadcast").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# threadcast configuration
#
# Every key is optional; anything left out uses the value shown here.

[site]
listing_url = "https://www.teamblind.com/kr/"
# Prefix for relative post links
origin = "https://www.teamblind.com"
# Present once the listing has rendered
listing_marker = "div.topic-list.best"
# Present once lazy posts have loaded
content_item = "div.article"
entry_selector = "div.topic-list.best div.article"
topic_selector = "span.topic a"
title_selector = "a.tit"
like_selector = "span.like"
comment_selector = "a.cmt"
image_class = "ico-img"
poll_class = "ico-poll"
detail_content_selector = "p.contents-txt#contentArea"

[browser]
headless = true
ignore_certificate_errors = true
page_load_timeout_secs = 60
listing_timeout_secs = 30
items_timeout_secs = 20
scroll_pause_ms = 1000
detail_settle_ms = 2000
detail_pause_ms = 1000
# Leave empty to use the built-in pool
user_agents = []

[preflight]
attempts = 3
# Attempt N waits N x backoff_ms before the next one
backoff_ms = 1000
timeout_secs = 10

[schedule]
interval_secs = 300
retry_attempts = 3
# Attempt N waits N x retry_backoff_secs before the next one
retry_backoff_secs = 5
run_on_start = true

[filter]
min_likes = 20
min_content_chars = 200

[store]
# Defaults live in the platform data directory
# path = "/var/lib/threadcast/posts.csv"
# processed_path = "/var/lib/threadcast/posts_processed.csv"
# narration_dir = "/var/lib/threadcast/narration"
# Keep only the newest N rows (unbounded when unset)
# max_rows = 5000

[rewrite]
# llama.cpp server (or compatible) base URL
endpoint = "http://127.0.0.1:8080"
max_tokens = 2048
temperature = 0.82
top_p = 0.97
repeat_penalty = 1.05
timeout_secs = 600
min_input_chars = 50
min_output_chars = 300
min_sentences = 5
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config = Config::from_toml(&content).expect("Default config should be valid TOML");

        assert_eq!(config.site.listing_url, "https://www.teamblind.com/kr/");
        assert_eq!(config.schedule.interval_secs, 300);
        assert_eq!(config.filter.min_likes, 20);
        assert_eq!(config.browser.page_load_timeout_secs, 60);
        assert_eq!(config.store.max_rows, None);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[filter]
min_likes = 50

[store]
path = "/tmp/posts.csv"
"##;
        let config = Config::from_toml(content).expect("Partial config should work");

        assert_eq!(config.filter.min_likes, 50);
        assert_eq!(config.filter.min_content_chars, 200);
        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/posts.csv")));
        assert_eq!(config.preflight.attempts, 3);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_toml("").expect("Empty config should work");
        assert_eq!(config.site.origin, "https://www.teamblind.com");
        assert_eq!(config.schedule.retry_attempts, 3);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = Config::from_toml("[site]\nlisting_url = \"not a url\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "site.listing_url", .. }));
    }

    #[test]
    fn test_zero_retry_attempts_rejected() {
        let err = Config::from_toml("[schedule]\nretry_attempts = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "schedule.retry_attempts", .. }));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[filter]\nmin_likes = 7\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.filter.min_likes, 7);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_error_carries_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[filter\n").unwrap();

        match Config::load(Some(&path)).unwrap_err() {
            ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
