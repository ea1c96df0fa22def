//! Plain HTTP reachability checks run before the browser is driven.

pub mod http_fetcher;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::{PipelineError, Result};

#[async_trait]
pub trait Fetcher {
    /// HTTP status code returned by a GET of `url`.
    async fn status(&self, url: &str) -> Result<u16>;
}

/// Retry policy for the pre-flight check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    /// Total attempts (default: 3)
    pub attempts: u32,

    /// Linear backoff step in milliseconds: attempt N waits N × step (default: 1000)
    pub backoff_ms: u64,

    /// Per-request timeout in seconds (default: 10)
    pub timeout_secs: u64,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 1000,
            timeout_secs: 10,
        }
    }
}

impl PreflightConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Check that `url` answers with a success status, retrying with linear
/// backoff. Fails with [`PipelineError::Connection`] once attempts run out.
pub async fn preflight(
    fetcher: &(dyn Fetcher + Send + Sync),
    url: &str,
    config: &PreflightConfig,
) -> Result<()> {
    let attempts = config.attempts.max(1);
    let mut last_problem = String::new();

    for attempt in 1..=attempts {
        match fetcher.status(url).await {
            Ok(status) if (200..300).contains(&status) => {
                debug!("Pre-flight {} answered {}", url, status);
                return Ok(());
            }
            Ok(status) => last_problem = format!("HTTP {}", status),
            Err(e) => last_problem = e.to_string(),
        }

        if attempt < attempts {
            warn!(
                "Pre-flight attempt {}/{} for {} failed: {}",
                attempt, attempts, url, last_problem
            );
            tokio::time::sleep(config.backoff(attempt)).await;
        }
    }

    Err(PipelineError::Connection(format!(
        "{} unreachable after {} attempts: {}",
        url, attempts, last_problem
    )))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Replays a fixed list of answers, repeating the last one.
    pub struct ScriptedFetcher {
        answers: Mutex<Vec<std::result::Result<u16, String>>>,
        pub calls: AtomicU32,
    }

    impl ScriptedFetcher {
        pub fn new(answers: Vec<std::result::Result<u16, String>>) -> Self {
            Self {
                answers: Mutex::new(answers),
                calls: AtomicU32::new(0),
            }
        }

        pub fn ok() -> Self {
            Self::new(vec![Ok(200)])
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn status(&self, _url: &str) -> Result<u16> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut answers = self.answers.lock().unwrap();
            let answer = if answers.len() > 1 {
                answers.remove(0)
            } else {
                answers[0].clone()
            };
            answer.map_err(PipelineError::Connection)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedFetcher;
    use super::*;

    fn quick() -> PreflightConfig {
        PreflightConfig {
            backoff_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_linear_backoff() {
        let config = PreflightConfig::default();
        assert_eq!(config.backoff(1), Duration::from_secs(1));
        assert_eq!(config.backoff(3), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_preflight_succeeds_first_try() {
        let fetcher = ScriptedFetcher::ok();
        tokio_test::assert_ok!(preflight(&fetcher, "https://a", &quick()).await);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_preflight_recovers_after_failures() {
        let fetcher = ScriptedFetcher::new(vec![Err("reset".into()), Ok(503), Ok(200)]);
        tokio_test::assert_ok!(preflight(&fetcher, "https://a", &quick()).await);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_preflight_gives_up_with_connection_error() {
        let fetcher = ScriptedFetcher::new(vec![Ok(500)]);
        let err = preflight(&fetcher, "https://a", &quick()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Connection(ref m) if m.contains("HTTP 500")));
        assert_eq!(fetcher.calls(), 3);
    }
}
