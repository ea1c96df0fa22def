use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::{PipelineError, Result};
use crate::scraper::config::ScraperConfig;
use crate::scraper::extractor::ContentExtractor;
use crate::scraper::{user_agent, BrowserSession, SessionFactory};

/// A Chrome page driven through chromiumoxide.
///
/// The browser process is torn down by [`BrowserSession::close`]; dropping
/// an unclosed session stops the event handler and lets chromiumoxide kill
/// the child process.
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: JoinHandle<()>,
    config: ScraperConfig,
}

impl ChromeSession {
    /// Launch a browser configured to look like an ordinary visitor.
    pub async fn launch(config: ScraperConfig) -> Result<Self> {
        let user_agent = user_agent::pick(&config.user_agents);

        // chromiumoxide's default argument list includes --enable-automation.
        let mut builder = BrowserConfig::builder()
            .disable_default_args()
            .request_timeout(config.page_load_timeout());
        for arg in launch_args(&config, &user_agent) {
            builder = builder.arg(arg);
        }

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| PipelineError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            PipelineError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(PipelineError::Browser(format!("Failed to create page: {}", e)));
            }
        };

        page.set_user_agent(&user_agent)
            .await
            .map_err(|e| PipelineError::Browser(format!("Failed to set user agent: {}", e)))?;

        debug!("Browser session started with user agent {}", user_agent);

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler,
            config,
        })
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| PipelineError::Browser("Session already closed".to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.page()?;
        let timeout = self.config.page_load_timeout();

        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(PipelineError::Browser(format!("Navigation to {} failed: {}", url, e))),
            Err(_) => Err(PipelineError::Timeout {
                selector: format!("page load of {}", url),
                secs: timeout.as_secs(),
            }),
        }
    }

    async fn has_element(&self, selector: &str) -> Result<bool> {
        let present: bool = self
            .page()?
            .evaluate(ContentExtractor::presence_script(selector))
            .await
            .map_err(|e| PipelineError::Browser(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| PipelineError::Browser(format!("Failed to parse result: {:?}", e)))?;
        Ok(present)
    }

    async fn execute_script(&self, script: &str) -> Result<()> {
        self.page()?
            .evaluate(script.to_string())
            .await
            .map_err(|e| PipelineError::Browser(format!("Script execution failed: {}", e)))?;
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        self.page()?
            .content()
            .await
            .map_err(|e| PipelineError::Browser(format!("Failed to read page source: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("Failed to close page: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            browser
                .close()
                .await
                .map_err(|e| PipelineError::Browser(format!("Failed to close browser: {}", e)))?;
            let _ = browser.wait().await;
            debug!("Browser session closed");
        }

        self.handler.abort();
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            warn!("Browser session dropped without close; killing it");
        }
        self.handler.abort();
    }
}

/// Chrome switches for a session that should not look automated.
fn launch_args(config: &ScraperConfig, user_agent: &str) -> Vec<String> {
    let mut args: Vec<String> = [
        "--no-sandbox",
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--disable-blink-features=AutomationControlled",
        "--disable-machine-learning-model-downloader",
        "--disable-background-networking",
        "--disable-background-timer-throttling",
        "--disable-backgrounding-occluded-windows",
        "--disable-renderer-backgrounding",
        "--disable-breakpad",
        "--disable-default-apps",
        "--disable-extensions",
        "--disable-hang-monitor",
        "--disable-popup-blocking",
        "--disable-prompt-on-repost",
        "--disable-sync",
        "--disable-search-engine-choice-screen",
        "--no-first-run",
        "--no-default-browser-check",
        "--password-store=basic",
        "--use-mock-keychain",
        "--ssl-version-min=tls1.2",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    args.push(format!("--user-agent={}", user_agent));
    if config.ignore_certificate_errors {
        args.push("--ignore-certificate-errors".to_string());
    }
    args
}

/// Launches a fresh [`ChromeSession`] per request.
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    config: ScraperConfig,
}

impl ChromeSessionFactory {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>> {
        let session = ChromeSession::launch(self.config.clone()).await?;
        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_args_hide_automation() {
        let args = launch_args(&ScraperConfig::default(), "agent-a");
        assert!(args.iter().all(|a| !a.contains("enable-automation")));
        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.contains(&"--user-agent=agent-a".to_string()));
        assert!(args.contains(&"--ignore-certificate-errors".to_string()));
    }

    #[test]
    fn test_launch_args_keep_certificate_checks_when_asked() {
        let config = ScraperConfig {
            ignore_certificate_errors: false,
            ..ScraperConfig::default()
        };
        let args = launch_args(&config, "agent-a");
        assert!(!args.contains(&"--ignore-certificate-errors".to_string()));
    }
}
