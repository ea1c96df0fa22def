use scraper::{Html, Selector};

use crate::app::{PipelineError, Result};

/// Builds the scripts run inside the page and pulls text out of rendered HTML.
pub struct ContentExtractor {
    detail_source: String,
    detail_selector: Selector,
}

impl ContentExtractor {
    /// Fails with a config error when `detail_selector` is not valid CSS.
    pub fn new(detail_selector: impl Into<String>) -> Result<Self> {
        let detail_source = detail_selector.into();
        let detail_selector = Selector::parse(&detail_source).map_err(|e| {
            PipelineError::Config(format!("invalid detail selector {}: {}", detail_source, e))
        })?;
        Ok(Self {
            detail_source,
            detail_selector,
        })
    }

    /// Script scrolling the window to `fraction` of the document height.
    ///
    /// Lazy listings only append posts once the viewport nears the bottom,
    /// so the fetcher scrolls in two steps (0.8 then 1.0).
    pub fn scroll_script(fraction: f64) -> String {
        let fraction = fraction.clamp(0.0, 1.0);
        format!("window.scrollTo(0, document.body.scrollHeight * {fraction});")
    }

    /// Script answering whether `selector` currently matches anything.
    pub fn presence_script(selector: &str) -> String {
        let quoted = serde_json::to_string(selector).unwrap_or_else(|_| "''".to_string());
        format!("document.querySelector({quoted}) !== null")
    }

    /// Trimmed text of the post body in a detail page.
    pub fn detail_text(&self, html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        let element = document.select(&self.detail_selector).next().ok_or_else(|| {
            PipelineError::Parse(format!("no element matches {}", self.detail_source))
        })?;

        Ok(element.text().collect::<String>().trim().to_string())
    }
}
